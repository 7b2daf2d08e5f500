//! Damped pendulum with a nested damper subsystem.
//!
//! Run with `cargo run -p skein-sim --example pendulum`.

use skein_core::{Args, Dynamics, LogError, LogScope, MergePolicy, unlogged};
use skein_sim::{Method, Options, SaveTimes, simulate};

struct Params {
    length: f64,
    damping: f64,
}

/// State: `[angle, angular velocity]`.
struct Pendulum;

impl Dynamics for Pendulum {
    type Params = Params;

    fn derivative(
        &self,
        dx: &mut [f64],
        args: Args<'_, Params>,
        log: &mut LogScope,
    ) -> Result<(), LogError> {
        const G: f64 = 9.81;

        let [angle, rate] = [args.x[0], args.x[1]];
        let damper = unlogged(|dx: &mut [f64], args: Args<'_, f64>| {
            dx[0] = -args.params * args.x[0];
        });
        let mut damping = [0.0];
        log.invoke(
            "damper",
            MergePolicy::Only,
            &damper,
            &mut damping,
            args.project(&args.x[1..], &args.params.damping),
        )?;

        dx[0] = rate;
        dx[1] = -G / args.params.length * angle.sin() + damping[0];

        log.append("angle", angle)?;
        log.append("rate", rate)?;
        log.append_with("height", || args.params.length * (1.0 - angle.cos()))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let params = Params {
        length: 1.0,
        damping: 0.3,
    };
    let options = Options::new(0.0, 10.0)?
        .with_method(Method::Dop853 {
            abs_tol: 1e-10,
            rel_tol: 1e-10,
        })
        .with_save_times(SaveTimes::Every(0.5));

    let result = simulate([1.0, 0.0], &Pendulum, &params, &options)?;

    println!("status: {:?}", result.status);
    for (time, record) in result.table.rows() {
        println!("t = {time:5.2}  {record}");
    }
    Ok(())
}
