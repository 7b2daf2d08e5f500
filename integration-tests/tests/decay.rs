use std::{f64::consts::E, thread};

use approx::assert_relative_eq;
use skein_core::{Args, LoggableFunction, unlogged};
use skein_integration_tests::decay::{Decay, DecayEnv};
use skein_sim::{Options, SaveTimes, Status, simulate, simulate_env};

fn options(save_times: &[f64]) -> Options {
    Options::new(0.0, 1.0)
        .unwrap()
        .with_save_times(SaveTimes::At(save_times.to_vec()))
}

#[test]
fn decay_is_recorded_at_the_requested_times() {
    let result = simulate_env(&DecayEnv, None, &options(&[0.0, 0.5, 1.0])).unwrap();

    assert_eq!(result.status, Status::Complete);
    assert_eq!(result.table.time(), &[0.0, 0.5, 1.0]);

    let x = result.table.scalars("x").unwrap();
    assert_relative_eq!(x[0], 1.0);
    assert_relative_eq!(x[1], E.powf(-0.5), max_relative = 1e-7);
    assert_relative_eq!(x[2], E.powf(-1.0), max_relative = 1e-7);
}

#[test]
fn one_row_per_save_time() {
    let times: Vec<f64> = (0..=20).map(|i| f64::from(i) * 0.05).collect();

    let result = simulate([1.0], &Decay, &1.0, &options(&times)).unwrap();

    assert_eq!(result.table.len(), times.len());
    assert_eq!(result.table.time(), times.as_slice());
    assert!(result.table.time().windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn save_times_do_not_perturb_the_trajectory() {
    let sparse = simulate([1.0], &Decay, &1.0, &options(&[1.0])).unwrap();
    let dense = simulate([1.0], &Decay, &1.0, &options(&[0.1, 0.2, 0.3, 0.7, 1.0])).unwrap();

    assert_eq!(sparse.trajectory, dense.trajectory);
    assert_eq!(sparse.stats.accepted_steps, dense.stats.accepted_steps);
    assert_eq!(sparse.stats.evaluations, dense.stats.evaluations);
}

#[test]
fn unlogged_dynamics_follow_the_same_trajectory() {
    let plain = unlogged(|dx: &mut [f64], args: Args<'_, f64>| {
        let mut scratch = [0.0];
        Decay
            .evaluate(&mut scratch, args)
            .expect("plain evaluation never fails");
        dx[0] = scratch[0];
    });
    let options = options(&[0.0, 0.25, 0.5, 0.75, 1.0]);

    let logged = simulate([1.0], &Decay, &1.0, &options).unwrap();
    let unlogged = simulate([1.0], &plain, &1.0, &options).unwrap();

    assert_eq!(unlogged.trajectory, logged.trajectory);
    assert_eq!(unlogged.table.time(), logged.table.time());
    assert!(unlogged.table.log().iter().all(|record| record.is_empty()));
    assert!(logged.table.log().iter().all(|record| !record.is_empty()));
}

#[test]
fn concurrent_runs_are_independent() {
    let options = options(&[0.0, 0.5, 1.0]);
    let expected = simulate([1.0], &Decay, &1.0, &options).unwrap();

    let tables: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| simulate([1.0], &Decay, &1.0, &options).unwrap().table))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for table in tables {
        assert_eq!(table, expected.table);
    }
}
