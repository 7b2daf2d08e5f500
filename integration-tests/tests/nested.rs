use approx::assert_relative_eq;
use skein_core::{Args, Dynamics, Inputs, LogRecord, LogValue, LoggableFunction, apply_inputs};
use skein_integration_tests::vehicle::{
    Actuator, Engine, Vehicle, VehicleEnv, VehicleParams, throttle,
};
use skein_sim::{Options, SaveTimes, Status, simulate, simulate_env};

fn driven_vehicle() -> impl Dynamics<Params = VehicleParams> {
    apply_inputs(Vehicle::default(), Vec::new()).input("throttle", |_, _, t| throttle(t))
}

#[test]
fn engine_record_matches_its_own_evaluation() {
    let params = VehicleParams::default();
    let driven = driven_vehicle();
    let options = Options::new(0.0, 5.0).unwrap();

    let result = simulate([0.0; 4], &driven, &params, &options).unwrap();

    assert_eq!(result.status, Status::Complete);
    assert!(result.table.len() > 2);

    for (time, record) in result.table.rows() {
        let state = result
            .trajectory
            .interpolate(time)
            .expect("saves lie on the trajectory");
        let inputs = [("throttle", throttle(time))];
        let args =
            Args::new(&state[2..], &params.engine, time).with_inputs(Inputs::new(&inputs));

        let mut dx = [0.0; 2];
        let expected = Engine::default().evaluate_with_log(&mut dx, args).unwrap();

        assert_eq!(
            record.get("engine"),
            Some(&LogValue::Record(expected)),
            "engine record differs at t = {time}"
        );
    }
}

/// Engine speed at `time` from a fixed-step RK4 integration of the engine and
/// actuator equations, written out by hand.
fn reference_engine_speed(params: &VehicleParams, time: f64) -> f64 {
    let engine = &params.engine;
    let rhs = |t: f64, [speed, position]: [f64; 2]| {
        let torque = engine.max_torque * position.clamp(0.0, 1.0);
        [
            (torque - engine.friction * speed) / engine.inertia,
            (throttle(t) - position) / engine.actuator.time_constant,
        ]
    };

    let step = |t: f64, h: f64, y: [f64; 2]| {
        let k1 = rhs(t, y);
        let k2 = rhs(t + h / 2.0, [y[0] + h / 2.0 * k1[0], y[1] + h / 2.0 * k1[1]]);
        let k3 = rhs(t + h / 2.0, [y[0] + h / 2.0 * k2[0], y[1] + h / 2.0 * k2[1]]);
        let k4 = rhs(t + h, [y[0] + h * k3[0], y[1] + h * k3[1]]);
        [0_usize, 1].map(|j| y[j] + h / 6.0 * (k1[j] + 2.0 * k2[j] + 2.0 * k3[j] + k4[j]))
    };

    let h = 1e-3;
    let whole = (time / h).floor() as usize;
    let mut y = [0.0, 0.0];
    for i in 0..whole {
        y = step(i as f64 * h, h, y);
    }
    let t = whole as f64 * h;
    if time > t {
        y = step(t, time - t, y);
    }
    y[0]
}

#[test]
fn engine_speed_matches_a_reference_solution() {
    let params = VehicleParams::default();
    let driven = driven_vehicle();

    for save_times in [SaveTimes::Steps, SaveTimes::Every(0.5)] {
        let options = Options::new(0.0, 3.0)
            .unwrap()
            .with_save_times(save_times);
        let result = simulate([0.0; 4], &driven, &params, &options).unwrap();

        let speeds = result.table.scalars("engine.speed").unwrap();
        assert!(speeds.last().is_some_and(|speed| *speed > 1.0));
        for (time, speed) in result.table.time().iter().zip(speeds) {
            assert_relative_eq!(
                speed,
                reference_engine_speed(&params, *time),
                epsilon = 1e-7,
                max_relative = 1e-6
            );
        }
    }
}

#[test]
fn records_nest_three_levels_deep() {
    let params = VehicleParams::default();
    let driven = driven_vehicle();
    let options = Options::new(0.0, 2.0)
        .unwrap()
        .with_save_times(SaveTimes::Every(0.5));

    let result = simulate([0.0; 4], &driven, &params, &options).unwrap();

    assert_eq!(result.table.time(), &[0.0, 0.5, 1.0, 1.5, 2.0]);

    let first: &LogRecord = &result.table.log()[0];
    let keys: Vec<&str> = first.keys().collect();
    assert_eq!(keys, vec!["engine", "position", "velocity", "traction"]);

    let commands = result.table.scalars("engine.actuator.command").unwrap();
    for (time, command) in result.table.time().iter().zip(commands) {
        assert_relative_eq!(command, throttle(*time));
    }

    // The actuator lags its command, so its position trails the throttle ramp.
    let positions = result.table.scalars("engine.actuator.position").unwrap();
    assert_relative_eq!(positions[0], 0.0);
    for (position, command) in positions
        .iter()
        .zip(result.table.scalars("engine.actuator.command").unwrap())
        .skip(1)
    {
        assert!(*position > 0.0 && *position < command);
    }

    let velocity = result.table.scalars("velocity").unwrap();
    assert!(velocity.windows(2).all(|pair| pair[1] > pair[0]));
}

#[test]
fn both_modes_agree_for_the_full_hierarchy() {
    let params = VehicleParams::default();
    let driven = driven_vehicle();

    for (state, time) in [
        ([0.0, 0.0, 0.0, 0.0], 0.0),
        ([12.0, 3.5, 40.0, 0.6], 1.3),
        ([250.0, 18.0, 310.0, 1.0], 7.9),
    ] {
        let mut plain = [0.0; 4];
        let mut logged = [0.0; 4];
        driven
            .evaluate(&mut plain, Args::new(&state, &params, time))
            .unwrap();
        driven
            .evaluate_with_log(&mut logged, Args::new(&state, &params, time))
            .unwrap();

        assert_eq!(plain.map(f64::to_bits), logged.map(f64::to_bits));
    }
}

#[test]
fn actuator_alone_can_be_simulated() {
    let params = VehicleParams::default().engine.actuator;
    let step = apply_inputs(Actuator, Vec::new()).input("command", |_, _, _| 1.0);
    let options = Options::new(0.0, 1.0)
        .unwrap()
        .with_save_times(SaveTimes::At(vec![0.2, 1.0]));

    let result = simulate([0.0], &step, &params, &options).unwrap();

    // First-order lag: position = 1 - exp(-t / tau)
    let positions = result.table.scalars("position").unwrap();
    assert_relative_eq!(positions[0], 1.0 - (-1.0_f64).exp(), max_relative = 1e-7);
    assert_relative_eq!(positions[1], 1.0 - (-5.0_f64).exp(), max_relative = 1e-7);
}

#[test]
fn environment_without_inputs_stays_at_rest() {
    let options = Options::new(0.0, 1.0)
        .unwrap()
        .with_save_times(SaveTimes::At(vec![0.0, 1.0]));

    let result = simulate_env(&VehicleEnv, None, &options).unwrap();

    assert_eq!(result.trajectory.final_state(), [0.0; 4]);
    assert_eq!(result.table.scalars("engine.torque").unwrap(), vec![0.0, 0.0]);
}
