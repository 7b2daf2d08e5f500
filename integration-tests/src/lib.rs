//! Shared systems for the end-to-end tests.

pub mod decay {
    use skein_core::{Args, Dynamics, Environment, LogError, LogScope};

    /// Exponential decay, `dx/dt = -rate * x`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Decay;

    impl Dynamics for Decay {
        type Params = f64;

        fn derivative(
            &self,
            dx: &mut [f64],
            args: Args<'_, f64>,
            log: &mut LogScope,
        ) -> Result<(), LogError> {
            dx[0] = -args.params * args.x[0];
            log.append("x", args.x[0])
        }
    }

    /// Unit decay starting from `x = 1`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DecayEnv;

    impl Environment<1> for DecayEnv {
        type Params = f64;
        type Dynamics = Decay;

        fn initial_state(&self) -> [f64; 1] {
            [1.0]
        }

        fn dynamics(&self) -> Decay {
            Decay
        }

        fn params(&self) -> Option<f64> {
            Some(1.0)
        }
    }
}

pub mod vehicle {
    //! A vehicle driven by an engine whose throttle is set by an actuator.
    //!
    //! State layout: `[position, velocity, engine speed, actuator position]`.
    //! The vehicle reads a `"throttle"` input; the engine forwards it to the
    //! actuator as `"command"`.

    use skein_core::{Args, Dynamics, Environment, Inputs, LogError, LogScope, MergePolicy};

    /// First-order lag tracking the `"command"` input.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Actuator;

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ActuatorParams {
        pub time_constant: f64,
    }

    impl Dynamics for Actuator {
        type Params = ActuatorParams;

        fn derivative(
            &self,
            dx: &mut [f64],
            args: Args<'_, ActuatorParams>,
            log: &mut LogScope,
        ) -> Result<(), LogError> {
            let command = args.inputs.get("command").unwrap_or(0.0);
            let position = args.x[0];
            dx[0] = (command - position) / args.params.time_constant;

            log.append("command", command)?;
            log.append("position", position)
        }
    }

    /// Rotating engine with torque proportional to the actuator position.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Engine {
        pub actuator: Actuator,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct EngineParams {
        pub max_torque: f64,
        pub inertia: f64,
        pub friction: f64,
        pub actuator: ActuatorParams,
    }

    impl Engine {
        /// Shaft torque for the engine state `[speed, actuator position]`.
        #[must_use]
        pub fn torque(x: &[f64], params: &EngineParams) -> f64 {
            params.max_torque * x[1].clamp(0.0, 1.0)
        }
    }

    impl Dynamics for Engine {
        type Params = EngineParams;

        fn derivative(
            &self,
            dx: &mut [f64],
            args: Args<'_, EngineParams>,
            log: &mut LogScope,
        ) -> Result<(), LogError> {
            let throttle = args.inputs.get("throttle").unwrap_or(0.0);
            let command = [("command", throttle)];
            let actuator_args = args
                .project(&args.x[1..], &args.params.actuator)
                .with_inputs(Inputs::new(&command));
            log.invoke(
                "actuator",
                MergePolicy::Nested,
                &self.actuator,
                &mut dx[1..],
                actuator_args,
            )?;

            let speed = args.x[0];
            let torque = Engine::torque(args.x, args.params);
            dx[0] = (torque - args.params.friction * speed) / args.params.inertia;

            log.append("speed", speed)?;
            log.append("torque", torque)?;
            log.append_with("power", || torque * speed)
        }
    }

    /// Point-mass vehicle pushed by the engine's torque through a fixed gear.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Vehicle {
        pub engine: Engine,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct VehicleParams {
        pub mass: f64,
        pub drag: f64,
        pub gear_ratio: f64,
        pub wheel_radius: f64,
        pub engine: EngineParams,
    }

    impl Default for VehicleParams {
        fn default() -> Self {
            Self {
                mass: 1200.0,
                drag: 0.4,
                gear_ratio: 4.0,
                wheel_radius: 0.3,
                engine: EngineParams {
                    max_torque: 250.0,
                    inertia: 0.5,
                    friction: 0.05,
                    actuator: ActuatorParams {
                        time_constant: 0.2,
                    },
                },
            }
        }
    }

    impl Dynamics for Vehicle {
        type Params = VehicleParams;

        fn derivative(
            &self,
            dx: &mut [f64],
            args: Args<'_, VehicleParams>,
            log: &mut LogScope,
        ) -> Result<(), LogError> {
            let (body, engine) = dx.split_at_mut(2);
            let engine_args = args.project(&args.x[2..], &args.params.engine);
            log.invoke(
                "engine",
                MergePolicy::Nested,
                &self.engine,
                engine,
                engine_args,
            )?;

            let params = args.params;
            let velocity = args.x[1];
            let traction = Engine::torque(&args.x[2..], &params.engine) * params.gear_ratio
                / params.wheel_radius;
            let drag = params.drag * velocity * velocity.abs();
            body[0] = velocity;
            body[1] = (traction - drag) / params.mass;

            log.append("position", args.x[0])?;
            log.append("velocity", velocity)?;
            log.append("traction", traction)
        }
    }

    /// A vehicle at rest with the default parameters.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct VehicleEnv;

    impl Environment<4> for VehicleEnv {
        type Params = VehicleParams;
        type Dynamics = Vehicle;

        fn initial_state(&self) -> [f64; 4] {
            [0.0; 4]
        }

        fn dynamics(&self) -> Vehicle {
            Vehicle::default()
        }

        fn params(&self) -> Option<VehicleParams> {
            Some(VehicleParams::default())
        }
    }

    /// Throttle schedule used by the tests: a ramp that saturates at full.
    #[must_use]
    pub fn throttle(t: f64) -> f64 {
        (0.2 + 0.4 * t).min(1.0)
    }
}
