use std::sync::Arc;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, error, info, trace, warn};
use crate::conf::AsservConf;
use crate::goal::{Goal, GoalCell};
use crate::stepper::{Direction, StepperDriver, StepperError};
use crate::tracker::AngleTracker;


/// Outcome of a single controller iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    /// No goal, motor untouched
    Idle,
    /// One step pulse was emitted
    Stepped(Direction),
    /// Target reached, goal retired
    Converged { current_deg: f32, target_deg: f32, error_deg: f32 },
    /// Target reached but a newer goal was published meanwhile, it is kept
    Superseded,
    /// Steps had no effect on the encoder, goal retired
    Stalled { current_deg: f32, target_deg: f32 },
    /// Encoder could not be read, nothing done
    EncoderFailure,
    /// Motor outputs could not be driven
    StepperFailure(StepperError),
}


/// Count steps sent for a goal since the encoder last moved
#[derive(Default)]
struct StallWatch {
    goal: Option<Goal>,
    last_deg: Option<f32>,
    steps: u32,
}

impl StallWatch {
    /// Update with the current position, return the steps sent without progress
    fn check(&mut self, goal: Goal, current_deg: f32) -> u32 {
        if self.goal != Some(goal) {
            *self = Self { goal: Some(goal), ..Self::default() };
        }
        if self.last_deg != Some(current_deg) {
            self.last_deg = Some(current_deg);
            self.steps = 0;
        }
        self.steps
    }

    fn stepped(&mut self) {
        self.steps += 1;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}


/// Drive the motor to the shared goal, one step per iteration
///
/// Stepping one pulse at a time bounds the latency to observe a new goal to a single step.
pub struct MotionController<T, Dir, Step, D> {
    tracker: T,
    stepper: StepperDriver<Dir, Step, D>,
    goal: Arc<GoalCell>,
    conf: AsservConf,
    stall: StallWatch,
}

impl<T, Dir, Step, D> MotionController<T, Dir, Step, D>
where
    T: AngleTracker,
    Dir: OutputPin,
    Step: OutputPin,
    D: DelayNs,
{
    pub fn new(tracker: T, dir: Dir, step: Step, delay: D, goal: Arc<GoalCell>, conf: AsservConf) -> Self {
        let stepper = StepperDriver::new(dir, step, delay, conf.pulse_width_us)
            .inverted(conf.invert_direction);
        Self { tracker, stepper, goal, conf, stall: StallWatch::default() }
    }

    /// Run a single iteration
    pub fn update(&mut self) -> ControllerEvent {
        let goal = self.goal.load();
        let Goal::Seeking { target_deg } = goal else {
            self.stall.reset();
            return ControllerEvent::Idle;
        };

        let current_deg = match self.tracker.current_angle() {
            Ok(v) => v,
            Err(err) => {
                error!("Encoder read failed: {err:?}");
                return ControllerEvent::EncoderFailure;
            }
        };
        let error_deg = self.tracker.error(target_deg, current_deg);

        if error_deg.abs() <= self.conf.tolerance(target_deg) {
            self.stall.reset();
            return if self.goal.retire(goal) {
                info!("Reached! current {current_deg:.2}°, target {target_deg:.2}°, error {error_deg:.2}°");
                ControllerEvent::Converged { current_deg, target_deg, error_deg }
            } else {
                debug!("Target {target_deg:.2}° reached after being replaced");
                ControllerEvent::Superseded
            };
        }

        if let Some(limit) = self.conf.stall_steps {
            if self.stall.check(goal, current_deg) >= limit {
                self.stall.reset();
                return if self.goal.retire(goal) {
                    warn!("Stalled at {current_deg:.2}° after {limit} steps, target {target_deg:.2}° dropped");
                    ControllerEvent::Stalled { current_deg, target_deg }
                } else {
                    ControllerEvent::Superseded
                };
            }
        }

        let direction = Direction::from_error(error_deg);
        trace!("step {direction:?}: current {current_deg:.2}°, target {target_deg:.2}°");
        match self.stepper.step(direction) {
            Ok(()) => {
                self.stall.stepped();
                ControllerEvent::Stepped(direction)
            }
            Err(err) => {
                error!("Stepper failure: {err}");
                ControllerEvent::StepperFailure(err)
            }
        }
    }

    /// Run the control loop forever
    pub fn run(&mut self) -> ! {
        loop {
            match self.update() {
                ControllerEvent::Idle |
                ControllerEvent::EncoderFailure |
                ControllerEvent::StepperFailure(_) => std::thread::sleep(self.conf.idle_period),
                _ => {}
            }
        }
    }
}
