use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, ErrorKind, OutputPin};


/// Rotation direction of the motor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Direction reducing a signed angle error
    pub fn from_error(error_deg: f32) -> Self {
        if error_deg > 0.0 { Direction::Forward } else { Direction::Reverse }
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepperError {
    Direction(ErrorKind),
    Step(ErrorKind),
}

impl std::fmt::Display for StepperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direction(kind) => write!(f, "direction output failed: {kind}"),
            Self::Step(kind) => write!(f, "step output failed: {kind}"),
        }
    }
}

impl std::error::Error for StepperError {}


/// Step/direction stepper motor driver
///
/// Each step is a pulse on the step output: high for the pulse width, then low for the same
/// duration. Pulse holds use a blocking delay; their jitter only stretches a pulse.
pub struct StepperDriver<Dir, Step, D> {
    dir: Dir,
    step: Step,
    delay: D,
    pulse_width_us: u32,
    invert_direction: bool,
}

impl<Dir: OutputPin, Step: OutputPin, D: DelayNs> StepperDriver<Dir, Step, D> {
    pub fn new(dir: Dir, step: Step, delay: D, pulse_width_us: u32) -> Self {
        Self { dir, step, delay, pulse_width_us, invert_direction: false }
    }

    /// Swap the direction output level (high is forward by default)
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set direction and emit a single step pulse
    pub fn step(&mut self, direction: Direction) -> Result<(), StepperError> {
        let high = (direction == Direction::Forward) != self.invert_direction;
        self.dir.set_state(high.into()).map_err(|e| StepperError::Direction(e.kind()))?;
        self.step.set_high().map_err(|e| StepperError::Step(e.kind()))?;
        self.delay.delay_us(self.pulse_width_us);
        self.step.set_low().map_err(|e| StepperError::Step(e.kind()))?;
        self.delay.delay_us(self.pulse_width_us);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use embedded_hal_mock::eh1::{
        MockError,
        delay::NoopDelay,
        digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
    };
    use super::*;

    #[test]
    fn direction_from_error() {
        assert_eq!(Direction::from_error(0.5), Direction::Forward);
        assert_eq!(Direction::from_error(-0.5), Direction::Reverse);
    }

    #[test]
    fn forward_pulse() {
        let mut dir = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let mut step = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut stepper = StepperDriver::new(dir.clone(), step.clone(), NoopDelay::new(), 200);
        assert_eq!(stepper.step(Direction::Forward), Ok(()));
        dir.done();
        step.done();
    }

    #[test]
    fn inverted_reverse_pulses() {
        let mut dir = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
        ]);
        let mut step = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);
        let mut stepper = StepperDriver::new(dir.clone(), step.clone(), NoopDelay::new(), 200)
            .inverted(true);
        assert_eq!(stepper.step(Direction::Reverse), Ok(()));
        assert_eq!(stepper.step(Direction::Reverse), Ok(()));
        dir.done();
        step.done();
    }

    #[test]
    fn step_failure_is_reported() {
        let mut dir = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let mut step = PinMock::new(&[
            PinTransaction::set(PinState::High).with_error(MockError::Io(std::io::ErrorKind::Other)),
        ]);
        let mut stepper = StepperDriver::new(dir.clone(), step.clone(), NoopDelay::new(), 200);
        assert_eq!(stepper.step(Direction::Reverse), Err(StepperError::Step(ErrorKind::Other)));
        dir.done();
        step.done();
    }
}
