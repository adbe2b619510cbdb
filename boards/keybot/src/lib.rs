//! Keybot board: a step/direction stepper motor, a quadrature encoder on its shaft and a
//! command link
use embedded_hal::{delay::DelayNs, digital::OutputPin};
use board_common::Encoder;

#[cfg(target_os = "espidf")]
mod esp;
#[cfg(target_os = "espidf")]
pub use esp::EspKeybotBoard;

#[cfg(not(target_os = "espidf"))]
mod sim;
#[cfg(not(target_os = "espidf"))]
pub use sim::SimKeybotBoard;


/// Motor step angle, in degrees
pub const STEP_ANGLE_DEG: f32 = 1.8;
/// Encoder counts for a full revolution of the shaft
pub const ENCODER_STEPS_PER_REV: u32 = 600;


/// Outputs and timing needed to drive the stepper
pub struct StepperPins<Dir, Step, D> {
    pub dir: Dir,
    pub step: Step,
    pub delay: D,
}


pub trait KeybotBoard {
    type Encoder: Encoder<i32> + Send + Sync + 'static;
    type Dir: OutputPin;
    type Step: OutputPin;
    type Delay: DelayNs;

    /// Initialize the board, logging included
    fn init() -> Self;

    /// Encoder mounted on the motor shaft, positive forward
    fn encoder(&mut self) -> Option<Self::Encoder>;

    fn stepper(&mut self) -> Option<StepperPins<Self::Dir, Self::Step, Self::Delay>>;

    /// Start the command link
    ///
    /// `on_write` is called from the link context for each received command.
    /// Return `false` if the link is not available.
    fn command_link<F: Fn(&[u8]) + Send + Sync + 'static>(&mut self, device_name: &str, on_write: F) -> bool;
}
