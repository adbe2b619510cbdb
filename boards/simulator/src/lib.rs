//! Host simulation of the keybot hardware
//!
//! A [`SimulatedShaft`] stands for the stepper motor and its encoder: step pulses sent to
//! [`SimStepPin`] move it, [`SimDirPin`] selects the way it turns and [`SimEncoder`] reads it back.
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};
use simple_logger::SimpleLogger;
use board_common::Encoder;

pub mod comm;


/// Motor shaft, counted in motor steps
pub struct SimulatedShaft {
    steps: AtomicI32,
    forward: AtomicBool,
    jammed: AtomicBool,
    step_angle_deg: f32,
    encoder_steps_per_rev: u32,
}

impl SimulatedShaft {
    pub fn new(step_angle_deg: f32, encoder_steps_per_rev: u32) -> Arc<Self> {
        Arc::new(Self {
            steps: AtomicI32::new(0),
            forward: AtomicBool::new(true),
            jammed: AtomicBool::new(false),
            step_angle_deg,
            encoder_steps_per_rev,
        })
    }

    /// Motor steps done since start, signed
    pub fn steps(&self) -> i32 {
        self.steps.load(Ordering::SeqCst)
    }

    /// Shaft angle in degrees, not wrapped
    pub fn angle(&self) -> f32 {
        self.steps() as f32 * self.step_angle_deg
    }

    /// Count seen by an ideal encoder mounted on the shaft
    pub fn encoder_count(&self) -> i32 {
        let deg_per_count = 360.0 / self.encoder_steps_per_rev as f32;
        (self.angle() / deg_per_count).round() as i32
    }

    /// Block the shaft, step pulses are then lost
    pub fn set_jammed(&self, jammed: bool) {
        self.jammed.store(jammed, Ordering::SeqCst);
    }

    fn set_forward(&self, forward: bool) {
        self.forward.store(forward, Ordering::SeqCst);
    }

    fn step(&self) {
        if self.jammed.load(Ordering::SeqCst) {
            log::trace!("shaft jammed, step lost");
            return;
        }
        let delta = if self.forward.load(Ordering::SeqCst) { 1 } else { -1 };
        self.steps.fetch_add(delta, Ordering::SeqCst);
    }
}


/// Direction output, high turns forward
pub struct SimDirPin(Arc<SimulatedShaft>);

impl SimDirPin {
    pub fn new(shaft: Arc<SimulatedShaft>) -> Self {
        Self(shaft)
    }
}

impl ErrorType for SimDirPin {
    type Error = Infallible;
}

impl OutputPin for SimDirPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_forward(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_forward(true);
        Ok(())
    }
}


/// Step output, the shaft moves on each rising edge
pub struct SimStepPin {
    shaft: Arc<SimulatedShaft>,
    high: bool,
}

impl SimStepPin {
    pub fn new(shaft: Arc<SimulatedShaft>) -> Self {
        Self { shaft, high: false }
    }
}

impl ErrorType for SimStepPin {
    type Error = Infallible;
}

impl OutputPin for SimStepPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.shaft.step();
        }
        self.high = true;
        Ok(())
    }
}


/// Encoder reading a simulated shaft
pub struct SimEncoder(Arc<SimulatedShaft>);

impl SimEncoder {
    pub fn new(shaft: Arc<SimulatedShaft>) -> Self {
        Self(shaft)
    }
}

impl Encoder<i32> for SimEncoder {
    type Error = Infallible;

    fn get_value(&self) -> Result<i32, Self::Error> {
        Ok(self.0.encoder_count())
    }
}


/// Delay relying on the OS scheduler
#[derive(Clone, Copy, Default)]
pub struct SimDelay;

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns.into()));
    }
}


pub fn init_logging() {
    SimpleLogger::new().init().unwrap();
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_on_rising_edge_only() {
        let shaft = SimulatedShaft::new(1.8, 600);
        let mut step = SimStepPin::new(shaft.clone());
        step.set_high().unwrap();
        step.set_high().unwrap();
        assert_eq!(shaft.steps(), 1);
        step.set_low().unwrap();
        step.set_high().unwrap();
        assert_eq!(shaft.steps(), 2);
    }

    #[test]
    fn direction_and_encoder() {
        let shaft = SimulatedShaft::new(1.8, 600);
        let mut dir = SimDirPin::new(shaft.clone());
        let mut step = SimStepPin::new(shaft.clone());
        let encoder = SimEncoder::new(shaft.clone());

        dir.set_low().unwrap();
        for _ in 0..5 {
            step.set_high().unwrap();
            step.set_low().unwrap();
        }
        assert_eq!(shaft.steps(), -5);
        // 1.8° per step, 0.6° per encoder count
        assert_eq!(encoder.get_value(), Ok(-15));
    }

    #[test]
    fn jammed_shaft_does_not_move() {
        let shaft = SimulatedShaft::new(1.8, 600);
        let mut step = SimStepPin::new(shaft.clone());
        shaft.set_jammed(true);
        step.set_high().unwrap();
        step.set_low().unwrap();
        assert_eq!(shaft.steps(), 0);
    }
}
