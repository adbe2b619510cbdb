use board_simulator::{
    comm::CommandLink, init_logging,
    SimDelay, SimDirPin, SimEncoder, SimStepPin, SimulatedShaft,
};
use crate::{KeybotBoard, StepperPins, ENCODER_STEPS_PER_REV, STEP_ANGLE_DEG};


pub struct SimKeybotBoard {
    encoder: Option<SimEncoder>,
    stepper: Option<StepperPins<SimDirPin, SimStepPin, SimDelay>>,
    link_started: bool,
}

impl KeybotBoard for SimKeybotBoard {
    type Encoder = SimEncoder;
    type Dir = SimDirPin;
    type Step = SimStepPin;
    type Delay = SimDelay;

    fn init() -> Self {
        init_logging();

        let shaft = SimulatedShaft::new(STEP_ANGLE_DEG, ENCODER_STEPS_PER_REV);
        Self {
            encoder: Some(SimEncoder::new(shaft.clone())),
            stepper: Some(StepperPins {
                dir: SimDirPin::new(shaft.clone()),
                step: SimStepPin::new(shaft),
                delay: SimDelay,
            }),
            link_started: false,
        }
    }

    fn encoder(&mut self) -> Option<Self::Encoder> {
        self.encoder.take()
    }

    fn stepper(&mut self) -> Option<StepperPins<Self::Dir, Self::Step, Self::Delay>> {
        self.stepper.take()
    }

    fn command_link<F: Fn(&[u8]) + Send + Sync + 'static>(&mut self, device_name: &str, on_write: F) -> bool {
        if self.link_started {
            return false;
        }
        CommandLink::run(device_name, on_write);
        self.link_started = true;
        true
    }
}
