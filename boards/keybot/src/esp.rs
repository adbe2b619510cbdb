use std::sync::Arc;
use esp_idf_svc::{
    bt::{Ble, BtDriver},
    hal::{
        delay::Ets,
        gpio::{AnyOutputPin, Output, PinDriver},
        prelude::Peripherals,
    },
    nvs::EspDefaultNvsPartition,
};
use ble::{BleComm, CommandPeripheral};
use esp32_encoder::Encoder as PcntEncoder;
use crate::{KeybotBoard, StepperPins};


pub type MotorPin = PinDriver<'static, AnyOutputPin, Output>;

pub struct EspKeybotBoard {
    encoder: Option<PcntEncoder<'static>>,
    stepper: Option<StepperPins<MotorPin, MotorPin, Ets>>,
    ble: Option<BtDriver<'static, Ble>>,
    command_peripheral: Option<Arc<CommandPeripheral>>,
}

impl KeybotBoard for EspKeybotBoard {
    type Encoder = PcntEncoder<'static>;
    type Dir = MotorPin;
    type Step = MotorPin;
    type Delay = Ets;

    fn init() -> Self {
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        let nvs = EspDefaultNvsPartition::take().unwrap();

        let peripherals = Peripherals::take().unwrap();

        // Stepper driver
        let dir = PinDriver::output(Into::<AnyOutputPin>::into(peripherals.pins.gpio33)).unwrap();
        let step = PinDriver::output(Into::<AnyOutputPin>::into(peripherals.pins.gpio32)).unwrap();

        // Encoder is mounted so that forward steps decrease its raw count
        let encoder = PcntEncoder::new(peripherals.pcnt0, peripherals.pins.gpio25, peripherals.pins.gpio26)
            .unwrap()
            .reversed();

        let ble = BtDriver::new(peripherals.modem, Some(nvs.clone())).unwrap();

        Self {
            encoder: Some(encoder),
            stepper: Some(StepperPins { dir, step, delay: Ets }),
            ble: Some(ble),
            command_peripheral: None,
        }
    }

    fn encoder(&mut self) -> Option<Self::Encoder> {
        self.encoder.take()
    }

    fn stepper(&mut self) -> Option<StepperPins<Self::Dir, Self::Step, Self::Delay>> {
        self.stepper.take()
    }

    fn command_link<F: Fn(&[u8]) + Send + Sync + 'static>(&mut self, device_name: &str, on_write: F) -> bool {
        let Some(bt) = self.ble.take() else {
            return false;
        };
        match BleComm::run(bt, device_name.into(), on_write) {
            Ok(peripheral) => {
                self.command_peripheral = Some(peripheral);
                true
            }
            Err(err) => {
                log::error!("BLE initialization failed: {err:?}");
                false
            }
        }
    }
}
