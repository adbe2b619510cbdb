use std::sync::Arc;

use esp_idf_svc::{
    hal::{
        gpio::{AnyInputPin, InputPin},
        pcnt::{Pcnt, PcntChannel, PcntChannelConfig, PcntControlMode, PcntCountMode, PcntDriver, PcntEvent, PcntEventType, PinIndex},
        peripheral::Peripheral
    },
    sys::EspError
};

use crate::{Wraps, COUNTER_LIMIT};

/// Glitch filter, in APB clock cycles
const FILTER_CYCLES: u16 = 1023;

/// Shaft position read from a PCNT unit in full quadrature (4 counts per encoder line)
///
/// Counting starts at zero when the encoder is created and is never cleared afterwards.
pub struct Encoder<'d> {
    unit: PcntDriver<'d>,
    wraps: Arc<Wraps>,
    sign: i32,
}

/// Edge rules for one channel: count on `signal` edges, direction given by `control`
fn quadrature(signal: PinIndex, control: PinIndex, rise: PcntCountMode, fall: PcntCountMode) -> (PinIndex, PinIndex, PcntChannelConfig) {
    let conf = PcntChannelConfig {
        lctrl_mode: PcntControlMode::Reverse,
        hctrl_mode: PcntControlMode::Keep,
        pos_mode: rise,
        neg_mode: fall,
        counter_h_lim: COUNTER_LIMIT,
        counter_l_lim: -COUNTER_LIMIT,
    };
    (signal, control, conf)
}

/// Forward limit events to `wraps` and start counting from zero
fn start(unit: &mut PcntDriver<'_>, wraps: Arc<Wraps>) -> Result<(), EspError> {
    // SAFETY: the handler only does atomic adds, which is allowed in ISR context
    unsafe {
        unit.subscribe(move |status| {
            let events = PcntEventType::from_repr_truncated(status);
            wraps.record(events.contains(PcntEvent::HighLimit), events.contains(PcntEvent::LowLimit));
        })?;
    }
    unit.event_enable(PcntEvent::HighLimit)?;
    unit.event_enable(PcntEvent::LowLimit)?;

    unit.counter_pause()?;
    unit.counter_clear()?;
    unit.counter_resume()
}

impl<'d> Encoder<'d> {
    /// Take a PCNT unit and the two encoder phases
    pub fn new<PCNT: Pcnt>(
        pcnt: impl Peripheral<P = PCNT> + 'd,
        phase_a: impl Peripheral<P = impl InputPin> + 'd,
        phase_b: impl Peripheral<P = impl InputPin> + 'd,
    ) -> Result<Self, EspError> {
        let mut unit = PcntDriver::new(
            pcnt,
            Some(phase_a),
            Some(phase_b),
            Option::<AnyInputPin>::None,
            Option::<AnyInputPin>::None,
        )?;

        let channels = [
            (PcntChannel::Channel0, quadrature(PinIndex::Pin0, PinIndex::Pin1, PcntCountMode::Decrement, PcntCountMode::Increment)),
            (PcntChannel::Channel1, quadrature(PinIndex::Pin1, PinIndex::Pin0, PcntCountMode::Increment, PcntCountMode::Decrement)),
        ];
        for (channel, (signal, control, conf)) in channels {
            unit.channel_config(channel, signal, control, &conf)?;
        }

        unit.set_filter_value(FILTER_CYCLES)?;
        unit.filter_enable()?;

        let wraps = Arc::new(Wraps::default());
        start(&mut unit, wraps.clone())?;

        Ok(Self { unit, wraps, sign: 1 })
    }

    /// Count the other way, for an encoder that decreases on forward motor steps
    pub fn reversed(mut self) -> Self {
        self.sign = -self.sign;
        self
    }
}

// SAFETY: the unit is owned and reads only touch the counter register and an atomic
unsafe impl Send for Encoder<'_> {}
unsafe impl Sync for Encoder<'_> {}

impl board_common::Encoder<i32> for Encoder<'_> {
    type Error = EspError;

    fn get_value(&self) -> Result<i32, EspError> {
        Ok(self.wraps.position(self.unit.get_counter_value()?, self.sign))
    }
}
