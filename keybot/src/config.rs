use core::time::Duration;
use asserv::conf::{AsservConf, TrackingPolicy};

/// Name advertised on the command link
pub const DEVICE_NAME: &str = "ESP32-BLE-Control";

/// Note commands are relative moves, they need an unbounded position
pub const TRACKING: TrackingPolicy = TrackingPolicy::Absolute;

pub fn asserv_conf() -> AsservConf {
    AsservConf {
        tolerance_pct: 0.03,
        min_tolerance_deg: 1.0,
        pulse_width_us: 200,
        idle_period: Duration::from_millis(20),
        ..Default::default()
    }
}
