use core::time::Duration;


/// How encoder counts are turned into an angle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackingPolicy {
    /// Accumulate motion since power-on, never wrap
    Absolute,
    /// Reduce to one revolution and steer along the shortest path
    Wrapped,
}


/// A structure with all dynamic asserv configuration
///
/// Having everything in one struct helps to not forget a value.
#[derive(Clone, Debug)]
pub struct AsservConf {
    /// Relative tolerance, as a fraction of the absolute target angle
    pub tolerance_pct: f32,
    /// Lower bound of the tolerance, in degrees
    pub min_tolerance_deg: f32,
    /// Duration of each half of a step pulse, in microseconds
    pub pulse_width_us: u32,
    /// Sleep between polls when there is no goal
    pub idle_period: Duration,
    /// Swap the level of the direction output
    pub invert_direction: bool,
    /// Give up a goal after this many consecutive steps without encoder change
    ///
    /// `None` keeps seeking forever.
    pub stall_steps: Option<u32>,
}

impl AsservConf {
    /// Tolerance window for a given target, in degrees
    pub fn tolerance(&self, target_deg: f32) -> f32 {
        (target_deg.abs() * self.tolerance_pct).max(self.min_tolerance_deg)
    }
}

impl Default for AsservConf {
    fn default() -> Self {
        Self {
            tolerance_pct: 0.03,
            min_tolerance_deg: 1.0,
            pulse_width_us: 200,
            idle_period: Duration::from_millis(20),
            invert_direction: false,
            stall_steps: None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_relative_with_floor() {
        let conf = AsservConf::default();
        assert!((conf.tolerance(90.0) - 2.7).abs() < 1e-5);
        assert!((conf.tolerance(-90.0) - 2.7).abs() < 1e-5);
        assert_eq!(conf.tolerance(0.0), 1.0);
        assert_eq!(conf.tolerance(19.6), 1.0);
    }
}
