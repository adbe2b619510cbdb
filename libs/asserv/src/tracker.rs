use board_common::Encoder;


/// Give the angular position of the motor shaft, in degrees
pub trait AngleTracker {
    type Error: core::fmt::Debug;

    /// Read the encoder and convert it to an angle
    fn current_angle(&self) -> Result<f32, Self::Error>;

    /// Signed error to go from `current` to `target`, positive means forward
    fn error(&self, target_deg: f32, current_deg: f32) -> f32 {
        target_deg - current_deg
    }

    /// Bring a computed target in the range handled by the tracker
    fn normalize_target(&self, target_deg: f32) -> f32 {
        target_deg
    }
}


/// Tracker accumulating motion since power-on
#[derive(Clone)]
pub struct AbsoluteTracker<E> {
    encoder: E,
    deg_per_count: f32,
}

impl<E: Encoder<i32>> AbsoluteTracker<E> {
    pub fn new(encoder: E, encoder_steps_per_rev: u32) -> Self {
        Self {
            encoder,
            deg_per_count: 360.0 / encoder_steps_per_rev as f32,
        }
    }
}

impl<E: Encoder<i32>> AngleTracker for AbsoluteTracker<E> {
    type Error = E::Error;

    fn current_angle(&self) -> Result<f32, Self::Error> {
        Ok(self.encoder.get_value()? as f32 * self.deg_per_count)
    }
}


/// Tracker reduced to a single revolution, in `[0, 360)`
#[derive(Clone)]
pub struct WrappedTracker<E> {
    encoder: E,
    steps_per_rev: i32,
    deg_per_count: f32,
}

impl<E: Encoder<i32>> WrappedTracker<E> {
    pub fn new(encoder: E, encoder_steps_per_rev: u32) -> Self {
        Self {
            encoder,
            steps_per_rev: encoder_steps_per_rev as i32,
            deg_per_count: 360.0 / encoder_steps_per_rev as f32,
        }
    }
}

impl<E: Encoder<i32>> AngleTracker for WrappedTracker<E> {
    type Error = E::Error;

    fn current_angle(&self) -> Result<f32, Self::Error> {
        let count = self.encoder.get_value()?.rem_euclid(self.steps_per_rev);
        Ok(count as f32 * self.deg_per_count)
    }

    /// Shortest signed path, in `[-180, 180)`
    fn error(&self, target_deg: f32, current_deg: f32) -> f32 {
        let d = (target_deg - current_deg).rem_euclid(360.0);
        if d >= 180.0 { d - 360.0 } else { d }
    }

    fn normalize_target(&self, target_deg: f32) -> f32 {
        target_deg.rem_euclid(360.0)
    }
}


/// Unsigned shortest distance between two headings, in `[0, 180]`
pub fn shortest_distance(target_deg: f32, current_deg: f32) -> f32 {
    let d = (target_deg - current_deg).abs() % 360.0;
    d.min(360.0 - d)
}
