use std::sync::atomic::{AtomicU32, Ordering};


/// Current goal of the motion controller
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Goal {
    Idle,
    Seeking { target_deg: f32 },
}

// A NaN pattern, never stored for a seeking goal since targets are finite
const IDLE_BITS: u32 = u32::MAX;

impl Goal {
    fn to_bits(self) -> u32 {
        match self {
            Goal::Idle => IDLE_BITS,
            Goal::Seeking { target_deg } => target_deg.to_bits(),
        }
    }

    fn from_bits(bits: u32) -> Self {
        if bits == IDLE_BITS {
            Goal::Idle
        } else {
            Goal::Seeking { target_deg: f32::from_bits(bits) }
        }
    }
}


/// Goal shared between the command gateway and the motion controller
///
/// The whole goal fits in a single atomic word, so that a reader never sees a target without
/// its state, or the other way around. The gateway publishes, overwriting any goal in flight;
/// the controller retires the goal it has reached.
pub struct GoalCell(AtomicU32);

impl GoalCell {
    pub const fn new() -> Self {
        Self(AtomicU32::new(IDLE_BITS))
    }

    pub fn load(&self) -> Goal {
        Goal::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Replace the goal by a new target
    ///
    /// Return `false` if target is not a finite value, the goal is then left unchanged.
    pub fn publish(&self, target_deg: f32) -> bool {
        if !target_deg.is_finite() {
            return false;
        }
        self.0.store(Goal::Seeking { target_deg }.to_bits(), Ordering::Release);
        true
    }

    /// Go back to idle, only if the goal is still `reached`
    ///
    /// Return `false` when a new goal has been published since `reached` was loaded.
    pub fn retire(&self, reached: Goal) -> bool {
        self.0
            .compare_exchange(reached.to_bits(), IDLE_BITS, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for GoalCell {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert_eq!(GoalCell::new().load(), Goal::Idle);
    }

    #[test]
    fn publish_overwrites() {
        let cell = GoalCell::new();
        assert!(cell.publish(39.2));
        assert!(cell.publish(-12.5));
        assert_eq!(cell.load(), Goal::Seeking { target_deg: -12.5 });
    }

    #[test]
    fn reject_non_finite_target() {
        let cell = GoalCell::new();
        assert!(cell.publish(10.0));
        assert!(!cell.publish(f32::NAN));
        assert!(!cell.publish(f32::INFINITY));
        assert_eq!(cell.load(), Goal::Seeking { target_deg: 10.0 });
    }

    #[test]
    fn retire_reached_goal() {
        let cell = GoalCell::new();
        cell.publish(90.0);
        let goal = cell.load();
        assert!(cell.retire(goal));
        assert_eq!(cell.load(), Goal::Idle);
    }

    #[test]
    fn retire_keeps_newer_goal() {
        let cell = GoalCell::new();
        cell.publish(90.0);
        let reached = cell.load();
        cell.publish(45.0);
        assert!(!cell.retire(reached));
        assert_eq!(cell.load(), Goal::Seeking { target_deg: 45.0 });
    }
}
