use std::sync::Arc;
use log::{info, warn, error};
use notes::{DecodeError, FormatError, NoteCommand, NoteError, NoteField};
use crate::goal::GoalCell;
use crate::tracker::AngleTracker;


/// Reason a command did not produce a new goal
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Payload is not valid UTF-8
    MalformedEncoding,
    FormatError(FormatError),
    InvalidNote {
        field: NoteField,
        from: String,
        to: String,
        reason: NoteError,
    },
    /// Both notes are the same, there is nothing to do
    NoOpCommand,
    /// Encoder could not be read to get the base angle
    PositionUnavailable,
}

impl From<DecodeError> for CommandError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::MalformedEncoding => Self::MalformedEncoding,
            DecodeError::Format(err) => Self::FormatError(err),
            DecodeError::InvalidNote { field, from, to, reason } => Self::InvalidNote { field, from, to, reason },
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedEncoding => write!(f, "payload is not valid text"),
            Self::FormatError(err) => write!(f, "format error ({err}), use (C1,E2)"),
            Self::InvalidNote { field, from, to, reason } => write!(f, "invalid {field} note in ({from},{to}): {reason}"),
            Self::NoOpCommand => write!(f, "same position"),
            Self::PositionUnavailable => write!(f, "current position unavailable"),
        }
    }
}

impl std::error::Error for CommandError {}


/// Goal published for an accepted command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Published {
    /// Position when the command was received
    pub base_deg: f32,
    /// Relative move requested by the command
    pub delta_deg: f32,
    pub target_deg: f32,
}


/// Turn raw command payloads into goals
///
/// Methods take `&self` and never block, so the gateway can be called directly from the
/// command link callback while the controller is running.
pub struct CommandGateway<T> {
    tracker: T,
    goal: Arc<GoalCell>,
}

impl<T: AngleTracker> CommandGateway<T> {
    pub fn new(tracker: T, goal: Arc<GoalCell>) -> Self {
        Self { tracker, goal }
    }

    /// Handle a single command payload, such as `(C1,E3)`
    ///
    /// Every outcome is logged. The goal is updated only on success.
    pub fn on_command(&self, raw: &[u8]) -> Result<Published, CommandError> {
        info!("Received command: {:?}", String::from_utf8_lossy(raw));
        let result = self.handle(raw);
        match &result {
            Ok(job) => info!("Job: move {:+.1}°, current {:.1}° -> target {:.1}°", job.delta_deg, job.base_deg, job.target_deg),
            Err(CommandError::NoOpCommand) => info!("Same position, nothing to do"),
            Err(err) => warn!("Command rejected: {err}"),
        }
        result
    }

    fn handle(&self, raw: &[u8]) -> Result<Published, CommandError> {
        let command = NoteCommand::decode(raw)?;
        let delta_deg = command.angle_delta();
        if delta_deg == 0.0 {
            return Err(CommandError::NoOpCommand);
        }

        let base_deg = self.tracker.current_angle().map_err(|err| {
            error!("Encoder read failed: {err:?}");
            CommandError::PositionUnavailable
        })?;
        let target_deg = self.tracker.normalize_target(base_deg + delta_deg);
        if !self.goal.publish(target_deg) {
            // Only reachable with a corrupted position
            return Err(CommandError::PositionUnavailable);
        }
        Ok(Published { base_deg, delta_deg, target_deg })
    }
}


#[cfg(test)]
mod tests {
    use board_common::mock::MockEncoder;
    use notes::KEY_ANGLE_DEG;
    use crate::goal::Goal;
    use crate::tracker::{AbsoluteTracker, WrappedTracker};
    use super::*;

    fn gateway(encoder: &Arc<MockEncoder>) -> (CommandGateway<AbsoluteTracker<Arc<MockEncoder>>>, Arc<GoalCell>) {
        let goal = Arc::new(GoalCell::new());
        let gateway = CommandGateway::new(AbsoluteTracker::new(encoder.clone(), 600), goal.clone());
        (gateway, goal)
    }

    fn target(goal: &GoalCell) -> f32 {
        match goal.load() {
            Goal::Seeking { target_deg } => target_deg,
            Goal::Idle => panic!("no goal published"),
        }
    }

    #[test]
    fn same_note_is_a_no_op() {
        let encoder = Arc::new(MockEncoder::new(0));
        let (gateway, goal) = gateway(&encoder);
        assert_eq!(gateway.on_command(b"(C1,C1)"), Err(CommandError::NoOpCommand));
        assert_eq!(goal.load(), Goal::Idle);
    }

    #[test]
    fn no_op_keeps_goal_in_flight() {
        let encoder = Arc::new(MockEncoder::new(0));
        let (gateway, goal) = gateway(&encoder);
        goal.publish(42.0);
        assert_eq!(gateway.on_command(b"(e2, E2)"), Err(CommandError::NoOpCommand));
        assert_eq!(goal.load(), Goal::Seeking { target_deg: 42.0 });
    }

    #[test]
    fn one_semitone_forward() {
        let encoder = Arc::new(MockEncoder::new(0));
        let (gateway, goal) = gateway(&encoder);
        let job = gateway.on_command(b"(C1,C#1)").unwrap();
        assert_eq!(job.base_deg, 0.0);
        assert_eq!(job.target_deg, KEY_ANGLE_DEG);
        assert_eq!(target(&goal), KEY_ANGLE_DEG);
    }

    #[test]
    fn whole_tone_forward() {
        let encoder = Arc::new(MockEncoder::new(0));
        let (gateway, goal) = gateway(&encoder);
        gateway.on_command(b"(C1,D1)").unwrap();
        assert!((target(&goal) - 2.0 * KEY_ANGLE_DEG).abs() < 1e-4);
    }

    #[test]
    fn move_is_relative_to_current_position() {
        let encoder = Arc::new(MockEncoder::new(150));
        let (gateway, goal) = gateway(&encoder);
        gateway.on_command(b"(D#2,C1)").unwrap();
        // 15 semitones down from 90°
        assert!((target(&goal) - (90.0 - 15.0 * KEY_ANGLE_DEG)).abs() < 1e-3);
    }

    #[test]
    fn identical_commands_give_identical_targets() {
        let encoder = Arc::new(MockEncoder::new(-42));
        let (gateway, _goal) = gateway(&encoder);
        let first = gateway.on_command(b"(C1,E3)").unwrap();
        let second = gateway.on_command(b"(C1,E3)").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn newer_command_supersedes() {
        let encoder = Arc::new(MockEncoder::new(0));
        let (gateway, goal) = gateway(&encoder);
        gateway.on_command(b"(C1,G1)").unwrap();
        gateway.on_command(b"(C1,A#1)").unwrap();
        assert_eq!(target(&goal), 10.0 * KEY_ANGLE_DEG);
    }

    #[test]
    fn rejected_commands_leave_goal_untouched() {
        let encoder = Arc::new(MockEncoder::new(0));
        let (gateway, goal) = gateway(&encoder);

        assert_eq!(gateway.on_command(&[b'(', 0xff, b')']), Err(CommandError::MalformedEncoding));
        assert_eq!(gateway.on_command(b"C1,E3"), Err(CommandError::FormatError(FormatError::MissingParentheses)));
        assert_eq!(gateway.on_command(b"(C1)"), Err(CommandError::FormatError(FormatError::FieldCount(1))));
        assert!(matches!(
            gateway.on_command(b"(C1,H2)"),
            Err(CommandError::InvalidNote { field: NoteField::To, .. })
        ));
        assert!(matches!(
            gateway.on_command(b"(C6,E2)"),
            Err(CommandError::InvalidNote { field: NoteField::From, .. })
        ));
        assert_eq!(goal.load(), Goal::Idle);
    }

    #[test]
    fn encoder_failure_rejects_command() {
        let encoder = Arc::new(MockEncoder::new(0));
        encoder.set_failing(true);
        let (gateway, goal) = gateway(&encoder);
        assert_eq!(gateway.on_command(b"(C1,E1)"), Err(CommandError::PositionUnavailable));
        assert_eq!(goal.load(), Goal::Idle);
    }

    #[test]
    fn wrapped_target_is_normalized() {
        let encoder = Arc::new(MockEncoder::new(0));
        let goal = Arc::new(GoalCell::new());
        let gateway = CommandGateway::new(WrappedTracker::new(encoder, 600), goal.clone());
        gateway.on_command(b"(C#1,C1)").unwrap();
        assert!((target(&goal) - (360.0 - KEY_ANGLE_DEG)).abs() < 1e-3);
    }
}
