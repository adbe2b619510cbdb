//! Closed-loop positioning of a stepper motor from note commands
//!
//! Two execution contexts share a single [`GoalCell`](goal::GoalCell):
//! - the [`CommandGateway`](gateway::CommandGateway), called from the command link on each write;
//! - the [`MotionController`](controller::MotionController), polling the goal and stepping the
//!   motor until the encoder reports the target is reached.
pub mod conf;
pub mod controller;
pub mod gateway;
pub mod goal;
pub mod stepper;
pub mod tracker;

pub use controller::{ControllerEvent, MotionController};
pub use gateway::{CommandError, CommandGateway, Published};
pub use goal::{Goal, GoalCell};
pub use stepper::{Direction, StepperDriver, StepperError};
pub use tracker::{AbsoluteTracker, AngleTracker, WrappedTracker, shortest_distance};
