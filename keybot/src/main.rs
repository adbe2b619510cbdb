mod config;

use std::sync::Arc;
use asserv::{AbsoluteTracker, AngleTracker, CommandGateway, GoalCell, MotionController, WrappedTracker};
use asserv::conf::TrackingPolicy;
use board_keybot::{KeybotBoard, ENCODER_STEPS_PER_REV};

#[cfg(target_os = "espidf")]
type KeybotBoardImpl = board_keybot::EspKeybotBoard;
#[cfg(not(target_os = "espidf"))]
use board_keybot::SimKeybotBoard as KeybotBoardImpl;


fn main() {
    let mut board = KeybotBoardImpl::init();

    let encoder = Arc::new(board.encoder().unwrap());
    match config::TRACKING {
        TrackingPolicy::Absolute => run(board, AbsoluteTracker::new(encoder, ENCODER_STEPS_PER_REV)),
        TrackingPolicy::Wrapped => run(board, WrappedTracker::new(encoder, ENCODER_STEPS_PER_REV)),
    }
}

fn run<B, T>(mut board: B, tracker: T) -> !
where
    B: KeybotBoard,
    T: AngleTracker + Clone + Send + Sync + 'static,
{
    let goal = Arc::new(GoalCell::new());

    let gateway = CommandGateway::new(tracker.clone(), goal.clone());
    let on_write = move |data: &[u8]| {
        // Outcome is logged by the gateway
        gateway.on_command(data).ok();
    };
    if !board.command_link(config::DEVICE_NAME, on_write) {
        log::error!("Command link not available");
    }

    let pins = board.stepper().unwrap();
    let mut controller = MotionController::new(tracker, pins.dir, pins.step, pins.delay, goal, config::asserv_conf());

    log::info!("Ready, waiting for commands");
    controller.run()
}
