//! Playback: state machine, sessions and the controller that drives them.

mod controller;
mod fsm;
mod session;

pub use controller::{PlaybackController, PlaybackControllerBuilder, StateChangeCallback};
pub use fsm::{PlaybackState, PlayerEvent, PlayerFsm, TransitionResult};
pub use session::PlaybackSession;
