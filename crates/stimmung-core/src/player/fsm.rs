//! Player state machine.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Play,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    None,
    StateChanged(PlaybackState),
}

#[derive(Debug, Default)]
pub struct PlayerFsm {
    state: PlaybackState,
}

impl PlayerFsm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn transition(&mut self, event: PlayerEvent) -> TransitionResult {
        use PlayerEvent::*;

        match (event, self.state) {
            (Play, PlaybackState::Stopped) => {
                self.state = PlaybackState::Playing;
                TransitionResult::StateChanged(PlaybackState::Playing)
            }
            (Stop, PlaybackState::Playing) => {
                self.state = PlaybackState::Stopped;
                TransitionResult::StateChanged(PlaybackState::Stopped)
            }
            // The controller always stops before starting again
            (Play, PlaybackState::Playing) | (Stop, PlaybackState::Stopped) => {
                TransitionResult::None
            }
        }
    }
}
