//! Playback controller.
//!
//! Owns at most one [`PlaybackSession`] at a time and reports every
//! Stopped/Playing transition, tagged with the source id, to an optional
//! observer. End-of-file notices arrive from the output backend over a
//! channel and are applied by [`PlaybackController::process_events`], so the
//! audio thread never calls back into the controller directly.

use super::fsm::{PlaybackState, PlayerEvent, PlayerFsm, TransitionResult};
use super::session::PlaybackSession;
use crate::output::{FinishedCallback, OutputBackend};
use crate::{PlayerConfig, Result};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use stimmung_midi::ParsedMidiFile;
use stimmung_synth::{OrganSynth, Replayer, SharedTemperament};
use tracing::{debug, info, warn};

/// Observer for state transitions: `(source_id, new_state)`.
pub type StateChangeCallback = Box<dyn FnMut(&str, PlaybackState)>;

/// Starts, stops and retunes MIDI playback.
///
/// # Example
///
/// ```ignore
/// use stimmung_core::{PlaybackController, PlaybackState};
///
/// let mut player = PlaybackController::builder()
///     .sample_rate(48000)
///     .on_state_change(|id, state| println!("{id}: {state:?}"))
///     .build()?;
///
/// player.play("bach", midi_file, registry.get("werckmeister3")?)?;
/// while player.is_playing() {
///     player.process_events();
///     std::thread::sleep(std::time::Duration::from_millis(50));
/// }
/// ```
pub struct PlaybackController {
    config: PlayerConfig,
    output: Box<dyn OutputBackend>,
    fsm: PlayerFsm,
    session: Option<PlaybackSession>,
    next_session_id: u64,
    on_state_change: Option<StateChangeCallback>,
    finished_tx: Sender<u64>,
    finished_rx: Receiver<u64>,
}

impl PlaybackController {
    pub fn builder() -> PlaybackControllerBuilder {
        PlaybackControllerBuilder::default()
    }

    /// Start playing `midi_file` with `temperament`.
    ///
    /// Any current playback is stopped first. On failure the controller is
    /// left stopped and no Playing notification is emitted.
    pub fn play(
        &mut self,
        source_id: impl Into<String>,
        midi_file: Arc<ParsedMidiFile>,
        temperament: SharedTemperament,
    ) -> Result<()> {
        let source_id = source_id.into();
        self.stop();

        let session = self
            .start_session(source_id.clone(), midi_file, temperament)
            .inspect_err(|e| warn!("Could not start playback of '{}': {}", source_id, e))?;

        info!("Playing '{}' (session {})", source_id, session.id());
        self.session = Some(session);
        self.apply(PlayerEvent::Play, &source_id);
        Ok(())
    }

    /// Parse `bytes` as a Standard MIDI File and play it.
    ///
    /// Current playback is stopped before parsing, so a malformed file leaves
    /// the controller stopped.
    pub fn play_bytes(
        &mut self,
        source_id: impl Into<String>,
        bytes: &[u8],
        temperament: SharedTemperament,
    ) -> Result<()> {
        let source_id = source_id.into();
        self.stop();

        let midi_file = ParsedMidiFile::parse(bytes)
            .inspect_err(|e| warn!("Could not parse '{}': {}", source_id, e))?;
        self.play(source_id, Arc::new(midi_file), temperament)
    }

    /// Stop playback. Does nothing when already stopped.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            debug!("Stop ignored: nothing is playing");
            return;
        };

        let source_id = session.source_id().to_string();
        session.close();
        info!("Stopped '{}'", source_id);
        self.apply(PlayerEvent::Stop, &source_id);
    }

    /// Retune the running session without interrupting it.
    ///
    /// The new temperament applies from the next note-on. Without a running
    /// session this does nothing.
    pub fn set_temperament(&mut self, temperament: SharedTemperament) {
        match &self.session {
            Some(session) => session.synth().lock().configure_temperament(temperament),
            None => debug!(
                "Temperament '{}' not applied: nothing is playing",
                temperament.read().identifier()
            ),
        }
    }

    /// Apply pending end-of-playback notices.
    ///
    /// A notice for the running session stops it; notices left over from
    /// sessions that were already replaced are dropped.
    pub fn process_events(&mut self) {
        while let Ok(finished_id) = self.finished_rx.try_recv() {
            let current = self.session.as_ref().map(PlaybackSession::id);
            if current == Some(finished_id) {
                debug!("Session {} reached the end", finished_id);
                self.stop();
            } else {
                debug!("Ignoring stale end notice for session {}", finished_id);
            }
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.fsm.state()
    }

    pub fn is_playing(&self) -> bool {
        self.fsm.state() == PlaybackState::Playing
    }

    /// Source id of the running session.
    pub fn current_source(&self) -> Option<&str> {
        self.session.as_ref().map(PlaybackSession::source_id)
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    fn start_session(
        &mut self,
        source_id: String,
        midi_file: Arc<ParsedMidiFile>,
        temperament: SharedTemperament,
    ) -> Result<PlaybackSession> {
        let id = self.next_session_id;
        self.next_session_id += 1;

        let synth = OrganSynth::new(self.config.sample_rate, temperament)?.into_shared();
        let replayer = Replayer::new(Arc::clone(&midi_file), Arc::clone(&synth))?;

        let finished_tx = self.finished_tx.clone();
        let on_finished: FinishedCallback = Box::new(move || {
            // Receiver gone means the controller was dropped
            let _ = finished_tx.send(id);
        });
        let sink = self.output.open(replayer, on_finished)?;

        Ok(PlaybackSession::new(id, source_id, midi_file, synth, sink))
    }

    fn apply(&mut self, event: PlayerEvent, source_id: &str) {
        if let TransitionResult::StateChanged(state) = self.fsm.transition(event) {
            debug!("Player state -> {:?} ('{}')", state, source_id);
            if let Some(callback) = self.on_state_change.as_mut() {
                callback(source_id, state);
            }
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

/// Builder for [`PlaybackController`].
#[derive(Default)]
pub struct PlaybackControllerBuilder {
    config: PlayerConfig,
    output: Option<Box<dyn OutputBackend>>,
    on_state_change: Option<StateChangeCallback>,
}

impl PlaybackControllerBuilder {
    pub fn config(mut self, config: PlayerConfig) -> Self {
        self.config = config;
        self
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: the system's default output device (feature `cpal`)
    pub fn output(mut self, output: impl OutputBackend + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn on_state_change(mut self, callback: impl FnMut(&str, PlaybackState) + 'static) -> Self {
        self.on_state_change = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Result<PlaybackController> {
        self.config.validate()?;

        let output = match self.output {
            Some(output) => output,
            None => default_output()?,
        };

        let (finished_tx, finished_rx) = crossbeam_channel::unbounded();

        Ok(PlaybackController {
            config: self.config,
            output,
            fsm: PlayerFsm::new(),
            session: None,
            next_session_id: 0,
            on_state_change: self.on_state_change,
            finished_tx,
            finished_rx,
        })
    }
}

#[cfg(feature = "cpal")]
fn default_output() -> Result<Box<dyn OutputBackend>> {
    Ok(Box::new(crate::output::CpalOutput::new()))
}

#[cfg(not(feature = "cpal"))]
fn default_output() -> Result<Box<dyn OutputBackend>> {
    Err(crate::Error::InvalidConfig(
        "no output backend configured".to_string(),
    ))
}
