//! Audio output capability.
//!
//! An [`OutputBackend`] takes ownership of a [`Replayer`] and pulls audio from
//! it until the file ends, then invokes the finished callback once. The
//! returned [`AudioSink`] lets the controller silence it early.

use crate::Result;
use stimmung_synth::Replayer;

#[cfg(feature = "cpal")]
mod stream;

#[cfg(feature = "cpal")]
pub use stream::{CpalOutput, CpalSink};

/// Invoked at most once, from whatever thread the backend renders on.
pub type FinishedCallback = Box<dyn FnOnce() + Send>;

/// A running output stream.
pub trait AudioSink {
    /// Stop producing sound and release the device. Idempotent.
    fn stop(&mut self);
}

/// Something that can play a replayer to an audio destination.
pub trait OutputBackend {
    fn open(
        &mut self,
        replayer: Replayer,
        on_finished: FinishedCallback,
    ) -> Result<Box<dyn AudioSink>>;
}
