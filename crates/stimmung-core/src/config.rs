//! Player configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the playback controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Rate every session synthesizer renders at, in Hz
    pub sample_rate: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
        }
    }
}

impl PlayerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate < 8000 || self.sample_rate > 384000 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        Ok(())
    }
}
