//! Integration test modules for stimmung

pub mod playback;
pub mod registry;
pub mod render;
pub mod temperament;
