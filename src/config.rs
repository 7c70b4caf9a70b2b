//! Session and synth configuration.

use std::path::PathBuf;

/// Where the interpreter patch lives and how its receiver is named.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Interpreter patch file (ships with pd-for-libpd).
    pub patch: String,
    /// Directory the patch is opened from.
    pub search_path: PathBuf,
    /// The interpreter receiver is `"<$0>-<interpreter_suffix>"`.
    pub interpreter_suffix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            patch: "dynamicpd.pd".to_string(),
            search_path: PathBuf::from("."),
            interpreter_suffix: "dynamicpd".to_string(),
        }
    }
}

/// Voice pool and synth patch settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SynthConfig {
    /// Initial pool size. Six voices is what a small tablet sustains.
    pub voices: usize,
    /// Abstraction loaded into each `channels~` slot.
    pub synth_type: String,
    pub channel_layout: String,
    /// The channel router listens on `"<$0>-<channels_suffix>"`.
    pub channels_suffix: String,
    /// Semitone range broadcast after the settings.
    pub pitchbend_range: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            voices: 6,
            synth_type: "subtractive_synth".to_string(),
            channel_layout: "stereo".to_string(),
            channels_suffix: "channels".to_string(),
            pitchbend_range: 36.0,
        }
    }
}
