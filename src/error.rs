//! Crate-wide error type.
//!
//! Every public operation returns [`Result`]; nothing is logged and swallowed.

use crate::transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The script line starts with a keyword outside the command vocabulary.
    #[error("unknown command: `{line}`")]
    UnknownCommand { line: String },

    /// The keyword is known but its arguments do not fit its grammar.
    #[error("malformed command `{line}`: {reason}")]
    MalformedCommand { line: String, reason: String },

    /// A receiver-addressed message began with a number.
    #[error("message `{message}` starts with a number; use the list send path instead")]
    MalformedMessage { message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("voice pool cannot hold {0} voices")]
    InvalidVoiceCount(usize),

    #[error("voice {voice} is outside the pool of {voices}")]
    VoiceOutOfRange { voice: usize, voices: usize },

    #[error("unknown setting `{0}`")]
    UnknownSetting(String),

    #[error("setting `{name}`: {reason}")]
    SettingMismatch { name: String, reason: String },

    /// Setting text that is neither a number, a symbol nor a numeric list.
    #[error("invalid setting value `{value}`: {reason}")]
    InvalidSettingValue { value: String, reason: String },
}

impl Error {
    pub(crate) fn malformed(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedCommand {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
