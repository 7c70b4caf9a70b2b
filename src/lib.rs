//! Dynamic patching for embedded Pure Data engines.
//!
//! A small script language creates, connects and deletes objects in a live
//! patch. [`session::Session`] turns scripts and typed calls into lists for the
//! interpreter patch, and [`voice::VoiceRouter`] fans messages out over a pool
//! of synth voices.
//!
//! ```ignore
//! let mut session = Session::new(transport, &SessionConfig::default())?;
//! session.run_script("obj foo loadbang, obj bar print, connect foo bar, loadbang")?;
//! ```

pub mod atom;
pub mod command;
pub mod config;
pub mod dsl;
pub mod encoder;
pub mod error;
#[doc(hidden)]
pub mod invariant_ppt;
pub mod session;
pub mod settings;
pub mod synth;
pub mod transport;
pub mod voice;

pub use atom::Atom;
pub use command::{Command, Connection};
pub use config::{SessionConfig, SynthConfig};
pub use error::{Error, Result};
pub use session::Session;
pub use transport::{MemoryTransport, Transport, TransportError};
pub use voice::VoiceRouter;
