//! Transport: the seam to the embedded signal-processing engine.
//!
//! A session needs three things from the engine: open a patch and learn its
//! `$0`, deliver atom lists to named receivers, and the direct bang/float/
//! message sends that bypass the script interpreter. Delivery is synchronous
//! and unacknowledged; an implementation either accepts a call or fails it
//! immediately.

#![warn(missing_docs)]

use crate::atom::{join_atoms, Atom};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A patch opened by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchHandle {
    /// The patch instance discriminator (`$0` inside Pd).
    pub dollar_zero: i32,
}

/// The engine refused or could not deliver a call.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("transport failure at `{receiver}`: {reason}")]
pub struct TransportError {
    /// Receiver, or patch name, the call was addressed to.
    pub receiver: String,
    /// What went wrong, as reported by the engine.
    pub reason: String,
}

impl TransportError {
    /// Failure of a call addressed to `receiver`.
    pub fn new(receiver: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            reason: reason.into(),
        }
    }
}

/// Primitives the engine must provide.
///
/// Implementations are not required to be thread safe; callers serialize
/// access.
pub trait Transport {
    /// Open `name` from `dir` and return its instance handle.
    fn open_patch(&mut self, name: &str, dir: &Path) -> Result<PatchHandle, TransportError>;

    /// Deliver a list to `receiver`.
    fn send_list(&mut self, receiver: &str, atoms: &[Atom]) -> Result<(), TransportError>;

    /// Deliver a message with an explicit selector to `receiver`.
    fn send_message(
        &mut self,
        receiver: &str,
        selector: &str,
        args: &[Atom],
    ) -> Result<(), TransportError>;

    /// Bang `receiver`.
    fn send_bang(&mut self, receiver: &str) -> Result<(), TransportError>;

    /// Deliver one float to `receiver`.
    fn send_float(&mut self, receiver: &str, value: f32) -> Result<(), TransportError>;
}

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Sent {
    List { receiver: String, atoms: Vec<Atom> },
    Message { receiver: String, selector: String, args: Vec<Atom> },
    Bang { receiver: String },
    Float { receiver: String, value: f32 },
}

impl Sent {
    /// Receiver the call was addressed to.
    pub fn receiver(&self) -> &str {
        match self {
            Sent::List { receiver, .. }
            | Sent::Message { receiver, .. }
            | Sent::Bang { receiver }
            | Sent::Float { receiver, .. } => receiver,
        }
    }

    /// The payload as wire text, without the receiver.
    pub fn text(&self) -> String {
        match self {
            Sent::List { atoms, .. } => join_atoms(atoms),
            Sent::Message { selector, args, .. } if args.is_empty() => selector.clone(),
            Sent::Message { selector, args, .. } => format!("{} {}", selector, join_atoms(args)),
            Sent::Bang { .. } => "bang".to_string(),
            Sent::Float { value, .. } => value.to_string(),
        }
    }
}

/// In-memory engine stand-in that records every call in order.
///
/// `$0` values start at 1001 and increase per opened patch. The transport can
/// be armed to fail once a number of deliveries has been accepted.
#[derive(Debug)]
pub struct MemoryTransport {
    next_dollar_zero: i32,
    opened: Vec<(String, PathBuf, i32)>,
    sent: Vec<Sent>,
    /// Deliveries left before every send fails.
    fail_after: Option<usize>,
}

impl MemoryTransport {
    /// Empty recorder that accepts every call.
    pub fn new() -> Self {
        Self {
            next_dollar_zero: 1001,
            opened: Vec::new(),
            sent: Vec::new(),
            fail_after: None,
        }
    }

    /// Accept `deliveries` more sends, then fail every following one.
    pub fn fail_after(&mut self, deliveries: usize) {
        self.fail_after = Some(deliveries);
    }

    /// Accept every send again after [`MemoryTransport::fail_after`].
    pub fn recover(&mut self) {
        self.fail_after = None;
    }

    /// Every accepted call, oldest first.
    pub fn sent(&self) -> &[Sent] {
        &self.sent
    }

    /// Payload text of every call accepted by `receiver`.
    pub fn lines_to(&self, receiver: &str) -> Vec<String> {
        self.sent
            .iter()
            .filter(|s| s.receiver() == receiver)
            .map(Sent::text)
            .collect()
    }

    /// Patches opened so far as `(name, dir, $0)`.
    pub fn opened(&self) -> &[(String, PathBuf, i32)] {
        &self.opened
    }

    /// Forget recorded calls. An armed failure limit stays armed.
    pub fn clear(&mut self) {
        self.sent.clear();
    }

    fn record(&mut self, sent: Sent) -> Result<(), TransportError> {
        match self.fail_after.as_mut() {
            Some(0) => return Err(TransportError::new(sent.receiver(), "delivery refused")),
            Some(remaining) => *remaining -= 1,
            None => {}
        }
        self.sent.push(sent);
        Ok(())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn open_patch(&mut self, name: &str, dir: &Path) -> Result<PatchHandle, TransportError> {
        if name.is_empty() {
            return Err(TransportError::new(name, "empty patch name"));
        }
        let dollar_zero = self.next_dollar_zero;
        self.next_dollar_zero += 1;
        self.opened
            .push((name.to_string(), dir.to_path_buf(), dollar_zero));
        Ok(PatchHandle { dollar_zero })
    }

    fn send_list(&mut self, receiver: &str, atoms: &[Atom]) -> Result<(), TransportError> {
        self.record(Sent::List {
            receiver: receiver.to_string(),
            atoms: atoms.to_vec(),
        })
    }

    fn send_message(
        &mut self,
        receiver: &str,
        selector: &str,
        args: &[Atom],
    ) -> Result<(), TransportError> {
        self.record(Sent::Message {
            receiver: receiver.to_string(),
            selector: selector.to_string(),
            args: args.to_vec(),
        })
    }

    fn send_bang(&mut self, receiver: &str) -> Result<(), TransportError> {
        self.record(Sent::Bang {
            receiver: receiver.to_string(),
        })
    }

    fn send_float(&mut self, receiver: &str, value: f32) -> Result<(), TransportError> {
        self.record(Sent::Float {
            receiver: receiver.to_string(),
            value,
        })
    }
}
