//! Message encoder: text to atom lists.
//!
//! Two policies exist. The unrestricted one is used for structural script
//! lines and `send` payloads. The receiver-first one backs direct messages,
//! whose first atom becomes the selector and therefore has to be a symbol.

use crate::atom::{coerce, Atom};
use crate::error::{Error, Result};
use crate::invariant_ppt::{assert_invariant, RECEIVER_FIRST_SYMBOLIC};

/// Split `text` on single spaces and coerce every token independently.
pub fn encode_unrestricted(text: &str) -> Vec<Atom> {
    text.split(' ').map(Atom::from_token).collect()
}

/// Like [`encode_unrestricted`], but the first token must be symbolic.
pub fn encode_receiver_first(text: &str) -> Result<Vec<Atom>> {
    let first = text.split(' ').next().unwrap_or_default();
    if coerce(first).is_some() {
        return Err(Error::MalformedMessage {
            message: text.to_string(),
        });
    }
    let atoms = encode_unrestricted(text);
    assert_invariant(
        RECEIVER_FIRST_SYMBOLIC,
        atoms.first().is_some_and(|a| !a.is_float()),
        "receiver-first message starts with a symbol",
        Some(text),
    );
    Ok(atoms)
}
