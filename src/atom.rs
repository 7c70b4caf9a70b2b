//! Atoms: the value units of the wire protocol, and the single rule that
//! decides whether a token is a number or a symbol.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;

/// A value transmitted to the engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Atom {
    /// Numeric atom. Pd floats are single precision.
    Float(f32),
    /// Symbolic atom.
    Symbol(String),
}

impl Atom {
    /// Build an atom from one token, applying [`coerce`].
    pub fn from_token(token: &str) -> Self {
        match coerce(token) {
            Some(value) => Atom::Float(value),
            None => Atom::Symbol(token.to_string()),
        }
    }

    /// True for [`Atom::Float`].
    pub fn is_float(&self) -> bool {
        matches!(self, Atom::Float(_))
    }

    /// The symbol text, if this atom is symbolic.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Atom::Symbol(s) => Some(s),
            Atom::Float(_) => None,
        }
    }

    /// The numeric value, if this atom is a float.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Atom::Float(v) => Some(*v),
            Atom::Symbol(_) => None,
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Float(v) => write!(f, "{}", v),
            Atom::Symbol(s) => f.write_str(s),
        }
    }
}

impl From<f32> for Atom {
    fn from(value: f32) -> Self {
        Atom::Float(value)
    }
}

impl From<&str> for Atom {
    fn from(value: &str) -> Self {
        Atom::Symbol(value.to_string())
    }
}

/// Render atoms as one space-separated line.
pub fn join_atoms(atoms: &[Atom]) -> String {
    atoms
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `token` as a number, or return `None` if it is a symbol.
///
/// The parsing locale is fixed and independent of the host: ASCII digits,
/// `.` as the decimal separator, no grouping separators, an optional leading
/// sign and an optional exponent. The whole token must match
/// `[+-]?(D+(.D*)?|.D+)([eE][+-]?D+)?`. Words such as `inf` or `nan` and values
/// that overflow `f32` are symbols.
pub fn coerce(token: &str) -> Option<f32> {
    if !is_decimal_literal(token.as_bytes()) {
        return None;
    }
    token.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// True when `token` is a whole, unsigned-or-signed integer literal.
pub fn is_integer_literal(token: &str) -> bool {
    let digits = token.strip_prefix(['+', '-']).unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_decimal_literal(bytes: &[u8]) -> bool {
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}
