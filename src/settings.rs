//! Typed synth parameters.
//!
//! Each parameter keeps the variant it was declared with. Text coming from a
//! UI is parsed once, at the boundary, into a [`SettingValue`]; from then on
//! updates are checked against the declared variant.

use crate::atom::coerce;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SettingValue {
    Number(f32),
    Symbol(String),
    /// Fixed-length numeric list, e.g. an ADSR envelope or a pan pair.
    List(Vec<f32>),
}

impl SettingValue {
    /// Parse space-separated text into a value.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let numbers: Vec<Option<f32>> = tokens.iter().map(|t| coerce(t)).collect();
        match (tokens.as_slice(), numbers.as_slice()) {
            ([], _) => Err(invalid(text, "empty value")),
            (_, [Some(v)]) => Ok(SettingValue::Number(*v)),
            ([symbol], [None]) => Ok(SettingValue::Symbol(symbol.to_string())),
            (_, many) if many.iter().all(Option::is_some) => {
                Ok(SettingValue::List(many.iter().flatten().copied().collect()))
            }
            _ => Err(invalid(text, "lists must be all numbers")),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SettingValue::Number(_) => "number",
            SettingValue::Symbol(_) => "symbol",
            SettingValue::List(_) => "list",
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Number(v) => write!(f, "{}", v),
            SettingValue::Symbol(s) => f.write_str(s),
            SettingValue::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}

fn invalid(value: &str, reason: &str) -> Error {
    Error::InvalidSettingValue {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn mismatch(name: &str, reason: impl Into<String>) -> Error {
    Error::SettingMismatch {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Named parameters, iterated in name order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    values: BTreeMap<String, SettingValue>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for the two-oscillator subtractive voice.
    pub fn subtractive() -> Self {
        use SettingValue::{List, Number, Symbol};

        let mut settings = Self::new();
        let entries = [
            ("osc1 semi", Number(0.0)),
            ("osc1 cent", Number(0.0)),
            ("osc1 phase", Number(0.0)),
            ("osc1 set", Symbol("sine_table".into())),
            ("osc1 mode", Symbol("o".into())),
            ("osc1 on", Number(1.0)),
            ("osc2 semi", Number(0.0)),
            ("osc2 cent", Number(10.0)),
            ("osc2 phase", Number(0.5)),
            ("osc2 set", Symbol("sawtooth_table".into())),
            ("osc2 mode", Symbol("-".into())),
            ("osc2 on", Number(1.0)),
            ("noise filter", Number(30.0)),
            ("noise adsr", List(vec![1.0, 100.0, 0.0, 1.0])),
            ("noise amount", Number(0.0)),
            ("filter frequency", Number(2000.0)),
            ("envelope", List(vec![1.0, 500.0, 1.0, 1.0])),
            ("pitchbend", Number(64.0)),
            ("pitchbend range", Number(12.0)),
            ("pan", List(vec![0.5, 0.0])),
            ("mix", List(vec![1.0, 0.5])),
            ("volume", Number(0.5)),
        ];
        for (name, value) in entries {
            settings.declare(name, value);
        }
        settings
    }

    /// Add or replace a parameter, fixing its variant.
    pub fn declare(&mut self, name: &str, value: SettingValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&SettingValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Update a declared parameter. The variant, and a list's length, must
    /// match the declaration.
    pub fn set(&mut self, name: &str, value: SettingValue) -> Result<()> {
        let current = self
            .values
            .get_mut(name)
            .ok_or_else(|| Error::UnknownSetting(name.to_string()))?;
        match (&*current, &value) {
            (SettingValue::List(old), SettingValue::List(new)) if old.len() != new.len() => {
                return Err(mismatch(
                    name,
                    format!("expected {} values, got {}", old.len(), new.len()),
                ))
            }
            (old, new) if old.kind() != new.kind() => {
                return Err(mismatch(
                    name,
                    format!("expected a {}, got a {}", old.kind(), new.kind()),
                ))
            }
            _ => {}
        }
        *current = value;
        Ok(())
    }

    /// Update one slot of a list parameter, e.g. the release of `envelope`.
    pub fn set_element(&mut self, name: &str, index: usize, value: f32) -> Result<()> {
        let current = self
            .values
            .get_mut(name)
            .ok_or_else(|| Error::UnknownSetting(name.to_string()))?;
        let SettingValue::List(values) = current else {
            return Err(mismatch(name, "not a list"));
        };
        let len = values.len();
        let slot = values
            .get_mut(index)
            .ok_or_else(|| mismatch(name, format!("index {} outside {} values", index, len)))?;
        *slot = value;
        Ok(())
    }

    /// The per-voice message for `name`, `"<name> <value>"`.
    pub fn message(&self, name: &str) -> Result<String> {
        self.get(name)
            .map(|value| format!("{} {}", name, value))
            .ok_or_else(|| Error::UnknownSetting(name.to_string()))
    }

    /// Every parameter as its per-voice message.
    pub fn messages(&self) -> impl Iterator<Item = String> + '_ {
        self.values
            .iter()
            .map(|(name, value)| format!("{} {}", name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_picks_variant() {
        assert_eq!(SettingValue::parse("0.5").unwrap(), SettingValue::Number(0.5));
        assert_eq!(
            SettingValue::parse("square_table").unwrap(),
            SettingValue::Symbol("square_table".into())
        );
        assert_eq!(
            SettingValue::parse("1 500 1 1").unwrap(),
            SettingValue::List(vec![1.0, 500.0, 1.0, 1.0])
        );
        assert_eq!(SettingValue::parse("-").unwrap(), SettingValue::Symbol("-".into()));
        assert!(SettingValue::parse("").is_err());
        assert!(SettingValue::parse("a b").is_err());
        let err = SettingValue::parse("1 x").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSettingValue {
                value: "1 x".into(),
                reason: "lists must be all numbers".into(),
            }
        );
        assert_eq!(err.to_string(), "invalid setting value `1 x`: lists must be all numbers");
    }

    #[test]
    fn set_checks_declared_variant() {
        let mut settings = Settings::subtractive();
        settings.set("volume", SettingValue::Number(0.8)).unwrap();
        assert_eq!(settings.get("volume"), Some(&SettingValue::Number(0.8)));

        assert!(matches!(
            settings.set("volume", SettingValue::Symbol("loud".into())),
            Err(Error::SettingMismatch { .. })
        ));
        assert!(matches!(
            settings.set("pan", SettingValue::List(vec![0.1])),
            Err(Error::SettingMismatch { .. })
        ));
        assert_eq!(
            settings.set("wobble", SettingValue::Number(1.0)),
            Err(Error::UnknownSetting("wobble".into()))
        );
    }

    #[test]
    fn set_element_updates_one_slot() {
        let mut settings = Settings::subtractive();
        settings.set_element("envelope", 3, 250.0).unwrap();
        assert_eq!(settings.message("envelope").unwrap(), "envelope 1 500 1 250");
        assert!(settings.set_element("envelope", 4, 1.0).is_err());
        assert!(settings.set_element("volume", 0, 1.0).is_err());
    }

    #[test]
    fn messages_render_per_voice_lines() {
        let settings = Settings::subtractive();
        let messages: Vec<String> = settings.messages().collect();
        assert_eq!(messages.len(), 22);
        assert!(messages.contains(&"osc2 mode -".to_string()));
        assert!(messages.contains(&"pan 0.5 0".to_string()));
        assert!(messages.contains(&"filter frequency 2000".to_string()));
    }
}
