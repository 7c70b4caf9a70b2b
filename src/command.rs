//! Script commands: parsing, validation and wire rendering.
//!
//! A script is a list of lines joined by `", "`. Each line starts with a
//! keyword from a closed vocabulary:
//!
//! ```text
//! obj <key> <type> [args...]
//! msg <key> <text...>
//! floatatom <key> [args...]
//! symbolatom <key> [args...]
//! delete <key>
//! connect <outletKey> [outlet] <inletKey> [inlet]
//! disconnect <outletKey> [outlet] <inletKey> [inlet]
//! target <subpatch>
//! send <receiver> <message...>
//! loadbang
//! reset
//! ```
//!
//! Every command becomes exactly one wire line for the interpreter receiver.
//! Missing connection indices become `0`, and `reset` goes out as `init`.
//!
//! Variants can be built directly; [`Command::encode`] re-checks them, so a
//! hand-built command with a numeric or blank key is rejected before sending.

#![warn(missing_docs)]

use crate::atom::{coerce, is_integer_literal, Atom};
use crate::encoder::encode_unrestricted;
use crate::error::{Error, Result};
use crate::invariant_ppt::{assert_invariant, CONNECT_NORMALIZED, KEY_SYMBOLIC};
use std::fmt;

/// Separator between lines of a script.
pub const LINE_SEPARATOR: &str = ", ";

/// Endpoints of a connection. Index 0 is the leftmost outlet or inlet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Key of the object whose outlet is connected.
    pub outlet_key: String,
    /// Outlet index on that object.
    pub outlet: u32,
    /// Key of the object whose inlet is connected.
    pub inlet_key: String,
    /// Inlet index on that object.
    pub inlet: u32,
}

/// One script command.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Command {
    /// Generic object; `definition` is the type followed by its arguments.
    Object { key: String, definition: String },
    /// Message box.
    Message { key: String, text: String },
    /// Number box.
    FloatAtom { key: String, args: String },
    /// Symbol box.
    SymbolAtom { key: String, args: String },
    /// Remove an object and its connections.
    Delete { key: String },
    Connect(Connection),
    Disconnect(Connection),
    /// Make a subpatch the canvas that following commands edit.
    Target { subpatch: String },
    /// Have the patch itself send `message` to `receiver`.
    Send { receiver: String, message: String },
    /// Fire every `[loadbang]` in the targeted patch.
    Loadbang,
    /// Clear the targeted patch.
    Reset,
}

impl Command {
    /// Create an object from a Pd-style definition (`"route a b"`, `"dac~"`).
    ///
    /// Definitions whose type is `msg`, `floatatom` or `symbolatom` produce
    /// the corresponding box command instead of a generic object.
    pub fn object(key: &str, definition: &str) -> Result<Self> {
        let line = format!("obj {} {}", key, definition);
        validate_symbol(&line, "key", key)?;
        let definition = definition.trim();
        if definition.is_empty() {
            return Err(Error::malformed(line, "missing object type"));
        }
        let (kind, rest) = split_first(definition);
        let key = key.to_string();
        Ok(match kind {
            "msg" => Command::Message {
                key,
                text: rest.to_string(),
            },
            "floatatom" => Command::FloatAtom {
                key,
                args: rest.to_string(),
            },
            "symbolatom" => Command::SymbolAtom {
                key,
                args: rest.to_string(),
            },
            _ => Command::Object {
                key,
                definition: definition.to_string(),
            },
        })
    }

    /// Message box holding `text`.
    pub fn message(key: &str, text: &str) -> Result<Self> {
        validate_symbol(&format!("msg {} {}", key, text), "key", key)?;
        Ok(Command::Message {
            key: key.to_string(),
            text: text.trim().to_string(),
        })
    }

    /// Number box; `args` are the usual width, range and label arguments.
    pub fn float_atom(key: &str, args: &str) -> Result<Self> {
        validate_symbol(&format!("floatatom {} {}", key, args), "key", key)?;
        Ok(Command::FloatAtom {
            key: key.to_string(),
            args: args.trim().to_string(),
        })
    }

    /// Symbol box.
    pub fn symbol_atom(key: &str, args: &str) -> Result<Self> {
        validate_symbol(&format!("symbolatom {} {}", key, args), "key", key)?;
        Ok(Command::SymbolAtom {
            key: key.to_string(),
            args: args.trim().to_string(),
        })
    }

    /// Delete the object created under `key`.
    pub fn delete(key: &str) -> Result<Self> {
        validate_symbol(&format!("delete {}", key), "key", key)?;
        Ok(Command::Delete {
            key: key.to_string(),
        })
    }

    /// Connect `outlet_key`'s outlet to `inlet_key`'s inlet.
    pub fn connect(outlet_key: &str, outlet: u32, inlet_key: &str, inlet: u32) -> Result<Self> {
        let line = format!("connect {} {} {} {}", outlet_key, outlet, inlet_key, inlet);
        Ok(Command::Connect(connection(&line, outlet_key, outlet, inlet_key, inlet)?))
    }

    /// Remove the connection between the given ports.
    pub fn disconnect(outlet_key: &str, outlet: u32, inlet_key: &str, inlet: u32) -> Result<Self> {
        let line = format!("disconnect {} {} {} {}", outlet_key, outlet, inlet_key, inlet);
        Ok(Command::Disconnect(connection(&line, outlet_key, outlet, inlet_key, inlet)?))
    }

    /// Point following commands at the subpatch named `subpatch`.
    pub fn target(subpatch: &str) -> Result<Self> {
        validate_symbol(&format!("target {}", subpatch), "subpatch", subpatch)?;
        Ok(Command::Target {
            subpatch: subpatch.to_string(),
        })
    }

    /// Have the patch send `message` to `receiver`.
    pub fn send(receiver: &str, message: &str) -> Result<Self> {
        validate_symbol(&format!("send {} {}", receiver, message), "receiver", receiver)?;
        Ok(Command::Send {
            receiver: receiver.to_string(),
            message: message.trim().to_string(),
        })
    }

    /// Keyword as written in scripts.
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Object { .. } => "obj",
            Command::Message { .. } => "msg",
            Command::FloatAtom { .. } => "floatatom",
            Command::SymbolAtom { .. } => "symbolatom",
            Command::Delete { .. } => "delete",
            Command::Connect(_) => "connect",
            Command::Disconnect(_) => "disconnect",
            Command::Target { .. } => "target",
            Command::Send { .. } => "send",
            Command::Loadbang => "loadbang",
            Command::Reset => "reset",
        }
    }

    /// Keyword as the interpreter patch expects it.
    pub fn wire_keyword(&self) -> &'static str {
        match self {
            Command::Reset => "init",
            other => other.keyword(),
        }
    }

    /// The command as one script line, parseable by [`parse_line`].
    pub fn script_line(&self) -> String {
        self.render(self.keyword())
    }

    /// The line sent to the interpreter receiver.
    pub fn wire_line(&self) -> String {
        self.render(self.wire_keyword())
    }

    /// Check the rules the constructors enforce.
    ///
    /// Useful for commands assembled from variants rather than through
    /// [`Command::object`] and friends or [`parse_line`].
    pub fn validate(&self) -> Result<()> {
        let line = self.script_line();
        match self {
            Command::Object { key, definition } => {
                validate_symbol(&line, "key", key)?;
                if definition.trim().is_empty() {
                    return Err(Error::malformed(line.trim(), "missing object type"));
                }
                Ok(())
            }
            Command::Message { key, .. }
            | Command::FloatAtom { key, .. }
            | Command::SymbolAtom { key, .. }
            | Command::Delete { key } => validate_symbol(&line, "key", key),
            Command::Connect(c) | Command::Disconnect(c) => {
                validate_symbol(&line, "outlet key", &c.outlet_key)?;
                validate_symbol(&line, "inlet key", &c.inlet_key)
            }
            Command::Target { subpatch } => validate_symbol(&line, "subpatch", subpatch),
            Command::Send { receiver, .. } => validate_symbol(&line, "receiver", receiver),
            Command::Loadbang | Command::Reset => Ok(()),
        }
    }

    /// Validate, then return the wire line as atoms.
    pub fn encode(&self) -> Result<Vec<Atom>> {
        self.validate()?;
        let atoms = encode_unrestricted(&self.wire_line());
        if let Command::Connect(_) | Command::Disconnect(_) = self {
            let index = |atom: &Atom| atom.as_float().is_some_and(|v| v >= 0.0);
            assert_invariant(
                CONNECT_NORMALIZED,
                atoms.len() == 5 && index(&atoms[2]) && index(&atoms[4]),
                "connection encodes as keyword, key, index, key, index",
                None,
            );
        }
        Ok(atoms)
    }

    fn render(&self, keyword: &str) -> String {
        let body = match self {
            Command::Object { key, definition } => format!("{} {}", key, definition),
            Command::Message { key, text: rest }
            | Command::FloatAtom { key, args: rest }
            | Command::SymbolAtom { key, args: rest } => join_nonempty(key, rest),
            Command::Delete { key } => key.clone(),
            Command::Connect(c) | Command::Disconnect(c) => format!(
                "{} {} {} {}",
                c.outlet_key, c.outlet, c.inlet_key, c.inlet
            ),
            Command::Target { subpatch } => subpatch.clone(),
            Command::Send { receiver, message } => join_nonempty(receiver, message),
            Command::Loadbang | Command::Reset => return keyword.to_string(),
        };
        format!("{} {}", keyword, body)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.script_line())
    }
}

/// Parse one script line.
///
/// Unknown keywords give [`Error::UnknownCommand`]; known keywords with bad
/// arguments give [`Error::MalformedCommand`] naming the whole line.
pub fn parse_line(line: &str) -> Result<Command> {
    let line = line.trim();
    let (keyword, rest) = split_first(line);
    let parsed = match keyword {
        "obj" => {
            let (key, definition) = split_first(rest);
            Command::object(key, definition)
        }
        "msg" => {
            let (key, text) = split_first(rest);
            Command::message(key, text)
        }
        "floatatom" => {
            let (key, args) = split_first(rest);
            Command::float_atom(key, args)
        }
        "symbolatom" => {
            let (key, args) = split_first(rest);
            Command::symbol_atom(key, args)
        }
        "delete" => single_argument(line, rest, "key").and_then(Command::delete),
        "connect" => parse_connection(line, rest).map(Command::Connect),
        "disconnect" => parse_connection(line, rest).map(Command::Disconnect),
        "target" => single_argument(line, rest, "subpatch").and_then(Command::target),
        "send" => {
            let (receiver, message) = split_first(rest);
            Command::send(receiver, message)
        }
        "loadbang" => no_arguments(line, rest).map(|_| Command::Loadbang),
        "reset" => no_arguments(line, rest).map(|_| Command::Reset),
        _ => {
            return Err(Error::UnknownCommand {
                line: line.to_string(),
            })
        }
    };
    parsed.map_err(|err| at_line(err, line))
}

/// Non-blank lines of `script`, trimmed, in order.
pub fn script_lines(script: &str) -> impl Iterator<Item = &str> {
    script
        .split(LINE_SEPARATOR)
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Parse a whole script without transmitting anything.
pub fn parse_script(script: &str) -> Result<Vec<Command>> {
    script_lines(script).map(parse_line).collect()
}

/// Join commands back into script text.
pub fn render_script(commands: &[Command]) -> String {
    commands
        .iter()
        .map(Command::script_line)
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

fn split_first(text: &str) -> (&str, &str) {
    match text.split_once(' ') {
        Some((head, tail)) => (head, tail.trim()),
        None => (text, ""),
    }
}

fn join_nonempty(head: &str, tail: &str) -> String {
    if tail.is_empty() {
        head.to_string()
    } else {
        format!("{} {}", head, tail)
    }
}

fn validate_symbol(line: &str, what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::malformed(line.trim(), format!("missing {}", what)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::malformed(line.trim(), format!("{} `{}` contains whitespace", what, value)));
    }
    if coerce(value).is_some() {
        return Err(Error::malformed(line.trim(), format!("{} `{}` must not be a number", what, value)));
    }
    assert_invariant(KEY_SYMBOLIC, coerce(value).is_none(), "keys are symbols", Some(value));
    Ok(())
}

fn connection(line: &str, outlet_key: &str, outlet: u32, inlet_key: &str, inlet: u32) -> Result<Connection> {
    validate_symbol(line, "outlet key", outlet_key)?;
    validate_symbol(line, "inlet key", inlet_key)?;
    Ok(Connection {
        outlet_key: outlet_key.to_string(),
        outlet,
        inlet_key: inlet_key.to_string(),
        inlet,
    })
}

fn parse_connection(line: &str, rest: &str) -> Result<Connection> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    match tokens.as_slice() {
        [outlet_key, inlet_key] => connection(line, outlet_key, 0, inlet_key, 0),
        [outlet_key, middle, last] if coerce(middle).is_some() => {
            connection(line, outlet_key, parse_index(line, middle)?, last, 0)
        }
        [outlet_key, inlet_key, inlet] => {
            connection(line, outlet_key, 0, inlet_key, parse_index(line, inlet)?)
        }
        [outlet_key, outlet, inlet_key, inlet] => connection(
            line,
            outlet_key,
            parse_index(line, outlet)?,
            inlet_key,
            parse_index(line, inlet)?,
        ),
        _ => Err(Error::malformed(
            line,
            "expected <outletKey> [outlet] <inletKey> [inlet]",
        )),
    }
}

fn parse_index(line: &str, token: &str) -> Result<u32> {
    if !is_integer_literal(token) {
        return Err(Error::malformed(line, format!("index `{}` is not an integer", token)));
    }
    token
        .parse::<u32>()
        .map_err(|_| Error::malformed(line, format!("index `{}` is out of range", token)))
}

fn single_argument<'a>(line: &str, rest: &'a str, what: &str) -> Result<&'a str> {
    match rest.split_whitespace().count() {
        0 => Err(Error::malformed(line, format!("missing {}", what))),
        1 => Ok(rest),
        _ => Err(Error::malformed(line, format!("expected a single {}", what))),
    }
}

fn no_arguments(line: &str, rest: &str) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(Error::malformed(line, "takes no arguments"))
    }
}

fn at_line(err: Error, line: &str) -> Error {
    match err {
        Error::MalformedCommand { reason, .. } => Error::MalformedCommand {
            line: line.to_string(),
            reason,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wire(script: &str) -> Vec<String> {
        parse_script(script)
            .unwrap()
            .iter()
            .map(Command::wire_line)
            .collect()
    }

    #[test]
    fn hello_script_dispatches_in_order() {
        assert_eq!(
            wire("obj foo loadbang, obj bar print, connect foo bar, loadbang"),
            vec!["obj foo loadbang", "obj bar print", "connect foo 0 bar 0", "loadbang"]
        );
    }

    #[test]
    fn connect_defaults_and_explicit_indices() {
        assert_eq!(wire("connect foo bar"), vec!["connect foo 0 bar 0"]);
        assert_eq!(wire("connect foo 1 bar 3"), vec!["connect foo 1 bar 3"]);
        assert_eq!(wire("connect router 2 message"), vec!["connect router 2 message 0"]);
        assert_eq!(wire("disconnect bar baz 2"), vec!["disconnect bar 0 baz 2"]);
    }

    #[test]
    fn connect_rejects_bad_indices() {
        for line in [
            "connect foo 1.5 bar",
            "connect foo bar one",
            "connect foo -1 bar 0",
            "connect foo",
            "connect a 0 b 0 c",
            "connect 1 bar",
        ] {
            let err = parse_line(line).unwrap_err();
            assert!(
                matches!(&err, Error::MalformedCommand { line: l, .. } if l == line),
                "{line}: {err:?}"
            );
        }
    }

    #[test]
    fn obj_redispatches_box_types() {
        assert_eq!(
            parse_line("obj message msg There will be coffee").unwrap(),
            Command::Message {
                key: "message".into(),
                text: "There will be coffee".into()
            }
        );
        assert_eq!(
            parse_line("obj num floatatom 5 0 0").unwrap().wire_line(),
            "floatatom num 5 0 0"
        );
        assert_eq!(
            parse_line("obj sym symbolatom").unwrap().wire_line(),
            "symbolatom sym"
        );
        assert_eq!(
            parse_line("obj router route zero one elephant").unwrap().wire_line(),
            "obj router route zero one elephant"
        );
    }

    #[test]
    fn reset_goes_out_as_init() {
        let cmd = parse_line("reset").unwrap();
        assert_eq!(cmd.wire_line(), "init");
        assert_eq!(cmd.script_line(), "reset");
    }

    #[test]
    fn send_keeps_numbers_numeric() {
        let cmd = parse_line("send foo 15").unwrap();
        assert_eq!(
            cmd.encode().unwrap(),
            vec![Atom::from("send"), Atom::from("foo"), Atom::Float(15.0)]
        );
    }

    #[test]
    fn hand_built_commands_are_checked() {
        let spaced = Command::Connect(Connection {
            outlet_key: "a b".into(),
            outlet: 0,
            inlet_key: "c".into(),
            inlet: 0,
        });
        assert!(matches!(spaced.encode(), Err(Error::MalformedCommand { .. })));

        let blank = Command::Disconnect(Connection {
            outlet_key: "a".into(),
            outlet: 1,
            inlet_key: String::new(),
            inlet: 0,
        });
        assert!(matches!(blank.encode(), Err(Error::MalformedCommand { .. })));

        let numeric = Command::Object {
            key: "12".into(),
            definition: "print".into(),
        };
        assert!(matches!(
            numeric.encode(),
            Err(Error::MalformedCommand { line, .. }) if line == "obj 12 print"
        ));

        let typeless = Command::Object {
            key: "foo".into(),
            definition: " ".into(),
        };
        assert!(typeless.validate().is_err());
        assert!(Command::Send {
            receiver: "foo".into(),
            message: String::new(),
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn unknown_keyword_names_line() {
        assert_eq!(
            parse_line("frobnicate foo").unwrap_err(),
            Error::UnknownCommand {
                line: "frobnicate foo".into()
            }
        );
        assert!(matches!(parse_line("init"), Err(Error::UnknownCommand { .. })));
    }

    #[test]
    fn keys_must_be_symbols() {
        assert!(matches!(parse_line("obj 12 print"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_line("obj foo"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_line("delete"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_line("delete a b"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_line("target 3"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_line("send 4 x"), Err(Error::MalformedCommand { .. })));
        assert!(matches!(parse_line("loadbang now"), Err(Error::MalformedCommand { .. })));
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_script("").unwrap().is_empty());
        assert_eq!(wire("loadbang, "), vec!["loadbang"]);
    }

    #[test]
    fn script_stops_at_first_error() {
        let err = parse_script("loadbang, frobnicate, obj 1 x").unwrap_err();
        assert_eq!(err, Error::UnknownCommand { line: "frobnicate".into() });
    }

    proptest! {
        #[test]
        fn rendered_scripts_parse_back(
            keys in proptest::collection::vec("[a-z][a-z0-9_]{0,6}", 2..6),
            outlet in 0u32..8,
            inlet in 0u32..8,
        ) {
            let mut commands = Vec::new();
            for key in &keys {
                commands.push(Command::object(key, "print").unwrap());
            }
            commands.push(Command::connect(&keys[0], outlet, &keys[1], inlet).unwrap());
            commands.push(Command::Reset);
            let script = render_script(&commands);
            prop_assert_eq!(parse_script(&script).unwrap(), commands);
        }

        #[test]
        fn parse_line_never_panics(s in "\\PC*") {
            let _ = parse_line(&s);
        }
    }
}
