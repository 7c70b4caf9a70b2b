//! DSL module: builder API for scripts.
//!
//! Chain typed calls, then either hand the commands to
//! [`Session::run_commands`](crate::session::Session::run_commands) or render
//! them to script text. The first invalid call is remembered and reported by
//! [`ScriptBuilder::build`]; later calls are ignored.

use crate::command::{render_script, Command};
use crate::error::{Error, Result};

/// The script builder.
#[derive(Debug, Default)]
pub struct ScriptBuilder {
    commands: Vec<Command>,
    error: Option<Error>,
}

impl ScriptBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, command: Result<Command>) -> Self {
        if self.error.is_none() {
            match command {
                Ok(command) => self.commands.push(command),
                Err(err) => self.error = Some(err),
            }
        }
        self
    }

    /// Add an object, e.g. `.obj("router", "route zero one")`.
    pub fn obj(self, key: &str, definition: &str) -> Self {
        self.push(Command::object(key, definition))
    }

    /// Add a message box.
    pub fn msg(self, key: &str, text: &str) -> Self {
        self.push(Command::message(key, text))
    }

    /// Add a number box.
    pub fn floatatom(self, key: &str, args: &str) -> Self {
        self.push(Command::float_atom(key, args))
    }

    /// Add a symbol box.
    pub fn symbolatom(self, key: &str, args: &str) -> Self {
        self.push(Command::symbol_atom(key, args))
    }

    /// Delete an object by key.
    pub fn delete(self, key: &str) -> Self {
        self.push(Command::delete(key))
    }

    /// Connect outlet 0 of `from` to inlet 0 of `to`.
    pub fn connect(self, from: &str, to: &str) -> Self {
        self.push(Command::connect(from, 0, to, 0))
    }

    /// Connect explicit ports.
    pub fn connect_ports(self, from: &str, outlet: u32, to: &str, inlet: u32) -> Self {
        self.push(Command::connect(from, outlet, to, inlet))
    }

    /// Disconnect outlet 0 of `from` from inlet 0 of `to`.
    pub fn disconnect(self, from: &str, to: &str) -> Self {
        self.push(Command::disconnect(from, 0, to, 0))
    }

    pub fn disconnect_ports(self, from: &str, outlet: u32, to: &str, inlet: u32) -> Self {
        self.push(Command::disconnect(from, outlet, to, inlet))
    }

    /// Switch the edited canvas to a subpatch.
    pub fn target(self, subpatch: &str) -> Self {
        self.push(Command::target(subpatch))
    }

    /// Send a message from inside the patch.
    pub fn send(self, receiver: &str, message: &str) -> Self {
        self.push(Command::send(receiver, message))
    }

    pub fn loadbang(self) -> Self {
        self.push(Ok(Command::Loadbang))
    }

    pub fn reset(self) -> Self {
        self.push(Ok(Command::Reset))
    }

    /// Build the command list.
    pub fn build(self) -> Result<Vec<Command>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.commands),
        }
    }

    /// Render the commands as script text.
    pub fn to_script(self) -> Result<String> {
        self.build().map(|commands| render_script(&commands))
    }
}
