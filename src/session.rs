//! Session: one dynamic patching context inside the engine.
//!
//! A session opens the interpreter patch, derives its receiver name from the
//! patch's `$0`, and clears it before handing control back. Every script line
//! and typed call becomes one list sent to that receiver. Several sessions can
//! coexist; each edits its own patch.
//!
//! Execution is synchronous and unbuffered. A script runs line by line; if a
//! line fails to parse or deliver, earlier lines have already reached the
//! engine and later lines are never attempted. Callers that need all-or-nothing
//! behavior validate with [`parse_script`](crate::command::parse_script) first.
//!
//! Sessions do no locking. Calls from several threads must be serialized by
//! the caller.

#![warn(missing_docs)]

use crate::atom::Atom;
use crate::command::{parse_line, script_lines, Command};
use crate::config::SessionConfig;
use crate::encoder::{encode_receiver_first, encode_unrestricted};
use crate::error::{Error, Result};
use crate::invariant_ppt::{assert_invariant, SCRIPT_ORDER_PRESERVED, SESSION_INITIALIZED};
use crate::transport::{PatchHandle, Transport};
use tracing::{debug, info};

/// A dynamic patching session bound to one interpreter patch.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: T,
    patch: PatchHandle,
    interpreter: String,
}

impl<T: Transport> Session<T> {
    /// Open the interpreter patch and reset it.
    pub fn new(mut transport: T, config: &SessionConfig) -> Result<Self> {
        let patch = transport.open_patch(&config.patch, &config.search_path)?;
        let interpreter = format!("{}-{}", patch.dollar_zero, config.interpreter_suffix);
        let mut session = Self {
            transport,
            patch,
            interpreter,
        };
        session.execute(&Command::Reset)?;
        assert_invariant(
            SESSION_INITIALIZED,
            !session.interpreter.is_empty(),
            "session reset before first use",
            Some(&session.interpreter),
        );
        info!(
            interpreter = %session.interpreter,
            patch = %config.patch,
            "dynamic patching session ready"
        );
        Ok(session)
    }

    /// The patch's `$0`.
    pub fn dollar_zero(&self) -> i32 {
        self.patch.dollar_zero
    }

    /// Receiver that accepts script lines.
    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    /// A receiver name local to this session's patch, `"<$0>-<suffix>"`.
    pub fn local_receiver(&self, suffix: &str) -> String {
        format!("{}-{}", self.patch.dollar_zero, suffix)
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable access to the transport, e.g. to inspect or rearm a test double.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the session and hand back its transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Validate and encode one command, then deliver it to the interpreter.
    ///
    /// A command that fails validation is not sent.
    pub fn execute(&mut self, command: &Command) -> Result<()> {
        let atoms = command.encode()?;
        debug!(interpreter = %self.interpreter, line = %command.wire_line(), "send");
        self.transport.send_list(&self.interpreter, &atoms)?;
        Ok(())
    }

    /// Run every line of `script` in order, stopping at the first error.
    pub fn run_script(&mut self, script: &str) -> Result<()> {
        let mut executed = 0usize;
        for line in script_lines(script) {
            let command = parse_line(line)?;
            self.execute(&command)?;
            executed += 1;
        }
        assert_invariant(
            SCRIPT_ORDER_PRESERVED,
            executed == script_lines(script).count(),
            "every script line ran once, in order",
            None,
        );
        Ok(())
    }

    /// Run already parsed commands in order, stopping at the first error.
    pub fn run_commands(&mut self, commands: &[Command]) -> Result<()> {
        for command in commands {
            self.execute(command)?;
        }
        Ok(())
    }

    /// Have the patch send `message` to `receiver` from inside Pd.
    ///
    /// Numbers and symbols arrive exactly as written, with no need for a
    /// `[list trim]` on the receiving side.
    pub fn send(&mut self, receiver: &str, message: &str) -> Result<()> {
        self.execute(&Command::send(receiver, message)?)
    }

    /// Send `message` straight to `receiver`, bypassing the interpreter.
    ///
    /// The first token is the selector and must not be a number.
    pub fn send_raw(&mut self, receiver: &str, message: &str) -> Result<()> {
        let atoms = encode_receiver_first(message)?;
        let (selector, args) = atoms
            .split_first()
            .and_then(|(head, args)| head.as_symbol().map(|selector| (selector, args)))
            .ok_or_else(|| Error::MalformedMessage {
                message: message.to_string(),
            })?;
        self.transport.send_message(receiver, selector, args)?;
        Ok(())
    }

    /// Bang `receiver` directly.
    pub fn send_bang(&mut self, receiver: &str) -> Result<()> {
        self.transport.send_bang(receiver)?;
        Ok(())
    }

    /// Send one float directly to `receiver`.
    pub fn send_float(&mut self, receiver: &str, value: f32) -> Result<()> {
        self.transport.send_float(receiver, value)?;
        Ok(())
    }

    /// Send prebuilt atoms directly to `receiver` as a list.
    pub fn send_list(&mut self, receiver: &str, atoms: &[Atom]) -> Result<()> {
        self.transport.send_list(receiver, atoms)?;
        Ok(())
    }

    /// Send a text list straight to `receiver`, coercing each token.
    pub fn send_list_text(&mut self, receiver: &str, text: &str) -> Result<()> {
        let atoms = encode_unrestricted(text);
        self.send_list(receiver, &atoms)
    }

    /// Create any object on Pd's search path; see [`Command::object`].
    pub fn create_object(&mut self, key: &str, definition: &str) -> Result<()> {
        self.execute(&Command::object(key, definition)?)
    }

    /// Create a message box; see [`Command::message`].
    pub fn create_message_box(&mut self, key: &str, text: &str) -> Result<()> {
        self.execute(&Command::message(key, text)?)
    }

    /// Create a number box.
    pub fn create_float_atom(&mut self, key: &str, args: &str) -> Result<()> {
        self.execute(&Command::float_atom(key, args)?)
    }

    /// Create a symbol box.
    pub fn create_symbol_atom(&mut self, key: &str, args: &str) -> Result<()> {
        self.execute(&Command::symbol_atom(key, args)?)
    }

    /// Remove an object and every connection touching it.
    pub fn delete_object(&mut self, key: &str) -> Result<()> {
        self.execute(&Command::delete(key)?)
    }

    /// Connect outlet 0 of `outlet_key` to inlet 0 of `inlet_key`.
    pub fn connect(&mut self, outlet_key: &str, inlet_key: &str) -> Result<()> {
        self.connect_ports(outlet_key, 0, inlet_key, 0)
    }

    /// Connect explicit outlet and inlet indices.
    pub fn connect_ports(&mut self, outlet_key: &str, outlet: u32, inlet_key: &str, inlet: u32) -> Result<()> {
        self.execute(&Command::connect(outlet_key, outlet, inlet_key, inlet)?)
    }

    /// Remove the connection from outlet 0 of `outlet_key` to inlet 0 of `inlet_key`.
    pub fn disconnect(&mut self, outlet_key: &str, inlet_key: &str) -> Result<()> {
        self.disconnect_ports(outlet_key, 0, inlet_key, 0)
    }

    /// Remove the connection between explicit ports.
    pub fn disconnect_ports(&mut self, outlet_key: &str, outlet: u32, inlet_key: &str, inlet: u32) -> Result<()> {
        self.execute(&Command::disconnect(outlet_key, outlet, inlet_key, inlet)?)
    }

    /// Edit the subpatch created by a `[pd <subpatch>]` object from now on.
    pub fn target(&mut self, subpatch: &str) -> Result<()> {
        self.execute(&Command::target(subpatch)?)
    }

    /// Clear the targeted patch.
    pub fn reset(&mut self) -> Result<()> {
        self.execute(&Command::Reset)
    }

    /// Fire the loadbangs of objects created so far.
    pub fn loadbang(&mut self) -> Result<()> {
        self.execute(&Command::Loadbang)
    }
}
