//! Polyphonic synth built with dynamic patching.
//!
//! [`PolySynth`] owns everything a host needs to play the subtractive synth:
//! the session, the voice router and the current settings. Hosts hold it
//! directly and pass it where it is needed.

use crate::config::{SessionConfig, SynthConfig};
use crate::dsl::ScriptBuilder;
use crate::error::Result;
use crate::session::Session;
use crate::settings::{SettingValue, Settings};
use crate::transport::Transport;
use crate::voice::VoiceRouter;
use tracing::debug;

/// Pitch bend value that leaves the pitch unchanged.
pub const PITCHBEND_CENTER: f32 = 64.0;

/// Session, voice router and settings of one subtractive synth.
#[derive(Debug)]
pub struct PolySynth<T: Transport> {
    session: Session<T>,
    router: VoiceRouter,
    settings: Settings,
}

impl<T: Transport> PolySynth<T> {
    /// Open a session, build the voice host graph, load every voice and send
    /// it the full settings.
    pub fn new(transport: T, session_config: &SessionConfig, config: &SynthConfig) -> Result<Self> {
        let mut session = Session::new(transport, session_config)?;
        let channels = session.local_receiver(&config.channels_suffix);

        let host = ScriptBuilder::new()
            .obj("input", &format!("r {}", channels))
            .obj("channels", "channels~")
            .obj("dac", "dac~")
            .obj("waveforms", "subtractor_waveforms")
            .connect("input", "channels")
            .connect("channels", "dac")
            .connect_ports("channels", 1, "dac", 1)
            .build()?;
        session.run_commands(&host)?;

        let router = VoiceRouter::new(channels, config)?;
        router.init_voices(&mut session)?;

        let mut settings = Settings::subtractive();
        settings.set("pitchbend range", SettingValue::Number(config.pitchbend_range))?;

        let mut synth = Self {
            session,
            router,
            settings,
        };
        synth.update_settings()?;
        Ok(synth)
    }

    /// The underlying session.
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    /// The voice router.
    pub fn router(&self) -> &VoiceRouter {
        &self.router
    }

    /// Current parameter values.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Send every setting to every voice.
    pub fn update_settings(&mut self) -> Result<()> {
        for message in self.settings.messages() {
            self.router.broadcast(&mut self.session, &message)?;
        }
        Ok(())
    }

    /// Start `note` on the next voice and return that voice.
    ///
    /// The voice's bend is centered and its volume set before the note starts.
    pub fn note_on(&mut self, note: u8, velocity: u8, volume: f32) -> Result<usize> {
        let voice = self.router.allocate_voice();
        self.pitch_bend(voice, PITCHBEND_CENTER)?;
        self.voice_volume(voice, volume)?;
        self.router
            .unicast(&mut self.session, voice, &format!("{} {}", note, velocity))?;
        debug!(note, velocity, voice, "note on");
        Ok(voice)
    }

    /// Release `note` on `voice`.
    pub fn note_off(&mut self, voice: usize, note: u8) -> Result<()> {
        self.router
            .unicast(&mut self.session, voice, &format!("{} 0", note))
    }

    /// Bend one voice; [`PITCHBEND_CENTER`] is no bend.
    pub fn pitch_bend(&mut self, voice: usize, value: f32) -> Result<()> {
        self.router
            .unicast(&mut self.session, voice, &format!("pitchbend {}", value))
    }

    /// Per-voice volume; negative values are clamped to silence.
    pub fn voice_volume(&mut self, voice: usize, volume: f32) -> Result<()> {
        self.router
            .unicast(&mut self.session, voice, &format!("volume {}", volume.max(0.0)))
    }

    /// Store a parameter and broadcast it.
    pub fn set_parameter(&mut self, name: &str, value: SettingValue) -> Result<()> {
        self.settings.set(name, value)?;
        self.broadcast_setting(name)
    }

    /// Store one slot of a list parameter and broadcast the whole list.
    pub fn set_parameter_element(&mut self, name: &str, index: usize, value: f32) -> Result<()> {
        self.settings.set_element(name, index, value)?;
        self.broadcast_setting(name)
    }

    /// Resize the voice pool.
    pub fn set_voice_count(&mut self, voices: usize) -> Result<()> {
        self.router.resize(&mut self.session, voices)
    }

    fn broadcast_setting(&mut self, name: &str) -> Result<()> {
        let message = self.settings.message(name)?;
        self.router.broadcast(&mut self.session, &message)
    }
}
