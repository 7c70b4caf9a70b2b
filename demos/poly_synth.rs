//! Plays a short arpeggio on the six-voice subtractive synth, then shrinks the
//! pool to three voices.

use pdscript::settings::SettingValue;
use pdscript::synth::PolySynth;
use pdscript::{MemoryTransport, SessionConfig, SynthConfig};

fn main() -> pdscript::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut synth = PolySynth::new(
        MemoryTransport::new(),
        &SessionConfig::default(),
        &SynthConfig::default(),
    )?;

    synth.set_parameter("osc1 set", SettingValue::parse("triangle_table")?)?;
    synth.set_parameter_element("envelope", 3, 800.0)?;

    let octave = 5u8;
    for note in [0u8, 4, 7, 12, 16, 19, 24] {
        let pitch = note + 12 * octave;
        let voice = synth.note_on(pitch, 127, 0.8)?;
        synth.pitch_bend(voice, 70.0)?;
        synth.note_off(voice, pitch)?;
    }

    synth.set_voice_count(3)?;

    let session = synth.session();
    println!(
        "{} messages sent to {}",
        session.transport().sent().len(),
        session.interpreter()
    );
    Ok(())
}
