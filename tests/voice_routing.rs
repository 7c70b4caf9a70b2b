use pdscript::settings::SettingValue;
use pdscript::synth::PolySynth;
use pdscript::{Error, MemoryTransport, Session, SessionConfig, SynthConfig, VoiceRouter};

fn router_with(voices: usize) -> (Session<MemoryTransport>, VoiceRouter) {
    let mut session = Session::new(MemoryTransport::new(), &SessionConfig::default()).unwrap();
    let config = SynthConfig {
        voices,
        ..SynthConfig::default()
    };
    let router = VoiceRouter::new(session.local_receiver(&config.channels_suffix), &config).unwrap();
    session.transport_mut().clear();
    (session, router)
}

fn sent_lines(session: &Session<MemoryTransport>) -> Vec<String> {
    session.transport().lines_to(session.interpreter())
}

#[test]
fn seven_notes_on_six_voices_steal_the_first() {
    let (_, mut router) = router_with(6);
    let allocated: Vec<usize> = (0..7).map(|_| router.allocate_voice()).collect();
    assert_eq!(allocated, vec![0, 1, 2, 3, 4, 5, 0]);
}

#[test]
fn shrinking_to_three_deletes_exactly_the_tail() {
    let (mut session, mut router) = router_with(6);
    router.resize(&mut session, 3).unwrap();
    let deleted: Vec<String> = sent_lines(&session)
        .into_iter()
        .filter(|line| line.contains(" delete "))
        .collect();
    assert_eq!(
        deleted,
        vec![
            "send 1001-channels delete 5",
            "send 1001-channels delete 4",
            "send 1001-channels delete 3",
        ]
    );
    assert_eq!(sent_lines(&session).len(), 3);
}

#[test]
fn resizing_to_same_size_sends_nothing() {
    let (mut session, mut router) = router_with(4);
    router.resize(&mut session, 4).unwrap();
    assert!(sent_lines(&session).is_empty());
}

#[test]
fn failed_resize_tracks_delivered_directives() {
    let (mut session, mut router) = router_with(6);
    session.transport_mut().fail_after(2);
    assert!(matches!(router.resize(&mut session, 2), Err(Error::Transport(_))));
    assert_eq!(router.num_voices(), 4);

    // Broadcasts only reach slots that still exist.
    session.transport_mut().recover();
    session.transport_mut().clear();
    router.broadcast(&mut session, "volume 0.5").unwrap();
    assert_eq!(sent_lines(&session).len(), 4);

    session.transport_mut().clear();
    router.resize(&mut session, 2).unwrap();
    assert_eq!(
        sent_lines(&session),
        vec!["send 1001-channels delete 3", "send 1001-channels delete 2"]
    );
}

#[test]
fn cursor_survives_shrink_below_it() {
    let (mut session, mut router) = router_with(6);
    for _ in 0..4 {
        router.allocate_voice();
    }
    router.resize(&mut session, 2).unwrap();
    let next: Vec<usize> = (0..3).map(|_| router.allocate_voice()).collect();
    assert_eq!(next, vec![0, 1, 0]);
}

#[test]
fn synth_plays_and_rewires_voices() {
    let mut synth = PolySynth::new(
        MemoryTransport::new(),
        &SessionConfig::default(),
        &SynthConfig::default(),
    )
    .unwrap();
    assert_eq!(synth.router().num_voices(), 6);

    let voices: Vec<usize> = (60..67)
        .map(|note| synth.note_on(note, 127, 1.0).unwrap())
        .collect();
    assert_eq!(voices, vec![0, 1, 2, 3, 4, 5, 0]);

    synth.session_mut().transport_mut().clear();
    synth.set_voice_count(4).unwrap();
    synth
        .set_parameter("osc1 set", SettingValue::parse("square_table").unwrap())
        .unwrap();
    let lines = sent_lines(synth.session());
    assert_eq!(lines.len(), 2 + 4);
    assert_eq!(lines[5], "send 1001-channels 3 osc1 set square_table");

    assert!(matches!(
        synth.set_parameter("osc1 set", SettingValue::Number(2.0)),
        Err(Error::SettingMismatch { .. })
    ));
    assert!(matches!(synth.note_off(5, 64), Err(Error::VoiceOutOfRange { voice: 5, voices: 4 })));
}

#[test]
fn negative_volume_is_silence() {
    let mut synth = PolySynth::new(
        MemoryTransport::new(),
        &SessionConfig::default(),
        &SynthConfig::default(),
    )
    .unwrap();
    synth.session_mut().transport_mut().clear();
    synth.voice_volume(2, -0.3).unwrap();
    assert_eq!(sent_lines(synth.session()), vec!["send 1001-channels 2 volume 0"]);
}
