//! Voice routing over a `channels~` style multiplexer.
//!
//! The router owns a fixed pool of voice slots addressed by index. Messages
//! for a voice are prefixed with its index and sent to the channel router's
//! receiver through [`Session::send`], so they are re-emitted from inside the
//! patch.
//!
//! Allocation is plain round-robin. Nothing tracks which notes are still
//! sounding: when the cursor wraps, the oldest slot is handed out again even if
//! its note is still ringing. Callers that care about audible stealing keep
//! their own note-to-voice map.

use crate::config::SynthConfig;
use crate::error::{Error, Result};
use crate::invariant_ppt::{
    assert_invariant, BROADCAST_COVERS_POOL, VOICE_CURSOR_BOUNDED, VOICE_RESIZE_EXACT,
};
use crate::session::Session;
use crate::transport::Transport;
use tracing::{debug, trace};

/// Round-robin voice allocator and message fan-out.
#[derive(Debug, Clone)]
pub struct VoiceRouter {
    receiver: String,
    synth_type: String,
    channel_layout: String,
    num_voices: usize,
    next_voice: usize,
}

impl VoiceRouter {
    /// Router for the channel object listening on `receiver`.
    ///
    /// No directives are sent; call [`VoiceRouter::init_voices`] once the
    /// channel object exists.
    pub fn new(receiver: impl Into<String>, config: &SynthConfig) -> Result<Self> {
        if config.voices == 0 {
            return Err(Error::InvalidVoiceCount(0));
        }
        Ok(Self {
            receiver: receiver.into(),
            synth_type: config.synth_type.clone(),
            channel_layout: config.channel_layout.clone(),
            num_voices: config.voices,
            next_voice: 0,
        })
    }

    /// Receiver of the channel object.
    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    /// Slots the engine currently holds.
    pub fn num_voices(&self) -> usize {
        self.num_voices
    }

    /// Index the next call to [`VoiceRouter::allocate_voice`] returns.
    pub fn next_voice(&self) -> usize {
        self.next_voice
    }

    /// Load the synth into every slot of the pool.
    pub fn init_voices<T: Transport>(&self, session: &mut Session<T>) -> Result<()> {
        for voice in 0..self.num_voices {
            self.init_voice(session, voice)?;
        }
        Ok(())
    }

    /// Hand out the next voice, wrapping (and stealing) at the end of the pool.
    pub fn allocate_voice(&mut self) -> usize {
        let voice = self.next_voice;
        self.next_voice = (self.next_voice + 1) % self.num_voices;
        assert_invariant(
            VOICE_CURSOR_BOUNDED,
            voice < self.num_voices && self.next_voice < self.num_voices,
            "voice cursor stays inside the pool",
            None,
        );
        trace!(voice, "allocated voice");
        voice
    }

    /// Grow or shrink the pool.
    ///
    /// Shrinking deletes slots `new_count..old` from the top down, growing
    /// initializes `old..new_count` in order. The pool size follows every
    /// delivered directive, so after a failure it still matches the slots the
    /// engine holds and retrying sends only what is left. The cursor is
    /// re-wrapped into the pool either way.
    pub fn resize<T: Transport>(&mut self, session: &mut Session<T>, new_count: usize) -> Result<()> {
        if new_count == 0 {
            return Err(Error::InvalidVoiceCount(new_count));
        }
        let old_count = self.num_voices;
        let stepped = self.step_towards(session, new_count);
        self.next_voice %= self.num_voices;
        let directives = match stepped {
            Ok(directives) => directives,
            Err(err) => {
                debug!(old_count, new_count, reached = self.num_voices, "voice pool resize interrupted");
                return Err(err);
            }
        };
        assert_invariant(
            VOICE_RESIZE_EXACT,
            directives == old_count.abs_diff(new_count) && self.num_voices == new_count,
            "one directive per added or removed voice",
            None,
        );
        debug!(old_count, new_count, next_voice = self.next_voice, "resized voice pool");
        Ok(())
    }

    fn step_towards<T: Transport>(&mut self, session: &mut Session<T>, new_count: usize) -> Result<usize> {
        let mut directives = 0usize;
        while self.num_voices > new_count {
            let voice = self.num_voices - 1;
            session.send(&self.receiver, &format!("delete {}", voice))?;
            self.num_voices = voice;
            directives += 1;
        }
        while self.num_voices < new_count {
            let voice = self.num_voices;
            self.init_voice(session, voice)?;
            self.num_voices = voice + 1;
            directives += 1;
        }
        Ok(directives)
    }

    /// Send `message` to every voice, lowest index first.
    pub fn broadcast<T: Transport>(&self, session: &mut Session<T>, message: &str) -> Result<()> {
        let mut reached = 0usize;
        for voice in 0..self.num_voices {
            session.send(&self.receiver, &format!("{} {}", voice, message))?;
            reached += 1;
        }
        assert_invariant(
            BROADCAST_COVERS_POOL,
            reached == self.num_voices,
            "broadcast reached every voice",
            Some(message),
        );
        Ok(())
    }

    /// Send `message` to one voice.
    pub fn unicast<T: Transport>(
        &self,
        session: &mut Session<T>,
        voice: usize,
        message: &str,
    ) -> Result<()> {
        if voice >= self.num_voices {
            return Err(Error::VoiceOutOfRange {
                voice,
                voices: self.num_voices,
            });
        }
        session.send(&self.receiver, &format!("{} {}", voice, message))
    }

    fn init_voice<T: Transport>(&self, session: &mut Session<T>, voice: usize) -> Result<()> {
        session.send(
            &self.receiver,
            &format!("init {} {} {}", voice, self.channel_layout, self.synth_type),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::transport::MemoryTransport;

    fn setup(voices: usize) -> (Session<MemoryTransport>, VoiceRouter) {
        let mut session = Session::new(MemoryTransport::new(), &SessionConfig::default()).unwrap();
        let config = SynthConfig {
            voices,
            ..SynthConfig::default()
        };
        let router = VoiceRouter::new(session.local_receiver("channels"), &config).unwrap();
        session.transport_mut().clear();
        (session, router)
    }

    fn lines(session: &Session<MemoryTransport>) -> Vec<String> {
        session.transport().lines_to(session.interpreter())
    }

    #[test]
    fn round_robin_wraps() {
        let (_, mut router) = setup(6);
        let voices: Vec<usize> = (0..7).map(|_| router.allocate_voice()).collect();
        assert_eq!(voices, vec![0, 1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn shrink_deletes_tail() {
        let (mut session, mut router) = setup(6);
        router.resize(&mut session, 3).unwrap();
        assert_eq!(
            lines(&session),
            vec![
                "send 1001-channels delete 5",
                "send 1001-channels delete 4",
                "send 1001-channels delete 3",
            ]
        );
        assert_eq!(router.num_voices(), 3);
    }

    #[test]
    fn interrupted_shrink_keeps_delivered_deletes() {
        let (mut session, mut router) = setup(6);
        for _ in 0..5 {
            router.allocate_voice();
        }
        session.transport_mut().fail_after(2);
        assert!(matches!(router.resize(&mut session, 2), Err(Error::Transport(_))));
        assert_eq!(router.num_voices(), 4);
        assert_eq!(router.next_voice(), 1);
        assert_eq!(
            router.unicast(&mut session, 4, "60 0"),
            Err(Error::VoiceOutOfRange { voice: 4, voices: 4 })
        );

        session.transport_mut().recover();
        session.transport_mut().clear();
        router.resize(&mut session, 2).unwrap();
        assert_eq!(
            lines(&session),
            vec!["send 1001-channels delete 3", "send 1001-channels delete 2"]
        );
        assert_eq!(router.num_voices(), 2);
    }

    #[test]
    fn interrupted_grow_counts_initialized_slots() {
        let (mut session, mut router) = setup(2);
        session.transport_mut().fail_after(1);
        assert!(router.resize(&mut session, 5).is_err());
        assert_eq!(router.num_voices(), 3);

        session.transport_mut().recover();
        session.transport_mut().clear();
        router.resize(&mut session, 5).unwrap();
        assert_eq!(
            lines(&session),
            vec![
                "send 1001-channels init 3 stereo subtractive_synth",
                "send 1001-channels init 4 stereo subtractive_synth",
            ]
        );
    }

    #[test]
    fn grow_inits_new_slots() {
        let (mut session, mut router) = setup(2);
        router.resize(&mut session, 4).unwrap();
        assert_eq!(
            lines(&session),
            vec![
                "send 1001-channels init 2 stereo subtractive_synth",
                "send 1001-channels init 3 stereo subtractive_synth",
            ]
        );
    }

    #[test]
    fn shrink_rewraps_cursor() {
        let (mut session, mut router) = setup(6);
        for _ in 0..5 {
            router.allocate_voice();
        }
        assert_eq!(router.next_voice(), 5);
        router.resize(&mut session, 3).unwrap();
        assert_eq!(router.next_voice(), 2);
        assert_eq!(router.allocate_voice(), 2);
        assert_eq!(router.allocate_voice(), 0);
    }

    #[test]
    fn zero_voices_rejected() {
        let (mut session, mut router) = setup(4);
        assert_eq!(router.resize(&mut session, 0), Err(Error::InvalidVoiceCount(0)));
        assert_eq!(router.num_voices(), 4);
        assert!(lines(&session).is_empty());
    }

    #[test]
    fn broadcast_and_unicast() {
        let (mut session, router) = setup(3);
        router.broadcast(&mut session, "osc1 phase 0.5").unwrap();
        router.unicast(&mut session, 1, "60 127").unwrap();
        assert_eq!(
            lines(&session),
            vec![
                "send 1001-channels 0 osc1 phase 0.5",
                "send 1001-channels 1 osc1 phase 0.5",
                "send 1001-channels 2 osc1 phase 0.5",
                "send 1001-channels 1 60 127",
            ]
        );
        assert_eq!(
            router.unicast(&mut session, 3, "60 0"),
            Err(Error::VoiceOutOfRange { voice: 3, voices: 3 })
        );
    }
}
