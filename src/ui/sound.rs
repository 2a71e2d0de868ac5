/// Sound engine: procedural chiptune cues via rodio.
///
/// Every cue is synthesised into an in-memory WAV buffer at startup and
/// played fire-and-forget on a detached Sink. The core never waits on it.
///
/// Build without the "sound" feature to get the silent stub engine.

use crate::sim::event::GameEvent;

/// The five audio cues the core can trigger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    Pellet,
    Energizer,
    GhostEaten,
    Death,
    Win,
}

impl Cue {
    pub const ALL: [Cue; 5] = [Cue::Pellet, Cue::Energizer, Cue::GhostEaten, Cue::Death, Cue::Win];

    pub fn for_event(event: &GameEvent) -> Option<Cue> {
        match event {
            GameEvent::PelletEaten { .. } | GameEvent::BonusEaten { .. } => Some(Cue::Pellet),
            GameEvent::EnergizerEaten { .. } => Some(Cue::Energizer),
            GameEvent::GhostEaten { .. } => Some(Cue::GhostEaten),
            GameEvent::PlayerDied { .. } => Some(Cue::Death),
            GameEvent::LevelWon { .. } => Some(Cue::Win),
            _ => None,
        }
    }

    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    fn index(self) -> usize {
        self as usize
    }
}

/// One cue per event kind per tick; several pellets in a tick chirp once.
pub fn cues_for(events: &[GameEvent]) -> Vec<Cue> {
    let mut cues: Vec<Cue> = Vec::new();
    for cue in events.iter().filter_map(Cue::for_event) {
        if !cues.contains(&cue) {
            cues.push(cue);
        }
    }
    cues
}

#[cfg(feature = "sound")]
mod inner {
    use std::cell::Cell;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::Cue;

    const SAMPLE_RATE: u32 = 22050;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<Vec<u8>>>,
        /// Second half of the two-tone pellet chomp.
        chomp_low: Arc<Vec<u8>>,
        chomp_flip: Cell<bool>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            let buffers = Cue::ALL
                .iter()
                .map(|&cue| Arc::new(encode_wav(&synth(cue))))
                .collect();
            Some(SoundEngine {
                _stream: stream,
                handle,
                buffers,
                chomp_low: Arc::new(encode_wav(&sweep(330.0, 220.0, 0.06, 0.2))),
                chomp_flip: Cell::new(false),
            })
        }

        pub fn play(&self, cue: Cue) {
            if cue == Cue::Pellet {
                let flip = !self.chomp_flip.get();
                self.chomp_flip.set(flip);
                if flip {
                    self.emit(&self.chomp_low);
                    return;
                }
            }
            if let Some(buf) = self.buffers.get(cue.index()) {
                self.emit(buf);
            }
        }

        fn emit(&self, buf: &Arc<Vec<u8>>) {
            let Ok(sink) = Sink::try_new(&self.handle) else {
                return;
            };
            if let Ok(src) = rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                sink.append(src);
                sink.detach();
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Synthesis
    // ════════════════════════════════════════════════════════════

    fn synth(cue: Cue) -> Vec<f32> {
        match cue {
            Cue::Pellet => sweep(220.0, 330.0, 0.06, 0.2),
            Cue::Energizer => {
                let mut s = sweep(200.0, 800.0, 0.12, 0.25);
                s.extend(sweep(800.0, 200.0, 0.12, 0.25));
                s
            }
            Cue::GhostEaten => sweep(300.0, 1500.0, 0.18, 0.25),
            Cue::Death => {
                let mut s = sweep(900.0, 120.0, 0.6, 0.3);
                fade_tail(&mut s, 4);
                s
            }
            Cue::Win => notes(&[(523.0, 0.1), (659.0, 0.1), (784.0, 0.1), (1047.0, 0.3)], 0.3),
        }
    }

    /// Square-ish tone gliding from `from` to `to` Hz.
    fn sweep(from: f32, to: f32, secs: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * secs) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                phase += (from + (to - from) * t) / SAMPLE_RATE as f32;
                let wave = (phase * TAU).sin() * 0.7 + (phase * 3.0 * TAU).sin() * 0.3;
                wave * (1.0 - t).sqrt() * volume
            })
            .collect()
    }

    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, secs) in seq {
            let n = (SAMPLE_RATE as f32 * secs) as usize;
            out.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.4;
                ((t * freq * TAU).sin() * 0.7 + (t * freq * 2.0 * TAU).sin() * 0.3) * env * volume
            }));
        }
        out
    }

    /// Linear fade over the last `1/part` of the samples.
    fn fade_tail(samples: &mut [f32], part: usize) {
        let total = samples.len();
        let len = total / part.max(1);
        for (k, s) in samples[total - len..].iter_mut().enumerate() {
            *s *= 1.0 - k as f32 / len.max(1) as f32;
        }
    }

    // ════════════════════════════════════════════════════════════
    //  16-bit mono PCM WAV
    // ════════════════════════════════════════════════════════════

    fn encode_wav(samples: &[f32]) -> Vec<u8> {
        let data_len = samples.len() as u32 * 2;
        let mut buf = Vec::with_capacity(44 + data_len as usize);
        let mut put = |bytes: &[u8]| buf.extend_from_slice(bytes);

        put(b"RIFF");
        put(&(36 + data_len).to_le_bytes());
        put(b"WAVEfmt ");
        put(&16u32.to_le_bytes());
        put(&1u16.to_le_bytes()); // PCM
        put(&1u16.to_le_bytes()); // mono
        put(&SAMPLE_RATE.to_le_bytes());
        put(&(SAMPLE_RATE * 2).to_le_bytes());
        put(&2u16.to_le_bytes());
        put(&16u16.to_le_bytes());
        put(b"data");
        put(&data_len.to_le_bytes());
        for &s in samples {
            put(&((s.clamp(-1.0, 1.0) * 32767.0) as i16).to_le_bytes());
        }
        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> {
        Some(SoundEngine)
    }
    pub fn play(&self, _cue: Cue) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Cell;

    #[test]
    fn events_map_to_cues() {
        assert_eq!(Cue::for_event(&GameEvent::GhostEaten { id: 2 }), Some(Cue::GhostEaten));
        assert_eq!(Cue::for_event(&GameEvent::PlayerRespawned), None);
        assert_eq!(Cue::for_event(&GameEvent::NewHighScore { score: 9 }), None);
    }

    #[test]
    fn duplicate_cues_collapse() {
        let events = [
            GameEvent::PelletEaten { cell: Cell::new(1, 1) },
            GameEvent::PelletEaten { cell: Cell::new(2, 1) },
            GameEvent::PlayerDied { lives_left: 1 },
        ];
        assert_eq!(cues_for(&events), vec![Cue::Pellet, Cue::Death]);
    }
}
