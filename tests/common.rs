//! Test utilities & fixtures.
//! Deterministic random sources and engine builders shared by integration tests.

use cwqso::qso::{BotEngine, Lexicon, QsoType, RandomSource, SessionOptions, ThinkTime};

/// Replays a fixed script of values, cycling when exhausted. Each value is
/// folded into the requested range so any script is valid for any call.
pub struct ScriptedRandom {
    script: Vec<usize>,
    pos: usize,
}

impl ScriptedRandom {
    pub fn new(script: &[usize]) -> Self {
        Self {
            script: script.to_vec(),
            pos: 0,
        }
    }

    /// Always the first entry of every list, the low end of every range.
    #[allow(dead_code)]
    pub fn lowest() -> Self {
        Self::new(&[0])
    }
}

impl RandomSource for ScriptedRandom {
    fn next_in_range(&mut self, low: usize, high: usize) -> usize {
        if high <= low || self.script.is_empty() {
            return low;
        }
        let v = self.script[self.pos % self.script.len()];
        self.pos += 1;
        low + v % (high - low)
    }
}

/// Engine operating as F4BOT with replies delivered immediately.
#[allow(dead_code)]
pub fn engine_as_f4bot(qso_type: QsoType, peer: Option<&str>) -> BotEngine {
    let options = SessionOptions {
        qso_type,
        peer_callsign: peer.map(str::to_string),
        station: Some("F4BOT".into()),
        think_time: ThinkTime { min_ms: 0, max_ms: 0 },
        ..SessionOptions::default()
    };
    BotEngine::new(options, Lexicon::shared(), Box::new(ScriptedRandom::lowest()))
}
