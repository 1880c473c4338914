//! Dialogue orchestration.
//!
//! A [`BotEngine`] plays one simulated station for one operator. Each inbound
//! line is analyzed, peer details are merged into the controller, and the
//! current phase plus the analysis decide the next transition and the text
//! to send back:
//!
//! | phase | condition | reply | next phase |
//! |-------|-----------|-------|------------|
//! | idle | peer sent CQ | answer the CQ | sending_report |
//! | idle | anything else | own CQ | waiting_answer |
//! | calling_cq, waiting_answer | callsign, greeting or `<us> DE` | acknowledge | sending_report |
//! | calling_cq, waiting_answer | otherwise | repeat CQ | unchanged |
//! | received_call, sending_report | any | signal report | receiving_report |
//! | receiving_report | report, name or QTH (contest/dx) | closing | ended |
//! | receiving_report | report, name or QTH | conversation | exchanging_info |
//! | receiving_report | repeat request | resend report | unchanged |
//! | receiving_report | otherwise | prompt for report | unchanged |
//! | exchanging_info | closing words | closing | ended |
//! | exchanging_info | question | answer | unchanged |
//! | exchanging_info | third exchange | closing | ended |
//! | exchanging_info | otherwise | conversation | unchanged |
//! | closing | any | farewell | ended |
//! | ended | any | nothing, new station | idle |
//!
//! The engine is synchronous and never fails on operator text.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::analyzer::{MessageAnalysis, TextAnalyzer};
use super::flow::{PeerInfo, QsoFlowController, QsoPhase, QsoStateView, QsoType};
pub use super::flow::EXCHANGE_CAP;
use super::lexicon::Lexicon;
use super::morse::encode_morse;
use super::profiles::{find_profile, pick_profile, Profile};
use super::responder::{counts_as_exchange, ResponseContext, ResponseGenerator, Utterance};
use super::rng::RandomSource;
use crate::logutil::escape_log;
use crate::metrics;
use crate::validation::{
    normalize_optional_callsign, validate_think_time, ValidationError, MAX_THINK_TIME_MS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        })
    }
}

/// Sending speed the operator asked for; reported back, not interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl FromStr for Speed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            other => Err(format!("unknown speed '{}'", other)),
        }
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        })
    }
}

/// Simulated operator pause before a reply goes out, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThinkTime {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for ThinkTime {
    fn default() -> Self {
        ThinkTime {
            min_ms: 2000,
            max_ms: 5000,
        }
    }
}

impl ThinkTime {
    /// Uniform draw in `min_ms..=max_ms`, both ends capped at
    /// [`MAX_THINK_TIME_MS`].
    pub fn draw(&self, rng: &mut dyn RandomSource) -> Duration {
        let max = self.max_ms.min(MAX_THINK_TIME_MS);
        let min = self.min_ms.min(max);
        if max == min {
            return Duration::from_millis(min);
        }
        let ms = rng.next_in_range(min as usize, max as usize + 1);
        Duration::from_millis(ms as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SessionOptions {
    pub qso_type: QsoType,
    pub difficulty: Difficulty,
    pub speed: Speed,
    /// Operator's own callsign, when known. Used to address the operator.
    pub peer_callsign: Option<String>,
    /// Always operate as this catalog station instead of a random one
    pub station: Option<String>,
    pub think_time: ThinkTime,
}

/// Partial options update; `None` leaves a field alone. For the peer
/// callsign `Some(None)` (or a blank string) clears it.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub qso_type: Option<QsoType>,
    pub difficulty: Option<Difficulty>,
    pub speed: Option<Speed>,
    pub peer_callsign: Option<Option<String>>,
    pub station: Option<Option<String>>,
    pub think_time: Option<ThinkTime>,
}

/// Result of one inbound line.
#[derive(Debug, Clone, Serialize)]
pub struct EngineReply {
    pub analysis: MessageAnalysis,
    pub response_text: Option<String>,
    pub response_morse: Option<String>,
    pub state: QsoStateView,
}

/// Result of the bot opening a QSO on its own.
#[derive(Debug, Clone, Serialize)]
pub struct StartReply {
    pub profile: Profile,
    pub response_text: String,
    pub response_morse: String,
    pub state: QsoStateView,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub profile: Profile,
    pub state: QsoStateView,
    pub options: SessionOptions,
}

pub struct BotEngine {
    options: SessionOptions,
    lexicon: Arc<Lexicon>,
    analyzer: TextAnalyzer,
    responder: ResponseGenerator,
    rng: Box<dyn RandomSource>,
    profile: Profile,
    qso: QsoFlowController,
}

impl BotEngine {
    /// Create an engine operating as the configured station, or a random
    /// one from the lexicon's catalog.
    pub fn new(
        options: SessionOptions,
        lexicon: Arc<Lexicon>,
        mut rng: Box<dyn RandomSource>,
    ) -> Self {
        let profile = match options
            .station
            .as_deref()
            .and_then(|c| find_profile(lexicon.profiles(), c))
        {
            Some(p) => p.clone(),
            None => pick_profile(lexicon.profiles(), rng.as_mut()),
        };
        debug!(
            target: "cwqso::qso",
            "engine.create station={} type={} peer={}",
            profile.callsign,
            options.qso_type,
            options.peer_callsign.as_deref().unwrap_or("-")
        );
        BotEngine {
            options,
            analyzer: TextAnalyzer::new(Arc::clone(&lexicon)),
            responder: ResponseGenerator::new(Arc::clone(&lexicon)),
            lexicon,
            rng,
            profile,
            qso: QsoFlowController::new(),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn controller(&self) -> &QsoFlowController {
        &self.qso
    }

    pub fn phase(&self) -> QsoPhase {
        self.qso.phase()
    }

    pub fn lexicon(&self) -> &Arc<Lexicon> {
        &self.lexicon
    }

    pub fn state(&self) -> QsoStateView {
        self.qso.view(self.options.peer_callsign.as_deref())
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            profile: self.profile.clone(),
            state: self.state(),
            options: self.options.clone(),
        }
    }

    /// Pick a new station and call CQ, abandoning any QSO in progress.
    pub fn start_session(&mut self) -> StartReply {
        self.qso.reset();
        self.change_profile(None);
        let text = self.open_qso(&MessageAnalysis::default());
        StartReply {
            profile: self.profile.clone(),
            response_morse: encode_morse(&text),
            response_text: text,
            state: self.state(),
        }
    }

    /// Process one line from the operator.
    pub fn receive(&mut self, text: &str) -> EngineReply {
        let peer = self.options.peer_callsign.as_deref();
        let analysis = self.analyzer.analyze(text, &self.profile.callsign, peer);
        debug!(
            target: "cwqso::qso",
            "rx text={} phase={} cq={} call={} report={} question={} closing={}",
            escape_log(text),
            self.qso.phase(),
            analysis.detected.is_cq,
            analysis.extracted.callsign.as_deref().unwrap_or("-"),
            analysis.detected.is_report,
            analysis.detected.is_question,
            analysis.detected.is_closing
        );
        if analysis.peer_mismatch(peer) {
            warn!(
                target: "cwqso::qso",
                "peer callsign mismatch configured={} heard={}",
                peer.unwrap_or("-"),
                analysis.extracted.callsign.as_deref().unwrap_or("-")
            );
        }

        let response_text = self.respond(&analysis);
        EngineReply {
            response_morse: response_text.as_deref().map(encode_morse),
            response_text,
            analysis,
            state: self.state(),
        }
    }

    /// Abandon the QSO and switch to a new station. The configured peer
    /// callsign and the other options are kept.
    pub fn reset(&mut self) {
        self.qso.reset();
        self.change_profile(None);
        info!(target: "cwqso::qso", "qso.reset station={}", self.profile.callsign);
    }

    /// Merge an options update. The peer callsign applies from the next line on.
    pub fn configure(&mut self, update: SessionUpdate) -> Result<(), ValidationError> {
        let peer = match &update.peer_callsign {
            Some(raw) => Some(normalize_optional_callsign(raw.as_deref())?),
            None => None,
        };
        if let Some(window) = &update.think_time {
            validate_think_time(window.min_ms, window.max_ms)?;
        }

        if let Some(qso_type) = update.qso_type {
            self.options.qso_type = qso_type;
        }
        if let Some(difficulty) = update.difficulty {
            self.options.difficulty = difficulty;
        }
        if let Some(speed) = update.speed {
            self.options.speed = speed;
        }
        if let Some(peer) = peer {
            self.options.peer_callsign = peer;
        }
        if let Some(station) = update.station {
            self.options.station = station
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty());
        }
        if let Some(window) = update.think_time {
            self.options.think_time = window;
        }
        debug!(
            target: "cwqso::qso",
            "engine.configure type={} difficulty={} speed={} peer={}",
            self.options.qso_type,
            self.options.difficulty,
            self.options.speed,
            self.options.peer_callsign.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    /// Switch station. A known callsign (or the pinned station from the
    /// options) selects that entry; otherwise a random one is drawn.
    pub fn change_profile(&mut self, callsign: Option<&str>) -> &Profile {
        let found = callsign
            .or(self.options.station.as_deref())
            .and_then(|c| find_profile(self.lexicon.profiles(), c).cloned());
        self.profile = match found {
            Some(p) => p,
            None => pick_profile(self.lexicon.profiles(), self.rng.as_mut()),
        };
        &self.profile
    }

    /// Draw the pause before the next reply goes out.
    pub fn think_time(&mut self) -> Duration {
        self.options.think_time.draw(self.rng.as_mut())
    }

    fn respond(&mut self, analysis: &MessageAnalysis) -> Option<String> {
        let phase = self.qso.phase();
        match phase {
            QsoPhase::Idle => return Some(self.open_qso(analysis)),
            QsoPhase::Ended => {
                self.qso.reset();
                self.change_profile(None);
                metrics::inc_implicit_resets();
                info!(
                    target: "cwqso::qso",
                    "qso.restart station={} (message after end)",
                    self.profile.callsign
                );
                return None;
            }
            _ => {}
        }

        self.record_peer(analysis);
        let count = if counts_as_exchange(phase, analysis) {
            self.qso.increment_exchange()
        } else {
            self.qso.exchange_count()
        };
        let utterance = Utterance::for_phase(phase, self.qso.qso_type(), count, analysis)?;
        let text = self.say(utterance, analysis);

        match (phase, utterance) {
            (QsoPhase::CallingCq | QsoPhase::WaitingAnswer, Utterance::Acknowledge) => {
                self.qso
                    .transition(QsoPhase::ReceivedCall, json!({ "reason": "answered" }));
                self.qso.transition(QsoPhase::SendingReport, Value::Null);
            }
            (QsoPhase::ReceivedCall | QsoPhase::SendingReport, _) => {
                self.qso.transition(QsoPhase::ReceivingReport, Value::Null);
            }
            (QsoPhase::ReceivingReport, Utterance::Conversation) => {
                self.qso.transition(QsoPhase::ExchangingInfo, Value::Null);
            }
            (QsoPhase::ReceivingReport | QsoPhase::ExchangingInfo, Utterance::Closing) => {
                let reason = if phase == QsoPhase::ReceivingReport {
                    "report_received"
                } else if analysis.detected.is_closing {
                    "peer_closing"
                } else {
                    "exchange_cap"
                };
                self.qso
                    .transition(QsoPhase::Closing, json!({ "reason": reason }));
                self.finish();
            }
            (QsoPhase::Closing, _) => self.finish(),
            _ => {}
        }
        Some(text)
    }

    /// Start a QSO from idle: answer a CQ or call one.
    fn open_qso(&mut self, analysis: &MessageAnalysis) -> String {
        self.qso
            .start_qso(&self.profile, self.options.qso_type, self.rng.as_mut());
        metrics::inc_qsos_started();
        info!(
            target: "cwqso::qso",
            "qso.start station={} type={} initiator={}",
            self.profile.callsign,
            self.options.qso_type,
            if analysis.detected.is_cq { "peer" } else { "bot" }
        );
        self.record_peer(analysis);

        let utterance = Utterance::for_phase(QsoPhase::Idle, self.qso.qso_type(), 0, analysis)
            .unwrap_or(Utterance::CqCall);
        let text = self.say(utterance, analysis);
        if utterance == Utterance::AnswerCq {
            self.qso
                .transition(QsoPhase::ReceivedCall, json!({ "reason": "peer_cq" }));
            self.qso.transition(QsoPhase::SendingReport, Value::Null);
        } else {
            self.qso.transition(QsoPhase::WaitingAnswer, Value::Null);
        }
        text
    }

    fn finish(&mut self) {
        self.qso.transition(QsoPhase::Ended, Value::Null);
        metrics::inc_qsos_completed();
        info!(
            target: "cwqso::qso",
            "qso.end station={} peer={} exchanges={} duration_ms={}",
            self.profile.callsign,
            self.qso.peer_info().callsign.as_deref().unwrap_or("-"),
            self.qso.exchange_count(),
            self.qso.duration().num_milliseconds()
        );
    }

    /// Merge what the line told us about the peer. Only a line that named
    /// a station or called us records a callsign; the configured peer
    /// callsign then wins over the one heard.
    fn record_peer(&mut self, analysis: &MessageAnalysis) {
        let extracted = &analysis.extracted;
        let heard = extracted.callsign.is_some() || analysis.detected.is_calling_self;
        let callsign = if heard {
            self.options
                .peer_callsign
                .clone()
                .or_else(|| extracted.callsign.clone())
        } else {
            None
        };
        self.qso.record_peer_info(PeerInfo {
            callsign,
            name: extracted.name.clone(),
            qth: extracted.qth.clone(),
            rst: extracted.rst.clone(),
        });
    }

    fn say(&mut self, utterance: Utterance, analysis: &MessageAnalysis) -> String {
        let ctx = ResponseContext {
            profile: &self.profile,
            qso_type: self.qso.qso_type(),
            peer: self.qso.peer_info(),
            self_info: self.qso.self_info(),
            configured_peer: self.options.peer_callsign.as_deref(),
        };
        self.responder
            .render(utterance, &ctx, analysis, self.rng.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qso::rng::StdRandom;

    /// Always returns the low end of the range.
    struct Lowest;

    impl RandomSource for Lowest {
        fn next_in_range(&mut self, low: usize, _high: usize) -> usize {
            low
        }
    }

    fn engine(qso_type: QsoType, peer: Option<&str>) -> BotEngine {
        let options = SessionOptions {
            qso_type,
            peer_callsign: peer.map(str::to_string),
            ..SessionOptions::default()
        };
        BotEngine::new(options, Lexicon::shared(), Box::new(StdRandom::seeded(42)))
    }

    /// Drive a fresh engine to `receiving_report` as station F4BOT.
    fn at_receiving_report(qso_type: QsoType) -> BotEngine {
        let mut e = engine(qso_type, None);
        e.change_profile(Some("F4BOT"));
        e.receive("HELLO");
        assert_eq!(e.phase(), QsoPhase::WaitingAnswer);
        e.receive("F4BOT DE F4ABC");
        e.receive("GM");
        assert_eq!(e.phase(), QsoPhase::ReceivingReport);
        e
    }

    /// Station F4BOT, operator F4ABC, deterministic template choice.
    fn scripted_engine() -> BotEngine {
        let options = SessionOptions {
            peer_callsign: Some("F4ABC".into()),
            station: Some("F4BOT".into()),
            ..SessionOptions::default()
        };
        BotEngine::new(options, Lexicon::shared(), Box::new(Lowest))
    }

    /// Feed `line` to the engine and check the reply against what the
    /// generator produces for the same phase and line.
    fn assert_generator_agrees(e: &mut BotEngine, line: &str) -> (QsoPhase, Option<String>) {
        let phase = e.phase();
        let peer = e.options.peer_callsign.clone();
        let analysis = e
            .analyzer
            .analyze(line, &e.profile.callsign, peer.as_deref());
        let count = e.qso.exchange_count() + u32::from(counts_as_exchange(phase, &analysis));
        let ctx = ResponseContext {
            profile: &e.profile,
            qso_type: e.options.qso_type,
            peer: e.qso.peer_info(),
            self_info: e.qso.self_info(),
            configured_peer: peer.as_deref(),
        };
        let expected = e
            .responder
            .generate(phase, &ctx, count, &analysis, &mut Lowest);
        let reply = e.receive(line);
        assert_eq!(reply.response_text, expected, "phase {} line {:?}", phase, line);
        (phase, reply.response_text)
    }

    #[test]
    fn generator_matches_engine_in_every_phase() {
        let mut e = scripted_engine();
        let mut seen = Vec::new();
        for line in [
            "HELLO",
            "QRM",
            "F4BOT DE F4ABC",
            "GM",
            "QRM",
            "RST 579 NAME BOB",
            "HW WX?",
            "73 SK",
            "73",
        ] {
            seen.push(assert_generator_agrees(&mut e, line).0);
        }
        assert_eq!(e.phase(), QsoPhase::Idle);

        e.receive("HELLO");
        e.qso.transition(QsoPhase::CallingCq, Value::Null);
        seen.push(assert_generator_agrees(&mut e, "F4BOT DE F4ABC").0);
        e.qso.transition(QsoPhase::ReceivedCall, Value::Null);
        let (phase, report) = assert_generator_agrees(&mut e, "GM");
        seen.push(phase);
        assert!(report.is_some_and(|r| r.starts_with("UR RST")));
        e.qso.transition(QsoPhase::Closing, Value::Null);
        let (phase, farewell) = assert_generator_agrees(&mut e, "73");
        seen.push(phase);
        assert!(farewell.is_some_and(|f| !f.contains("TNX FER QSO")));
        assert_eq!(e.phase(), QsoPhase::Ended);

        for phase in [
            QsoPhase::Idle,
            QsoPhase::CallingCq,
            QsoPhase::WaitingAnswer,
            QsoPhase::ReceivedCall,
            QsoPhase::SendingReport,
            QsoPhase::ReceivingReport,
            QsoPhase::ExchangingInfo,
            QsoPhase::Closing,
            QsoPhase::Ended,
        ] {
            assert!(seen.contains(&phase), "{} not exercised", phase);
        }
    }

    #[test]
    fn peer_callsign_only_recorded_when_heard() {
        let mut e = scripted_engine();
        let start = e.start_session();
        assert_eq!(start.state.peer_info.callsign, None);
        assert_eq!(start.state.configured_peer_callsign.as_deref(), Some("F4ABC"));
        assert!(start.response_text.starts_with("CQ"));

        assert_eq!(e.receive("QRM").state.peer_info.callsign, None);
        let answered = e.receive("F4BOT DE");
        assert_eq!(answered.state.peer_info.callsign.as_deref(), Some("F4ABC"));
    }

    #[test]
    fn unconfigured_peer_stays_unknown_without_a_callsign() {
        let options = SessionOptions {
            station: Some("F4BOT".into()),
            ..SessionOptions::default()
        };
        let mut e = BotEngine::new(options, Lexicon::shared(), Box::new(Lowest));
        e.start_session();
        let reply = e.receive("F4BOT DE");
        assert_eq!(reply.state.phase, QsoPhase::SendingReport);
        assert_eq!(reply.state.peer_info.callsign, None);
        assert!(reply.response_text.unwrap().starts_with("OM DE F4BOT"));
    }

    #[test]
    fn start_session_calls_cq() {
        let mut e = engine(QsoType::Casual, None);
        let start = e.start_session();
        assert_eq!(start.state.phase, QsoPhase::WaitingAnswer);
        assert!(start.response_text.starts_with("CQ"));
        assert!(start.response_text.contains(&start.profile.callsign));
        assert_eq!(start.response_morse, encode_morse(&start.response_text));
    }

    #[test]
    fn peer_cq_is_answered() {
        let mut e = engine(QsoType::Casual, None);
        let reply = e.receive("CQ CQ DE DL1XYZ K");
        assert_eq!(reply.state.phase, QsoPhase::SendingReport);
        let text = reply.response_text.unwrap();
        assert!(text.starts_with("DL1XYZ"), "{}", text);
        assert_eq!(reply.state.peer_info.callsign.as_deref(), Some("DL1XYZ"));
    }

    #[test]
    fn unrelated_line_repeats_cq() {
        let mut e = engine(QsoType::Casual, None);
        e.start_session();
        let reply = e.receive("QRM");
        assert_eq!(reply.state.phase, QsoPhase::WaitingAnswer);
        assert!(reply.response_text.unwrap().contains("CQ"));
    }

    #[test]
    fn contest_closes_after_report() {
        let mut e = at_receiving_report(QsoType::Contest);
        let reply = e.receive("TU 5NN 001");
        assert_eq!(reply.state.phase, QsoPhase::Ended);
        assert_eq!(reply.state.exchange_count, 1);
        assert!(!e
            .controller()
            .history()
            .iter()
            .any(|h| h.phase == QsoPhase::ExchangingInfo));
    }

    #[test]
    fn casual_exchange_cap() {
        let mut e = at_receiving_report(QsoType::Casual);
        assert_eq!(
            e.receive("UR RST 579 NAME BOB").state.phase,
            QsoPhase::ExchangingInfo
        );
        assert_eq!(e.receive("NICE SIG").state.exchange_count, 2);
        let last = e.receive("NICE SIG");
        assert_eq!(last.state.exchange_count, 3);
        assert_eq!(last.state.phase, QsoPhase::Ended);
    }

    #[test]
    fn repeat_request_resends_report() {
        let mut e = at_receiving_report(QsoType::Casual);
        let reply = e.receive("PSE AGN");
        assert_eq!(reply.state.phase, QsoPhase::ReceivingReport);
        assert!(reply.response_text.unwrap().contains("NAME"));
    }

    #[test]
    fn message_after_end_restarts_silently() {
        let mut e = engine(QsoType::Contest, Some("F4ABC"));
        e.change_profile(Some("F4BOT"));
        e.receive("QRL?");
        e.receive("F4BOT DE F4ABC");
        e.receive("R");
        e.receive("5NN 001");
        assert_eq!(e.phase(), QsoPhase::Ended);

        let reply = e.receive("73");
        assert_eq!(reply.response_text, None);
        assert_eq!(reply.response_morse, None);
        assert_eq!(reply.state.phase, QsoPhase::Idle);
        assert_eq!(reply.state.configured_peer_callsign.as_deref(), Some("F4ABC"));

        let next = e.receive("HELLO");
        assert_eq!(next.state.phase, QsoPhase::WaitingAnswer);
    }

    #[test]
    fn configure_validates_and_merges() {
        let mut e = engine(QsoType::Casual, None);
        e.configure(SessionUpdate {
            peer_callsign: Some(Some("k1zz".into())),
            speed: Some(Speed::Fast),
            ..SessionUpdate::default()
        })
        .unwrap();
        assert_eq!(e.options().peer_callsign.as_deref(), Some("K1ZZ"));
        assert_eq!(e.options().speed, Speed::Fast);
        assert_eq!(e.options().qso_type, QsoType::Casual);

        let bad = e.configure(SessionUpdate {
            think_time: Some(ThinkTime { min_ms: 10, max_ms: 1 }),
            qso_type: Some(QsoType::Dx),
            ..SessionUpdate::default()
        });
        assert!(bad.is_err());
        assert_eq!(e.options().qso_type, QsoType::Casual);

        e.configure(SessionUpdate {
            peer_callsign: Some(None),
            ..SessionUpdate::default()
        })
        .unwrap();
        assert_eq!(e.options().peer_callsign, None);
    }

    #[test]
    fn change_profile_by_callsign() {
        let mut e = engine(QsoType::Casual, None);
        assert_eq!(e.change_profile(Some("sm5orm")).callsign, "SM5ORM");
        // Unknown callsign falls back to a random catalog entry
        let p = e.change_profile(Some("ZZ9ZZ")).clone();
        assert!(e.lexicon().profiles().contains(&p));
    }

    #[test]
    fn pinned_station_survives_reset() {
        let options = SessionOptions {
            station: Some("G3TEST".into()),
            ..SessionOptions::default()
        };
        let mut e = BotEngine::new(options, Lexicon::shared(), Box::new(StdRandom::seeded(8)));
        assert_eq!(e.profile().callsign, "G3TEST");
        e.start_session();
        e.reset();
        assert_eq!(e.profile().callsign, "G3TEST");
        assert_eq!(e.snapshot().options.station.as_deref(), Some("G3TEST"));
    }

    #[test]
    fn think_time_stays_in_window() {
        let mut e = engine(QsoType::Casual, None);
        for _ in 0..50 {
            let d = e.think_time().as_millis();
            assert!((2000..=5000).contains(&d));
        }
        let fixed = ThinkTime { min_ms: 300, max_ms: 300 };
        assert_eq!(fixed.draw(&mut StdRandom::seeded(1)), Duration::from_millis(300));
    }

    #[test]
    fn unvalidated_think_time_is_capped() {
        let cap = Duration::from_millis(MAX_THINK_TIME_MS);
        let mut rng = StdRandom::seeded(5);
        let wide = ThinkTime { min_ms: 0, max_ms: u64::MAX };
        for _ in 0..20 {
            assert!(wide.draw(&mut rng) <= cap);
        }
        let huge = ThinkTime { min_ms: u64::MAX, max_ms: u64::MAX };
        assert_eq!(huge.draw(&mut rng), cap);
        let inverted = ThinkTime { min_ms: u64::MAX, max_ms: 10 };
        assert_eq!(inverted.draw(&mut rng), Duration::from_millis(10));
    }

    #[test]
    fn option_enums_parse() {
        assert_eq!("Advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
        assert_eq!("slow".parse::<Speed>(), Ok(Speed::Slow));
        assert!("warp".parse::<Speed>().is_err());
        assert_eq!(Speed::default().to_string(), "normal");
    }
}
