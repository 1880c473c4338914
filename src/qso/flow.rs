//! QSO progress tracking.
//!
//! [`QsoFlowController`] owns the phase, the exchange counter, what we know
//! about both stations and an append-only event history. The orchestrator
//! drives it through named operations only; deciding *which* transition to
//! take lives in the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use super::lexicon::SELF_RST;
use super::profiles::Profile;
use super::rng::{choose, RandomSource};

/// Exchanges after which the bot closes a conversational QSO on its own.
pub const EXCHANGE_CAP: u32 = 3;

/// Phase of a QSO. `Idle` is initial, `Ended` terminal until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QsoPhase {
    #[default]
    Idle,
    CallingCq,
    WaitingAnswer,
    ReceivedCall,
    SendingReport,
    ReceivingReport,
    ExchangingInfo,
    Closing,
    Ended,
}

impl QsoPhase {
    pub const ALL: [QsoPhase; 9] = [
        QsoPhase::Idle,
        QsoPhase::CallingCq,
        QsoPhase::WaitingAnswer,
        QsoPhase::ReceivedCall,
        QsoPhase::SendingReport,
        QsoPhase::ReceivingReport,
        QsoPhase::ExchangingInfo,
        QsoPhase::Closing,
        QsoPhase::Ended,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CallingCq => "calling_cq",
            Self::WaitingAnswer => "waiting_answer",
            Self::ReceivedCall => "received_call",
            Self::SendingReport => "sending_report",
            Self::ReceivingReport => "receiving_report",
            Self::ExchangingInfo => "exchanging_info",
            Self::Closing => "closing",
            Self::Ended => "ended",
        }
    }

    /// Parse a phase label; anything unrecognised is treated as `Idle`.
    pub fn from_label(label: &str) -> Self {
        let wanted = label.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.label() == wanted)
            .unwrap_or(QsoPhase::Idle)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Ended)
    }
}

impl fmt::Display for QsoPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of contact being simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QsoType {
    #[default]
    Casual,
    Contest,
    Dx,
    Ragchew,
    Training,
}

impl QsoType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Contest => "contest",
            Self::Dx => "dx",
            Self::Ragchew => "ragchew",
            Self::Training => "training",
        }
    }

    /// Contest and DX contacts close right after the report exchange.
    pub fn is_minimal_exchange(&self) -> bool {
        matches!(self, Self::Contest | Self::Dx)
    }
}

impl fmt::Display for QsoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QsoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "casual" => Ok(Self::Casual),
            "contest" => Ok(Self::Contest),
            "dx" => Ok(Self::Dx),
            "ragchew" => Ok(Self::Ragchew),
            "training" => Ok(Self::Training),
            other => Err(format!("unknown QSO type '{}'", other)),
        }
    }
}

/// What we have learned about the other station.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub callsign: Option<String>,
    pub name: Option<String>,
    pub qth: Option<String>,
    pub rst: Option<String>,
}

/// Our own side of the exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfInfo {
    pub callsign: Option<String>,
    pub name: Option<String>,
    pub qth: Option<String>,
    pub rst: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub phase: QsoPhase,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QsoState {
    pub phase: QsoPhase,
    pub qso_type: QsoType,
    pub exchange_count: u32,
    pub peer_info: PeerInfo,
    pub self_info: SelfInfo,
    pub started_at: Option<DateTime<Utc>>,
    pub last_activity_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
}

impl QsoState {
    fn fresh() -> Self {
        QsoState {
            phase: QsoPhase::Idle,
            qso_type: QsoType::Casual,
            exchange_count: 0,
            peer_info: PeerInfo::default(),
            self_info: SelfInfo::default(),
            started_at: None,
            last_activity_at: Utc::now(),
            history: Vec::new(),
        }
    }
}

/// Snapshot handed across the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QsoStateView {
    pub phase: QsoPhase,
    pub qso_type: QsoType,
    pub exchange_count: u32,
    pub peer_info: PeerInfo,
    pub self_info: SelfInfo,
    pub duration_ms: i64,
    pub is_active: bool,
    pub configured_peer_callsign: Option<String>,
}

fn upper(value: &str) -> Option<String> {
    let v = value.trim().to_ascii_uppercase();
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}

#[derive(Debug)]
pub struct QsoFlowController {
    state: QsoState,
}

impl QsoFlowController {
    pub fn new() -> Self {
        QsoFlowController {
            state: QsoState::fresh(),
        }
    }

    /// Drop everything; back to `Idle`.
    pub fn reset(&mut self) {
        self.state = QsoState::fresh();
    }

    /// Begin a new contact as `profile`. Prior state is discarded.
    pub fn start_qso(&mut self, profile: &Profile, qso_type: QsoType, rng: &mut dyn RandomSource) {
        self.reset();
        let now = Utc::now();
        self.state.qso_type = qso_type;
        self.state.self_info = SelfInfo {
            callsign: upper(&profile.callsign),
            name: upper(&profile.name),
            qth: upper(&profile.qth),
            rst: Some(choose(rng, SELF_RST).to_string()),
        };
        self.state.phase = QsoPhase::CallingCq;
        self.state.started_at = Some(now);
        self.state.last_activity_at = now;
        self.log(
            "qso_started",
            json!({ "type": qso_type.label(), "station": profile.callsign }),
        );
    }

    /// Move to `to`, logging the change with an arbitrary payload.
    pub fn transition(&mut self, to: QsoPhase, data: Value) {
        let from = self.state.phase;
        self.state.phase = to;
        self.state.last_activity_at = Utc::now();
        self.log(
            "transition",
            json!({ "from": from.label(), "to": to.label(), "data": data }),
        );
    }

    /// Merge non-empty fields into the peer record.
    pub fn record_peer_info(&mut self, update: PeerInfo) {
        let peer = &mut self.state.peer_info;
        let mut changed = false;
        for (slot, value) in [
            (&mut peer.callsign, update.callsign),
            (&mut peer.name, update.name),
            (&mut peer.qth, update.qth),
            (&mut peer.rst, update.rst),
        ] {
            if let Some(v) = value.as_deref().and_then(upper) {
                *slot = Some(v);
                changed = true;
            }
        }
        if changed {
            let snapshot = serde_json::to_value(&self.state.peer_info).unwrap_or(Value::Null);
            self.log("peer_info_updated", snapshot);
        }
    }

    pub fn increment_exchange(&mut self) -> u32 {
        self.state.exchange_count += 1;
        self.state.exchange_count
    }

    pub fn phase(&self) -> QsoPhase {
        self.state.phase
    }

    pub fn qso_type(&self) -> QsoType {
        self.state.qso_type
    }

    pub fn exchange_count(&self) -> u32 {
        self.state.exchange_count
    }

    pub fn peer_info(&self) -> &PeerInfo {
        &self.state.peer_info
    }

    pub fn self_info(&self) -> &SelfInfo {
        &self.state.self_info
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.state.history
    }

    pub fn state(&self) -> &QsoState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.phase.is_active()
    }

    pub fn is_ended(&self) -> bool {
        self.state.phase == QsoPhase::Ended
    }

    /// Time since the QSO started, zero when idle.
    pub fn duration(&self) -> chrono::Duration {
        match self.state.started_at {
            Some(start) => Utc::now() - start,
            None => chrono::Duration::zero(),
        }
    }

    /// Nominal successor of the current phase for the current QSO type.
    pub fn next_phase(&self) -> QsoPhase {
        use QsoPhase::*;
        match self.state.phase {
            Idle => CallingCq,
            CallingCq => WaitingAnswer,
            WaitingAnswer => ReceivedCall,
            ReceivedCall => SendingReport,
            SendingReport => ReceivingReport,
            ReceivingReport if self.state.qso_type.is_minimal_exchange() => Closing,
            ReceivingReport => ExchangingInfo,
            ExchangingInfo if self.state.exchange_count >= 2 => Closing,
            ExchangingInfo => ExchangingInfo,
            Closing => Ended,
            Ended => Idle,
        }
    }

    pub fn view(&self, configured_peer: Option<&str>) -> QsoStateView {
        QsoStateView {
            phase: self.state.phase,
            qso_type: self.state.qso_type,
            exchange_count: self.state.exchange_count,
            peer_info: self.state.peer_info.clone(),
            self_info: self.state.self_info.clone(),
            duration_ms: self.duration().num_milliseconds(),
            is_active: self.is_active(),
            configured_peer_callsign: configured_peer.map(str::to_string),
        }
    }

    fn log(&mut self, event: &str, payload: Value) {
        self.state.history.push(HistoryEntry {
            timestamp: Utc::now(),
            event: event.to_string(),
            phase: self.state.phase,
            payload,
        });
    }
}

impl Default for QsoFlowController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qso::profiles::standard_profiles;
    use crate::qso::rng::StdRandom;

    fn started(qso_type: QsoType) -> QsoFlowController {
        let mut ctl = QsoFlowController::new();
        let profile = standard_profiles().remove(0);
        ctl.start_qso(&profile, qso_type, &mut StdRandom::seeded(11));
        ctl
    }

    #[test]
    fn unknown_phase_label_is_idle() {
        assert_eq!(QsoPhase::from_label("receiving_report"), QsoPhase::ReceivingReport);
        assert_eq!(QsoPhase::from_label("WAITING_ANSWER"), QsoPhase::WaitingAnswer);
        assert_eq!(QsoPhase::from_label("warp_drive"), QsoPhase::Idle);
        assert_eq!(QsoPhase::from_label(""), QsoPhase::Idle);
    }

    #[test]
    fn phase_serializes_snake_case() {
        let json = serde_json::to_string(&QsoPhase::ExchangingInfo).unwrap();
        assert_eq!(json, "\"exchanging_info\"");
        for p in QsoPhase::ALL {
            assert_eq!(QsoPhase::from_label(p.label()), p);
        }
    }

    #[test]
    fn start_assigns_self_info_and_logs() {
        let ctl = started(QsoType::Casual);
        assert_eq!(ctl.phase(), QsoPhase::CallingCq);
        assert!(ctl.is_active());
        let me = ctl.self_info();
        assert_eq!(me.callsign.as_deref(), Some("F4BOT"));
        assert!(SELF_RST.contains(&me.rst.as_deref().unwrap()));
        assert_eq!(ctl.history().len(), 1);
        assert_eq!(ctl.history()[0].event, "qso_started");
        assert!(ctl.state().started_at.is_some());
    }

    #[test]
    fn peer_fields_only_overwritten_by_values() {
        let mut ctl = started(QsoType::Casual);
        ctl.record_peer_info(PeerInfo {
            callsign: Some("f4abc".into()),
            name: Some("bob".into()),
            ..PeerInfo::default()
        });
        ctl.record_peer_info(PeerInfo {
            name: Some("  ".into()),
            qth: Some("lyon".into()),
            ..PeerInfo::default()
        });
        let peer = ctl.peer_info();
        assert_eq!(peer.callsign.as_deref(), Some("F4ABC"));
        assert_eq!(peer.name.as_deref(), Some("BOB"));
        assert_eq!(peer.qth.as_deref(), Some("LYON"));
        assert_eq!(peer.rst, None);
    }

    #[test]
    fn transitions_are_logged_with_from_and_to() {
        let mut ctl = started(QsoType::Casual);
        ctl.transition(QsoPhase::WaitingAnswer, json!({ "reason": "cq" }));
        let last = ctl.history().last().unwrap();
        assert_eq!(last.event, "transition");
        assert_eq!(last.phase, QsoPhase::WaitingAnswer);
        assert_eq!(last.payload["from"], "calling_cq");
        assert_eq!(last.payload["to"], "waiting_answer");
    }

    #[test]
    fn reset_clears_counter_and_history() {
        let mut ctl = started(QsoType::Casual);
        ctl.increment_exchange();
        ctl.increment_exchange();
        assert_eq!(ctl.exchange_count(), 2);
        ctl.reset();
        assert_eq!(ctl.exchange_count(), 0);
        assert_eq!(ctl.phase(), QsoPhase::Idle);
        assert!(ctl.history().is_empty());
        assert_eq!(ctl.duration(), chrono::Duration::zero());
    }

    #[test]
    fn next_phase_skips_chat_for_contest() {
        let mut ctl = started(QsoType::Contest);
        ctl.transition(QsoPhase::ReceivingReport, Value::Null);
        assert_eq!(ctl.next_phase(), QsoPhase::Closing);

        let mut casual = started(QsoType::Ragchew);
        casual.transition(QsoPhase::ReceivingReport, Value::Null);
        assert_eq!(casual.next_phase(), QsoPhase::ExchangingInfo);
    }

    #[test]
    fn qso_type_parses() {
        assert_eq!("Contest".parse::<QsoType>(), Ok(QsoType::Contest));
        assert!("sprint".parse::<QsoType>().is_err());
        assert!(QsoType::Dx.is_minimal_exchange());
        assert!(!QsoType::Training.is_minimal_exchange());
    }
}
