//! Outbound text generation from template catalogs.
//!
//! Template choice within a catalog is uniform through the injected
//! [`RandomSource`], so callers should check membership in a catalog rather
//! than exact strings unless they script the source.

use regex::{Captures, Regex};
use std::sync::{Arc, LazyLock};

use super::analyzer::MessageAnalysis;
use super::flow::{PeerInfo, QsoPhase, QsoType, SelfInfo, EXCHANGE_CAP};
use super::lexicon::{self, Lexicon, QuestionTopic};
use super::profiles::Profile;
use super::rng::{choose, coin, RandomSource};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_]+)\}").expect("placeholder pattern compiles"));

/// Fallback peer address when no callsign is known.
pub const UNKNOWN_PEER: &str = "OM";

/// Everything a template may refer to.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub profile: &'a Profile,
    pub qso_type: QsoType,
    pub peer: &'a PeerInfo,
    pub self_info: &'a SelfInfo,
    pub configured_peer: Option<&'a str>,
}

impl ResponseContext<'_> {
    /// Configured callsign first, then whatever the peer sent, then `OM`.
    pub fn peer_callsign(&self) -> &str {
        self.configured_peer
            .or(self.peer.callsign.as_deref())
            .unwrap_or(UNKNOWN_PEER)
    }
}

/// Kinds of transmission the bot makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utterance {
    CqCall,
    AnswerCq,
    Acknowledge,
    SignalReport,
    PromptReport,
    Conversation,
    Answer,
    Closing,
    Farewell,
}

/// True when the inbound line counts toward the exchange total in `phase`:
/// the peer's report leaving `receiving_report`, and every line while
/// exchanging info.
pub fn counts_as_exchange(phase: QsoPhase, analysis: &MessageAnalysis) -> bool {
    let d = &analysis.detected;
    match phase {
        QsoPhase::ReceivingReport => d.is_report || d.has_name || d.has_qth,
        QsoPhase::ExchangingInfo => true,
        _ => false,
    }
}

impl Utterance {
    /// What the bot sends back in `phase` for this line, or `None` when the
    /// line gets no reply (after the QSO ended). `exchange_count` is the count
    /// with this line already included (see [`counts_as_exchange`]).
    pub fn for_phase(
        phase: QsoPhase,
        qso_type: QsoType,
        exchange_count: u32,
        analysis: &MessageAnalysis,
    ) -> Option<Self> {
        let d = &analysis.detected;
        let utterance = match phase {
            QsoPhase::Idle if d.is_cq => Self::AnswerCq,
            QsoPhase::Idle => Self::CqCall,
            QsoPhase::CallingCq | QsoPhase::WaitingAnswer => {
                if d.has_callsign || d.is_greeting || d.is_calling_self {
                    Self::Acknowledge
                } else {
                    Self::CqCall
                }
            }
            QsoPhase::ReceivedCall | QsoPhase::SendingReport => Self::SignalReport,
            QsoPhase::ReceivingReport => {
                if counts_as_exchange(phase, analysis) {
                    if qso_type.is_minimal_exchange() {
                        Self::Closing
                    } else {
                        Self::Conversation
                    }
                } else if d.is_repeat_request {
                    Self::SignalReport
                } else {
                    Self::PromptReport
                }
            }
            QsoPhase::ExchangingInfo => {
                if d.is_closing {
                    Self::Closing
                } else if d.is_question {
                    Self::Answer
                } else if exchange_count >= EXCHANGE_CAP {
                    Self::Closing
                } else {
                    Self::Conversation
                }
            }
            QsoPhase::Closing => Self::Farewell,
            QsoPhase::Ended => return None,
        };
        Some(utterance)
    }
}

pub struct ResponseGenerator {
    lexicon: Arc<Lexicon>,
}

impl ResponseGenerator {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        ResponseGenerator { lexicon }
    }

    /// Reply to `analysis` in `phase`, using the same rules as the engine.
    /// `exchange_count` includes the current line when it counts.
    pub fn generate(
        &self,
        phase: QsoPhase,
        ctx: &ResponseContext<'_>,
        exchange_count: u32,
        analysis: &MessageAnalysis,
        rng: &mut dyn RandomSource,
    ) -> Option<String> {
        Utterance::for_phase(phase, ctx.qso_type, exchange_count, analysis)
            .map(|utterance| self.render(utterance, ctx, analysis, rng))
    }

    pub fn render(
        &self,
        utterance: Utterance,
        ctx: &ResponseContext<'_>,
        analysis: &MessageAnalysis,
        rng: &mut dyn RandomSource,
    ) -> String {
        match utterance {
            Utterance::CqCall => self.cq_call(ctx, rng),
            Utterance::AnswerCq => self.pick_and_fill(lexicon::ANSWER_TO_PEER_CQ, ctx, rng),
            Utterance::Acknowledge => self.acknowledgment(ctx, rng),
            Utterance::SignalReport => self.signal_report(ctx, rng),
            Utterance::PromptReport => choose(rng, lexicon::REPORT_PROMPTS).to_string(),
            Utterance::Conversation => self.conversation(ctx, analysis, rng),
            Utterance::Answer => self.answer_question(ctx, analysis, rng),
            Utterance::Closing => self.closing(ctx, rng),
            Utterance::Farewell => self.farewell(ctx, rng),
        }
    }

    pub fn cq_call(&self, ctx: &ResponseContext<'_>, rng: &mut dyn RandomSource) -> String {
        let catalog = match ctx.qso_type {
            QsoType::Contest => lexicon::CQ_CONTEST,
            QsoType::Dx => lexicon::CQ_DX,
            _ => lexicon::CQ_STANDARD,
        };
        self.pick_and_fill(catalog, ctx, rng)
    }

    /// Acknowledge a station answering our CQ, with a greeting in the profile's style.
    pub fn acknowledgment(&self, ctx: &ResponseContext<'_>, rng: &mut dyn RandomSource) -> String {
        let greeting = choose(rng, lexicon::style_greetings(ctx.profile.style));
        let ack = self.pick_and_fill(lexicon::ACK_PEER_ANSWER, ctx, rng);
        format!("{} {}", ack, greeting)
    }

    pub fn signal_report(&self, ctx: &ResponseContext<'_>, rng: &mut dyn RandomSource) -> String {
        let catalog = match ctx.qso_type {
            QsoType::Contest => lexicon::REPORT_CONTEST,
            QsoType::Dx => lexicon::REPORT_DX,
            _ => lexicon::REPORT_FIRST,
        };
        self.pick_and_fill(catalog, ctx, rng)
    }

    /// Chit-chat: optional copy confirmation, a question or comment, then hand over.
    pub fn conversation(
        &self,
        ctx: &ResponseContext<'_>,
        analysis: &MessageAnalysis,
        rng: &mut dyn RandomSource,
    ) -> String {
        let mut parts: Vec<String> = Vec::new();
        if analysis.detected.is_report || analysis.detected.has_name {
            parts.push(choose(rng, lexicon::UNDERSTOOD).to_string());
        }
        let pool = if coin(rng) {
            lexicon::CONVERSATION_QUESTIONS
        } else {
            lexicon::CONVERSATION_COMMENTS
        };
        parts.push(choose(rng, pool).to_string());
        parts.push(self.fill(lexicon::TURN_OVER, ctx, &[], rng));
        parts.join(" ")
    }

    /// Answer a weather, equipment or antenna question; anything else gets a generic reply.
    pub fn answer_question(
        &self,
        ctx: &ResponseContext<'_>,
        analysis: &MessageAnalysis,
        rng: &mut dyn RandomSource,
    ) -> String {
        match self.lexicon.question_topic(&analysis.normalized_text) {
            Some(QuestionTopic::Weather) => {
                let (wx, temp) = lexicon::WEATHER[rng.next_in_range(0, lexicon::WEATHER.len())];
                let template = choose(rng, lexicon::WEATHER_RESPONSES);
                self.fill(
                    template,
                    ctx,
                    &[("wx", wx.to_string()), ("temp", temp.to_string())],
                    rng,
                )
            }
            Some(QuestionTopic::Equipment) => {
                self.pick_and_fill(lexicon::RIG_RESPONSES, ctx, rng)
            }
            Some(QuestionTopic::Antenna) => {
                self.pick_and_fill(lexicon::ANTENNA_RESPONSES, ctx, rng)
            }
            None => self.fill(lexicon::GENERIC_ANSWER, ctx, &[], rng),
        }
    }

    /// Thanks followed by a farewell.
    pub fn closing(&self, ctx: &ResponseContext<'_>, rng: &mut dyn RandomSource) -> String {
        let thanks = self.pick_and_fill(lexicon::CLOSING_THANKS, ctx, rng);
        format!("{} {}", thanks, self.farewell(ctx, rng))
    }

    pub fn farewell(&self, ctx: &ResponseContext<'_>, rng: &mut dyn RandomSource) -> String {
        let catalog = if ctx.qso_type == QsoType::Contest {
            lexicon::CONTEST_END
        } else {
            lexicon::FAREWELL
        };
        self.pick_and_fill(catalog, ctx, rng)
    }

    fn pick_and_fill(
        &self,
        catalog: &[&str],
        ctx: &ResponseContext<'_>,
        rng: &mut dyn RandomSource,
    ) -> String {
        let template = choose(rng, catalog);
        self.fill(template, ctx, &[], rng)
    }

    /// Substitute `{placeholder}` markers (case-insensitive). `extra` entries
    /// take precedence; unknown markers are left as written. A `{serial}` is
    /// drawn once per call in 100..=999.
    pub fn fill(
        &self,
        template: &str,
        ctx: &ResponseContext<'_>,
        extra: &[(&str, String)],
        rng: &mut dyn RandomSource,
    ) -> String {
        let mut serial: Option<String> = None;
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                let key = caps[1].to_ascii_lowercase();
                if let Some((_, v)) = extra.iter().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
                    return v.clone();
                }
                let profile = ctx.profile;
                match key.as_str() {
                    "mycall" => profile.callsign.clone(),
                    "usercall" => ctx.peer_callsign().to_string(),
                    "name" => profile.name.clone(),
                    "qth" => profile.qth.clone(),
                    "country" => profile.country.clone(),
                    "rst" => ctx.self_info.rst.clone().unwrap_or_else(|| "599".to_string()),
                    "rig" => profile.equipment.rig.clone(),
                    "power" => profile.equipment.power.to_string(),
                    "antenna" => profile.equipment.antenna.clone(),
                    "serial" => serial
                        .get_or_insert_with(|| rng.next_in_range(100, 1000).to_string())
                        .clone(),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}
