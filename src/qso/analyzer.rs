//! Classification and field extraction for one inbound line.
//!
//! [`TextAnalyzer::analyze`] is deterministic and total: any input, including
//! an empty string, yields a well-formed [`MessageAnalysis`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::lexicon::{first_capture, KeywordCategory, Lexicon};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedFlags {
    pub is_cq: bool,
    pub is_greeting: bool,
    pub is_report: bool,
    pub has_name: bool,
    pub has_qth: bool,
    pub is_question: bool,
    pub is_confirmation: bool,
    pub is_closing: bool,
    pub is_repeat_request: bool,
    pub has_callsign: bool,
    pub has_self_callsign: bool,
    pub has_configured_peer_callsign: bool,
    pub peer_callsign_matches_configured: bool,
    pub is_calling_self: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// First callsign that is not our own
    pub callsign: Option<String>,
    /// Every distinct callsign, in order of first appearance
    pub all_callsigns: Vec<String>,
    pub name: Option<String>,
    pub qth: Option<String>,
    pub rst: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAnalysis {
    pub original: String,
    pub normalized_text: String,
    pub words: Vec<String>,
    pub detected: DetectedFlags,
    pub extracted: ExtractedFields,
}

impl MessageAnalysis {
    /// True when the configured peer callsign is set but the text named
    /// someone else as the calling station.
    pub fn peer_mismatch(&self, configured: Option<&str>) -> bool {
        match (configured, self.extracted.callsign.as_deref()) {
            (Some(cfg), Some(extracted)) => cfg != extracted,
            _ => false,
        }
    }
}

/// Replace the `N` placeholder digit (as in `5NN`) with `9`.
pub fn normalize_rst(raw: &str) -> String {
    raw.to_ascii_uppercase().replace('N', "9")
}

pub struct TextAnalyzer {
    lexicon: Arc<Lexicon>,
}

impl TextAnalyzer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        TextAnalyzer { lexicon }
    }

    pub fn analyze(
        &self,
        text: &str,
        self_callsign: &str,
        configured_peer: Option<&str>,
    ) -> MessageAnalysis {
        let normalized = text.trim().to_uppercase();
        let words: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
        let lex = &self.lexicon;
        let self_call = self_callsign.trim().to_ascii_uppercase();

        let mut detected = DetectedFlags {
            is_cq: lex.matches(KeywordCategory::Cq, &normalized),
            is_greeting: lex.matches(KeywordCategory::Greeting, &normalized),
            is_report: lex.matches(KeywordCategory::Report, &normalized),
            has_name: lex.matches(KeywordCategory::Name, &normalized),
            has_qth: lex.matches(KeywordCategory::Qth, &normalized),
            is_question: lex.matches(KeywordCategory::Question, &normalized),
            is_confirmation: lex.matches(KeywordCategory::Confirm, &normalized),
            is_closing: lex.matches(KeywordCategory::Closing, &normalized),
            is_repeat_request: lex.matches(KeywordCategory::Repeat, &normalized),
            ..DetectedFlags::default()
        };

        let mut all_callsigns: Vec<String> = Vec::new();
        for call in lex.callsigns(&normalized) {
            if !all_callsigns.contains(&call) {
                all_callsigns.push(call);
            }
        }
        let primary = all_callsigns.iter().find(|c| **c != self_call).cloned();

        let extracted = ExtractedFields {
            callsign: primary,
            name: first_capture(lex.name_matchers(), &normalized),
            qth: first_capture(lex.qth_matchers(), &normalized),
            rst: first_capture(lex.rst_matchers(), &normalized).map(|r| normalize_rst(&r)),
            all_callsigns,
        };

        detected.has_callsign = extracted.callsign.is_some();
        detected.has_self_callsign =
            !self_call.is_empty() && extracted.all_callsigns.contains(&self_call);
        if let Some(cfg) = configured_peer {
            let cfg = cfg.trim().to_ascii_uppercase();
            detected.has_configured_peer_callsign = extracted.all_callsigns.contains(&cfg);
            detected.peer_callsign_matches_configured =
                extracted.callsign.as_deref() == Some(cfg.as_str());
        }
        detected.is_calling_self = calling_self(&words, &self_call);

        MessageAnalysis {
            original: text.to_string(),
            normalized_text: normalized,
            words,
            detected,
            extracted,
        }
    }
}

/// `<self> DE` appears in the text (the peer addressing us).
fn calling_self(words: &[String], self_call: &str) -> bool {
    if self_call.is_empty() {
        return false;
    }
    fn bare(word: &str) -> &str {
        word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '/')
    }
    words
        .windows(2)
        .any(|pair| bare(&pair[0]) == self_call && bare(&pair[1]) == "DE")
}
