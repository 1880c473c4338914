//! Procedural vocabulary: keyword sets, field patterns, response templates,
//! the Morse table and the station catalog.
//!
//! A [`Lexicon`] is built once and shared read-only (`Arc<Lexicon>`) between
//! the analyzer and the response generator. Template catalogs are plain
//! `&'static` string lists; placeholders use `{name}` markers.

use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::profiles::{standard_profiles, OperatorStyle, Profile};

// ---------------------------------------------------------------------------
// Keywords
// ---------------------------------------------------------------------------

/// Classification categories. Each maps to one detected flag of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Cq,
    Greeting,
    Report,
    Name,
    Qth,
    Question,
    Confirm,
    Closing,
    Repeat,
}

impl KeywordCategory {
    pub const ALL: [KeywordCategory; 9] = [
        KeywordCategory::Cq,
        KeywordCategory::Greeting,
        KeywordCategory::Report,
        KeywordCategory::Name,
        KeywordCategory::Qth,
        KeywordCategory::Question,
        KeywordCategory::Confirm,
        KeywordCategory::Closing,
        KeywordCategory::Repeat,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Cq => &["CQ", "CQ CQ", "CQ DX", "CQ TEST", "CQ CONTEST"],
            Self::Greeting => &["GM", "GA", "GE", "GN", "HELLO", "HI"],
            Self::Report => &["RST", "UR", "599", "579", "559", "5NN"],
            Self::Name => &["NAME", "NAME IS", "NAME HR", "OP", "OP IS"],
            Self::Qth => &["QTH", "QTH IS", "QTH HR", "LOCATED"],
            Self::Question => &["HW", "HW?", "?", "QRL", "QRZ", "AGN", "RPT"],
            Self::Confirm => &["R", "RR", "R R", "OK", "FB", "ROGER", "QSL"],
            Self::Closing => &["73", "TU", "TNX", "GB", "GL", "SK", "CUL", "CUAGN"],
            Self::Repeat => &["AGN", "AGN?", "PSE AGN", "RPT", "QRZ?", "?"],
        }
    }
}

/// Topics the bot can answer questions about while exchanging info.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionTopic {
    Weather,
    Equipment,
    Antenna,
}

impl QuestionTopic {
    /// Checked in this order; the first topic that matches wins.
    pub const ALL: [QuestionTopic; 3] = [
        QuestionTopic::Weather,
        QuestionTopic::Equipment,
        QuestionTopic::Antenna,
    ];

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Weather => &["WX", "WEATHER"],
            Self::Equipment => &["RIG", "PWR", "POWER"],
            Self::Antenna => &["ANT", "ANTENNA"],
        }
    }
}

/// Build a whole-token alternation: a keyword must not touch a letter or digit
/// on either side. Keywords made of punctuation (`?`) still match.
fn token_alternation(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)(?:^|[^A-Z0-9])(?:{})(?:$|[^A-Z0-9])", alternation);
    Regex::new(&pattern).expect("keyword pattern compiles")
}

// ---------------------------------------------------------------------------
// Field matchers
// ---------------------------------------------------------------------------

/// One independent extraction pattern. Capture group 1 is the extracted value.
#[derive(Debug)]
pub struct FieldMatcher {
    pub label: &'static str,
    regex: Regex,
}

impl FieldMatcher {
    fn new(label: &'static str, pattern: &str) -> Self {
        FieldMatcher {
            label,
            regex: Regex::new(pattern).expect("field pattern compiles"),
        }
    }

    /// Uppercased capture, or `None` when the pattern does not match.
    pub fn capture(&self, text: &str) -> Option<String> {
        self.regex
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
    }
}

/// Run matchers in order and stop at the first capture.
pub fn first_capture(matchers: &[FieldMatcher], text: &str) -> Option<String> {
    matchers.iter().find_map(|m| m.capture(text))
}

fn name_matchers() -> Vec<FieldMatcher> {
    vec![
        FieldMatcher::new("name_is", r"(?i)\bNAME\s+(?:IS\s+)?([A-Z]{2,12})"),
        FieldMatcher::new("name_assign", r"(?i)\bNAME\s*[=:]\s*([A-Z]{2,12})"),
        FieldMatcher::new("op_is", r"(?i)\bOP\s+(?:IS\s+)?([A-Z]{2,12})"),
        FieldMatcher::new("my_name", r"(?i)\bMY\s+NAME\s+([A-Z]{2,12})"),
    ]
}

fn qth_matchers() -> Vec<FieldMatcher> {
    vec![
        FieldMatcher::new("qth_is", r"(?i)\bQTH\s+(?:IS\s+)?(?:IN\s+)?([A-Z]{2,20})"),
        FieldMatcher::new("qth_assign", r"(?i)\bQTH\s*[=:]\s*([A-Z]{2,20})"),
        FieldMatcher::new("located", r"(?i)\bLOCATED\s+(?:IN\s+)?([A-Z]{2,20})"),
    ]
}

fn rst_matchers() -> Vec<FieldMatcher> {
    vec![
        FieldMatcher::new("rst", r"(?i)\bRST\s+([0-9]{3})"),
        FieldMatcher::new("ur", r"(?i)\bUR\s+([0-9]{3})"),
        FieldMatcher::new("pair", r"\b([0-9]{3})\s+[0-9]{3}\b"),
        FieldMatcher::new("five_nn", r"(?i)\b(5[0-9N]{2})\b"),
    ]
}

const CALLSIGN_PATTERN: &str = r"(?i)\b([A-Z]{1,2}[0-9][A-Z]{1,4}|[0-9][A-Z][0-9][A-Z]{1,4})\b";

// ---------------------------------------------------------------------------
// Template catalogs
// ---------------------------------------------------------------------------

pub const CQ_STANDARD: &[&str] = &[
    "CQ CQ CQ DE {mycall} {mycall} {mycall} K",
    "CQ CQ DE {mycall} {mycall} K",
    "CQ CQ CQ DE {mycall} K",
];

pub const CQ_CONTEST: &[&str] = &[
    "CQ TEST DE {mycall} {mycall}",
    "CQ CONTEST DE {mycall}",
    "{mycall} TEST",
];

pub const CQ_DX: &[&str] = &["CQ DX DE {mycall} {mycall} K", "CQ DX DX DE {mycall} K"];

/// The bot answers a CQ sent by the operator.
pub const ANSWER_TO_PEER_CQ: &[&str] = &[
    "{usercall} DE {mycall} {mycall} K",
    "{usercall} {usercall} DE {mycall} K",
    "{usercall} DE {mycall} {mycall} {mycall} K",
];

/// The operator answered the bot's CQ.
pub const ACK_PEER_ANSWER: &[&str] = &[
    "{usercall} DE {mycall} GM/GA/GE TNX FER CALL",
    "{usercall} DE {mycall} GD TO MEET U",
    "{usercall} TNX FER COMING BACK",
];

pub const REPORT_FIRST: &[&str] = &[
    "UR RST {rst} {rst} NAME {name} {name} QTH {qth} HW CPY? {usercall} DE {mycall} K",
    "RST {rst} {rst} NAME IS {name} QTH {qth} {qth} HW? K",
    "UR {rst} {rst} NAME {name} QTH NR {qth} K",
];

pub const REPORT_CONTEST: &[&str] = &[
    "UR 5NN {serial}",
    "5NN {serial} {serial}",
    "TU 599 {serial}",
];

pub const REPORT_DX: &[&str] = &["UR 599 599 TU", "599 TU 73", "R 599 GL"];

pub const REPORT_PROMPTS: &[&str] = &[
    "UR RST? NAME? QTH?",
    "PSE UR INFO",
    "HW CPY? UR RST ES NAME?",
];

pub const UNDERSTOOD: &[&str] = &["FB FB", "OK OK", "VY FB", "SOLID CPY", "FB COPY"];

pub const CONVERSATION_QUESTIONS: &[&str] = &[
    "HW IS WX IN UR QTH?",
    "WOT RIG U RUNNING?",
    "HW LNG U BEEN HAM?",
    "WOT ANT U USING?",
    "HW CONDX UR END?",
    "FIRST QSO TODAY?",
];

pub const CONVERSATION_COMMENTS: &[&str] = &[
    "CONDX FB TODAY",
    "NICE SIG HR",
    "UR SIG SOLID HR",
    "FB FIST OM",
    "NICE CW OM",
    "VY FB COPY",
];

/// Hand-over appended to conversation filler.
pub const TURN_OVER: &str = "{usercall} DE {mycall} K";

pub const WEATHER_RESPONSES: &[&str] = &[
    "WX HR {wx} TEMP {temp}C",
    "WX IS {wx} ES {temp} DEGREES",
    "{wx} SKY TEMP ABT {temp}C",
];

pub const RIG_RESPONSES: &[&str] = &[
    "RIG HR IS {rig} {power}W",
    "RUNNING {rig} INTO {antenna}",
    "{rig} ES {antenna} ANT",
];

pub const ANTENNA_RESPONSES: &[&str] = &["ANT IS {antenna}", "ANT {antenna}", "USING {antenna} HR"];

pub const GENERIC_ANSWER: &str = "FB OM {usercall} DE {mycall} K";

pub const CLOSING_THANKS: &[&str] = &["TNX FER QSO", "TNX FB QSO", "TU FER NICE QSO", "TNX CALL"];

pub const FAREWELL: &[&str] = &[
    "73 73 {usercall} DE {mycall} SK",
    "HPE CUAGN 73 73 GL",
    "VY 73 GB {usercall} DE {mycall} E E",
    "73 ES GB SK E E",
    "TU 73 GL DX {usercall} DE {mycall} SK",
];

pub const CONTEST_END: &[&str] = &["TU {mycall}", "TU 73", "GL"];

/// Greeting pool per operating style, appended to acknowledgments.
pub fn style_greetings(style: OperatorStyle) -> &'static [&'static str] {
    match style {
        OperatorStyle::Friendly => &["GM OM", "GA DEAR OM", "GE MY FRIEND", "HI HI"],
        OperatorStyle::Formal => &["GM", "GA", "GE"],
        OperatorStyle::Casual => &["HI OM", "HLO", "GD DAY"],
        OperatorStyle::Enthusiastic => &["GM GM GM", "HI HI OM", "GA VY NICE"],
    }
}

/// Simulated local weather: (condition, temperature in C).
pub const WEATHER: &[(&str, i32)] = &[
    ("SUNNY", 22),
    ("CLOUDY", 18),
    ("RAINY", 14),
    ("WINDY", 16),
    ("CLEAR", 20),
    ("OVERCAST", 15),
    ("COLD", 5),
    ("WARM", 25),
];

/// Self signal reports, weighted toward 599 by repetition.
pub const SELF_RST: &[&str] = &["599", "599", "599", "589", "579", "569", "559"];

// ---------------------------------------------------------------------------
// Morse table and abbreviations
// ---------------------------------------------------------------------------

pub const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"), ('B', "-..."), ('C', "-.-."), ('D', "-.."), ('E', "."), ('F', "..-."),
    ('G', "--."), ('H', "...."), ('I', ".."), ('J', ".---"), ('K', "-.-"), ('L', ".-.."),
    ('M', "--"), ('N', "-."), ('O', "---"), ('P', ".--."), ('Q', "--.-"), ('R', ".-."),
    ('S', "..."), ('T', "-"), ('U', "..-"), ('V', "...-"), ('W', ".--"), ('X', "-..-"),
    ('Y', "-.--"), ('Z', "--.."),
    ('1', ".----"), ('2', "..---"), ('3', "...--"), ('4', "....-"), ('5', "....."),
    ('6', "-...."), ('7', "--..."), ('8', "---.."), ('9', "----."), ('0', "-----"),
    ('/', "-..-."), ('?', "..--.."), ('.', ".-.-.-"), (',', "--..--"), ('=', "-...-"),
    ('+', ".-.-."),
];

/// Common CW shorthand with plain-language meanings, for trainees.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("AGN", "Again"),
    ("ANT", "Antenna"),
    ("AR", "End of message"),
    ("BK", "Break"),
    ("CPY", "Copy"),
    ("CUAGN", "See you again"),
    ("CUL", "See you later"),
    ("DE", "From"),
    ("DX", "Long distance"),
    ("ES", "And"),
    ("FB", "Fine business (very good)"),
    ("GA", "Good afternoon"),
    ("GE", "Good evening"),
    ("GL", "Good luck"),
    ("GM", "Good morning"),
    ("GN", "Good night"),
    ("HPE", "Hope"),
    ("HR", "Here"),
    ("HW", "How"),
    ("K", "Over, go ahead"),
    ("OM", "Old man (fellow operator)"),
    ("PSE", "Please"),
    ("PWR", "Power"),
    ("QRM", "Interference"),
    ("QRN", "Static noise"),
    ("QRQ", "Send faster"),
    ("QRS", "Send slower"),
    ("QRZ", "Who is calling?"),
    ("QSB", "Fading"),
    ("QSL", "Confirmation"),
    ("QTH", "Location"),
    ("R", "Roger, received"),
    ("RIG", "Radio equipment"),
    ("RST", "Readability-Strength-Tone"),
    ("SK", "End of contact"),
    ("TNX", "Thanks"),
    ("TU", "Thank you"),
    ("UR", "Your / you are"),
    ("VY", "Very"),
    ("WX", "Weather"),
    ("XYL", "Wife"),
    ("YL", "Young lady"),
];

// ---------------------------------------------------------------------------
// Lexicon
// ---------------------------------------------------------------------------

/// Compiled, immutable vocabulary shared by the analyzer and responder.
#[derive(Debug)]
pub struct Lexicon {
    keywords: Vec<(KeywordCategory, Regex)>,
    topics: Vec<(QuestionTopic, Regex)>,
    callsign: Regex,
    names: Vec<FieldMatcher>,
    qths: Vec<FieldMatcher>,
    reports: Vec<FieldMatcher>,
    profiles: Vec<Profile>,
}

static SHARED: LazyLock<Arc<Lexicon>> = LazyLock::new(|| Arc::new(Lexicon::standard()));

impl Lexicon {
    /// Build the standard vocabulary with the built-in station catalog.
    pub fn standard() -> Self {
        Self::with_profiles(standard_profiles())
    }

    /// Standard vocabulary with a custom station catalog. An empty catalog
    /// falls back to the built-in one.
    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        let profiles = if profiles.is_empty() {
            standard_profiles()
        } else {
            profiles
        };
        Lexicon {
            keywords: KeywordCategory::ALL
                .iter()
                .map(|c| (*c, token_alternation(c.keywords())))
                .collect(),
            topics: QuestionTopic::ALL
                .iter()
                .map(|t| (*t, token_alternation(t.keywords())))
                .collect(),
            callsign: Regex::new(CALLSIGN_PATTERN).expect("callsign pattern compiles"),
            names: name_matchers(),
            qths: qth_matchers(),
            reports: rst_matchers(),
            profiles,
        }
    }

    /// Process-wide instance, compiled on first use.
    pub fn shared() -> Arc<Lexicon> {
        Arc::clone(&SHARED)
    }

    /// True when any keyword of `category` occurs as a whole token in `text`.
    pub fn matches(&self, category: KeywordCategory, text: &str) -> bool {
        self.keywords
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, re)| re.is_match(text))
            .unwrap_or(false)
    }

    /// First question topic mentioned in `text`.
    pub fn question_topic(&self, text: &str) -> Option<QuestionTopic> {
        self.topics
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(t, _)| *t)
    }

    /// Callsign-shaped tokens in order of appearance, uppercased.
    pub fn callsigns(&self, text: &str) -> Vec<String> {
        self.callsign
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
            .collect()
    }

    pub fn name_matchers(&self) -> &[FieldMatcher] {
        &self.names
    }

    pub fn qth_matchers(&self) -> &[FieldMatcher] {
        &self.qths
    }

    pub fn rst_matchers(&self) -> &[FieldMatcher] {
        &self.reports
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn morse_for(c: char) -> Option<&'static str> {
        MORSE_TABLE
            .iter()
            .find(|(k, _)| *k == c)
            .map(|(_, code)| *code)
    }

    pub fn char_for_morse(code: &str) -> Option<char> {
        MORSE_TABLE
            .iter()
            .find(|(_, v)| *v == code)
            .map(|(k, _)| *k)
    }

    pub fn abbreviation(token: &str) -> Option<&'static str> {
        let wanted = token.trim().to_ascii_uppercase();
        ABBREVIATIONS
            .iter()
            .find(|(k, _)| *k == wanted)
            .map(|(_, v)| *v)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::standard()
    }
}
