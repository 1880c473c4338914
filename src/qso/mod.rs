//! # QSO dialogue engine
//!
//! Simulates the other station in a CW contact so an operator can practice
//! the procedural exchange: CQ, call, signal reports, a bit of conversation,
//! then 73 and SK.
//!
//! ## Modules
//!
//! - [`lexicon`] - keyword sets, field matchers, template catalogs, Morse table
//! - [`analyzer`] - classifies an inbound line and extracts callsign/name/QTH/RST
//! - [`flow`] - phase, exchange counter and history of one QSO
//! - [`responder`] - fills response templates for the current phase
//! - [`morse`] - text to dot/dash and back
//! - [`engine`] - [`BotEngine`], which ties the above together
//! - [`session`] / [`dispatch`] - think-time pacing and delivery of replies
//!
//! ## Usage
//!
//! ```rust
//! use cwqso::qso::{BotEngine, Lexicon, SessionOptions, StdRandom};
//!
//! let mut bot = BotEngine::new(
//!     SessionOptions::default(),
//!     Lexicon::shared(),
//!     Box::new(StdRandom::seeded(1)),
//! );
//! let start = bot.start_session();
//! assert!(start.response_text.starts_with("CQ"));
//!
//! let call = format!("{} DE F4ABC", start.profile.callsign);
//! let reply = bot.receive(&call);
//! assert_eq!(reply.analysis.extracted.callsign.as_deref(), Some("F4ABC"));
//! assert!(reply.response_text.is_some());
//! ```

pub mod analyzer;
pub mod dispatch;
pub mod engine;
pub mod flow;
pub mod lexicon;
pub mod morse;
pub mod profiles;
pub mod responder;
pub mod rng;
pub mod session;

pub use analyzer::{MessageAnalysis, TextAnalyzer};
pub use dispatch::{start_dispatcher, DispatchConfig, DispatchError, DispatchHandle, OutboundReply};
pub use engine::{
    BotEngine, Difficulty, EngineReply, EngineSnapshot, SessionOptions, SessionUpdate, Speed,
    StartReply, ThinkTime,
};
pub use flow::{PeerInfo, QsoFlowController, QsoPhase, QsoStateView, QsoType, SelfInfo};
pub use lexicon::Lexicon;
pub use morse::{decode_morse, encode_morse};
pub use profiles::{OperatorStyle, Profile};
pub use responder::ResponseGenerator;
pub use rng::{RandomSource, StdRandom};
pub use session::Session;
