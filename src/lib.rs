//! # cwqso - CW QSO practice bot
//!
//! cwqso simulates the other station in an amateur-radio Morse contact so
//! operators can practice the call-and-response rhythm of a CW QSO: CQ,
//! answer, signal reports, a little chat, then 73 and SK.
//!
//! ## Features
//!
//! - **Procedural text analysis**: keyword classification and extraction of
//!   callsign, name, QTH and RST.
//! - **QSO state machine**: nine phases from idle to ended, with contest/DX short exchanges.
//! - **Station profiles**: eight simulated operators with their own rig, antenna and style.
//! - **Morse encoding**: every reply comes with its dot/dash rendering.
//! - **Think-time pacing**: replies are delayed like a human operator's, and cancelled on reset.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cwqso::config::Config;
//! use cwqso::qso::{BotEngine, StdRandom};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("cwqso.toml").await?;
//!     config.validate()?;
//!
//!     let rng = Box::new(StdRandom::from_seed_option(config.bot.seed));
//!     let mut bot = BotEngine::new(config.session_options(), config.lexicon(), rng);
//!     println!("{}", bot.start_session().response_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`qso`] - dialogue engine, sessions and reply dispatch
//! - [`config`] - TOML configuration
//! - [`validation`] - callsign and pacing validation
//! - [`metrics`] - process-wide counters
//! - [`logutil`] - log sanitizing helpers

pub mod config;
pub mod logutil;
pub mod metrics;
pub mod qso;
pub mod validation;
