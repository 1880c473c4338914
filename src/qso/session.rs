use chrono::{DateTime, Utc};
use log::{debug, info};
use std::time::Duration;
use uuid::Uuid;

use super::dispatch::{DispatchError, DispatchHandle, OutboundReply, ReplyEnvelope};
use super::engine::{BotEngine, EngineReply, StartReply};
use crate::logutil::escape_log;

/// # Practice Session
///
/// One operator practicing against one simulated station. The session owns
/// the [`BotEngine`] and, when attached to a dispatcher, schedules every
/// reply with a simulated think-time pause instead of returning it at once.
///
/// ## Epochs
///
/// Each QSO runs under an epoch number. [`Session::reset`] and
/// [`Session::start`] abandon the current QSO: the epoch is bumped and every
/// reply still queued from the old epoch is cancelled, so the operator never
/// hears a late answer to a conversation that no longer exists.
///
/// Calls must be serialized by the owner; the session is not shared.
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    engine: BotEngine,
    epoch: u64,
    dispatcher: Option<DispatchHandle>,
}

impl Session {
    /// Session that returns replies directly without scheduling them.
    pub fn new(engine: BotEngine) -> Self {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            last_activity: now,
            engine,
            epoch: 0,
            dispatcher: None,
        }
    }

    /// Session whose replies go out through `dispatcher` after a think-time pause.
    pub fn with_dispatcher(engine: BotEngine, dispatcher: DispatchHandle) -> Self {
        let mut session = Self::new(engine);
        session.dispatcher = Some(dispatcher);
        session
    }

    pub fn engine(&self) -> &BotEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BotEngine {
        &mut self.engine
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Bot calls CQ as a fresh station. Any pending reply is cancelled.
    /// The engine restarts even when the dispatcher is gone; the error is
    /// reported afterwards and the CQ is not scheduled.
    pub fn start(&mut self) -> Result<StartReply, DispatchError> {
        self.update_activity();
        let cancelled = self.abandon_pending();
        let start = self.engine.start_session();
        info!(
            "Session {}: started as {} ({})",
            self.id, start.profile.callsign, start.state.qso_type
        );
        cancelled?;
        self.schedule(&start.response_text, &start.response_morse)?;
        Ok(start)
    }

    /// Feed one operator line to the engine and schedule the reply, if any.
    pub fn handle_line(&mut self, text: &str) -> Result<EngineReply, DispatchError> {
        self.update_activity();
        debug!("Session {}: rx {}", self.id, escape_log(text));
        let reply = self.engine.receive(text);
        if let (Some(text), Some(morse)) = (&reply.response_text, &reply.response_morse) {
            self.schedule(text, morse)?;
        }
        Ok(reply)
    }

    /// Abandon the QSO, switch station and drop queued replies.
    /// The engine is reset and the epoch bumped even when cancelling fails.
    pub fn reset(&mut self) -> Result<(), DispatchError> {
        self.update_activity();
        let cancelled = self.abandon_pending();
        self.engine.reset();
        cancelled
    }

    pub fn update_activity(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Time since the operator last did anything.
    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now() - self.last_activity
    }

    fn abandon_pending(&mut self) -> Result<(), DispatchError> {
        self.epoch += 1;
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.cancel(&self.id, self.epoch),
            None => Ok(()),
        }
    }

    /// Queue a reply. Returns the chosen delay, or `None` without a dispatcher.
    fn schedule(&mut self, text: &str, morse: &str) -> Result<Option<Duration>, DispatchError> {
        let Some(dispatcher) = &self.dispatcher else {
            return Ok(None);
        };
        let delay = self.engine.think_time();
        let reply = OutboundReply {
            session_id: self.id.clone(),
            epoch: self.epoch,
            text: text.to_string(),
            morse: morse.to_string(),
        };
        debug!(
            "Session {}: tx in {} ms: {}",
            self.id,
            delay.as_millis(),
            escape_log(text)
        );
        dispatcher.enqueue(ReplyEnvelope::new(reply, delay))?;
        Ok(Some(delay))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(dispatcher) = &self.dispatcher {
            // A dispatcher that already shut down has nothing to release.
            let _ = dispatcher.forget(&self.id);
        }
    }
}
