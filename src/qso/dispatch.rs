//! Delayed reply delivery.
//!
//! The engine answers instantly; a real operator does not. Replies are handed
//! to a scheduler task with an earliest delivery time (now + think time) and
//! released on an outbound channel once due.
//!
//! Every envelope carries the session's *epoch*. Resetting a session bumps
//! its epoch and sends [`ScheduleCommand::Cancel`]; the scheduler drops queued
//! envelopes from older epochs and remembers the floor so that a late
//! enqueue from the abandoned QSO is discarded as well. Nothing is retried.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

use crate::metrics;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("reply dispatcher has shut down")]
    Closed,
}

/// Text ready to go out to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundReply {
    pub session_id: String,
    pub epoch: u64,
    pub text: String,
    pub morse: String,
}

#[derive(Debug)]
pub struct ReplyEnvelope {
    pub session_id: String,
    pub epoch: u64,
    pub earliest: Instant,
    pub enqueued_at: Instant,
    pub reply: OutboundReply,
}

impl ReplyEnvelope {
    pub fn new(reply: OutboundReply, delay: Duration) -> Self {
        let now = Instant::now();
        Self {
            session_id: reply.session_id.clone(),
            epoch: reply.epoch,
            earliest: now + delay,
            enqueued_at: now,
            reply,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How often the queue is checked for due replies
    pub tick_ms: u64,
    /// Period of the debug stats line; 0 disables it
    pub stats_interval_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            stats_interval_ms: 0,
        }
    }
}

impl DispatchConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

pub enum ScheduleCommand {
    Enqueue(ReplyEnvelope),
    /// Drop everything queued for `session_id` with an epoch below `before_epoch`.
    Cancel {
        session_id: String,
        before_epoch: u64,
    },
    /// The session is gone: drop its queued replies and its epoch floor.
    Forget { session_id: String },
    Snapshot(oneshot::Sender<DispatchStats>),
    Shutdown(oneshot::Sender<()>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub queued: usize,
    pub delivered_total: u64,
    pub cancelled_total: u64,
    pub dropped_total: u64,
    /// Sessions with a remembered epoch floor
    pub tracked_sessions: usize,
}

#[derive(Clone, Debug)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<ScheduleCommand>,
}

impl DispatchHandle {
    pub fn enqueue(&self, env: ReplyEnvelope) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduleCommand::Enqueue(env))
            .map_err(|_| DispatchError::Closed)
    }

    pub fn cancel(&self, session_id: &str, before_epoch: u64) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduleCommand::Cancel {
                session_id: session_id.to_string(),
                before_epoch,
            })
            .map_err(|_| DispatchError::Closed)
    }

    pub fn forget(&self, session_id: &str) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduleCommand::Forget {
                session_id: session_id.to_string(),
            })
            .map_err(|_| DispatchError::Closed)
    }

    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        let _ = self.tx.send(ScheduleCommand::Shutdown(tx));
        let _ = rx.await;
    }

    pub async fn snapshot(&self) -> Option<DispatchStats> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(ScheduleCommand::Snapshot(tx)).is_ok() {
            rx.await.ok()
        } else {
            None
        }
    }
}

/// Spawn the scheduler on the current tokio runtime.
pub fn start_dispatcher(
    cfg: DispatchConfig,
    outgoing: mpsc::UnboundedSender<OutboundReply>,
) -> DispatchHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<ScheduleCommand>();
    let handle = DispatchHandle { tx };

    tokio::spawn(async move {
        let mut queue: Vec<ReplyEnvelope> = Vec::new();
        let mut floors: HashMap<String, u64> = HashMap::new();
        let mut stats = DispatchStats::default();
        let mut last_stats_log = Instant::now();
        loop {
            tokio::select! {
                cmd = rx.recv() => {
                    match cmd {
                        Some(ScheduleCommand::Enqueue(env)) => {
                            let floor = floors.get(&env.session_id).copied().unwrap_or(0);
                            if env.epoch < floor {
                                stats.cancelled_total += 1;
                                metrics::add_replies_cancelled(1);
                                log::debug!(
                                    "dispatch.stale session={} epoch={} floor={}",
                                    env.session_id,
                                    env.epoch,
                                    floor
                                );
                            } else {
                                queue.push(env);
                            }
                        }
                        Some(ScheduleCommand::Cancel { session_id, before_epoch }) => {
                            let removed = drop_queued(&mut queue, &session_id, before_epoch);
                            let floor = floors.entry(session_id.clone()).or_insert(0);
                            *floor = (*floor).max(before_epoch);
                            if removed > 0 {
                                stats.cancelled_total += removed;
                                metrics::add_replies_cancelled(removed);
                                log::debug!(
                                    "dispatch.cancel session={} removed={}",
                                    session_id,
                                    removed
                                );
                            }
                        }
                        Some(ScheduleCommand::Forget { session_id }) => {
                            let removed = drop_queued(&mut queue, &session_id, u64::MAX);
                            floors.remove(&session_id);
                            if removed > 0 {
                                stats.cancelled_total += removed;
                                metrics::add_replies_cancelled(removed);
                            }
                            log::debug!(
                                "dispatch.forget session={} removed={}",
                                session_id,
                                removed
                            );
                        }
                        Some(ScheduleCommand::Snapshot(resp)) => {
                            let _ = resp.send(DispatchStats {
                                queued: queue.len(),
                                tracked_sessions: floors.len(),
                                ..stats.clone()
                            });
                        }
                        Some(ScheduleCommand::Shutdown(done)) => {
                            floors.clear();
                            let _ = done.send(());
                            break;
                        }
                        None => break,
                    }
                }
                _ = tokio::time::sleep(cfg.tick()) => {}
            }
            if queue.is_empty() {
                continue;
            }
            let now = Instant::now();

            if cfg.stats_interval_ms > 0
                && now.duration_since(last_stats_log) >= cfg.stats_interval()
            {
                log::debug!(
                    "dispatch stats: queued={} delivered_total={} cancelled_total={} \
                     dropped_total={}",
                    queue.len(),
                    stats.delivered_total,
                    stats.cancelled_total,
                    stats.dropped_total
                );
                last_stats_log = now;
            }

            queue.sort_by(|a, b| {
                a.earliest
                    .cmp(&b.earliest)
                    .then(a.enqueued_at.cmp(&b.enqueued_at))
            });
            let due = queue.iter().take_while(|e| e.earliest <= now).count();
            for ready in queue.drain(..due) {
                let waited = now.duration_since(ready.enqueued_at).as_millis();
                if outgoing.send(ready.reply).is_err() {
                    log::warn!(
                        "outbound channel closed; dropping reply for session {}",
                        ready.session_id
                    );
                    stats.dropped_total += 1;
                } else {
                    stats.delivered_total += 1;
                    metrics::inc_replies_delivered();
                    log::trace!(
                        "dispatch.deliver session={} waited_ms={}",
                        ready.session_id,
                        waited
                    );
                }
            }
        }
        log::debug!("dispatch loop terminated");
    });

    handle
}

/// Remove queued envelopes of `session_id` with an epoch below `before_epoch`.
fn drop_queued(queue: &mut Vec<ReplyEnvelope>, session_id: &str, before_epoch: u64) -> u64 {
    let before = queue.len();
    queue.retain(|e| !(e.session_id == session_id && e.epoch < before_epoch));
    (before - queue.len()) as u64
}
