//! Render coordinator.
//!
//! Every render in the preview goes through one [`RenderCoordinator`]. It
//! owns a per-key state machine,
//!
//! ```text
//! Idle ──▶ Queued ──▶ InProgress ──▶ Rendered
//!  ▲                      │
//!  └──── Failed ◀─────────┘
//! ```
//!
//! and a queue holding at most one entry per [`RenderKey`]. A key that is
//! queued, in progress, or already rendered is never queued again, so a
//! component cannot end up in the document twice no matter how many parts
//! of the builder ask for it.
//!
//! A render that fails with a retryable error goes back on the queue at
//! high priority, due after the next of `retry_delays`, until
//! `max_retries` is used up. Only then is the key marked `Failed`.
//!
//! The coordinator does no rendering itself. [`process_queue`] hands each
//! entry to a [`RenderTarget`] without holding the internal lock, so
//! targets may call [`request`] re-entrantly (a section asking for its
//! components, for instance).
//!
//! [`process_queue`]: RenderCoordinator::process_queue
//! [`request`]: RenderCoordinator::request

use crate::error::{RenderResult, TransitionError};
use mediakit_model::{Component, Section};
use mediakit_types::{EventBus, Priority, RenderKey, SectionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Configuration for the render coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Consecutive failures that open the circuit breaker.
    pub max_consecutive_failures: u32,
    /// How long the breaker stays open before allowing a trial pass.
    #[serde(with = "duration_ms")]
    pub reset_timeout: Duration,
    /// Upper bound on passes made by [`RenderCoordinator::process_until_idle`].
    pub max_passes: usize,
    /// Buffered events per subscriber.
    pub event_capacity: usize,
    /// Automatic re-renders of a failed key before it is marked `Failed`.
    pub max_retries: u32,
    /// Delay before each retry; the last one repeats.
    #[serde(with = "duration_ms_list")]
    pub retry_delays: Vec<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
            reset_timeout: Duration::from_secs(30),
            max_passes: 32,
            event_capacity: 256,
            max_retries: 3,
            retry_delays: [100, 250, 500, 1000, 2000]
                .into_iter()
                .map(Duration::from_millis)
                .collect(),
        }
    }
}

impl CoordinatorConfig {
    /// Delay before retry number `retry` (1-based).
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let index = (retry.max(1) - 1) as usize;
        self.retry_delays
            .get(index)
            .or(self.retry_delays.last())
            .copied()
            .unwrap_or_default()
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod duration_ms_list {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delays: &[Duration], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(delays.iter().map(|d| d.as_millis() as u64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Duration>, D::Error> {
        Vec::<u64>::deserialize(d).map(|ms| ms.into_iter().map(Duration::from_millis).collect())
    }
}

/// Lifecycle of a render key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    #[default]
    Idle,
    Queued,
    InProgress,
    Rendered,
    Failed,
}

impl RenderState {
    /// Whether the state machine allows `self -> to`.
    pub const fn can_transition(self, to: RenderState) -> bool {
        matches!(
            (self, to),
            (RenderState::Idle | RenderState::Failed, RenderState::Queued)
                | (RenderState::Queued, RenderState::InProgress)
                | (RenderState::InProgress, RenderState::Rendered | RenderState::Failed)
                | (RenderState::Rendered | RenderState::Failed, RenderState::Idle)
        )
    }
}

/// What is being rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPayload {
    Component(Component),
    /// A section together with the records of the components it lists.
    Section {
        section: Section,
        components: Vec<Component>,
    },
}

/// A request to render one component or section.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub key: RenderKey,
    pub payload: RenderPayload,
    pub priority: Priority,
    /// Free-form label of whoever asked, for logs.
    pub source: String,
}

impl RenderRequest {
    pub fn component(component: Component) -> Self {
        Self {
            key: RenderKey::component(&component.component_type, &component.id),
            payload: RenderPayload::Component(component),
            priority: Priority::Normal,
            source: String::new(),
        }
    }

    pub fn section(section: Section, components: Vec<Component>) -> Self {
        Self {
            key: RenderKey::section(&section.section_id),
            payload: RenderPayload::Section {
                section,
                components,
            },
            priority: Priority::Normal,
            source: String::new(),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Answer to [`RenderCoordinator::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Queued,
    /// Already queued at normal priority; now high.
    Upgraded,
    AlreadyQueued,
    InProgress,
    AlreadyRendered,
}

/// Notifications published by the coordinator and render targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    Requested {
        key: RenderKey,
        priority: Priority,
    },
    Completed {
        key: RenderKey,
        already_rendered: bool,
    },
    Failed {
        key: RenderKey,
        reason: String,
    },
    /// A failed render went back on the queue.
    RetryScheduled {
        key: RenderKey,
        retry: u32,
        delay_ms: u64,
        reason: String,
    },
    SectionRendered {
        section_id: SectionId,
        components: usize,
    },
    ControlsAttached {
        element_id: String,
    },
}

/// Running counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    pub requested: u64,
    pub processed: u64,
    pub succeeded: u64,
    /// Keys that ended `Failed`, retries included.
    pub failed: u64,
    pub retried: u64,
    pub duplicates_blocked: u64,
    pub priority_upgrades: u64,
    pub queue_high_water_mark: usize,
}

/// Summary of one [`RenderCoordinator::process_queue`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub rendered: usize,
    pub failed: usize,
    /// Failures put back on the queue for another attempt.
    pub retried: usize,
    /// Entries left queued: breaker open, or a retry not yet due.
    pub skipped: usize,
}

impl PassReport {
    fn absorb(&mut self, other: PassReport) {
        self.rendered += other.rendered;
        self.failed += other.failed;
        self.retried += other.retried;
        self.skipped = other.skipped;
    }

    fn progressed(&self) -> bool {
        self.rendered + self.failed + self.retried > 0
    }
}

/// Circuit breaker position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct CircuitBreaker {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }

    /// Whether a pass may start, moving Open to HalfOpen once the timeout
    /// has elapsed.
    fn allow_pass(&mut self, reset_timeout: Duration) -> bool {
        match self.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = self.opened_at.map_or(Duration::MAX, |t| t.elapsed());
                if elapsed >= reset_timeout {
                    info!("render circuit breaker half-open");
                    self.state = BreakerState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_success(&mut self) {
        if self.state != BreakerState::Closed {
            info!("render circuit breaker closed");
        }
        self.state = BreakerState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
    }

    fn record_failure(&mut self, threshold: u32) {
        self.consecutive_failures += 1;
        let trip = self.state == BreakerState::HalfOpen || self.consecutive_failures >= threshold;
        if trip && self.state != BreakerState::Open {
            warn!(
                failures = self.consecutive_failures,
                "render circuit breaker opened"
            );
            self.state = BreakerState::Open;
            self.opened_at = Some(Instant::now());
        }
    }
}

/// Renders whatever the coordinator hands it.
pub trait RenderTarget: Send + Sync {
    /// Renders one request. `coordinator` may be used to request further
    /// renders and to publish events.
    fn render(&self, request: &RenderRequest, coordinator: &RenderCoordinator) -> RenderResult<()>;
}

struct QueueEntry {
    request: RenderRequest,
    seq: u64,
    retries: u32,
    not_before: Option<Instant>,
}

impl QueueEntry {
    fn is_due(&self, now: Instant) -> bool {
        self.not_before.is_none_or(|t| t <= now)
    }
}

struct CoordinatorInner {
    states: HashMap<RenderKey, RenderState>,
    queue: HashMap<RenderKey, QueueEntry>,
    next_seq: u64,
    stats: RenderStats,
    breaker: CircuitBreaker,
}

impl CoordinatorInner {
    fn state(&self, key: &RenderKey) -> RenderState {
        self.states.get(key).copied().unwrap_or_default()
    }

    fn transition(&mut self, key: &RenderKey, to: RenderState) -> Result<(), TransitionError> {
        let from = self.state(key);
        if !from.can_transition(to) {
            return Err(TransitionError {
                key: key.clone(),
                from,
                to,
            });
        }
        if to == RenderState::Idle {
            self.states.remove(key);
        } else {
            self.states.insert(key.clone(), to);
        }
        Ok(())
    }
}

/// Deduplicating render scheduler.
pub struct RenderCoordinator {
    config: CoordinatorConfig,
    inner: Mutex<CoordinatorInner>,
    bus: EventBus<RenderEvent>,
}

impl Default for RenderCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl RenderCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        let bus = EventBus::with_capacity(config.event_capacity);
        Self {
            config,
            inner: Mutex::new(CoordinatorInner {
                states: HashMap::new(),
                queue: HashMap::new(),
                next_seq: 0,
                stats: RenderStats::default(),
                breaker: CircuitBreaker::new(),
            }),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorInner> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.bus.subscribe()
    }

    /// Publishes an event on the render bus.
    pub fn publish(&self, event: RenderEvent) {
        self.bus.publish(event);
    }

    // ── Requests ─────────────────────────────────────────────────

    /// Asks for a render.
    ///
    /// Only idle or failed keys are queued. A queued entry keeps its slot
    /// but takes the newer payload, and a `High` request upgrades it.
    pub fn request(&self, request: RenderRequest) -> RequestOutcome {
        let key = request.key.clone();
        let priority = request.priority;
        let outcome = {
            let mut inner = self.lock();
            inner.stats.requested += 1;
            match inner.state(&key) {
                RenderState::Rendered => {
                    inner.stats.duplicates_blocked += 1;
                    RequestOutcome::AlreadyRendered
                }
                RenderState::InProgress => {
                    inner.stats.duplicates_blocked += 1;
                    RequestOutcome::InProgress
                }
                RenderState::Queued => {
                    let mut upgraded = false;
                    if let Some(entry) = inner.queue.get_mut(&key) {
                        upgraded = priority.rank() < entry.request.priority.rank();
                        let kept = entry.request.priority;
                        entry.request = request;
                        if !upgraded {
                            entry.request.priority = kept;
                        }
                    }
                    if upgraded {
                        inner.stats.priority_upgrades += 1;
                        RequestOutcome::Upgraded
                    } else {
                        inner.stats.duplicates_blocked += 1;
                        RequestOutcome::AlreadyQueued
                    }
                }
                RenderState::Idle | RenderState::Failed => {
                    if let Err(error) = inner.transition(&key, RenderState::Queued) {
                        warn!(%error, "render request refused");
                        return RequestOutcome::AlreadyQueued;
                    }
                    let seq = inner.next_seq;
                    inner.next_seq += 1;
                    inner.queue.insert(
                        key.clone(),
                        QueueEntry {
                            request,
                            seq,
                            retries: 0,
                            not_before: None,
                        },
                    );
                    let depth = inner.queue.len();
                    if depth > inner.stats.queue_high_water_mark {
                        inner.stats.queue_high_water_mark = depth;
                    }
                    RequestOutcome::Queued
                }
            }
        };

        match outcome {
            RequestOutcome::Queued => {
                debug!(key = %key, ?priority, "render queued");
                self.bus.publish(RenderEvent::Requested { key, priority });
            }
            RequestOutcome::AlreadyRendered => {
                debug!(key = %key, "render skipped, already rendered");
                self.bus.publish(RenderEvent::Completed {
                    key,
                    already_rendered: true,
                });
            }
            RequestOutcome::Upgraded => debug!(key = %key, "render priority upgraded"),
            RequestOutcome::AlreadyQueued | RequestOutcome::InProgress => {
                debug!(key = %key, ?outcome, "duplicate render request blocked");
            }
        }
        outcome
    }

    // ── Processing ───────────────────────────────────────────────

    /// Renders every entry queued and due when the pass starts, high
    /// priority first, then in request order.
    ///
    /// Requests made while the pass runs wait for the next pass.
    pub fn process_queue(&self, target: &dyn RenderTarget) -> PassReport {
        let mut report = PassReport::default();
        let order: Vec<RenderKey> = {
            let mut inner = self.lock();
            if !inner.breaker.allow_pass(self.config.reset_timeout) {
                report.skipped = inner.queue.len();
                debug!(queued = report.skipped, "render pass skipped, breaker open");
                return report;
            }
            let now = Instant::now();
            let mut entries: Vec<(&RenderKey, &QueueEntry)> =
                inner.queue.iter().filter(|(_, e)| e.is_due(now)).collect();
            report.skipped = inner.queue.len() - entries.len();
            entries.sort_by_key(|(_, e)| (e.request.priority.rank(), e.seq));
            entries.into_iter().map(|(k, _)| k.clone()).collect()
        };

        for key in order {
            let (request, retries) = {
                let mut inner = self.lock();
                if inner.breaker.state == BreakerState::Open {
                    report.skipped += 1;
                    continue;
                }
                // Gone if reset or invalidated since the pass started.
                let Some(entry) = inner.queue.remove(&key) else {
                    continue;
                };
                if let Err(error) = inner.transition(&key, RenderState::InProgress) {
                    warn!(%error, "queued render dropped");
                    continue;
                }
                (entry.request, entry.retries)
            };

            let result = target.render(&request, self);

            let event = {
                let mut inner = self.lock();
                inner.stats.processed += 1;
                match result {
                    Ok(()) => {
                        inner.stats.succeeded += 1;
                        inner.breaker.record_success();
                        report.rendered += 1;
                        inner
                            .transition(&key, RenderState::Rendered)
                            .map(|()| RenderEvent::Completed {
                                key: key.clone(),
                                already_rendered: false,
                            })
                    }
                    Err(error) => {
                        inner
                            .breaker
                            .record_failure(self.config.max_consecutive_failures);
                        let reason = error.to_string();
                        let failed = inner.transition(&key, RenderState::Failed);
                        let retry_allowed =
                            error.is_retryable() && retries < self.config.max_retries;
                        if failed.is_ok() && retry_allowed {
                            let retry = retries + 1;
                            let delay = self.config.retry_delay(retry);
                            self.requeue(&mut inner, &key, request, retry, delay);
                            inner.stats.retried += 1;
                            report.retried += 1;
                            warn!(
                                key = %key,
                                retry,
                                delay_ms = delay.as_millis() as u64,
                                %error,
                                "render failed, retrying"
                            );
                            Ok(RenderEvent::RetryScheduled {
                                key: key.clone(),
                                retry,
                                delay_ms: delay.as_millis() as u64,
                                reason,
                            })
                        } else {
                            inner.stats.failed += 1;
                            report.failed += 1;
                            warn!(
                                key = %key,
                                source = %request.source,
                                retries,
                                %error,
                                "render failed"
                            );
                            failed.map(|()| RenderEvent::Failed {
                                key: key.clone(),
                                reason,
                            })
                        }
                    }
                }
            };
            match event {
                Ok(event) => {
                    self.bus.publish(event);
                }
                // The key's state changed under the render; its result is stale.
                Err(error) => debug!(%error, "render result discarded"),
            }
        }

        if report.progressed() {
            debug!(
                rendered = report.rendered,
                failed = report.failed,
                retried = report.retried,
                skipped = report.skipped,
                "render pass complete"
            );
        }
        report
    }

    /// Puts a failed key back on the queue. The key must be `Failed`.
    fn requeue(
        &self,
        inner: &mut CoordinatorInner,
        key: &RenderKey,
        mut request: RenderRequest,
        retries: u32,
        delay: Duration,
    ) {
        if let Err(error) = inner.transition(key, RenderState::Queued) {
            warn!(%error, "render retry dropped");
            return;
        }
        request.priority = Priority::High;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.insert(
            key.clone(),
            QueueEntry {
                request,
                seq,
                retries,
                not_before: Some(Instant::now() + delay),
            },
        );
    }

    /// Runs passes until the queue is empty, a pass makes no progress, or
    /// `max_passes` is reached.
    ///
    /// Blocks the calling thread while the only queued entries are retries
    /// that are not due yet.
    pub fn process_until_idle(&self, target: &dyn RenderTarget) -> PassReport {
        let mut total = PassReport::default();
        for _ in 0..self.config.max_passes {
            let pass = self.process_queue(target);
            total.absorb(pass);
            if self.queue_len() == 0 {
                break;
            }
            if !pass.progressed() {
                match self.next_retry_in() {
                    Some(wait) if self.breaker_state() != BreakerState::Open => {
                        std::thread::sleep(wait);
                    }
                    _ => break,
                }
            }
        }
        total
    }

    /// Time until the earliest pending retry is due, if any retry is queued.
    pub fn next_retry_in(&self) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .queue
            .values()
            .filter_map(|e| e.not_before)
            .min()
            .map(|t| t.saturating_duration_since(now))
    }

    // ── State ────────────────────────────────────────────────────

    pub fn state(&self, key: &RenderKey) -> RenderState {
        self.lock().state(key)
    }

    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Keys currently queued, in the order the next pass would take them.
    pub fn queued_keys(&self) -> Vec<RenderKey> {
        let inner = self.lock();
        let mut entries: Vec<(&RenderKey, &QueueEntry)> = inner.queue.iter().collect();
        entries.sort_by_key(|(_, e)| (e.request.priority.rank(), e.seq));
        entries.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Number of keys currently being rendered.
    pub fn in_progress_count(&self) -> usize {
        self.lock()
            .states
            .values()
            .filter(|s| **s == RenderState::InProgress)
            .count()
    }

    /// Returns a rendered or failed key to `Idle` so it can be rendered
    /// again.
    pub fn invalidate(&self, key: &RenderKey) -> bool {
        let mut inner = self.lock();
        match inner.transition(key, RenderState::Idle) {
            Ok(()) => {
                debug!(key = %key, "render invalidated");
                true
            }
            Err(_) => false,
        }
    }

    /// Forgets every key and drops the queue. Counters are kept.
    ///
    /// Keys still rendering stay `InProgress` until their render returns,
    /// so a request made meanwhile cannot start a second render.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.states.retain(|_, state| *state == RenderState::InProgress);
        inner.queue.clear();
        inner.breaker = CircuitBreaker::new();
        info!("render coordinator reset");
    }

    pub fn stats(&self) -> RenderStats {
        self.lock().stats.clone()
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.lock().breaker.state
    }
}
