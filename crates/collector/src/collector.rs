use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{Arc, RwLock},
    time::Duration,
};

use {
    futures::FutureExt,
    murmur_channels::{Author, ChannelSession, Element, session::markup_of},
    murmur_common::{Clock, SystemClock},
    murmur_config::{CollectorConfig, MurmurConfig},
    serde::Serialize,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use {
    crate::metrics as collector_metrics,
    ::metrics::{counter, gauge},
};

use crate::{
    buffer,
    error::{Error, Result},
    filters::{self, Filter},
    lock::{self, GroupGuard},
    message::{GroupTemp, Message, UNKNOWN_ID},
    mute,
    normalize::normalize,
    store::GroupStateStore,
    subscriber::Subscriber,
};

/// What a broadcast did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Direct conversation, or no group id to key the history by.
    Ignored,
    /// Normalized content was empty; nothing was recorded.
    Empty,
    /// Recorded; no filter asked for a dispatch.
    Buffered,
    /// Recorded and a filter matched, but the group is muted.
    Muted,
    /// Recorded and handed to subscribers.
    Dispatched { delivered: usize, failed: usize },
}

/// Point-in-time view of a group for host UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupStats {
    pub group_id: String,
    pub buffered: usize,
    /// Epoch milliseconds at which the current mute window ends.
    pub muted_until: Option<u64>,
    pub locked: bool,
}

/// Per-group message collector and dispatcher.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct Collector {
    store: GroupStateStore,
    clock: Arc<dyn Clock>,
    max_messages: usize,
    lock_timeout: Option<Duration>,
    filters: RwLock<Vec<Arc<dyn Filter>>>,
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl Collector {
    /// A `max_messages` of zero is raised to one so a dispatched history
    /// always contains the message that triggered it.
    pub fn new(config: &CollectorConfig) -> Self {
        if config.max_messages == 0 {
            warn!("max_messages is 0, keeping one message per group");
        }
        Self {
            store: GroupStateStore::new(),
            clock: Arc::new(SystemClock),
            max_messages: config.max_messages.max(1),
            lock_timeout: (config.lock_timeout_ms > 0)
                .then(|| Duration::from_millis(config.lock_timeout_ms)),
            filters: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Build a collector with the built-in filters described by `config`.
    pub fn from_config(config: &MurmurConfig) -> Self {
        let collector = Self::new(&config.collector);
        for filter in filters::from_config(&config.filters) {
            collector.add_shared_filter(filter);
        }
        collector
    }

    /// Replace the time source used for mute windows.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    // ── Registration ────────────────────────────────────────────────────────

    /// Register a filter. Any matching filter makes a message dispatchable.
    pub fn add_filter(&self, filter: impl Filter + 'static) {
        self.add_shared_filter(Arc::new(filter));
    }

    pub fn add_shared_filter(&self, filter: Arc<dyn Filter>) {
        let mut filters = self.filters.write().unwrap_or_else(|e| e.into_inner());
        filters.push(filter);
        info!(count = filters.len(), "dispatch filter registered");
    }

    /// Register a subscriber invoked on every dispatch.
    pub fn subscribe(&self, subscriber: impl Subscriber + 'static) {
        let name = subscriber.name().to_string();
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subscribers.push(Arc::new(subscriber));
        info!(subscriber = %name, count = subscribers.len(), "dispatch subscriber registered");
    }

    // ── Broadcast ───────────────────────────────────────────────────────────

    /// Record a message that arrived from the platform and dispatch the
    /// group history if a filter matches and the group is not muted.
    pub async fn broadcast_incoming(&self, session: &ChannelSession) -> Result<BroadcastOutcome> {
        let Some(group_id) = session.group_id() else {
            return Ok(BroadcastOutcome::Ignored);
        };
        let guard = self.acquire(group_id).await?;

        let content = normalize(&session.bot, &session.content, &session.elements);
        if content.is_empty() {
            self.note_empty(group_id);
            return Ok(BroadcastOutcome::Empty);
        }

        let mut message = Message::new(
            content,
            session.author.display_name(),
            author_id(&session.author),
        );
        if let Some(quote) = &session.quote {
            message = message.with_quote(Message::new(
                normalize(&session.bot, &quote.content, &quote.elements),
                quote.author.display_name(),
                author_id(&quote.author),
            ));
        }

        self.record(&guard, message.clone());

        if !self.any_filter_matches(session, &message) {
            return Ok(BroadcastOutcome::Buffered);
        }

        let snapshot = {
            let state = guard.state();
            if mute::is_muted(&state, self.clock.now_ms()) {
                debug!(group_id, mute_until = state.mute_until, "dispatch suppressed, group muted");
                #[cfg(feature = "metrics")]
                counter!(collector_metrics::DISPATCHES_MUTED_TOTAL).increment(1);
                return Ok(BroadcastOutcome::Muted);
            }
            state.buffer.iter().cloned().collect::<Vec<_>>()
        };

        let (delivered, failed) = self.emit(group_id, session, &snapshot).await;
        drop(guard);
        Ok(BroadcastOutcome::Dispatched { delivered, failed })
    }

    /// Record a message the bot itself sent. Never dispatches.
    pub async fn broadcast_outgoing(
        &self,
        session: &ChannelSession,
        elements: &[Element],
    ) -> Result<BroadcastOutcome> {
        let Some(group_id) = session.group_id() else {
            return Ok(BroadcastOutcome::Ignored);
        };
        let guard = self.acquire(group_id).await?;

        let content = normalize(&session.bot, &markup_of(elements), elements);
        if content.is_empty() {
            self.note_empty(group_id);
            return Ok(BroadcastOutcome::Empty);
        }

        let message = Message::new(
            content,
            session.bot.name.as_deref().unwrap_or(UNKNOWN_ID),
            session.bot.id.as_deref().unwrap_or(UNKNOWN_ID),
        );
        self.record(&guard, message);
        Ok(BroadcastOutcome::Buffered)
    }

    fn record(&self, guard: &GroupGuard, message: Message) {
        let evicted = buffer::append(guard, message, self.max_messages);
        debug!(group_id = guard.group_id(), evicted, "message buffered");
        #[cfg(feature = "metrics")]
        {
            counter!(collector_metrics::MESSAGES_BUFFERED_TOTAL).increment(1);
            counter!(collector_metrics::MESSAGES_EVICTED_TOTAL).increment(evicted as u64);
        }
    }

    fn note_empty(&self, group_id: &str) {
        debug!(group_id, "empty message skipped");
        #[cfg(feature = "metrics")]
        counter!(collector_metrics::MESSAGES_EMPTY_TOTAL).increment(1);
    }

    fn any_filter_matches(&self, session: &ChannelSession, message: &Message) -> bool {
        let filters = self.filters.read().unwrap_or_else(|e| e.into_inner());
        filters.iter().any(|f| f.matches(session, message))
    }

    /// Run every subscriber concurrently. Errors and panics are logged and
    /// counted; they never escape into the caller's critical section.
    async fn emit(
        &self,
        group_id: &str,
        session: &ChannelSession,
        messages: &[Message],
    ) -> (usize, usize) {
        let subscribers: Vec<Arc<dyn Subscriber>> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        debug!(group_id, subscribers = subscribers.len(), messages = messages.len(), "dispatching");
        #[cfg(feature = "metrics")]
        counter!(collector_metrics::DISPATCHES_TOTAL).increment(1);

        let runs = subscribers.iter().map(|subscriber| async move {
            let outcome = AssertUnwindSafe(subscriber.on_messages(session, messages))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(Error::subscriber(subscriber.name(), e)),
                Err(panic) => Some(Error::subscriber(subscriber.name(), panic_message(&*panic))),
            }
        });

        let mut failed = 0;
        for error in futures::future::join_all(runs).await.into_iter().flatten() {
            failed += 1;
            warn!(group_id, error = %error, "subscriber failed");
            #[cfg(feature = "metrics")]
            counter!(collector_metrics::SUBSCRIBER_FAILURES_TOTAL).increment(1);
        }
        (subscribers.len() - failed, failed)
    }

    // ── Locking ─────────────────────────────────────────────────────────────

    /// Enter a group's critical section. Dropping the guard releases it.
    pub async fn acquire(&self, group_id: &str) -> Result<GroupGuard> {
        let slot = self.store.get_or_create(group_id);
        #[cfg(feature = "metrics")]
        gauge!(collector_metrics::GROUPS_TRACKED).set(self.store.len() as f64);

        lock::acquire(group_id, slot, self.lock_timeout)
            .await
            .inspect_err(|e| {
                warn!(group_id, error = %e, "could not enter group critical section");
                #[cfg(feature = "metrics")]
                counter!(collector_metrics::LOCK_TIMEOUTS_TOTAL).increment(1);
            })
    }

    /// Returns true while some task is inside the group's critical section.
    pub fn is_locked(&self, group_id: &str) -> bool {
        self.store
            .get(group_id)
            .is_some_and(|slot| slot.is_locked())
    }

    // ── History ─────────────────────────────────────────────────────────────

    /// Snapshot of a group's history, oldest first. `None` for unseen groups.
    ///
    /// Does not wait for the group's critical section, so it is safe to call
    /// from inside a subscriber.
    pub fn get_messages(&self, group_id: &str) -> Option<Vec<Message>> {
        self.store
            .get(group_id)
            .map(|slot| {
                let state = slot.state();
                state.buffer.iter().cloned().collect()
            })
    }

    /// Empty one group's history, or every group's when `group_id` is `None`.
    /// Mute windows and temp data are kept.
    ///
    /// Waits for each group's critical section, so it must not be called
    /// from a subscriber of a group being cleared.
    pub async fn clear(&self, group_id: Option<&str>) -> Result<()> {
        let ids = match group_id {
            Some(id) if self.store.get(id).is_some() => vec![id.to_string()],
            Some(_) => return Ok(()),
            None => self.store.group_ids(),
        };
        for id in ids {
            let guard = self.acquire(&id).await?;
            guard.state().buffer.clear();
            debug!(group_id = %id, "history cleared");
        }
        Ok(())
    }

    // ── Mute ────────────────────────────────────────────────────────────────

    /// Suppress dispatch for `duration`, extending any window already active.
    /// Returns the epoch milliseconds at which the window now ends.
    ///
    /// Does not wait for the group's critical section, so a subscriber may
    /// mute its own group.
    pub fn mute(&self, group_id: &str, duration: Duration) -> u64 {
        let slot = self.store.get_or_create(group_id);
        let until = mute::extend_mute(&mut slot.state(), self.clock.now_ms(), duration);
        info!(group_id, duration_ms = duration.as_millis() as u64, until, "group muted");
        until
    }

    pub fn is_muted(&self, group_id: &str) -> bool {
        let Some(slot) = self.store.get(group_id) else {
            return false;
        };
        let state = slot.state();
        mute::is_muted(&state, self.clock.now_ms())
    }

    // ── Temp data ───────────────────────────────────────────────────────────
    //
    // These take the critical section. Calling them for the group currently
    // being dispatched, from one of its subscribers, never completes.

    pub async fn get_temp(&self, group_id: &str) -> Result<GroupTemp> {
        let guard = self.acquire(group_id).await?;
        let temp = guard.state().temp.clone();
        Ok(temp)
    }

    pub async fn set_temp(&self, group_id: &str, temp: GroupTemp) -> Result<()> {
        let guard = self.acquire(group_id).await?;
        guard.state().temp = temp;
        Ok(())
    }

    /// Read-modify-write a group's temp data inside its critical section.
    pub async fn update_temp<R>(
        &self,
        group_id: &str,
        f: impl FnOnce(&mut GroupTemp) -> R,
    ) -> Result<R> {
        let guard = self.acquire(group_id).await?;
        let result = f(&mut guard.state().temp);
        Ok(result)
    }

    // ── Introspection ───────────────────────────────────────────────────────

    pub fn group_ids(&self) -> Vec<String> {
        self.store.group_ids()
    }

    pub fn stats(&self, group_id: &str) -> Option<GroupStats> {
        let slot = self.store.get(group_id)?;
        let locked = slot.is_locked();
        let state = slot.state();
        let now = self.clock.now_ms();
        Some(GroupStats {
            group_id: group_id.to_string(),
            buffered: state.buffer.len(),
            muted_until: mute::is_muted(&state, now).then_some(state.mute_until),
            locked,
        })
    }
}

fn author_id(author: &Author) -> &str {
    author.id.as_deref().unwrap_or(UNKNOWN_ID)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}
