//! Dispatch subscribers.

use std::{future::Future, marker::PhantomData};

use {async_trait::async_trait, murmur_channels::ChannelSession};

use crate::message::Message;

/// Receives a group's history whenever a new message passes the filters.
///
/// `messages` is a snapshot taken at dispatch time, oldest first. Later
/// appends are not visible through it.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// A human-readable name used in logs.
    fn name(&self) -> &str {
        "subscriber"
    }

    async fn on_messages(
        &self,
        session: &ChannelSession,
        messages: &[Message],
    ) -> anyhow::Result<()>;
}

/// Subscriber backed by an async closure.
pub struct FnSubscriber<F, Fut> {
    name: String,
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a [`Subscriber`].
///
/// ```ignore
/// collector.subscribe(subscriber_fn("log", |session, messages| async move {
///     tracing::info!(group = ?session.group_id(), count = messages.len(), "dispatch");
///     Ok(())
/// }));
/// ```
pub fn subscriber_fn<F, Fut>(name: impl Into<String>, f: F) -> FnSubscriber<F, Fut>
where
    F: Fn(ChannelSession, Vec<Message>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    FnSubscriber {
        name: name.into(),
        f,
        _fut: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> Subscriber for FnSubscriber<F, Fut>
where
    F: Fn(ChannelSession, Vec<Message>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn on_messages(
        &self,
        session: &ChannelSession,
        messages: &[Message],
    ) -> anyhow::Result<()> {
        (self.f)(session.clone(), messages.to_vec()).await
    }
}
