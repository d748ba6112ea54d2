#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    async_trait::async_trait,
    murmur_channels::{Author, BotIdentity, ChannelSession, Element},
    murmur_collector::{
        BroadcastOutcome, Collector, Message, Subscriber, filters::Always, subscriber_fn,
    },
    murmur_common::ManualClock,
    murmur_config::CollectorConfig,
};

fn collector(max_messages: usize) -> Collector {
    Collector::new(&CollectorConfig {
        max_messages,
        lock_timeout_ms: 0,
    })
}

fn session(group: &str, text: &str) -> ChannelSession {
    ChannelSession {
        channel_type: "test".into(),
        guild_id: Some(group.into()),
        channel_id: group.into(),
        author: Author {
            id: Some("7".into()),
            name: Some("alice".into()),
            nick: None,
        },
        content: text.into(),
        elements: vec![Element::text(text)],
        bot: BotIdentity {
            id: Some("bot".into()),
            name: Some("Assistant".into()),
        },
        ..Default::default()
    }
}

type Seen = Arc<Mutex<Vec<Vec<Message>>>>;

fn collect_into(collector: &Collector) -> Seen {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    collector.subscribe(subscriber_fn("collector", move |_, messages| {
        let sink = Arc::clone(&sink);
        async move {
            sink.lock().unwrap().push(messages);
            Ok(())
        }
    }));
    seen
}

fn contents(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.content.as_str()).collect()
}

#[tokio::test]
async fn capacity_keeps_most_recent_messages() {
    let c = collector(2);
    for text in ["A", "B", "C"] {
        c.broadcast_incoming(&session("g1", text)).await.unwrap();
    }
    let messages = c.get_messages("g1").unwrap();
    assert_eq!(contents(&messages), vec!["B", "C"]);
    assert!(c.get_messages("g2").is_none());
}

#[tokio::test]
async fn empty_messages_neither_buffer_nor_dispatch() {
    let c = collector(5);
    c.add_filter(Always);
    let seen = collect_into(&c);

    let outcome = c.broadcast_incoming(&session("g1", "   ")).await.unwrap();
    assert_eq!(outcome, BroadcastOutcome::Empty);
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(c.get_messages("g1"), Some(vec![]));
}

#[tokio::test]
async fn dispatch_is_gated_by_mute_but_buffering_is_not() {
    let clock = Arc::new(ManualClock::new(100_000));
    let c = collector(10).with_clock(clock.clone());
    c.add_filter(Always);
    let seen = collect_into(&c);

    let outcome = c.broadcast_incoming(&session("g1", "first")).await.unwrap();
    assert_eq!(outcome, BroadcastOutcome::Dispatched {
        delivered: 1,
        failed: 0
    });
    {
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(contents(&seen[0]), vec!["first"]);
    }

    c.mute("g1", Duration::from_millis(1_000));
    let outcome = c.broadcast_incoming(&session("g1", "second")).await.unwrap();
    assert_eq!(outcome, BroadcastOutcome::Muted);
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(contents(&c.get_messages("g1").unwrap()), vec!["first", "second"]);

    clock.advance(Duration::from_millis(1_000));
    c.broadcast_incoming(&session("g1", "third")).await.unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(contents(&seen[1]), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn mute_extends_an_active_window() {
    let clock = Arc::new(ManualClock::new(0));
    let c = collector(10).with_clock(clock.clone());

    assert!(!c.is_muted("g1"));
    assert_eq!(c.mute("g1", Duration::from_millis(1_000)), 1_000);
    assert!(c.is_muted("g1"));

    clock.advance(Duration::from_millis(500));
    assert_eq!(c.mute("g1", Duration::from_millis(1_000)), 2_000);

    clock.advance(Duration::from_millis(1_000));
    assert!(c.is_muted("g1"));
    clock.advance(Duration::from_millis(500));
    assert!(!c.is_muted("g1"));
}

#[tokio::test]
async fn no_filter_match_means_no_dispatch() {
    let c = collector(10);
    c.add_filter(|_: &ChannelSession, m: &Message| m.content.contains("murmur"));
    let seen = collect_into(&c);

    assert_eq!(
        c.broadcast_incoming(&session("g1", "hello")).await.unwrap(),
        BroadcastOutcome::Buffered
    );
    assert_eq!(
        c.broadcast_incoming(&session("g1", "hey murmur")).await.unwrap(),
        BroadcastOutcome::Dispatched {
            delivered: 1,
            failed: 0
        }
    );
    assert_eq!(seen.lock().unwrap().len(), 1);
}

struct Failing {
    panic: bool,
}

#[async_trait]
impl Subscriber for Failing {
    fn name(&self) -> &str {
        if self.panic { "panics" } else { "errors" }
    }

    async fn on_messages(
        &self,
        _session: &ChannelSession,
        _messages: &[Message],
    ) -> anyhow::Result<()> {
        if self.panic {
            panic!("subscriber panic");
        }
        anyhow::bail!("subscriber error")
    }
}

#[tokio::test]
async fn failing_subscribers_are_isolated() {
    let c = collector(10);
    c.add_filter(Always);
    c.subscribe(Failing { panic: false });
    c.subscribe(Failing { panic: true });
    let seen = collect_into(&c);

    let outcome = c.broadcast_incoming(&session("g1", "hello")).await.unwrap();
    assert_eq!(outcome, BroadcastOutcome::Dispatched {
        delivered: 1,
        failed: 2
    });
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(!c.is_locked("g1"));

    // The group is still usable afterwards.
    c.broadcast_incoming(&session("g1", "again")).await.unwrap();
    assert_eq!(c.get_messages("g1").unwrap().len(), 2);
}

#[tokio::test]
async fn subscribers_can_read_history_and_mute_their_group() {
    let c = Arc::new(collector(10));
    c.add_filter(Always);
    let inner = Arc::clone(&c);
    c.subscribe(subscriber_fn("self-muting", move |session, messages| {
        let inner = Arc::clone(&inner);
        async move {
            let group = session.group_id().unwrap_or_default().to_string();
            assert!(inner.is_locked(&group));
            assert_eq!(inner.get_messages(&group), Some(messages));
            inner.mute(&group, Duration::from_secs(60));
            Ok(())
        }
    }));

    assert!(matches!(
        c.broadcast_incoming(&session("g1", "one")).await.unwrap(),
        BroadcastOutcome::Dispatched { failed: 0, .. }
    ));
    assert_eq!(
        c.broadcast_incoming(&session("g1", "two")).await.unwrap(),
        BroadcastOutcome::Muted
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_broadcasts_never_interleave() {
    const MAX: usize = 3;
    let c = Arc::new(collector(MAX));
    c.add_filter(Always);

    let violations = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&violations);
    c.subscribe(subscriber_fn("checker", move |session, messages| {
        let sink = Arc::clone(&sink);
        async move {
            // Give other broadcasts a chance to run while we hold the group.
            tokio::task::yield_now().await;
            let last = messages.last().map(|m| m.content.clone());
            if messages.len() > MAX || last.as_deref() != Some(session.content.as_str()) {
                sink.lock()
                    .unwrap()
                    .push(format!("{} saw {:?}", session.content, contents(&messages)));
            }
            Ok(())
        }
    }));

    let tasks: Vec<_> = (0..64)
        .map(|i| {
            let c = Arc::clone(&c);
            let group = if i % 2 == 0 { "even" } else { "odd" };
            tokio::spawn(async move { c.broadcast_incoming(&session(group, &format!("m{i}"))).await })
        })
        .collect();
    for task in tasks {
        assert!(matches!(
            task.await.unwrap().unwrap(),
            BroadcastOutcome::Dispatched { failed: 0, .. }
        ));
    }

    assert!(violations.lock().unwrap().is_empty(), "{:?}", violations.lock().unwrap());
    assert_eq!(c.get_messages("even").unwrap().len(), MAX);
    assert_eq!(c.get_messages("odd").unwrap().len(), MAX);
}

#[tokio::test]
async fn waiters_are_served_in_request_order() {
    let c = Arc::new(collector(10));
    let held = c.acquire("g1").await.unwrap();

    let mut tasks = Vec::new();
    for text in ["first", "second", "third"] {
        let c = Arc::clone(&c);
        tasks.push(tokio::spawn(async move {
            c.broadcast_incoming(&session("g1", text)).await
        }));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    drop(held);
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    assert_eq!(contents(&c.get_messages("g1").unwrap()), vec!["first", "second", "third"]);
}
