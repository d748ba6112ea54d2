//! `murmur replay`: drive a collector from a recorded JSON-lines file.
//!
//! Each line is one event:
//!
//! ```json
//! {"direction": "incoming", "session": {"guild_id": "g1", "content": "hi", ...}}
//! {"direction": "outgoing", "session": {...}, "elements": [{"type": "text", "content": "hello"}]}
//! {"direction": "mute", "group_id": "g1", "duration_ms": 60000}
//! ```

use std::{
    collections::BTreeMap,
    io::{BufRead, BufReader},
    path::Path,
    time::Duration,
};

use {
    anyhow::Context,
    murmur_channels::{ChannelSession, Element},
    murmur_collector::{BroadcastOutcome, Collector, Message, subscriber_fn},
    murmur_config::MurmurConfig,
    serde::{Deserialize, Serialize},
    tracing::{info, warn},
};

#[derive(Debug, Deserialize)]
#[serde(tag = "direction", rename_all = "snake_case")]
enum ReplayEvent {
    Incoming {
        session: ChannelSession,
    },
    Outgoing {
        session: ChannelSession,
        #[serde(default)]
        elements: Vec<Element>,
    },
    Mute {
        group_id: String,
        duration_ms: u64,
    },
}

/// One dispatch, as printed on stdout.
#[derive(Debug, Clone, Serialize)]
struct DispatchLine {
    group_id: String,
    messages: Vec<Message>,
}

/// Totals reported at the end of a replay.
#[derive(Debug, Default, PartialEq, Eq)]
struct ReplaySummary {
    events: usize,
    ignored: usize,
    empty: usize,
    dispatched: usize,
    muted: usize,
}

pub async fn run(config: &MurmurConfig, file: &Path, group: Option<&str>) -> anyhow::Result<()> {
    crate::config_commands::ensure_valid(config)?;

    let reader: Box<dyn BufRead> = if file == Path::new("-") {
        Box::new(BufReader::new(std::io::stdin()))
    } else {
        let f = std::fs::File::open(file)
            .with_context(|| format!("failed to open {}", file.display()))?;
        Box::new(BufReader::new(f))
    };

    let collector = Collector::from_config(config);
    collector.subscribe(subscriber_fn("stdout", |session, messages| async move {
        let line = DispatchLine {
            group_id: session.group_id().unwrap_or_default().to_string(),
            messages,
        };
        println!("{}", serde_json::to_string(&line)?);
        Ok::<(), anyhow::Error>(())
    }));

    let summary = replay(&collector, reader).await?;
    info!(
        events = summary.events,
        dispatched = summary.dispatched,
        muted = summary.muted,
        empty = summary.empty,
        ignored = summary.ignored,
        "replay finished"
    );

    let histories: BTreeMap<String, Vec<Message>> = collector
        .group_ids()
        .into_iter()
        .filter(|id| group.is_none_or(|g| g == id))
        .filter_map(|id| collector.get_messages(&id).map(|m| (id, m)))
        .collect();
    println!("{}", serde_json::to_string_pretty(&histories)?);
    Ok(())
}

async fn replay(collector: &Collector, reader: impl BufRead) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("failed to read replay input")?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(&line)
            .with_context(|| format!("invalid replay event on line {}", index + 1))?;
        summary.events += 1;

        let outcome = match event {
            ReplayEvent::Incoming { session } => collector.broadcast_incoming(&session).await?,
            ReplayEvent::Outgoing { session, elements } => {
                collector.broadcast_outgoing(&session, &elements).await?
            },
            ReplayEvent::Mute {
                group_id,
                duration_ms,
            } => {
                collector.mute(&group_id, Duration::from_millis(duration_ms));
                continue;
            },
        };

        match outcome {
            BroadcastOutcome::Ignored => summary.ignored += 1,
            BroadcastOutcome::Empty => summary.empty += 1,
            BroadcastOutcome::Buffered => {},
            BroadcastOutcome::Muted => summary.muted += 1,
            BroadcastOutcome::Dispatched { failed, .. } => {
                summary.dispatched += 1;
                if failed > 0 {
                    warn!(line = index + 1, failed, "some subscribers failed");
                }
            },
        }
    }

    Ok(summary)
}
