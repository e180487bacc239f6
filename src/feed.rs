//! Polling of the remote device feed.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::input::Reading;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("feed body is not a list of records: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One record as the device backend serves it.
#[derive(Clone, Debug, Deserialize)]
pub struct FeedRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<serde_json::Value>,
    #[serde(rename = "dato", alias = "token")]
    pub token: String,
}

impl From<FeedRecord> for Reading {
    fn from(record: FeedRecord) -> Self {
        let id = record.id.and_then(|id| match id {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        });
        Reading {
            id,
            token: record.token,
        }
    }
}

/// Takes the last record of a feed body.
pub fn latest_record(body: &str) -> Result<Option<Reading>, FeedError> {
    let records: Vec<FeedRecord> = serde_json::from_str(body)?;
    Ok(records.into_iter().last().map(Reading::from))
}

#[async_trait]
pub trait Feed: Send + Sync {
    /// Reads the newest record, or `None` when the feed is empty.
    async fn latest(&self) -> Result<Option<Reading>, FeedError>;
}

pub struct HttpFeed {
    url: String,
    client: reqwest::Client,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Feed for HttpFeed {
    async fn latest(&self) -> Result<Option<Reading>, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }
        let body = response.text().await?;
        latest_record(&body)
    }
}

/// Counters for the poll loop. Reading them never affects the game.
#[derive(Debug, Default)]
pub struct PollStats {
    polls: AtomicU64,
    failures: AtomicU64,
}

impl PollStats {
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    Reading(Reading),
    Empty,
    Failed(FeedError),
}

pub struct Poller<F> {
    feed: F,
    interval: Duration,
    stats: Arc<PollStats>,
}

impl<F: Feed + 'static> Poller<F> {
    pub fn new(feed: F, interval: Duration) -> Self {
        Self {
            feed,
            interval,
            stats: Arc::new(PollStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<PollStats> {
        Arc::clone(&self.stats)
    }

    /// Performs a single read. Failures are logged and counted, never raised.
    pub async fn poll_once(&self) -> PollOutcome {
        self.stats.polls.fetch_add(1, Ordering::Relaxed);
        match self.feed.latest().await {
            Ok(Some(reading)) => {
                debug!(%reading, "polled feed");
                PollOutcome::Reading(reading)
            }
            Ok(None) => PollOutcome::Empty,
            Err(error) => {
                let failures = self.stats.failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(%error, failures, "failed to poll device feed");
                PollOutcome::Failed(error)
            }
        }
    }

    /// Polls on every tick and forwards each latest reading.
    ///
    /// Returns once the receiving side is gone.
    #[instrument(skip_all, fields(interval_ms = self.interval.as_millis() as u64))]
    pub async fn run(self, tx: mpsc::UnboundedSender<Reading>) {
        info!("starting device feed poller");
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            if let PollOutcome::Reading(reading) = self.poll_once().await {
                if tx.send(reading).is_err() {
                    break;
                }
            }
        }
        info!(
            polls = self.stats.polls(),
            failures = self.stats.failures(),
            "device feed poller stopped"
        );
    }

    pub fn spawn(self, tx: mpsc::UnboundedSender<Reading>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }
}
