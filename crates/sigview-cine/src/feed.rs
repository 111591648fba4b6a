//! Live feed: poll a JSON endpoint for one numeric field and stream the
//! values into a channel

use serde_json::Value;
use sigview_core::{feed_error, ChannelId, SamplePoint, SigResult};
use sigview_processing::FeedParams;
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// One value from the feed, ready for a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedSample {
    pub channel: ChannelId,
    pub point: SamplePoint,
}

/// Source of single numeric readings
pub trait LiveFeed: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = SigResult<f64>> + Send;
}

/// Accept only absolute http(s) URLs
pub fn validate_feed_url(url: &str) -> SigResult<()> {
    let url = url.trim();
    if url.is_empty() {
        return Err(feed_error!("Feed URL is empty"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(feed_error!("Feed URL must start with http:// or https://, got {}", url));
    }
    Ok(())
}

/// Extract `field` from a JSON object. The field may hold a number or a
/// numeric string.
pub fn parse_feed_payload(body: &str, field: &str) -> SigResult<f64> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| feed_error!("Invalid JSON payload: {}", e))?;
    let object = json
        .as_object()
        .ok_or_else(|| feed_error!("Payload is not a JSON object"))?;
    let raw = object
        .get(field)
        .ok_or_else(|| feed_error!("Payload has no '{}' field", field))?;

    let value = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| feed_error!("Field '{}' is not numeric: {}", field, raw))
}

/// Seconds since the UNIX epoch
pub fn wall_clock_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// HTTP implementation of [`LiveFeed`]
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: reqwest::Client,
    field: String,
}

impl HttpFeed {
    pub fn new(params: &FeedParams) -> SigResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(params.timeout_ms))
            .build()
            .map_err(|e| feed_error!("Failed to build HTTP client: {}", e))?;
        Ok(Self {
            client,
            field: params.field.clone(),
        })
    }
}

impl LiveFeed for HttpFeed {
    async fn fetch(&self, url: &str) -> SigResult<f64> {
        validate_feed_url(url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| feed_error!("Request to {} failed: {}", url, e))?
            .error_for_status()
            .map_err(|e| feed_error!("Feed returned an error status: {}", e))?;
        let body = response
            .text()
            .await
            .map_err(|e| feed_error!("Failed to read feed body: {}", e))?;
        parse_feed_payload(&body, &self.field)
    }
}

/// Polls a [`LiveFeed`] on a fixed interval
pub struct FeedPoller<F> {
    feed: F,
    url: String,
    channel: ChannelId,
    period: Duration,
}

impl<F: LiveFeed> FeedPoller<F> {
    pub fn new(feed: F, url: impl Into<String>, channel: ChannelId, period: Duration) -> SigResult<Self> {
        let url = url.into();
        validate_feed_url(&url)?;
        if period.is_zero() {
            return Err(feed_error!("Poll interval must be positive"));
        }
        Ok(Self {
            feed,
            url,
            channel,
            period,
        })
    }

    /// Fetch one value, stamped with the current wall clock
    pub async fn poll_once(&self) -> SigResult<FeedSample> {
        let value = self.feed.fetch(&self.url).await?;
        Ok(FeedSample {
            channel: self.channel,
            point: SamplePoint::new(wall_clock_seconds(), value),
        })
    }

    /// Poll until the receiving side goes away. Failed polls are skipped.
    pub async fn run(self, sender: mpsc::Sender<FeedSample>) {
        let mut timer = interval(self.period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(url = %self.url, channel = %self.channel, "feed poller started");

        loop {
            timer.tick().await;
            match self.poll_once().await {
                Ok(sample) => {
                    debug!(value = sample.point.value, "feed sample");
                    if sender.send(sample).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "feed poll skipped"),
            }
        }
        info!(url = %self.url, "feed poller stopped");
    }
}

/// Helper function to start polling in the background
pub fn start_feed_poller<F: LiveFeed>(
    feed: F,
    params: &FeedParams,
) -> SigResult<mpsc::Receiver<FeedSample>> {
    let url = params
        .url
        .clone()
        .ok_or_else(|| feed_error!("No feed URL configured"))?;
    let poller = FeedPoller::new(
        feed,
        url,
        params.channel,
        Duration::from_millis(params.poll_interval_ms),
    )?;
    let (sender, receiver) = mpsc::channel(64);
    tokio::spawn(poller.run(sender));
    Ok(receiver)
}
