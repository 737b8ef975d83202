//! NIST randomness beacon client
//!
//! The beacon publishes a signed 512-bit random value every minute. Only
//! its parity is used, to pick the mood of the magic 8-ball.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result};

/// Default pulse endpoint
pub const DEFAULT_BEACON_URL: &str = "https://beacon.nist.gov/beacon/2.0/pulse/last";

/// Source of public randomness
#[async_trait]
pub trait RandomnessSource: Send + Sync {
    /// Latest pulse
    ///
    /// # Errors
    ///
    /// Returns error if the beacon cannot be reached or answers unexpectedly
    async fn latest(&self) -> Result<Pulse>;
}

/// One beacon pulse
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pulse {
    /// Sequence number within the chain
    #[serde(default)]
    pub pulse_index: u64,
    /// Publication time as reported by the beacon
    #[serde(default)]
    pub time_stamp: String,
    /// Random value, hex encoded
    pub output_value: String,
}

impl Pulse {
    /// Whether the random value is even
    #[must_use]
    pub fn is_even(&self) -> Option<bool> {
        let last = self.output_value.trim().chars().last()?.to_digit(16)?;
        Some(last % 2 == 0)
    }
}

#[derive(Deserialize)]
struct PulseResponse {
    pulse: Pulse,
}

/// Parse a `/pulse/last` body
///
/// # Errors
///
/// Returns [`Error::Parse`] if the body has no hex `outputValue`
pub fn parse_pulse(body: &str) -> Result<Pulse> {
    let parsed: PulseResponse = serde_json::from_str(body)
        .map_err(|e| Error::parse("nist-beacon", format!("invalid pulse: {e}")))?;

    if parsed.pulse.is_even().is_none() {
        return Err(Error::parse("nist-beacon", "outputValue is not hex"));
    }
    Ok(parsed.pulse)
}

/// HTTP client for the NIST beacon
pub struct NistBeacon {
    client: Client,
    url: String,
}

impl NistBeacon {
    /// Create a client for `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RandomnessSource for NistBeacon {
    async fn latest(&self) -> Result<Pulse> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(Error::parse(
                "nist-beacon",
                format!("HTTP {}", response.status()),
            ));
        }
        parse_pulse(&response.text().await?)
    }
}

/// Where a polarity reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSource {
    /// A beacon pulse
    Beacon,
    /// The local clock, used when the beacon is unreachable
    Clock,
}

/// A yes/no coin flip with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolarityReading {
    /// Even value means positive
    pub positive: bool,
    /// Value the decision was based on
    pub value: String,
    /// Where the value came from
    pub source: ReadingSource,
}

/// Read the beacon, falling back to the current Unix time
pub async fn read_polarity(source: &dyn RandomnessSource) -> PolarityReading {
    match source.latest().await {
        Ok(pulse) => PolarityReading {
            positive: pulse.is_even().unwrap_or(true),
            value: pulse.output_value,
            source: ReadingSource::Beacon,
        },
        Err(e) => {
            tracing::warn!(error = %e, "beacon unavailable, using clock");
            let now = chrono::Utc::now().timestamp();
            PolarityReading {
                positive: now % 2 == 0,
                value: now.to_string(),
                source: ReadingSource::Clock,
            }
        }
    }
}
