// Downsampling tier configuration
use crate::domain::error::GraphError;
use serde::Deserialize;

/// Precision of the dates sent to the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateGranularity {
    #[default]
    Minute,
    Second,
    Millisecond,
}

impl DateGranularity {
    pub fn format(&self) -> &'static str {
        match self {
            DateGranularity::Minute => "%Y-%m-%d %H:%MZ",
            DateGranularity::Second => "%Y-%m-%d %H:%M:%SZ",
            DateGranularity::Millisecond => "%Y-%m-%d %H:%M:%S:%3fZ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DownsamplingTier {
    pub threshold_ms: u64,
    pub point_count: u32,
    #[serde(default)]
    pub granularity: DateGranularity,
}

impl DownsamplingTier {
    pub fn new(threshold_ms: u64, point_count: u32) -> Self {
        Self {
            threshold_ms,
            point_count,
            granularity: DateGranularity::Minute,
        }
    }

    pub fn with_granularity(mut self, granularity: DateGranularity) -> Self {
        self.granularity = granularity;
        self
    }
}

/// Non-empty list of tiers, strictly ascending by threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct TierTable {
    tiers: Vec<DownsamplingTier>,
}

impl TierTable {
    pub fn new(tiers: Vec<DownsamplingTier>) -> Result<Self, GraphError> {
        if tiers.is_empty() {
            return Err(GraphError::Configuration(
                "downsampling tier table is empty".to_string(),
            ));
        }

        if let Some(pair) = tiers
            .windows(2)
            .find(|w| w[0].threshold_ms >= w[1].threshold_ms)
        {
            return Err(GraphError::Configuration(format!(
                "downsampling tiers must be strictly ascending: {} is followed by {}",
                pair[0].threshold_ms, pair[1].threshold_ms
            )));
        }

        if let Some(tier) = tiers.iter().find(|t| t.threshold_ms == 0 || t.point_count == 0) {
            return Err(GraphError::Configuration(format!(
                "downsampling tier {} has a zero threshold or point count",
                tier.threshold_ms
            )));
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[DownsamplingTier] {
        &self.tiers
    }

    pub fn finest(&self) -> &DownsamplingTier {
        &self.tiers[0]
    }

    pub fn coarsest(&self) -> &DownsamplingTier {
        &self.tiers[self.tiers.len() - 1]
    }

    pub fn get(&self, threshold_ms: u64) -> Option<&DownsamplingTier> {
        self.tiers.iter().find(|t| t.threshold_ms == threshold_ms)
    }
}
