// Data provider trait for time-series and activity access
use async_trait::async_trait;
use serde::Serialize;

/// Range request sent to the provider, e.g.
/// `{"startDate":"2015-03-03 00:00Z","endDate":"2015-03-04 00:00Z","metrics":["*"],"numOfPoints":100}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequest {
    pub start_date: String,
    pub end_date: String,
    pub metrics: Vec<String>,
    pub num_of_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub start_date: String,
    pub end_date: String,
}

/// The provider answers with the raw JSON payload; decoding and validation
/// stay on the graph side so a bad payload never reaches the datasets.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Query time series data for a range, downsampled to about `num_of_points`
    async fn load_data(&self, request: &DataRequest) -> anyhow::Result<String>;

    /// Query activity regions overlapping a range
    async fn load_activities(&self, request: &ActivityRequest) -> anyhow::Result<String>;
}
