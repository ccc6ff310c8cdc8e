// Graph error kinds
use crate::domain::time_point::DatasetTag;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("stale {tag} response (generation {generation}, current {current})")]
    StaleResponse {
        tag: DatasetTag,
        generation: u64,
        current: u64,
    },
    #[error("stale activity response (generation {generation}, current {current})")]
    StaleActivities {
        generation: u64,
        current: u64,
    },
    #[error("unknown series: {0}")]
    UnknownSeries(String),
}
