// tsdv-graph - Adaptive-resolution time-series graph core
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
