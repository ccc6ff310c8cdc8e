// Presentation layer - Host event decoding and the per-view session loop
pub mod host_event;
pub mod session;
