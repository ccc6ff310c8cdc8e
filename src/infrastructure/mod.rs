// Infrastructure layer - External dependencies and adapters
pub mod bridge_codec;
pub mod config;
pub mod fixture_provider;
pub mod http_provider;
pub mod log_surface;
