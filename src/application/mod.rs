// Application layer - View state, fetching and interaction logic
pub mod data_provider;
pub mod fetch_orchestrator;
pub mod gesture;
pub mod graph_controller;
pub mod legend_presenter;
pub mod scheduler;
pub mod tier_resolver;
pub mod windower;
