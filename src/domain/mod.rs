// Domain layer - Graph data and view models
pub mod activity;
pub mod error;
pub mod interaction;
pub mod plot_item;
pub mod render;
pub mod tier;
pub mod time_point;
pub mod viewport;
