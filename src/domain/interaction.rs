// Gesture interaction state and signals raised to the host
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Zooming,
    Panning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", content = "id", rename_all = "snake_case")]
pub enum Signal {
    /// Sent once when a session starts.
    ViewReady,
    ItemSelected(String),
}
