/// Backend submodules bridging the UI thread and the messaging service
///
/// - `state`: per-session connections and channel handles
/// - `handlers`: turn `BackendAction`s into service calls and `GuiEvent`s
/// - `main_loop`: tokio runtime and action polling loop
mod handlers;
mod main_loop;
mod state;

// Re-export the main backend entry points
pub use main_loop::{run_backend, spawn_backend};
pub use state::BackendState;
