//! Coordination/enforcement service library surface. `main.rs` drives the
//! stdin/stdout loop; everything reusable by tests or an alternate host
//! runtime lives here.

pub mod dispatch;
pub mod state;
pub mod tools;

pub use dispatch::{Dispatcher, ResolvedRequest, ToolHandler};
pub use state::AppState;
