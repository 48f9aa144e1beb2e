//! HTTP API front end
//!
//! A thin adapter from transport to the core pipeline:
//! - POST /api/inference/ - diarize + transcribe an uploaded recording
//! - GET / - service banner
//! - GET /debug/models - model lifecycle introspection
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
