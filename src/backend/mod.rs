//! In-memory backend serving the dashboard endpoints, for local demos.

pub mod routes;
pub mod state;

pub use routes::*;
pub use state::*;
