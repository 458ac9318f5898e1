//! Application state management.
//!
//! The state contains:
//! - Configuration
//! - MongoDB client and database handle

use mongodb::{Client, Database};

/// Shared application state.
///
/// Cloned into the readiness handler; both MongoDB handles are cheap clones of one pool.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// Dropped during graceful shutdown
    pub mongo_client: Client,
    pub db: Database,
}
