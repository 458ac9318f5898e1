//! Server infrastructure module.
//!
//! - Router assembly with OpenAPI docs and cross-cutting middleware
//! - Liveness endpoint and aggregated readiness checks
//! - Graceful shutdown with a cleanup hook for connection handles
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//! use core_config::app_info;
//!
//! let router = create_router::<ApiDoc>(
//!     api_routes,
//!     "http://localhost:3000",
//!     config.server.request_timeout(),
//! )?;
//! let app = router.merge(health_router(app_info!()));
//!
//! create_production_app(app, &config.server, Duration::from_secs(30), async move {
//!     drop(mongo_client);
//! })
//! .await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{create_production_app, create_router};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
