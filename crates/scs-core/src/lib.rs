//! SCS Core - Config Server migration engine
//!
//! The pieces that decide what can be migrated and then migrate it:
//! - Classifies Config Server parameters for SCS 2.x-only features
//! - Rewrites parameters into the SCS 3.x schema
//! - Orchestrates the rename / recreate / rebind / restage sequence
//! - Scans a foundation for deprecated service instances
//!
//! # Example
//!
//! ```rust,ignore
//! use scs_core::{classify, transform, MigrationOrchestrator, MigrationPolicy};
//!
//! # async fn example(gateway: std::sync::Arc<dyn scs_core::PlatformGateway>) -> anyhow::Result<()> {
//! let mut params = serde_json::from_str(r#"{ "composite": [ { "git": { "uri": "x" } } ] }"#)?;
//! assert!(classify(&params).uses_old_composite);
//!
//! transform(&mut params);
//! assert!(!classify(&params).uses_old_composite);
//!
//! let orchestrator = MigrationOrchestrator::new(gateway, MigrationPolicy::default());
//! let instance = orchestrator
//!     .migrate(&service, &space_guid, params, &bindings, &cancel)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod classify;
pub mod config;
pub mod error;
pub mod gateway;
pub mod orchestrator;
pub mod payload;
pub mod poll;
pub mod report;
pub mod scanner;
pub mod state_machine;
pub mod transform;
pub mod types;

// Re-exports for convenience
pub use catalog::{command_line_url, ServiceKind};
pub use classify::classify;
pub use config::{MigrationPolicy, PollPolicy};
pub use error::{GatewayError, MigrationError, ScanError, StateMachineError};
pub use gateway::{PlatformGateway, PlatformInventory};
pub use orchestrator::{BindingMigration, MigrationFailure, MigrationOrchestrator, MigrationProgress};
pub use payload::{ConfigPayload, PayloadExt};
pub use poll::{await_last_operation, PollOutcome, Sleeper, TokioSleeper};
pub use report::render_report;
pub use scanner::{scan_foundation, services_by_label, ScanContext, ScanReport, Scanner};
pub use state_machine::{MigrationState, MigrationStep};
pub use transform::{transform, transformed};
pub use types::{
    App, Binding, CompatibilityFlags, LastOperation, NewServiceInstance, OperationState, Org,
    ServiceInstance, ServiceOffering, ServicePlan, ServiceSummary, ServiceUsage, Space,
    SpaceSummary,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with SCS Core
    pub use crate::{
        classify, transform, Binding, ConfigPayload, MigrationOrchestrator, MigrationPolicy,
        PlatformGateway, PlatformInventory, ScanContext, Scanner, ServiceKind, ServiceSummary,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
