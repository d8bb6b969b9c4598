//! Error types for SCS Core
//!
//! Provides error handling for:
//! - Platform API calls (transport, HTTP status, decoding, login)
//! - Scan failures, which are collected and never abort a scan
//! - Migration step failures, which halt one service's migration
//! - Illegal migration state transitions

use crate::state_machine::{MigrationState, MigrationStep};

/// Platform API error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Request never produced a response
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Non-success HTTP status
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// Login against the UAA failed
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl GatewayError {
    /// HTTP status, if the platform answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure while scanning a foundation
///
/// Recorded against the space or service it concerns; scanning carries on.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    #[error("couldn't get space summary for {space_guid}: {source}")]
    SpaceSummary {
        space_guid: String,
        #[source]
        source: GatewayError,
    },

    #[error("couldn't list bindings for service {service_guid}: {source}")]
    Bindings {
        service_guid: String,
        #[source]
        source: GatewayError,
    },

    #[error("couldn't get config parameters for service {service_guid}: {source}")]
    ConfigParameters {
        service_guid: String,
        #[source]
        source: GatewayError,
    },

    #[error("couldn't get config parameters for service {service_guid}: no dashboard url")]
    MissingDashboardUrl { service_guid: String },
}

/// Failure of one migration step
#[derive(Debug, Clone, thiserror::Error)]
pub enum MigrationError {
    #[error("couldn't rename service {service}: {source}")]
    Rename {
        service: String,
        #[source]
        source: GatewayError,
    },

    #[error("rename service operation failed for service instance {guid}: {last_operation}")]
    RenameFailed { guid: String, last_operation: String },

    /// The bounded poll never observed `succeeded`
    #[error("rename of service instance {guid} hasn't completed: last operation = {last_operation}")]
    RenameTimeout { guid: String, last_operation: String },

    #[error("couldn't create new service instance {service}: {source}")]
    Create {
        service: String,
        #[source]
        source: GatewayError,
    },

    #[error("couldn't bind app {app_guid} to new service instance {service}: {source}")]
    Bind {
        app_guid: String,
        service: String,
        #[source]
        source: GatewayError,
    },

    #[error("couldn't delete old service binding {binding_guid}: {source}")]
    Unbind {
        binding_guid: String,
        #[source]
        source: GatewayError,
    },

    #[error("couldn't restage app {app_guid}: {source}")]
    Restage {
        app_guid: String,
        #[source]
        source: GatewayError,
    },

    #[error("couldn't delete old service instance {service} ({guid}): {source}")]
    DeleteOld {
        service: String,
        guid: String,
        #[source]
        source: GatewayError,
    },

    #[error("migration cancelled before {step}")]
    Cancelled { step: MigrationStep },
}

impl MigrationError {
    /// Raised by the rename poll rather than by a platform call
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RenameTimeout { .. })
    }

    /// Underlying platform error, if any
    #[must_use]
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Rename { source, .. }
            | Self::Create { source, .. }
            | Self::Bind { source, .. }
            | Self::Unbind { source, .. }
            | Self::Restage { source, .. }
            | Self::DeleteOld { source, .. } => Some(source),
            Self::RenameFailed { .. } | Self::RenameTimeout { .. } | Self::Cancelled { .. } => None,
        }
    }
}

/// Migration state machine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateMachineError {
    #[error("illegal migration state transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: MigrationState,
        to: MigrationState,
    },
}
