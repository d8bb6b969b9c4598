//! Platform collaborators
//!
//! The scanner reads through [`PlatformInventory`]; the orchestrator mutates
//! through [`PlatformGateway`]. A Cloud Controller client implements both.

use crate::error::GatewayError;
use crate::payload::ConfigPayload;
use crate::types::{App, Binding, NewServiceInstance, Org, ServiceInstance, Space, SpaceSummary};
use async_trait::async_trait;

/// Read-only view of a foundation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformInventory: Send + Sync {
    /// All organizations visible to the user
    async fn list_orgs(&self) -> Result<Vec<Org>, GatewayError>;

    /// All apps visible to the user
    async fn list_apps(&self) -> Result<Vec<App>, GatewayError>;

    /// All spaces visible to the user
    async fn list_spaces(&self) -> Result<Vec<Space>, GatewayError>;

    /// Services provisioned in a space
    async fn space_summary(&self, space_guid: &str) -> Result<SpaceSummary, GatewayError>;

    /// Bindings of one service instance
    async fn list_service_bindings(
        &self,
        service_instance_guid: &str,
    ) -> Result<Vec<Binding>, GatewayError>;

    /// GET a token-authenticated broker endpoint returning a JSON object
    async fn fetch_parameters(&self, url: &str) -> Result<ConfigPayload, GatewayError>;
}

/// Mutating operations used by a migration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Start an asynchronous rename
    async fn rename_service_instance(&self, guid: &str, new_name: &str) -> Result<(), GatewayError>;

    /// Current state of an instance, including its last operation
    async fn service_instance(&self, guid: &str) -> Result<ServiceInstance, GatewayError>;

    /// Provision a service instance
    async fn create_service_instance(
        &self,
        request: &NewServiceInstance,
    ) -> Result<ServiceInstance, GatewayError>;

    /// Bind an app to a service instance
    async fn create_service_binding(
        &self,
        app_guid: &str,
        service_instance_guid: &str,
    ) -> Result<Binding, GatewayError>;

    /// Delete a binding
    async fn delete_service_binding(&self, binding_guid: &str) -> Result<(), GatewayError>;

    /// Request a restage; returns as soon as the platform accepts it
    async fn restage_app(&self, app_guid: &str) -> Result<App, GatewayError>;

    /// Delete a service instance
    async fn delete_service_instance(
        &self,
        guid: &str,
        recursive: bool,
        accepts_incomplete: bool,
    ) -> Result<(), GatewayError>;
}
