//! Testing utilities for the SCS migration checker workspace
//!
//! An in-memory platform, sleepers that never block, and fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use scs_core::catalog::{CIRCUIT_BREAKER_2_LABEL, CONFIG_SERVER_2_LABEL, SERVICE_REGISTRY_2_LABEL};
use scs_core::{
    App, Binding, ConfigPayload, GatewayError, LastOperation, NewServiceInstance, OperationState,
    Org, PlatformGateway, PlatformInventory, ServiceInstance, ServiceOffering, ServicePlan,
    ServiceSummary, Sleeper, Space, SpaceSummary,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A call received by [`FakePlatform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    ListOrgs,
    ListApps,
    ListSpaces,
    SpaceSummary { space_guid: String },
    ListBindings { service_instance_guid: String },
    FetchParameters { url: String },
    Rename { guid: String, new_name: String },
    ServiceInstance { guid: String },
    CreateServiceInstance { name: String, service_plan_guid: String, space_guid: String },
    CreateBinding { app_guid: String, service_instance_guid: String },
    DeleteBinding { guid: String },
    Restage { app_guid: String },
    DeleteServiceInstance { guid: String, recursive: bool, accepts_incomplete: bool },
}

impl PlatformCall {
    /// Whether the call changes platform state
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Rename { .. }
                | Self::CreateServiceInstance { .. }
                | Self::CreateBinding { .. }
                | Self::DeleteBinding { .. }
                | Self::Restage { .. }
                | Self::DeleteServiceInstance { .. }
        )
    }
}

type FailurePredicate = Box<dyn Fn(&PlatformCall) -> bool + Send + Sync>;

/// In-memory foundation implementing both platform traits
///
/// Every call is recorded. Renames report the scripted operation states in
/// order, then `succeeded`.
#[derive(Default)]
pub struct FakePlatform {
    orgs: Vec<Org>,
    apps: Vec<App>,
    spaces: Vec<Space>,
    summaries: HashMap<String, SpaceSummary>,
    bindings: HashMap<String, Vec<Binding>>,
    parameters: HashMap<String, ConfigPayload>,
    rename_states: Mutex<VecDeque<OperationState>>,
    renamed: Mutex<HashMap<String, String>>,
    failures: Vec<FailurePredicate>,
    calls: Mutex<Vec<PlatformCall>>,
    next_guid: AtomicUsize,
}

impl FakePlatform {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_org(mut self, org: Org) -> Self {
        self.orgs.push(org);
        self
    }

    #[must_use]
    pub fn with_app(mut self, app: App) -> Self {
        self.apps.push(app);
        self
    }

    /// Add a space whose summary lists `services`
    #[must_use]
    pub fn with_space(mut self, space: Space, services: Vec<ServiceSummary>) -> Self {
        self.summaries.insert(
            space.guid.clone(),
            SpaceSummary {
                guid: space.guid.clone(),
                name: space.name.clone(),
                services,
            },
        );
        self.spaces.push(space);
        self
    }

    #[must_use]
    pub fn with_bindings(mut self, service_instance_guid: &str, bindings: Vec<Binding>) -> Self {
        self.bindings.insert(service_instance_guid.to_string(), bindings);
        self
    }

    /// Parameters served at a broker URL
    #[must_use]
    pub fn with_parameters(mut self, url: &str, parameters: ConfigPayload) -> Self {
        self.parameters.insert(url.to_string(), parameters);
        self
    }

    /// States reported by successive status reads after a rename
    #[must_use]
    pub fn with_rename_states(self, states: impl IntoIterator<Item = OperationState>) -> Self {
        self.rename_states.lock().extend(states);
        self
    }

    /// Fail every call matching `predicate` with a 502
    #[must_use]
    pub fn failing_on(mut self, predicate: impl Fn(&PlatformCall) -> bool + Send + Sync + 'static) -> Self {
        self.failures.push(Box::new(predicate));
        self
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().clone()
    }

    /// Mutating calls received so far, in order
    #[must_use]
    pub fn mutations(&self) -> Vec<PlatformCall> {
        self.calls.lock().iter().filter(|c| c.is_mutation()).cloned().collect()
    }

    fn record(&self, call: PlatformCall) -> Result<(), GatewayError> {
        let fails = self.failures.iter().any(|predicate| predicate(&call));
        let description = format!("{call:?}");
        self.calls.lock().push(call);
        if fails {
            return Err(GatewayError::Status {
                method: "FAKE".to_string(),
                url: description,
                status: 502,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn guid(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_guid.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl std::fmt::Debug for FakePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakePlatform")
            .field("spaces", &self.spaces.len())
            .field("calls", &self.calls.lock().len())
            .finish_non_exhaustive()
    }
}

fn not_found(url: String) -> GatewayError {
    GatewayError::Status {
        method: "GET".to_string(),
        url,
        status: 404,
        body: String::new(),
    }
}

#[async_trait]
impl PlatformInventory for FakePlatform {
    async fn list_orgs(&self) -> Result<Vec<Org>, GatewayError> {
        self.record(PlatformCall::ListOrgs)?;
        Ok(self.orgs.clone())
    }

    async fn list_apps(&self) -> Result<Vec<App>, GatewayError> {
        self.record(PlatformCall::ListApps)?;
        Ok(self.apps.clone())
    }

    async fn list_spaces(&self) -> Result<Vec<Space>, GatewayError> {
        self.record(PlatformCall::ListSpaces)?;
        Ok(self.spaces.clone())
    }

    async fn space_summary(&self, space_guid: &str) -> Result<SpaceSummary, GatewayError> {
        self.record(PlatformCall::SpaceSummary {
            space_guid: space_guid.to_string(),
        })?;
        self.summaries
            .get(space_guid)
            .cloned()
            .ok_or_else(|| not_found(format!("/v2/spaces/{space_guid}/summary")))
    }

    async fn list_service_bindings(&self, service_instance_guid: &str) -> Result<Vec<Binding>, GatewayError> {
        self.record(PlatformCall::ListBindings {
            service_instance_guid: service_instance_guid.to_string(),
        })?;
        Ok(self.bindings.get(service_instance_guid).cloned().unwrap_or_default())
    }

    async fn fetch_parameters(&self, url: &str) -> Result<ConfigPayload, GatewayError> {
        self.record(PlatformCall::FetchParameters { url: url.to_string() })?;
        self.parameters
            .get(url)
            .cloned()
            .ok_or_else(|| not_found(url.to_string()))
    }
}

#[async_trait]
impl PlatformGateway for FakePlatform {
    async fn rename_service_instance(&self, guid: &str, new_name: &str) -> Result<(), GatewayError> {
        self.record(PlatformCall::Rename {
            guid: guid.to_string(),
            new_name: new_name.to_string(),
        })?;
        self.renamed.lock().insert(guid.to_string(), new_name.to_string());
        Ok(())
    }

    async fn service_instance(&self, guid: &str) -> Result<ServiceInstance, GatewayError> {
        self.record(PlatformCall::ServiceInstance { guid: guid.to_string() })?;
        let state = self.rename_states.lock().pop_front().unwrap_or(OperationState::Succeeded);
        let name = self.renamed.lock().get(guid).cloned().unwrap_or_default();
        Ok(ServiceInstance {
            guid: guid.to_string(),
            name,
            last_operation: Some(LastOperation {
                kind: "update".to_string(),
                state,
                description: String::new(),
            }),
        })
    }

    async fn create_service_instance(&self, request: &NewServiceInstance) -> Result<ServiceInstance, GatewayError> {
        self.record(PlatformCall::CreateServiceInstance {
            name: request.name.clone(),
            service_plan_guid: request.service_plan_guid.clone(),
            space_guid: request.space_guid.clone(),
        })?;
        Ok(ServiceInstance {
            guid: self.guid("instance"),
            name: request.name.clone(),
            last_operation: Some(LastOperation {
                kind: "create".to_string(),
                state: OperationState::InProgress,
                description: String::new(),
            }),
        })
    }

    async fn create_service_binding(&self, app_guid: &str, service_instance_guid: &str) -> Result<Binding, GatewayError> {
        self.record(PlatformCall::CreateBinding {
            app_guid: app_guid.to_string(),
            service_instance_guid: service_instance_guid.to_string(),
        })?;
        Ok(Binding {
            guid: self.guid("binding"),
            app_guid: app_guid.to_string(),
            service_instance_guid: service_instance_guid.to_string(),
        })
    }

    async fn delete_service_binding(&self, binding_guid: &str) -> Result<(), GatewayError> {
        self.record(PlatformCall::DeleteBinding {
            guid: binding_guid.to_string(),
        })
    }

    async fn restage_app(&self, app_guid: &str) -> Result<App, GatewayError> {
        self.record(PlatformCall::Restage {
            app_guid: app_guid.to_string(),
        })?;
        let name = self
            .apps
            .iter()
            .find(|a| a.guid == app_guid)
            .map_or_else(|| app_guid.to_string(), |a| a.name.clone());
        Ok(App {
            guid: app_guid.to_string(),
            name,
            state: Some("STARTED".to_string()),
        })
    }

    async fn delete_service_instance(
        &self,
        guid: &str,
        recursive: bool,
        accepts_incomplete: bool,
    ) -> Result<(), GatewayError> {
        self.record(PlatformCall::DeleteServiceInstance {
            guid: guid.to_string(),
            recursive,
            accepts_incomplete,
        })
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

/// Returns immediately and remembers every requested delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    naps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn naps(&self) -> Vec<Duration> {
        self.naps.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.naps.lock().push(duration);
    }
}

// Fixtures

/// Unwrap a `json!` object into a payload
///
/// # Panics
/// When `value` is not an object.
#[must_use]
pub fn payload(value: serde_json::Value) -> ConfigPayload {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("payload fixture must be a JSON object, got {other}"),
    }
}

#[must_use]
pub fn org(guid: &str, name: &str) -> Org {
    Org {
        guid: guid.to_string(),
        name: name.to_string(),
    }
}

#[must_use]
pub fn app(guid: &str, name: &str) -> App {
    App {
        guid: guid.to_string(),
        name: name.to_string(),
        state: Some("STARTED".to_string()),
    }
}

#[must_use]
pub fn space(guid: &str, name: &str, organization_guid: &str) -> Space {
    Space {
        guid: guid.to_string(),
        name: name.to_string(),
        organization_guid: organization_guid.to_string(),
    }
}

#[must_use]
pub fn binding(guid: &str, app_guid: &str, service_instance_guid: &str) -> Binding {
    Binding {
        guid: guid.to_string(),
        app_guid: app_guid.to_string(),
        service_instance_guid: service_instance_guid.to_string(),
    }
}

fn summary(guid: &str, name: &str, label: &str, bound_app_count: usize, dashboard_url: Option<String>) -> ServiceSummary {
    ServiceSummary {
        guid: guid.to_string(),
        name: name.to_string(),
        bound_app_count,
        dashboard_url,
        service_plan: ServicePlan {
            guid: format!("{label}-standard"),
            name: "standard".to_string(),
            service: ServiceOffering {
                guid: format!("{label}-offering"),
                label: label.to_string(),
            },
        },
    }
}

/// Broker host used by [`config_server_summary`] dashboard URLs
pub const BROKER: &str = "https://spring-cloud-broker.apps.example.com";

/// SCS 2.x Config Server with a dashboard URL on [`BROKER`]
#[must_use]
pub fn config_server_summary(guid: &str, name: &str, bound_app_count: usize) -> ServiceSummary {
    summary(
        guid,
        name,
        CONFIG_SERVER_2_LABEL,
        bound_app_count,
        Some(format!("{BROKER}/dashboard/p-config-server/{guid}")),
    )
}

/// Parameters URL matching [`config_server_summary`]
#[must_use]
pub fn parameters_url(guid: &str) -> String {
    format!("{BROKER}/cli/instances/{guid}/parameters")
}

#[must_use]
pub fn service_registry_summary(guid: &str, name: &str, bound_app_count: usize) -> ServiceSummary {
    summary(guid, name, SERVICE_REGISTRY_2_LABEL, bound_app_count, None)
}

#[must_use]
pub fn circuit_breaker_summary(guid: &str, name: &str, bound_app_count: usize) -> ServiceSummary {
    summary(guid, name, CIRCUIT_BREAKER_2_LABEL, bound_app_count, None)
}
