//! Core types for SCS Core
//!
//! Defines the records exchanged with the platform and the scan results:
//! - Compatibility flags for a Config Server instance
//! - Usage records for the scan report
//! - Orgs, spaces, apps, service summaries, instances and bindings

use crate::payload::ConfigPayload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Config parameters in SCS 2.x that may be incompatible with SCS 3.x
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompatibilityFlags {
    /// `git.repos` is set; SCS 3.x cannot express it (hard blocker)
    pub uses_old_git_repos: bool,
    /// `encrypt.key` is set; only available from SCS 3.1.6
    pub uses_encrypt_key: bool,
    /// Composite entries nest `git`/`vault` objects; needs rewriting
    pub uses_old_composite: bool,
}

impl CompatibilityFlags {
    /// Whether any flag is raised
    #[inline]
    #[must_use]
    pub fn any(&self) -> bool {
        self.uses_old_git_repos || self.uses_encrypt_key || self.uses_old_composite
    }

    /// Whether the instance cannot be migrated without losing configuration
    #[inline]
    #[must_use]
    pub fn has_blocker(&self) -> bool {
        self.uses_old_git_repos
    }
}

/// One deprecated service instance found by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUsage {
    pub org: String,
    pub space: String,
    pub service_instance_name: String,
    pub bound_apps: usize,
    pub app_names: Vec<String>,
    pub flags: CompatibilityFlags,
}

/// Organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Org {
    pub guid: String,
    pub name: String,
}

/// Application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,
    /// Desired state (`STARTED`, `STOPPED`) when the platform reports it
    #[serde(default)]
    pub state: Option<String>,
}

/// Space, the inner tenancy level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
    pub organization_guid: String,
}

/// Space summary, restricted to the services it contains
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceSummary {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub services: Vec<ServiceSummary>,
}

/// Service instance as listed in a space summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub bound_app_count: usize,
    #[serde(default)]
    pub dashboard_url: Option<String>,
    /// Absent for user-provided services
    #[serde(default)]
    pub service_plan: ServicePlan,
}

impl ServiceSummary {
    /// Catalog label of the marketplace service
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.service_plan.service.label
    }
}

/// Service plan reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub service: ServiceOffering,
}

/// Marketplace service offering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub label: String,
}

/// Provisioned service instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub last_operation: Option<LastOperation>,
}

/// Status of the latest asynchronous broker operation on an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastOperation {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub state: OperationState,
    #[serde(default)]
    pub description: String,
}

impl fmt::Display for LastOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.state)?;
        if !self.description.is_empty() {
            write!(f, " ({})", self.description)?;
        }
        Ok(())
    }
}

/// Broker operation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationState {
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InProgress => "in progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        })
    }
}

/// Binding of an app to a service instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub guid: String,
    pub app_guid: String,
    pub service_instance_guid: String,
}

/// Request to provision a service instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewServiceInstance {
    pub name: String,
    pub service_plan_guid: String,
    pub space_guid: String,
    pub parameters: ConfigPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_blocker() {
        let flags = CompatibilityFlags {
            uses_encrypt_key: true,
            ..CompatibilityFlags::default()
        };
        assert!(flags.any());
        assert!(!flags.has_blocker());

        let blocked = CompatibilityFlags {
            uses_old_git_repos: true,
            ..CompatibilityFlags::default()
        };
        assert!(blocked.has_blocker());
        assert!(!CompatibilityFlags::default().any());
    }

    #[test]
    fn service_summary_decodes_space_summary_shape() {
        let summary: ServiceSummary = serde_json::from_str(
            r#"{
                "guid": "si-1",
                "name": "config",
                "bound_app_count": 2,
                "dashboard_url": "https://broker/dashboard/p-config-server/si-1",
                "service_plan": {
                    "guid": "plan-1",
                    "name": "standard",
                    "service": { "guid": "svc-1", "label": "p-config-server", "provider": null }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(summary.label(), "p-config-server");
        assert_eq!(summary.service_plan.guid, "plan-1");
        assert_eq!(summary.bound_app_count, 2);
    }

    #[test]
    fn user_provided_service_has_empty_label() {
        let summary: ServiceSummary =
            serde_json::from_str(r#"{ "guid": "ups", "name": "creds", "bound_app_count": 1 }"#).unwrap();
        assert_eq!(summary.label(), "");
        assert!(summary.dashboard_url.is_none());
    }

    #[test]
    fn operation_state_decodes() {
        let op: LastOperation = serde_json::from_str(
            r#"{ "type": "update", "state": "in progress", "description": "renaming" }"#,
        )
        .unwrap();
        assert_eq!(op.state, OperationState::InProgress);
        assert_eq!(op.to_string(), "update in progress (renaming)");

        let odd: LastOperation = serde_json::from_str(r#"{ "type": "create", "state": "queued" }"#).unwrap();
        assert_eq!(odd.state, OperationState::Unknown);
    }
}
