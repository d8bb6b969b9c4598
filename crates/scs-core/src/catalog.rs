//! Marketplace catalog labels for Spring Cloud Services
//!
//! SCS 2.x and SCS 3.x publish their services under different labels.
//! Only the 2.x labels identify migration candidates.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CIRCUIT_BREAKER_2_LABEL: &str = "p-circuit-breaker-dashboard";

pub const CONFIG_SERVER_2_LABEL: &str = "p-config-server";
pub const CONFIG_SERVER_3_LABEL: &str = "p.config-server";

pub const SERVICE_REGISTRY_2_LABEL: &str = "p-service-registry";
pub const SERVICE_REGISTRY_3_LABEL: &str = "p.service-registry";

/// Deprecated middleware service types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceKind {
    /// Hystrix dashboard, discontinued in SCS 3.x
    CircuitBreakerDashboard,
    ConfigServer,
    ServiceRegistry,
}

impl ServiceKind {
    /// All kinds, in report order
    pub const ALL: [ServiceKind; 3] = [
        ServiceKind::CircuitBreakerDashboard,
        ServiceKind::ConfigServer,
        ServiceKind::ServiceRegistry,
    ];

    /// SCS 2.x catalog label
    #[inline]
    #[must_use]
    pub fn legacy_label(self) -> &'static str {
        match self {
            Self::CircuitBreakerDashboard => CIRCUIT_BREAKER_2_LABEL,
            Self::ConfigServer => CONFIG_SERVER_2_LABEL,
            Self::ServiceRegistry => SERVICE_REGISTRY_2_LABEL,
        }
    }

    /// SCS 3.x catalog label, if the service still exists there
    #[inline]
    #[must_use]
    pub fn current_label(self) -> Option<&'static str> {
        match self {
            Self::CircuitBreakerDashboard => None,
            Self::ConfigServer => Some(CONFIG_SERVER_3_LABEL),
            Self::ServiceRegistry => Some(SERVICE_REGISTRY_3_LABEL),
        }
    }

    /// Kind for an SCS 2.x label
    #[must_use]
    pub fn from_legacy_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.legacy_label() == label)
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CircuitBreakerDashboard => "Circuit Breaker Dashboard",
            Self::ConfigServer => "Config Server",
            Self::ServiceRegistry => "Service Registry",
        })
    }
}

/// Convert a Config Server dashboard URL into the parameters endpoint that
/// accepts a UAA token
///
/// `https://host/dashboard/p-config-server/GUID` becomes
/// `https://host/cli/instances/GUID/parameters`.
#[must_use]
pub fn command_line_url(dashboard_url: &str) -> String {
    let url = dashboard_url
        .replacen("dashboard", "cli", 1)
        .replacen(CONFIG_SERVER_2_LABEL, "instances", 1);
    format!("{url}/parameters")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_url() {
        let url = "https://spring-cloud-broker.apps.pivotal.io/dashboard/p-config-server/GUID";
        assert_eq!(
            command_line_url(url),
            "https://spring-cloud-broker.apps.pivotal.io/cli/instances/GUID/parameters"
        );
    }

    #[test]
    fn broker_url_replaces_first_occurrence_only() {
        let url = "https://host/dashboard/p-config-server/dashboard-p-config-server";
        assert_eq!(
            command_line_url(url),
            "https://host/cli/instances/dashboard-p-config-server/parameters"
        );
    }

    #[test]
    fn legacy_labels_round_trip() {
        for kind in ServiceKind::ALL {
            assert_eq!(ServiceKind::from_legacy_label(kind.legacy_label()), Some(kind));
        }
        assert_eq!(ServiceKind::from_legacy_label(CONFIG_SERVER_3_LABEL), None);
        assert_eq!(ServiceKind::from_legacy_label(SERVICE_REGISTRY_3_LABEL), None);
    }

    #[test]
    fn circuit_breaker_has_no_successor() {
        assert!(ServiceKind::CircuitBreakerDashboard.current_label().is_none());
        assert_eq!(ServiceKind::ConfigServer.current_label(), Some("p.config-server"));
    }
}
