//! Foundation scanner
//!
//! Walks every space, picks out SCS 2.x service instances and records a
//! [`ServiceUsage`] for each. Config Server instances are classified from
//! their broker parameters. Failures against one space or one service are
//! collected in the report and the walk moves on.

use crate::catalog::{command_line_url, ServiceKind};
use crate::classify::classify;
use crate::error::{GatewayError, ScanError};
use crate::gateway::PlatformInventory;
use crate::types::{App, CompatibilityFlags, Org, ServiceSummary, ServiceUsage, Space};
use std::collections::HashMap;

/// Lookup tables built once per run and only read afterwards
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    org_names_by_guid: HashMap<String, String>,
    app_names_by_guid: HashMap<String, String>,
}

impl ScanContext {
    /// Build from already listed orgs and apps
    #[must_use]
    pub fn new(orgs: Vec<Org>, apps: Vec<App>) -> Self {
        Self {
            org_names_by_guid: orgs.into_iter().map(|o| (o.guid, o.name)).collect(),
            app_names_by_guid: apps.into_iter().map(|a| (a.guid, a.name)).collect(),
        }
    }

    /// List orgs and apps from the platform
    ///
    /// # Errors
    /// Either listing failing; there is nothing useful to scan without them.
    pub async fn load(inventory: &dyn PlatformInventory) -> Result<Self, GatewayError> {
        let orgs = inventory.list_orgs().await?;
        let apps = inventory.list_apps().await?;
        tracing::debug!(orgs = orgs.len(), apps = apps.len(), "loaded scan context");
        Ok(Self::new(orgs, apps))
    }

    /// Org name, empty when unknown
    #[must_use]
    pub fn org_name(&self, guid: &str) -> &str {
        self.org_names_by_guid.get(guid).map_or("", String::as_str)
    }

    /// App name, falling back to the guid for apps outside the listing
    #[must_use]
    pub fn app_name<'a>(&'a self, guid: &'a str) -> &'a str {
        self.app_names_by_guid.get(guid).map_or(guid, String::as_str)
    }
}

/// Load orgs and apps, then scan every space
///
/// # Errors
/// Listing orgs, apps or spaces failed.
pub async fn scan_foundation(inventory: &dyn PlatformInventory) -> Result<ScanReport, GatewayError> {
    let context = ScanContext::load(inventory).await?;
    Scanner::new(inventory, &context).scan().await
}

/// Service summaries carrying `label`, in their original order
#[must_use]
pub fn services_by_label<'a>(label: &str, summaries: &'a [ServiceSummary]) -> Vec<&'a ServiceSummary> {
    summaries.iter().filter(|s| s.label() == label).collect()
}

/// Everything a scan found
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub circuit_breakers: Vec<ServiceUsage>,
    pub config_servers: Vec<ServiceUsage>,
    pub service_registries: Vec<ServiceUsage>,
    pub errors: Vec<ScanError>,
}

impl ScanReport {
    /// Usages of one service kind
    #[must_use]
    pub fn usages(&self, kind: ServiceKind) -> &[ServiceUsage] {
        match kind {
            ServiceKind::CircuitBreakerDashboard => &self.circuit_breakers,
            ServiceKind::ConfigServer => &self.config_servers,
            ServiceKind::ServiceRegistry => &self.service_registries,
        }
    }

    fn usages_mut(&mut self, kind: ServiceKind) -> &mut Vec<ServiceUsage> {
        match kind {
            ServiceKind::CircuitBreakerDashboard => &mut self.circuit_breakers,
            ServiceKind::ConfigServer => &mut self.config_servers,
            ServiceKind::ServiceRegistry => &mut self.service_registries,
        }
    }

    /// Total number of deprecated instances found
    #[must_use]
    pub fn total_usages(&self) -> usize {
        ServiceKind::ALL.iter().map(|k| self.usages(*k).len()).sum()
    }
}

/// Sequential scanner over a platform inventory
#[derive(Clone, Copy)]
pub struct Scanner<'a> {
    inventory: &'a dyn PlatformInventory,
    context: &'a ScanContext,
}

impl<'a> Scanner<'a> {
    /// Create a scanner
    #[must_use]
    pub fn new(inventory: &'a dyn PlatformInventory, context: &'a ScanContext) -> Self {
        Self { inventory, context }
    }

    /// List every space and scan them
    ///
    /// # Errors
    /// Only when the space listing itself fails.
    pub async fn scan(&self) -> Result<ScanReport, GatewayError> {
        let spaces = self.inventory.list_spaces().await?;
        Ok(self.scan_spaces(&spaces).await)
    }

    /// Scan the given spaces one after another
    pub async fn scan_spaces(&self, spaces: &[Space]) -> ScanReport {
        let mut report = ScanReport::default();
        let total = spaces.len();

        for (index, space) in spaces.iter().enumerate() {
            tracing::info!(space = %space.name, space_index = index + 1, spaces = total, "scanning space");

            let summary = match self.inventory.space_summary(&space.guid).await {
                Ok(summary) => summary,
                Err(source) => {
                    tracing::warn!(space = %space.guid, error = %source, "space summary failed");
                    report.errors.push(ScanError::SpaceSummary {
                        space_guid: space.guid.clone(),
                        source,
                    });
                    continue;
                }
            };

            for kind in ServiceKind::ALL {
                let services = services_by_label(kind.legacy_label(), &summary.services);
                let (usages, errors) = self.build_usages(space, &services).await;
                report.usages_mut(kind).extend(usages);
                report.errors.extend(errors);
            }
        }

        tracing::info!(
            spaces = total,
            usages = report.total_usages(),
            errors = report.errors.len(),
            "scan finished"
        );
        report
    }

    /// One usage record per service; failures are returned alongside
    pub async fn build_usages(
        &self,
        space: &Space,
        services: &[&ServiceSummary],
    ) -> (Vec<ServiceUsage>, Vec<ScanError>) {
        let mut usages = Vec::with_capacity(services.len());
        let mut errors = Vec::new();

        for service in services {
            let app_names = if service.bound_app_count > 0 {
                match self.bound_app_names(service).await {
                    Ok(names) => names,
                    Err(error) => {
                        errors.push(error);
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };

            let flags = if service.label() == ServiceKind::ConfigServer.legacy_label() {
                match self.config_server_flags(service).await {
                    Ok(flags) => flags,
                    Err(error) => {
                        errors.push(error);
                        CompatibilityFlags::default()
                    }
                }
            } else {
                CompatibilityFlags::default()
            };

            usages.push(ServiceUsage {
                org: self.context.org_name(&space.organization_guid).to_owned(),
                space: space.name.clone(),
                service_instance_name: service.name.clone(),
                bound_apps: service.bound_app_count,
                app_names,
                flags,
            });
        }

        (usages, errors)
    }

    // TODO: report org/space next to the app name, shared instances can be bound across spaces
    async fn bound_app_names(&self, service: &ServiceSummary) -> Result<Vec<String>, ScanError> {
        let bindings = self
            .inventory
            .list_service_bindings(&service.guid)
            .await
            .map_err(|source| ScanError::Bindings {
                service_guid: service.guid.clone(),
                source,
            })?;

        Ok(bindings
            .iter()
            .map(|b| self.context.app_name(&b.app_guid).to_owned())
            .collect())
    }

    async fn config_server_flags(&self, service: &ServiceSummary) -> Result<CompatibilityFlags, ScanError> {
        let dashboard_url = service
            .dashboard_url
            .as_deref()
            .ok_or_else(|| ScanError::MissingDashboardUrl {
                service_guid: service.guid.clone(),
            })?;

        let params = self
            .inventory
            .fetch_parameters(&command_line_url(dashboard_url))
            .await
            .map_err(|source| ScanError::ConfigParameters {
                service_guid: service.guid.clone(),
                source,
            })?;

        let flags = classify(&params);
        tracing::debug!(service = %service.name, ?flags, "classified config server");
        Ok(flags)
    }
}

impl std::fmt::Debug for Scanner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner").field("context", &self.context).finish_non_exhaustive()
    }
}
