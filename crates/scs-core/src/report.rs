//! Plain-text rendering of a [`ScanReport`]

use crate::catalog::ServiceKind;
use crate::scanner::ScanReport;
use crate::types::ServiceUsage;
use std::fmt::Write;

pub const ERROR_ICON: &str = "❌";
pub const WARNING_ICON: &str = "⚠️";
pub const SAFE_ICON: &str = "✅";

const CIRCUIT_BREAKER_REPLACEMENT_GUIDE: &str =
    "tanzu.vmware.com/content/practitioners/replacing-the-spring-cloud-services-circuit-breaker-dashboard";

/// Render the scan outcome the way the CLI prints it
#[must_use]
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &ScanReport) -> std::fmt::Result {
    if !report.errors.is_empty() {
        writeln!(out, "Encountered {} errors:", report.errors.len())?;
        for (i, error) in report.errors.iter().enumerate() {
            writeln!(out, "{}. {error}", i + 1)?;
        }
        writeln!(out)?;
    }

    let breakers = report.usages(ServiceKind::CircuitBreakerDashboard);
    if breakers.is_empty() {
        writeln!(out, "{SAFE_ICON}  no usages of deprecated Circuit Breaker Dashboard")?;
    } else {
        writeln!(
            out,
            "{WARNING_ICON}  The Circuit Breaker Dashboard is unavailable in SCS 3.x - the following services cannot be migrated:"
        )?;
        writeln!(out, "See {CIRCUIT_BREAKER_REPLACEMENT_GUIDE}")?;
        write_usages(out, breakers)?;
    }
    writeln!(out)?;

    let config_servers = report.usages(ServiceKind::ConfigServer);
    if config_servers.is_empty() {
        writeln!(out, "{SAFE_ICON}  no Config Server instances to migrate")?;
    } else {
        writeln!(out, "{SAFE_ICON} Config Server instances to be migrated")?;
        write_usages(out, config_servers)?;
        writeln!(out)?;
    }

    let registries = report.usages(ServiceKind::ServiceRegistry);
    if registries.is_empty() {
        writeln!(out, "{SAFE_ICON}  no Service Registry instances to be migrated")?;
    } else {
        writeln!(out, "{SAFE_ICON} Service Registry instances to be migrated")?;
        writeln!(out, "{WARNING_ICON}  Note: not available in SCS 3.0, you must run SCS 3.1+")?;
        write_usages(out, registries)?;
    }

    Ok(())
}

fn write_usages(out: &mut String, usages: &[ServiceUsage]) -> std::fmt::Result {
    for usage in usages {
        writeln!(
            out,
            "- {}/{}/{} ({} apps)",
            usage.org, usage.space, usage.service_instance_name, usage.bound_apps
        )?;
        if usage.flags.uses_encrypt_key {
            writeln!(
                out,
                " {WARNING_ICON}  This service uses \"encrypt.key\", which is only available in SCS 3.1.6 and later."
            )?;
        }
        if usage.flags.uses_old_composite {
            writeln!(
                out,
                " {WARNING_ICON}  This service uses composite backend which require a new configuration format in SCS 3.x."
            )?;
        }
        if usage.flags.uses_old_git_repos {
            writeln!(
                out,
                " {ERROR_ICON} This service uses \"git.repos\", which is not supported in SCS 3.x"
            )?;
        }
        for app in &usage.app_names {
            writeln!(out, "  - {app}")?;
        }
    }
    Ok(())
}
