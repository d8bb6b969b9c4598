//! `scan`: report every SCS 2.x instance

use anyhow::Context;
use scs_core::{render_report, scan_foundation, PlatformInventory};

/// Scan the foundation and render the report
///
/// # Errors
/// Listing orgs, apps or spaces failed. Per-space failures end up in the
/// report instead.
pub async fn run(inventory: &dyn PlatformInventory) -> anyhow::Result<String> {
    let report = scan_foundation(inventory)
        .await
        .context("couldn't scan the foundation")?;
    Ok(render_report(&report))
}
