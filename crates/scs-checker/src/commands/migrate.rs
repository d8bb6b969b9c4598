//! `migrate`: replace one SCS 2.x Config Server

use crate::cli::MigrateArgs;
use anyhow::{bail, Context};
use scs_core::catalog::CONFIG_SERVER_2_LABEL;
use scs_core::{
    classify, command_line_url, transformed, CompatibilityFlags, ConfigPayload, MigrationFailure,
    MigrationOrchestrator, MigrationPolicy, PlatformGateway, PlatformInventory, ServiceInstance,
    ServiceSummary, Sleeper,
};
use std::fmt::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a successful `migrate` did
#[derive(Debug, Clone, PartialEq)]
pub enum MigrateOutcome {
    /// Nothing was changed
    DryRun {
        flags: CompatibilityFlags,
        parameters: ConfigPayload,
    },
    /// The replacement instance now carries the original name
    Migrated {
        flags: CompatibilityFlags,
        instance: ServiceInstance,
        rebound_apps: usize,
    },
}

impl MigrateOutcome {
    /// Human readable summary for stdout
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::DryRun { parameters, .. } => {
                let json = serde_json::to_string_pretty(parameters).unwrap_or_default();
                format!("dry run, no changes made. New instance parameters:\n{json}\n")
            }
            Self::Migrated {
                instance, rebound_apps, ..
            } => format!(
                "migrated {} to new instance {} ({rebound_apps} apps rebound and restaging)\n",
                instance.name, instance.guid
            ),
        }
    }
}

/// Locate the instance, rewrite its parameters and run the migration
///
/// # Errors
/// The org, space or service cannot be found, `git.repos` is in use without
/// `drop_git_repos`, a platform read fails, or the migration stops part way;
/// the last case carries a [`MigrationFailure`].
pub async fn run<P>(
    platform: Arc<P>,
    args: &MigrateArgs,
    sleeper: Option<Arc<dyn Sleeper>>,
    cancel: &CancellationToken,
) -> anyhow::Result<MigrateOutcome>
where
    P: PlatformInventory + PlatformGateway + 'static,
{
    let (space_guid, service) = locate(platform.as_ref(), args).await?;
    tracing::info!(service = %service.name, guid = %service.guid, "found config server");

    let dashboard_url = service
        .dashboard_url
        .as_deref()
        .with_context(|| format!("service {} has no dashboard url", service.name))?;
    let parameters = platform
        .fetch_parameters(&command_line_url(dashboard_url))
        .await
        .with_context(|| format!("couldn't get config parameters for service {}", service.guid))?;

    let flags = classify(&parameters);
    if flags.uses_old_git_repos && !args.drop_git_repos {
        bail!(
            "service {} uses \"git.repos\", which is not supported in SCS 3.x; \
             rerun with --drop-git-repos to migrate without those repositories",
            service.name
        );
    }
    if flags.uses_encrypt_key {
        tracing::warn!(service = %service.name, "\"encrypt.key\" needs SCS 3.1.6 or later");
    }

    let parameters = transformed(parameters);
    if args.dry_run {
        return Ok(MigrateOutcome::DryRun { flags, parameters });
    }

    let bindings = PlatformInventory::list_service_bindings(platform.as_ref(), &service.guid)
        .await
        .with_context(|| format!("couldn't list bindings for service {}", service.guid))?;

    let policy = MigrationPolicy::new();
    let gateway: Arc<dyn PlatformGateway> = platform;
    let mut orchestrator = MigrationOrchestrator::new(gateway, policy);
    if let Some(sleeper) = sleeper {
        orchestrator = orchestrator.with_sleeper(sleeper);
    }

    let instance = orchestrator
        .migrate(&service, &space_guid, parameters, &bindings, cancel)
        .await?;

    Ok(MigrateOutcome::Migrated {
        flags,
        instance,
        rebound_apps: bindings.len(),
    })
}

async fn locate(inventory: &dyn PlatformInventory, args: &MigrateArgs) -> anyhow::Result<(String, ServiceSummary)> {
    let orgs = inventory.list_orgs().await.context("couldn't list orgs")?;
    let Some(org) = orgs.into_iter().find(|o| o.name == args.org) else {
        bail!("org {} not found", args.org);
    };

    let spaces = inventory.list_spaces().await.context("couldn't list spaces")?;
    let Some(space) = spaces
        .into_iter()
        .find(|s| s.name == args.space && s.organization_guid == org.guid)
    else {
        bail!("space {} not found in org {}", args.space, args.org);
    };

    let summary = inventory
        .space_summary(&space.guid)
        .await
        .with_context(|| format!("couldn't get space summary for {}", space.guid))?;
    let Some(service) = summary
        .services
        .into_iter()
        .find(|s| s.name == args.service && s.label() == CONFIG_SERVER_2_LABEL)
    else {
        bail!(
            "no {CONFIG_SERVER_2_LABEL} instance named {} in {}/{}",
            args.service,
            args.org,
            args.space
        );
    };

    Ok((space.guid, service))
}

/// Step, cause and binding state of a stopped migration
#[must_use]
pub fn render_failure(failure: &MigrationFailure) -> String {
    let mut out = String::new();
    let progress = &failure.progress;

    let _ = writeln!(out, "migration of {} stopped at step \"{}\"", failure.service, failure.step);
    let _ = writeln!(out, "cause: {}", failure.cause);
    match (&progress.renamed_to, &progress.rename_requested) {
        (Some(renamed), _) => {
            let _ = writeln!(out, "original instance is now named {renamed}");
        }
        (None, Some(requested)) => {
            let _ = writeln!(
                out,
                "original instance was asked to rename to {requested}; check its name before retrying"
            );
        }
        (None, None) => {}
    }
    if let Some(instance) = &progress.new_instance {
        let _ = writeln!(out, "replacement instance: {} ({})", instance.name, instance.guid);
    }
    for binding in progress.migrated_bindings() {
        let _ = writeln!(out, "  moved: app {}", binding.app_guid);
    }
    if let Some(partial) = progress.partial_binding() {
        let _ = writeln!(
            out,
            "  partially moved: app {} (bound to new: {}, old binding deleted: {}, restage requested: {})",
            partial.app_guid,
            partial.new_binding_guid.is_some(),
            partial.old_binding_deleted,
            partial.restage_requested
        );
    }
    for binding in &progress.untouched_bindings {
        let _ = writeln!(out, "  not moved: app {}", binding.app_guid);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scs_core::MigrationStep;
    use scs_test_utils::{
        app, binding, config_server_summary, org, parameters_url, payload, space, FakePlatform, NoSleep,
        PlatformCall,
    };
    use serde_json::json;

    fn args() -> MigrateArgs {
        MigrateArgs {
            org: "payments".to_string(),
            space: "prod".to_string(),
            service: "config".to_string(),
            dry_run: false,
            drop_git_repos: false,
        }
    }

    fn platform(parameters: serde_json::Value) -> FakePlatform {
        FakePlatform::new()
            .with_org(org("org-1", "payments"))
            .with_org(org("org-2", "other"))
            .with_app(app("app-1", "billing"))
            .with_space(space("space-2", "prod", "org-2"), vec![config_server_summary("cs-9", "config", 0)])
            .with_space(space("space-1", "prod", "org-1"), vec![config_server_summary("cs-1", "config", 1)])
            .with_bindings("cs-1", vec![binding("b-1", "app-1", "cs-1")])
            .with_parameters(&parameters_url("cs-1"), payload(parameters))
    }

    async fn migrate(platform: &Arc<FakePlatform>, args: &MigrateArgs) -> anyhow::Result<MigrateOutcome> {
        run(platform.clone(), args, Some(Arc::new(NoSleep)), &CancellationToken::new()).await
    }

    #[tokio::test]
    async fn dry_run_changes_nothing() {
        let platform = Arc::new(platform(json!({ "composite": [ { "git": { "uri": "https://git" } } ] })));
        let args = MigrateArgs {
            dry_run: true,
            ..args()
        };

        let outcome = migrate(&platform, &args).await.unwrap();

        match &outcome {
            MigrateOutcome::DryRun { flags, parameters } => {
                assert!(flags.uses_old_composite);
                assert_eq!(
                    serde_json::Value::Object(parameters.clone()),
                    json!({ "composite": [ { "uri": "https://git", "type": "git" } ] })
                );
            }
            other => panic!("expected dry run, got {other:?}"),
        }
        assert!(platform.mutations().is_empty());
        assert!(outcome.render().starts_with("dry run, no changes made"));
    }

    #[tokio::test]
    async fn migrates_the_instance_in_the_named_org() {
        let platform = Arc::new(platform(json!({ "git": { "uri": "https://git" } })));

        let outcome = migrate(&platform, &args()).await.unwrap();

        match outcome {
            MigrateOutcome::Migrated { rebound_apps, .. } => assert_eq!(rebound_apps, 1),
            other => panic!("expected migration, got {other:?}"),
        }
        assert_eq!(
            platform.mutations().first(),
            Some(&PlatformCall::Rename {
                guid: "cs-1".to_string(),
                new_name: "config-old".to_string()
            })
        );
        assert!(!platform
            .mutations()
            .iter()
            .any(|c| matches!(c, PlatformCall::DeleteServiceInstance { .. })));
    }

    #[tokio::test]
    async fn git_repos_blocks_migration() {
        let platform = Arc::new(platform(json!({ "git": { "repos": { "team": {} } } })));

        let err = migrate(&platform, &args()).await.unwrap_err();

        assert!(err.to_string().contains("--drop-git-repos"));
        assert!(platform.mutations().is_empty());
    }

    #[tokio::test]
    async fn git_repos_can_be_dropped() {
        let platform = Arc::new(platform(json!({ "git": { "uri": "https://git", "repos": { "team": {} } } })));
        let args = MigrateArgs {
            drop_git_repos: true,
            dry_run: true,
            ..args()
        };

        let outcome = migrate(&platform, &args).await.unwrap();

        match outcome {
            MigrateOutcome::DryRun { parameters, .. } => {
                assert_eq!(serde_json::Value::Object(parameters), json!({ "git": { "uri": "https://git" } }));
            }
            other => panic!("expected dry run, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_service_is_an_error() {
        let platform = Arc::new(platform(json!({})));
        let args = MigrateArgs {
            service: "nope".to_string(),
            ..args()
        };

        let err = migrate(&platform, &args).await.unwrap_err();

        assert_eq!(err.to_string(), "no p-config-server instance named nope in payments/prod");
    }

    #[tokio::test]
    async fn failure_report_lists_bindings() {
        let platform = Arc::new(
            platform(json!({})).failing_on(|call| matches!(call, PlatformCall::Restage { .. })),
        );

        let err = migrate(&platform, &args()).await.unwrap_err();
        let failure = err.downcast_ref::<MigrationFailure>().unwrap();

        assert_eq!(failure.step, MigrationStep::Restage);
        let text = render_failure(failure);
        assert!(text.contains("stopped at step \"restage\""));
        assert!(text.contains("original instance is now named config-old"));
        assert!(text.contains("partially moved: app app-1 (bound to new: true, old binding deleted: true, restage requested: false)"));
    }

    #[tokio::test]
    async fn failure_report_mentions_unconfirmed_rename() {
        let platform = Arc::new(
            platform(json!({})).failing_on(|call| matches!(call, PlatformCall::ServiceInstance { .. })),
        );

        let err = migrate(&platform, &args()).await.unwrap_err();
        let failure = err.downcast_ref::<MigrationFailure>().unwrap();

        assert_eq!(failure.step, MigrationStep::AwaitRename);
        let text = render_failure(failure);
        assert!(text.contains("original instance was asked to rename to config-old"));
        assert!(!text.contains("is now named"));
    }
}
