//! Scanning a fake foundation end to end

use scs_core::{render_report, ScanContext, ScanError, Scanner};
use scs_test_utils::{
    app, binding, circuit_breaker_summary, config_server_summary, org, parameters_url, payload,
    service_registry_summary, space, FakePlatform, PlatformCall,
};
use serde_json::json;

fn foundation() -> FakePlatform {
    FakePlatform::new()
        .with_org(org("org-1", "payments"))
        .with_app(app("app-1", "billing"))
        .with_app(app("app-2", "ledger"))
        .with_space(
            space("space-1", "prod", "org-1"),
            vec![
                config_server_summary("cs-1", "config", 2),
                service_registry_summary("sr-1", "registry", 0),
                circuit_breaker_summary("cb-1", "hystrix", 0),
            ],
        )
        .with_bindings(
            "cs-1",
            vec![binding("b-1", "app-1", "cs-1"), binding("b-2", "app-2", "cs-1")],
        )
        .with_parameters(
            &parameters_url("cs-1"),
            payload(json!({
                "git": { "uri": "https://git.example.com/config", "repos": { "team": {} } },
                "composite": [ { "vault": { "host": "vault" } } ]
            })),
        )
}

#[tokio::test]
async fn scan_finds_every_deprecated_instance() {
    let platform = foundation();
    let context = ScanContext::load(&platform).await.unwrap();

    let report = Scanner::new(&platform, &context).scan().await.unwrap();

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.circuit_breakers.len(), 1);
    assert_eq!(report.service_registries.len(), 1);

    let config = &report.config_servers[0];
    assert_eq!(config.org, "payments");
    assert_eq!(config.space, "prod");
    assert_eq!(config.bound_apps, 2);
    assert_eq!(config.app_names, vec!["billing", "ledger"]);
    assert!(config.flags.uses_old_git_repos);
    assert!(config.flags.uses_old_composite);
    assert!(!config.flags.uses_encrypt_key);

    let registry = &report.service_registries[0];
    assert!(registry.app_names.is_empty());
    assert!(registry.flags == scs_core::CompatibilityFlags::default());

    let text = render_report(&report);
    assert!(text.contains("- payments/prod/config (2 apps)"));
    assert!(text.contains("\"git.repos\""));
}

#[tokio::test]
async fn scan_never_mutates() {
    let platform = foundation();
    let context = ScanContext::load(&platform).await.unwrap();

    Scanner::new(&platform, &context).scan().await.unwrap();

    assert!(platform.mutations().is_empty());
    // unbound instances are not asked for bindings
    let binding_lookups: Vec<_> = platform
        .calls()
        .into_iter()
        .filter(|c| matches!(c, PlatformCall::ListBindings { .. }))
        .collect();
    assert_eq!(
        binding_lookups,
        vec![PlatformCall::ListBindings {
            service_instance_guid: "cs-1".to_string()
        }]
    );
}

#[tokio::test]
async fn failures_are_collected_per_space_and_service() {
    let platform = FakePlatform::new()
        .with_org(org("org-1", "payments"))
        .with_space(space("space-1", "prod", "org-1"), vec![config_server_summary("cs-9", "config", 0)])
        .with_space(space("space-2", "dev", "org-1"), vec![service_registry_summary("sr-1", "eureka", 0)])
        .failing_on(|call| matches!(call, PlatformCall::SpaceSummary { space_guid } if space_guid == "space-1"))
        .failing_on(|call| matches!(call, PlatformCall::FetchParameters { .. }));
    let context = ScanContext::load(&platform).await.unwrap();

    let report = Scanner::new(&platform, &context).scan().await.unwrap();

    assert_eq!(report.errors.len(), 1);
    assert!(matches!(&report.errors[0], ScanError::SpaceSummary { space_guid, .. } if space_guid == "space-1"));
    assert_eq!(report.service_registries.len(), 1);
    assert!(render_report(&report).starts_with("Encountered 1 errors:"));
}

#[tokio::test]
async fn space_listing_failure_aborts() {
    let platform = FakePlatform::new().failing_on(|call| matches!(call, PlatformCall::ListSpaces));
    let context = ScanContext::default();

    let result = Scanner::new(&platform, &context).scan().await;

    assert_eq!(result.unwrap_err().status(), Some(502));
}
