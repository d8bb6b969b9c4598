use anyhow::Context;
use clap::Parser;
use scs_checker::commands::{migrate, scan};
use scs_checker::{build_info, logging, Cli, Command};
use scs_cloudfoundry::{CloudFoundryClient, CloudFoundryConfig};
use scs_core::MigrationFailure;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command() {
        Command::Version => {
            println!("{}", build_info::version_line());
            Ok(())
        }
        Command::Scan => {
            let client = connect(cli.cloud_foundry_config()?).await?;
            print!("{}", scan::run(&client).await?);
            Ok(())
        }
        Command::Migrate(args) => {
            let client = Arc::new(connect(cli.cloud_foundry_config()?).await?);
            let cancel = CancellationToken::new();
            spawn_interrupt_handler(cancel.clone());

            match migrate::run(client, &args, None, &cancel).await {
                Ok(outcome) => {
                    print!("{}", outcome.render());
                    Ok(())
                }
                Err(error) => {
                    if let Some(failure) = error.downcast_ref::<MigrationFailure>() {
                        eprint!("{}", migrate::render_failure(failure));
                    }
                    Err(error)
                }
            }
        }
    }
}

async fn connect(config: CloudFoundryConfig) -> anyhow::Result<CloudFoundryClient> {
    let api = config.api_address.clone();
    CloudFoundryClient::connect(config)
        .await
        .with_context(|| format!("could not create API client for {api}"))
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping before the next migration step");
            cancel.cancel();
        }
    });
}
