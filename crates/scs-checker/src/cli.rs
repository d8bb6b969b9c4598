//! Command-line arguments

use clap::{Args, Parser, Subcommand};
use scs_cloudfoundry::CloudFoundryConfig;

#[derive(Parser, Debug)]
#[command(
    name = "scs-migration-checker",
    version,
    about = "Finds Spring Cloud Services 2.x instances and migrates Config Servers to SCS 3.x"
)]
pub struct Cli {
    #[arg(long, global = true, help = "API endpoint. Required. ex: https://api.sys.foo.com")]
    pub api: Option<String>,

    #[arg(long, global = true, help = "Cloud Foundry API user. Required")]
    pub user: Option<String>,

    #[arg(
        long,
        global = true,
        env = "PASSWORD",
        hide_env_values = true,
        help = "Cloud Foundry API password. May also be provided via the $PASSWORD variable"
    )]
    pub password: Option<String>,

    #[arg(long, global = true, help = "Do not validate TLS connections")]
    pub insecure: bool,

    #[arg(short, long, global = true, help = "Log at debug level unless RUST_LOG says otherwise")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version, commit and build date
    Version,
    /// Report SCS 2.x instances across the foundation (default)
    Scan,
    /// Replace one SCS 2.x Config Server with an instance using the SCS 3.x schema
    Migrate(MigrateArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MigrateArgs {
    #[arg(long, help = "Org containing the service instance")]
    pub org: String,

    #[arg(long, help = "Space containing the service instance")]
    pub space: String,

    #[arg(long, help = "Name of the Config Server instance")]
    pub service: String,

    #[arg(long, help = "Print the rewritten parameters without changing anything")]
    pub dry_run: bool,

    #[arg(long, help = "Migrate even though \"git.repos\" is set; the repos are dropped")]
    pub drop_git_repos: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the api, user, and password flags are required, please try again")]
pub struct MissingCredentials;

impl Cli {
    /// Sub-command to run; scanning when none is given
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Scan)
    }

    /// Client settings from the credential flags
    ///
    /// # Errors
    /// [`MissingCredentials`] when api, user or password is absent or empty.
    pub fn cloud_foundry_config(&self) -> Result<CloudFoundryConfig, MissingCredentials> {
        let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_owned);

        match (present(&self.api), present(&self.user), present(&self.password)) {
            (Some(api), Some(user), Some(password)) => {
                Ok(CloudFoundryConfig::new(api, user, password).with_skip_ssl_validation(self.insecure))
            }
            _ => Err(MissingCredentials),
        }
    }
}
