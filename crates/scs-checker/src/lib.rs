//! SCS Checker - command-line front end
//!
//! Wires the Cloud Controller client into the scanner and orchestrator:
//! - `scan` (default) prints every SCS 2.x instance and its blockers
//! - `migrate` replaces one Config Server with an SCS 3.x compatible one
//! - `version` prints build metadata

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod build_info;
pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, Command, MigrateArgs, MissingCredentials};
