//! SCS Cloud Foundry - Cloud Controller v2 backend
//!
//! Implements [`scs_core::PlatformInventory`] and [`scs_core::PlatformGateway`]
//! over HTTP:
//! - UAA password grant discovered through `/v2/info`
//! - Paginated listings following `next_url`
//! - One re-login when the token is rejected
//!
//! # Example
//!
//! ```rust,ignore
//! use scs_cloudfoundry::{CloudFoundryClient, CloudFoundryConfig};
//!
//! let config = CloudFoundryConfig::new("https://api.sys.example.com", "admin", "secret")
//!     .with_skip_ssl_validation(true);
//! let client = CloudFoundryClient::connect(config).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod auth;
pub mod client;
pub mod config;
pub mod error;
mod models;

pub use client::CloudFoundryClient;
pub use config::CloudFoundryConfig;
pub use error::ClientError;
