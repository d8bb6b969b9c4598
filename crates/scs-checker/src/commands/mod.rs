//! Sub-command implementations, independent of how the platform is reached

pub mod migrate;
pub mod scan;
