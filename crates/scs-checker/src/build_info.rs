//! Build metadata baked in at compile time

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `SCS_BUILD_COMMIT` at build time
pub const COMMIT: &str = match option_env!("SCS_BUILD_COMMIT") {
    Some(commit) => commit,
    None => "none",
};

/// `SCS_BUILD_DATE` at build time
pub const DATE: &str = match option_env!("SCS_BUILD_DATE") {
    Some(date) => date,
    None => "unknown",
};

/// `0.1.0, commit abc123, built at 2024-01-01`
#[must_use]
pub fn version_line() -> String {
    format!("{VERSION}, commit {COMMIT}, built at {DATE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_line_shape() {
        let line = version_line();
        assert!(line.starts_with(VERSION));
        assert!(line.contains(&format!(", commit {COMMIT}, built at {DATE}")));
    }
}
