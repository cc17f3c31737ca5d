//! Build metadata consumed by the standard User-Agent.

/// Build version: the `BUILD_VERSION` env var at compile time, else the crate version
pub const BUILD_VERSION: &str = match option_env!("BUILD_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
