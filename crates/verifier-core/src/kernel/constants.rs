/// Application name
pub const APP_NAME: &str = "plugin-verifier";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
