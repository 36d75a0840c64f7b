//! Fixed names used by migsweep that are not exposed through TOML

/// Environment variables consulted for the access token, in order
pub const TOKEN_ENV_VARS: &[&str] = &["GH_TOKEN", "MIGSWEEP_TOKEN"];

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub const APP_DIR: &str = "migsweep";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOGS_DIR: &str = "logs";
