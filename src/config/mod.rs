/// Database configuration and connection management
pub mod database;

/// Application settings loaded from TOML and the environment
pub mod settings;
