//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ProvisionConfig;

/// Keycloak provisioner - idempotently sets up a realm's client, roles and admin user.
#[derive(Debug, Parser)]
#[command(name = "kc-provision")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long, env = "KC_PROVISION_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server URL (overrides config).
    #[arg(short, long, env = "KC_SERVER_URL")]
    pub server: Option<String>,

    /// Realm to provision (overrides config).
    #[arg(short, long, env = "KC_REALM")]
    pub realm: Option<String>,

    /// Admin username (overrides config).
    #[arg(long, env = "KC_ADMIN_USER")]
    pub admin_user: Option<String>,

    /// Admin password (overrides config).
    #[arg(long, env = "KC_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Maximum readiness attempts (overrides config).
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Seconds between readiness attempts (overrides config).
    #[arg(long)]
    pub interval_secs: Option<u64>,

    /// Only upsert the client; skip roles and the admin user.
    #[arg(long)]
    pub client_only: bool,

    /// Report format.
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Report format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration.
    pub fn apply(&self, config: &mut ProvisionConfig) {
        if let Some(server) = &self.server {
            config.base_url = server.clone();
        }
        if let Some(realm) = &self.realm {
            config.realm = realm.clone();
        }
        if let Some(user) = &self.admin_user {
            config.admin_user = user.clone();
        }
        if let Some(password) = &self.admin_password {
            config.admin_password = password.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(interval_secs) = self.interval_secs {
            config.retry.interval_secs = interval_secs;
        }
        if self.client_only {
            config.client_only();
        }
    }
}
