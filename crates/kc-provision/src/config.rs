//! Provisioning configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{
    ClientRepresentation, CredentialRepresentation, RoleRepresentation, UserRepresentation,
    PKCE_METHOD_ATTRIBUTE,
};

/// Fixed-count, fixed-delay retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least one).
    pub max_attempts: u32,
    /// Delay between failed attempts, in seconds.
    pub interval_secs: u64,
}

impl RetryPolicy {
    /// Creates a new policy.
    #[must_use]
    pub const fn new(max_attempts: u32, interval_secs: u64) -> Self {
        Self {
            max_attempts,
            interval_secs,
        }
    }

    /// Delay between failed attempts.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(30, 2)
    }
}

/// A user to provision together with the client role it should hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssignment {
    /// User definition.
    pub user: UserRepresentation,
    /// Name of the client role to assign.
    pub client_role: String,
}

/// Provisioning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Keycloak base URL (e.g., http://localhost:8180).
    pub base_url: String,
    /// Realm to provision into.
    pub realm: String,
    /// Realm holding the admin account.
    pub admin_realm: String,
    /// Client used for the admin password grant.
    pub admin_client_id: String,
    /// Admin username.
    pub admin_user: String,
    /// Admin password.
    pub admin_password: String,
    /// OAuth client to upsert.
    pub client: ClientRepresentation,
    /// Client roles to upsert.
    pub roles: Vec<RoleRepresentation>,
    /// User to upsert and assign a client role to.
    pub user: Option<UserAssignment>,
    /// Readiness polling policy.
    pub retry: RetryPolicy,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8180".to_string(),
            realm: "enterprise".to_string(),
            admin_realm: "master".to_string(),
            admin_client_id: "admin-cli".to_string(),
            admin_user: "admin".to_string(),
            admin_password: "admin".to_string(),
            client: default_client(),
            roles: vec![
                RoleRepresentation::new(
                    "MICROSERVICES_ADMIN",
                    "Administrator role for microservices client",
                ),
                RoleRepresentation::new(
                    "MICROSERVICES_USER",
                    "Standard user role for microservices client",
                ),
            ],
            user: Some(UserAssignment {
                user: default_user(),
                client_role: "MICROSERVICES_ADMIN".to_string(),
            }),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_client() -> ClientRepresentation {
    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(PKCE_METHOD_ATTRIBUTE.to_string(), "S256".to_string());

    ClientRepresentation {
        id: None,
        client_id: "microservices".to_string(),
        name: Some("Microservices Frontend".to_string()),
        description: Some("Public client for Microservices Frontend with PKCE".to_string()),
        enabled: true,
        public_client: true,
        protocol: Some("openid-connect".to_string()),
        standard_flow_enabled: true,
        direct_access_grants_enabled: true,
        root_url: Some("http://localhost:4200".to_string()),
        base_url: Some("http://localhost:4200".to_string()),
        redirect_uris: vec![
            "http://localhost:4200/*".to_string(),
            "http://localhost/*".to_string(),
        ],
        web_origins: vec!["*".to_string()],
        attributes,
    }
}

fn parse_error(e: impl std::fmt::Display) -> crate::ProvisionError {
    crate::ProvisionError::Config(format!("failed to parse config: {e}"))
}

fn default_user() -> UserRepresentation {
    UserRepresentation {
        id: None,
        username: "microservices-admin".to_string(),
        email: Some("microservices-admin@example.com".to_string()),
        first_name: Some("Microservices".to_string()),
        last_name: Some("Admin".to_string()),
        enabled: true,
        email_verified: true,
        credentials: vec![CredentialRepresentation::password("microservices-admin123")],
    }
}

impl ProvisionConfig {
    /// Loads configuration from a TOML file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> crate::ProvisionResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML. Absent keys keep their defaults.
    ///
    /// A file that lists its own `roles` but has no `[user]` table provisions no
    /// user; the default user only accompanies the default roles.
    pub fn from_toml(content: &str) -> crate::ProvisionResult<Self> {
        let table: toml::Table = toml::from_str(content).map_err(parse_error)?;
        let defines_roles = table.contains_key("roles");
        let defines_user = table.contains_key("user");

        let mut config: Self = toml::Value::Table(table).try_into().map_err(parse_error)?;
        if defines_roles && !defines_user {
            config.user = None;
        }
        Ok(config)
    }

    /// Drops roles and the user, leaving only the client upsert.
    pub fn client_only(&mut self) {
        self.roles.clear();
        self.user = None;
    }

    /// Validates the configuration.
    pub fn validate(&self) -> crate::ProvisionResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(crate::ProvisionError::Config("base_url is required".to_string()));
        }
        if self.realm.trim().is_empty() {
            return Err(crate::ProvisionError::Config("realm is required".to_string()));
        }
        if self.client.client_id.trim().is_empty() {
            return Err(crate::ProvisionError::Config(
                "client.clientId is required".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(crate::ProvisionError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(assignment) = &self.user {
            if assignment.user.username.trim().is_empty() {
                return Err(crate::ProvisionError::Config(
                    "user.username is required".to_string(),
                ));
            }
            if !self.roles.iter().any(|r| r.name == assignment.client_role) {
                return Err(crate::ProvisionError::Config(format!(
                    "client role '{}' is assigned to '{}' but not defined in roles",
                    assignment.client_role, assignment.user.username
                )));
            }
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
