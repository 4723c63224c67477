//! Admin API wire representations.
//!
//! Field names follow the Keycloak admin REST representations (camelCase on the
//! wire). Every representation tolerates missing fields so that server responses
//! carrying more or fewer attributes than we send still deserialize.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// PKCE challenge method attribute key.
pub const PKCE_METHOD_ATTRIBUTE: &str = "pkce.code.challenge.method";

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer access token.
    pub access_token: String,
    /// Lifetime in seconds, if reported.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// OAuth client definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientRepresentation {
    /// Server-assigned internal identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// OAuth `client_id`, unique within the realm.
    pub client_id: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the client is enabled.
    pub enabled: bool,
    /// Whether this is a public client.
    pub public_client: bool,
    /// Protocol (`openid-connect`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Authorization Code flow.
    pub standard_flow_enabled: bool,
    /// Resource Owner Password Credentials grant.
    pub direct_access_grants_enabled: bool,
    /// Root URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_url: Option<String>,
    /// Base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Allowed redirect URIs.
    pub redirect_uris: Vec<String>,
    /// Allowed web origins (CORS).
    pub web_origins: Vec<String>,
    /// Protocol extension attributes.
    pub attributes: BTreeMap<String, String>,
}

impl ClientRepresentation {
    /// Returns the configured PKCE challenge method, if any.
    #[must_use]
    pub fn pkce_method(&self) -> Option<&str> {
        self.attributes.get(PKCE_METHOD_ATTRIBUTE).map(String::as_str)
    }
}

/// Client role.
///
/// Role mappings reference roles by their full representation, so every field the
/// server returns is retained in `extra` and sent back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    /// Server-assigned identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role name, unique within the client.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Remaining server-side fields (`composite`, `clientRole`, `containerId`, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RoleRepresentation {
    /// Creates a role definition with a description.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// User credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRepresentation {
    /// Credential type.
    #[serde(rename = "type")]
    pub type_: String,
    /// Secret value.
    pub value: String,
    /// Whether the user must change it at first login.
    #[serde(default)]
    pub temporary: bool,
}

impl CredentialRepresentation {
    /// Creates a non-temporary password credential.
    #[must_use]
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            type_: "password".to_string(),
            value: value.into(),
            temporary: false,
        }
    }
}

/// User definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRepresentation {
    /// Server-assigned identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Username, unique within the realm.
    pub username: String,
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// First name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Whether the user is enabled.
    pub enabled: bool,
    /// Whether the email address is verified.
    pub email_verified: bool,
    /// Initial credentials.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<CredentialRepresentation>,
}

impl UserRepresentation {
    /// Returns the initial password, if one is configured.
    #[must_use]
    pub fn initial_password(&self) -> Option<&str> {
        self.credentials
            .iter()
            .find(|c| c.type_ == "password")
            .map(|c| c.value.as_str())
    }
}
