//! In-process fake of the Keycloak admin API.
//!
//! Holds clients, client roles, users and client-role mappings for a single realm
//! in memory and answers with the statuses the real admin API uses. Role mappings
//! answer `409 Conflict` when a role is already mapped.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Form, Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use kc_provision::{ProvisionConfig, RetryPolicy};

/// Token the fake hands out and expects back.
pub const TOKEN: &str = "fake-admin-token";

/// Backing state of the fake realm.
#[derive(Debug, Default)]
pub struct Realm {
    /// Token requests still to reject with 503.
    pub unavailable_for: u32,
    /// Token requests received.
    pub token_attempts: u32,
    /// Clients, as stored JSON with an `id`.
    pub clients: Vec<Value>,
    /// Client roles keyed by client internal id.
    pub roles: HashMap<String, Vec<Value>>,
    /// Users, as stored JSON with an `id`.
    pub users: Vec<Value>,
    /// Role ids mapped per (user id, client id).
    pub mappings: HashMap<(String, String), Vec<String>>,
    /// Internal ids targeted by client PUTs.
    pub client_puts: Vec<String>,
    /// Last allocated id suffix.
    pub next_id: u64,
}

impl Realm {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Clients whose `clientId` matches.
    pub fn clients_named(&self, client_id: &str) -> Vec<&Value> {
        self.clients
            .iter()
            .filter(|c| c["clientId"] == client_id)
            .collect()
    }

    /// Users whose `username` matches.
    pub fn users_named(&self, username: &str) -> Vec<&Value> {
        self.users
            .iter()
            .filter(|u| u["username"] == username)
            .collect()
    }

    /// Role names mapped to a user for a client.
    pub fn mapped_role_names(&self, username: &str, client_id: &str) -> Vec<String> {
        let Some(user_id) = self.users_named(username).first().map(|u| id_of(u)) else {
            return Vec::new();
        };
        let Some(client_uuid) = self.clients_named(client_id).first().map(|c| id_of(c)) else {
            return Vec::new();
        };
        let roles = self.roles.get(&client_uuid).cloned().unwrap_or_default();
        self.mappings
            .get(&(user_id, client_uuid))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| roles.iter().find(|r| id_of(r) == *id))
                    .map(|r| r["name"].as_str().unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}

type Shared = Arc<Mutex<Realm>>;

/// A running fake admin API.
pub struct FakeKeycloak {
    /// Base URL of the server.
    pub base_url: String,
    /// Shared backing state.
    pub realm: Shared,
}

impl FakeKeycloak {
    /// Starts a fake with an empty realm.
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(Realm::default()).await
    }

    /// Starts a fake with the given backing state.
    pub async fn start_with(realm: Realm) -> anyhow::Result<Self> {
        let realm = Arc::new(Mutex::new(realm));
        let app = Router::new()
            .route("/realms/{realm}/protocol/openid-connect/token", post(token))
            .route(
                "/admin/realms/{realm}/clients",
                get(list_clients).post(create_client),
            )
            .route("/admin/realms/{realm}/clients/{id}", put(update_client))
            .route("/admin/realms/{realm}/clients/{id}/roles", post(create_role))
            .route("/admin/realms/{realm}/clients/{id}/roles/{name}", get(get_role))
            .route(
                "/admin/realms/{realm}/users",
                get(list_users).post(create_user),
            )
            .route(
                "/admin/realms/{realm}/users/{id}/role-mappings/clients/{client}",
                post(add_mappings),
            )
            .with_state(realm.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            realm,
        })
    }

    /// Default configuration pointed at this fake, polling without delay.
    pub fn config(&self) -> ProvisionConfig {
        ProvisionConfig {
            base_url: self.base_url.clone(),
            retry: RetryPolicy::new(5, 0),
            ..Default::default()
        }
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn token(
    State(realm): State<Shared>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut realm = realm.lock();
    realm.token_attempts += 1;

    if realm.unavailable_for > 0 {
        realm.unavailable_for -= 1;
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let valid = form.get("grant_type").map(String::as_str) == Some("password")
        && form.get("client_id").map(String::as_str) == Some("admin-cli")
        && form.get("username").map(String::as_str) == Some("admin")
        && form.get("password").map(String::as_str) == Some("admin");
    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid_grant" })),
        )
            .into_response();
    }

    Json(json!({
        "access_token": TOKEN,
        "token_type": "Bearer",
        "expires_in": 60
    }))
    .into_response()
}

async fn list_clients(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let realm = realm.lock();
    let clients: Vec<Value> = match query.get("clientId") {
        Some(client_id) => realm.clients_named(client_id).into_iter().cloned().collect(),
        None => realm.clients.clone(),
    };
    Json(clients).into_response()
}

async fn create_client(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Json(mut client): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut realm = realm.lock();
    let client_id = client["clientId"].as_str().unwrap_or_default().to_string();
    if !realm.clients_named(&client_id).is_empty() {
        return (StatusCode::CONFLICT, "Client already exists").into_response();
    }
    client["id"] = Value::String(realm.allocate_id("client"));
    realm.clients.push(client);
    StatusCode::CREATED.into_response()
}

async fn update_client(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Path((_realm, id)): Path<(String, String)>,
    Json(mut client): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut realm = realm.lock();
    realm.client_puts.push(id.clone());
    let Some(slot) = realm.clients.iter_mut().find(|c| c["id"] == id.as_str()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    client["id"] = Value::String(id);
    *slot = client;
    StatusCode::NO_CONTENT.into_response()
}

async fn get_role(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Path((_realm, id, name)): Path<(String, String, String)>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let realm = realm.lock();
    realm
        .roles
        .get(&id)
        .and_then(|roles| roles.iter().find(|r| r["name"] == name.as_str()))
        .map_or_else(
            || {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Could not find role" })),
                )
                    .into_response()
            },
            |role| Json(role.clone()).into_response(),
        )
}

async fn create_role(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Path((_realm, id)): Path<(String, String)>,
    Json(mut role): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut realm = realm.lock();
    if realm.clients.iter().all(|c| c["id"] != id.as_str()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let exists = realm
        .roles
        .get(&id)
        .is_some_and(|roles| roles.iter().any(|r| r["name"] == role["name"]));
    if exists {
        return (StatusCode::CONFLICT, "Role already exists").into_response();
    }
    role["id"] = Value::String(realm.allocate_id("role"));
    role["composite"] = Value::Bool(false);
    role["clientRole"] = Value::Bool(true);
    role["containerId"] = Value::String(id.clone());
    realm.roles.entry(id).or_default().push(role);
    StatusCode::CREATED.into_response()
}

async fn list_users(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let realm = realm.lock();
    let users: Vec<Value> = match query.get("username") {
        Some(username) => realm.users_named(username).into_iter().cloned().collect(),
        None => realm.users.clone(),
    };
    // Credentials are never returned by the admin API.
    let users: Vec<Value> = users
        .into_iter()
        .map(|mut u| {
            if let Some(obj) = u.as_object_mut() {
                obj.remove("credentials");
            }
            u
        })
        .collect();
    Json(users).into_response()
}

async fn create_user(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Json(mut user): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut realm = realm.lock();
    let username = user["username"].as_str().unwrap_or_default().to_string();
    if !realm.users_named(&username).is_empty() {
        return (StatusCode::CONFLICT, "User exists with same username").into_response();
    }
    user["id"] = Value::String(realm.allocate_id("user"));
    realm.users.push(user);
    StatusCode::CREATED.into_response()
}

async fn add_mappings(
    State(realm): State<Shared>,
    headers: HeaderMap,
    Path((_realm, user_id, client_uuid)): Path<(String, String, String)>,
    Json(roles): Json<Vec<Value>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut realm = realm.lock();
    let known = realm
        .roles
        .get(&client_uuid)
        .cloned()
        .unwrap_or_default();
    let mut ids = Vec::new();
    for role in &roles {
        let id = id_of(role);
        if known.iter().all(|r| id_of(r) != id) {
            return StatusCode::NOT_FOUND.into_response();
        }
        ids.push(id);
    }

    let mapped = realm.mappings.entry((user_id, client_uuid)).or_default();
    if ids.iter().any(|id| mapped.contains(id)) {
        return (StatusCode::CONFLICT, "Role already mapped").into_response();
    }
    mapped.extend(ids);
    StatusCode::NO_CONTENT.into_response()
}
