//! An in-memory stand-in for the console API, so the demo binary runs end
//! to end without a server. Routes are matched against the same builders
//! in [`crate::api`] that the scenes use, and mutations actually mutate,
//! so a second fetch sees what the first submit wrote.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use scene_store::{ApiError, HttpClient};

use crate::api::{self, ApiKey, LogLine, Member, MemberLevel, MetricPoint, Project, ReplayConfig};

/// The one CLI authorization code the demo backend accepts.
pub const DEMO_AUTH_CODE: &str = "DEMO-1234";

struct DemoState {
    projects: Vec<Project>,
    members: Vec<Member>,
    next_member_id: u64,
    key: ApiKey,
    replay: ReplayConfig,
}

impl DemoState {
    fn seeded() -> Self {
        Self {
            projects: vec![
                Project { id: 1, name: "Demo Corp".to_string() },
                Project { id: 2, name: "Demo Corp Staging".to_string() },
            ],
            members: vec![
                Member { id: 1, email: "alice@example.com".to_string(), level: MemberLevel::Owner },
                Member { id: 2, email: "bob@example.com".to_string(), level: MemberLevel::Member },
            ],
            next_member_id: 3,
            key: ApiKey {
                label: "demo".to_string(),
                scopes: vec!["insight:read".to_string(), "dashboard:read".to_string()],
            },
            replay: ReplayConfig { sample_rate: 1.0, minimum_duration_ms: None },
        }
    }
}

/// Demo implementation of [`HttpClient`] over mutable canned data.
pub struct DemoBackend {
    base: String,
    state: Mutex<DemoState>,
}

impl DemoBackend {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into(), state: Mutex::new(DemoState::seeded()) }
    }

    fn lock(&self) -> MutexGuard<'_, DemoState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn authorize(&self, body: &Value) -> Result<Value, ApiError> {
        let code = body.get("code").and_then(Value::as_str).unwrap_or_default();
        if code != DEMO_AUTH_CODE {
            return Err(ApiError::new(400, "invalid_code", "unknown or expired code"));
        }
        let project = body.get("project").and_then(Value::as_u64);
        let state = self.lock();
        match project {
            Some(id) if state.projects.iter().any(|p| p.id == id) => Ok(json!({"authorized": true})),
            _ => Err(ApiError::new(403, "access_denied", "project not accessible")),
        }
    }

    fn signup(&self, body: &Value) -> Result<Value, ApiError> {
        let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
        if email == "taken@example.com" {
            return Err(ApiError::new(409, "email_taken", "account already exists"));
        }
        Ok(json!({"id": 99}))
    }

    fn invite(&self, body: &Value) -> Result<Value, ApiError> {
        let email = body.get("email").and_then(Value::as_str).unwrap_or_default().to_string();
        let level: MemberLevel = serde_json::from_value(
            body.get("level").cloned().unwrap_or(Value::Null),
        )
        .map_err(|_| ApiError::new(400, "invalid_level", "unknown member level"))?;

        let mut state = self.lock();
        if state.members.iter().any(|m| m.email == email) {
            return Err(ApiError::new(409, "already_member", "this email is already a member"));
        }
        let member = Member { id: state.next_member_id, email, level };
        state.next_member_id += 1;
        state.members.push(member.clone());
        respond(&member)
    }

    fn remove_member(&self, route: &str) -> Result<Value, ApiError> {
        let prefix = format!("{}/organizations/@current/members/", self.base);
        let id: u64 = route
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix("/remove"))
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| ApiError::new(404, "not_found", format!("no demo route for {route}")))?;

        let mut state = self.lock();
        if !state.members.iter().any(|m| m.id == id) {
            return Err(ApiError::new(404, "not_found", "no such member"));
        }
        state.members.retain(|m| m.id != id);
        Ok(json!({}))
    }

    fn update_key(&self, body: &Value) -> Result<Value, ApiError> {
        let scopes: Vec<String> = serde_json::from_value(
            body.get("scopes").cloned().unwrap_or(Value::Null),
        )
        .map_err(|_| ApiError::new(400, "invalid_scopes", "scopes must be a string list"))?;

        let mut state = self.lock();
        state.key.scopes = scopes;
        respond(&state.key)
    }

    fn update_replay(&self, body: &Value) -> Result<Value, ApiError> {
        let config: ReplayConfig = serde_json::from_value(body.clone())
            .map_err(|_| ApiError::new(400, "invalid_rate", "sample rate out of range"))?;
        if !(0.0..=1.0).contains(&config.sample_rate) {
            return Err(ApiError::new(400, "invalid_rate", "sample rate out of range"));
        }

        let mut state = self.lock();
        state.replay = config;
        respond(&state.replay)
    }

    fn metrics(&self) -> Result<Value, ApiError> {
        respond(&vec![
            MetricPoint { bucket: "08:00".to_string(), succeeded: 1423, failed: 2 },
            MetricPoint { bucket: "09:00".to_string(), succeeded: 1390, failed: 0 },
            MetricPoint { bucket: "10:00".to_string(), succeeded: 1511, failed: 7 },
        ])
    }

    fn logs(&self) -> Result<Value, ApiError> {
        respond(&vec![
            LogLine {
                timestamp: "10:02:11".to_string(),
                level: "info".to_string(),
                message: "batch of 500 events exported".to_string(),
            },
            LogLine {
                timestamp: "10:02:14".to_string(),
                level: "warn".to_string(),
                message: "destination responded 429, retrying".to_string(),
            },
        ])
    }
}

#[async_trait]
impl HttpClient for DemoBackend {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        debug!(path, "Demo backend GET");
        let route = path.split_once('?').map_or(path, |(route, _)| route);

        if route == api::projects_path(&self.base) {
            return respond(&self.lock().projects);
        }
        if route == api::members_path(&self.base) {
            return respond(&self.lock().members);
        }
        if route == api::current_key_path(&self.base) {
            return respond(&self.lock().key);
        }
        if route == api::replay_config_path(&self.base) {
            return respond(&self.lock().replay);
        }
        if let Some(rest) = route.strip_prefix(&format!("{}/pipelines/", self.base)) {
            if rest.ends_with("/metrics") {
                return self.metrics();
            }
            if rest.ends_with("/logs") {
                return self.logs();
            }
        }
        Err(ApiError::new(404, "not_found", format!("no demo route for {path}")))
    }

    async fn create(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        debug!(path, "Demo backend CREATE");

        if path == api::authorize_path(&self.base) {
            return self.authorize(&body);
        }
        if path == api::signup_path(&self.base) {
            return self.signup(&body);
        }
        if path == api::invite_path(&self.base) {
            return self.invite(&body);
        }
        if path == api::update_key_path(&self.base) {
            return self.update_key(&body);
        }
        if path == api::replay_config_path(&self.base) {
            return self.update_replay(&body);
        }
        if path.ends_with("/remove") {
            return self.remove_member(path);
        }
        Err(ApiError::new(404, "not_found", format!("no demo route for {path}")))
    }
}

fn respond<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|err| ApiError::invalid_payload(err.to_string()))
}
