//! API payload types and path builders shared by the scenes.
//!
//! Paths are built in one place so scenes and test expectations can never
//! drift apart on a URL. The client itself stays behind
//! [`HttpClient`](scene_store::HttpClient); removal and other mutations go
//! through `create` on action-style paths.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberLevel {
    Member,
    Admin,
    Owner,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub email: String,
    pub level: MemberLevel,
}

/// One time bucket of pipeline delivery counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub bucket: String,
    pub succeeded: u64,
    pub failed: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: String,
    pub level: String,
    pub message: String,
}

/// A personal API key as the scopes editor sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub label: String,
    pub scopes: Vec<String>,
}

/// Session-recording settings as stored server-side. The sample rate is a
/// fraction in `[0.0, 1.0]`, not a percentage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub sample_rate: f64,
    pub minimum_duration_ms: Option<u64>,
}

pub fn projects_path(base: &str) -> String {
    format!("{base}/projects")
}

pub fn authorize_path(base: &str) -> String {
    format!("{base}/cli-auth/authorize")
}

pub fn signup_path(base: &str) -> String {
    format!("{base}/signup")
}

pub fn members_path(base: &str) -> String {
    format!("{base}/organizations/@current/members")
}

pub fn invite_path(base: &str) -> String {
    format!("{base}/organizations/@current/invites")
}

pub fn remove_member_path(base: &str, id: u64) -> String {
    format!("{base}/organizations/@current/members/{id}/remove")
}

pub fn metrics_path(base: &str, pipeline: &str, window: &str) -> String {
    format!("{base}/pipelines/{pipeline}/metrics?window={window}")
}

pub fn logs_path(base: &str, pipeline: &str) -> String {
    format!("{base}/pipelines/{pipeline}/logs")
}

pub fn current_key_path(base: &str) -> String {
    format!("{base}/personal-api-keys/current")
}

pub fn update_key_path(base: &str) -> String {
    format!("{base}/personal-api-keys/current/update")
}

pub fn replay_config_path(base: &str) -> String {
    format!("{base}/replay/config")
}
