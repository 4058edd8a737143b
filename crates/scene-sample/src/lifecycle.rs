//! Process-level observability setup.
//!
//! [`setup_tracing`] initializes structured logging for the whole console.
//! Log level comes from `RUST_LOG`:
//!
//! ```bash
//! RUST_LOG=info cargo run      # lifecycle and toast lines
//! RUST_LOG=debug cargo run     # every action through every store
//! ```
//!
//! At `debug`, each store logs every action it dispatches, which reads as
//! a complete trace of a scene's behavior:
//!
//! ```text
//! DEBUG Dispatch scene=members action=invite_submitted
//! DEBUG Dispatch scene=members action=invite_started
//! DEBUG Demo backend CREATE path=/api/organizations/@current/invites
//! DEBUG Dispatch scene=members action=invite_finished
//! ```

/// Initializes the global tracing subscriber. Call once, first thing in
/// `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // Scene names are structured fields already
        .compact()
        .init();
}
