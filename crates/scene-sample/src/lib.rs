//! # Console Sample
//!
//! A product-analytics console built on [`scene_store`]: seven scenes
//! covering auth, pipelines, settings and onboarding, wired together by
//! [`console::ConsoleSystem`]. The modules are exposed here so the
//! integration tests can drive whole scenes through their public
//! surface.

pub mod api;
pub mod backend;
pub mod config;
pub mod console;
pub mod lifecycle;
pub mod scenes;
