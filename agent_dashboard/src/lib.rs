//! Agent availability dashboard.
//!
//! Polls three JSON endpoints (GUARDIANS, PLATINUM and the per-state DH
//! insurance list), normalizes them into a [`snapshot::Snapshot`] and renders
//! the result into a headless [`render::View`] drawn by the terminal UI.

pub mod auto_refresh;
pub mod config;
pub mod endpoints;
pub mod notifier;
pub mod orchestrator;
pub mod render;
pub mod snapshot;
pub mod tui;
