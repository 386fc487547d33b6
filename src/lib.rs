// src/lib.rs
// Terminal control panel for an ollama-remote daemon.

pub mod app;
pub mod busy;
pub mod drafts;
pub mod error;
pub mod events;
pub mod handlers;
pub mod listing;
pub mod panel;
pub mod remote_api;
pub mod settings;
pub mod tasks;
pub mod tui;
pub mod ui;
