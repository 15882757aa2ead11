//! Composition and dispatch machinery behind the command line.

pub mod app;
pub mod auth;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod flag;
pub mod hooks;
pub mod plugin;
pub mod registry;
pub mod store;
