//! taskdeck - client state layer for a task management server
//!
//! # Module Organization
//!
//! - `api`: the remote data client (`Remote` trait, reqwest implementation)
//! - `channel`: Socket.IO live notification channel
//! - `store`: entity slices and the shared `StoreHandle`
//! - `commands`: validated, tracked operations against the remote
//! - `model`: wire entities and request payloads
//! - `validate`: form validation rules
//! - `session`: persisted bearer-token session
//! - `config`: configuration loading from `taskdeck.toml`
//! - `cli`, `output`, `events`: the command-line surface
//! - `lock`: file locking and atomic writes

pub mod api;
pub mod channel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod lock;
pub mod model;
pub mod output;
pub mod session;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
