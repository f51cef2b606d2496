//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the database pool, the dialogue controller, and
//! configuration. The controller is stateless; every session's state lives
//! in its own `DialogueSession`, so sessions never contend on shared data.

use crate::config::Config;
use crate::db::Db;
use smartauction_core::controller::DialogueController;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub controller: Arc<DialogueController>,
    pub config: Arc<Config>,
}
