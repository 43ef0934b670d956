//! Library API
//!
//! A REST JSON server for a small lending library: book catalog CRUD,
//! loan creation and return tracking, and a daily late loan email notifier.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
