//! HTTP/JSON front end for the contact agenda.
//!
//! # Responsibility
//! - Route one endpoint per contact use-case.
//! - Run blocking SQLite work off the async executor.
//!
//! # Invariants
//! - One shared connection; each request holds its lock for a single
//!   service call only.
//! - Handlers never talk to the repository directly.

#![forbid(unsafe_code)]

pub mod config;
pub mod http;

pub use config::{ConfigError, ServerConfig};
pub use http::response::{ApiError, Envelope, EnvelopeStatus};

use agenda_core::{ContactService, RepoError, ServiceResult, SqliteContactRepository};
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn;
use axum::routing::{get, patch, post};
use axum::Router;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    max_body_bytes: usize,
}

impl AppState {
    /// Wraps a connection opened through `agenda_core::db`.
    ///
    /// # Errors
    /// - Returns an error when the connection does not carry the contact schema.
    pub fn new(conn: Connection, max_body_bytes: usize) -> Result<Self, RepoError> {
        let _ = SqliteContactRepository::try_new(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
            max_body_bytes,
        })
    }

    /// Runs one service call on the blocking pool.
    pub(crate) async fn run<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&ContactService<SqliteContactRepository<'_>>) -> ServiceResult<T>
            + Send
            + 'static,
    {
        let db = Arc::clone(&self.db);
        let joined = tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| ApiError::Internal("connection lock poisoned".to_string()))?;
            let service = ContactService::new(SqliteContactRepository::new(&conn));
            call(&service).map_err(ApiError::from)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => Err(ApiError::Internal(format!("blocking task failed: {err}"))),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    use crate::http::handlers;

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route(
            "/api/contacts",
            post(handlers::create_contact).get(handlers::list_contacts),
        )
        .route("/api/contacts/total", get(handlers::count_all))
        .route("/api/contacts/total-active", get(handlers::count_active))
        .route("/api/contacts/total-inactive", get(handlers::count_inactive))
        .route("/api/contacts/total-favorites", get(handlers::count_favorites))
        .route("/api/contacts/favorites", get(handlers::list_favorites))
        .route("/api/contacts/inactive", get(handlers::list_inactive))
        .route(
            "/api/contacts/:id",
            get(handlers::get_contact)
                .put(handlers::update_contact)
                .delete(handlers::delete_contact),
        )
        .route(
            "/api/contacts/:id/deactivate",
            patch(handlers::deactivate_contact),
        )
        .route(
            "/api/contacts/:id/activate",
            patch(handlers::activate_contact),
        )
        .route(
            "/api/contacts/:id/favorite",
            patch(handlers::favorite_contact),
        )
        .route(
            "/api/contacts/:id/unfavorite",
            patch(handlers::unfavorite_contact),
        )
        .route(
            "/api/contacts/:id/toggle-favorite",
            patch(handlers::toggle_favorite_contact),
        )
        .layer(from_fn(crate::http::request_logging_middleware))
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .with_state(state)
}
