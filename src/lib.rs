pub mod authentication;
pub mod cache;
pub mod config;
pub mod data_formats;
pub mod db_helpers;
pub mod errors;
mod handlers;
pub mod media;
pub mod models;
pub mod pagination;

use anyhow::Context;
pub use anyhow::Result;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::*,
    Router,
};
use handlers::*;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use std::{net::TcpListener, sync::Arc};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::{cache::PageCache, config::Config, pagination::Paginator};

const DEFAULT_LOG_FILTER: &str = "yatube=info,tower_http=info";

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub page_cache: Arc<PageCache>,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> SqlitePool {
        app_state.pool.clone()
    }
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let pool = init_db(&config.database_url).await?;
        Ok(Self {
            pool,
            page_cache: Arc::new(PageCache::new(config.index_cache_ttl)),
            config: Arc::new(config),
        })
    }

    pub fn paginator(&self) -> Paginator {
        Paginator::new(self.config.page_size)
    }
}

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn run_app(listener: TcpListener, state: AppState) -> Result<()> {
    let app = make_router(state);
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        tracing::info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {}", db_url))?;
    } else {
        tracing::debug!("Database already exists");
    }
    let pool = SqlitePool::connect(db_url)
        .await
        .with_context(|| format!("Failed to connect to {}", db_url))?;
    tracing::info!("Running migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations completed");
    Ok(pool)
}

pub fn make_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_root);
    let upload_limit = state.config.max_upload_bytes;
    Router::new()
        // ==== POSTS ==== //
        .route("/", get(index))
        .route("/group/:slug/", get(group_posts))
        .route("/profile/:username/", get(profile))
        .route("/profile/:username/follow/", get(profile_follow))
        .route("/profile/:username/unfollow/", get(profile_unfollow))
        .route("/posts/:post_id/", get(post_detail))
        .route("/posts/:post_id/edit/", get(post_edit_form).post(post_edit))
        .route("/posts/:post_id/comment/", post(add_comment))
        .route("/create/", get(post_create_form).post(post_create))
        .route("/follow/", get(follow_index))
        // ==== USERS ==== //
        .route("/auth/signup/", get(signup_form).post(signup))
        .route("/auth/login/", get(login_form).post(login))
        .route("/auth/logout/", get(logout).post(logout))
        .route(
            "/auth/password_change/",
            get(password_change_form).post(password_change),
        )
        .route("/auth/password_change/done/", get(password_change_done))
        .route(
            "/auth/password_reset/",
            get(password_reset_form).post(password_reset),
        )
        .route("/auth/password_reset/done/", get(password_reset_done))
        .route(
            "/auth/reset/:uid/:token/",
            get(password_reset_confirm_form).post(password_reset_confirm),
        )
        .route("/auth/reset/done/", get(password_reset_complete))
        // ==== ABOUT ==== //
        .route("/about/author/", get(about_author))
        .route("/about/tech/", get(about_tech))
        // ==== MEDIA ==== //
        .nest_service("/media", media)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
