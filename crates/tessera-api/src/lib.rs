//! tessera-api — REST API for Tessera.
//!
//! Provides axum route handlers for every record collection. Each
//! collection `R` gets the same four routes, generated from
//! `R::COLLECTION`:
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/{collection}` | Create a record (201) |
//! | GET | `/{collection}/{id}` | Get a record |
//! | PUT | `/{collection}/{id}` | Replace a record |
//! | DELETE | `/{collection}/{id}` | Delete a record, returning it |
//!
//! Collections: `storage_clusters`, `compute_clusters`, `workers`,
//! `tenant_gateways`, `speakers`, `talks`, `workshops`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tessera_core::*;
use tessera_store::{ResourceService, StateStore};

use crate::auth::SharedSecret;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
}

impl ApiState {
    pub fn service<R: Record>(&self) -> ResourceService<R> {
        ResourceService::new(self.store.clone())
    }
}

/// Build the complete API router. With `auth_token` set, every route
/// requires the shared secret.
pub fn build_router(store: StateStore, auth_token: Option<&str>) -> Router {
    let router = Router::new()
        .merge(collection_routes::<StorageCluster>())
        .merge(collection_routes::<ComputeCluster>())
        .merge(collection_routes::<Worker>())
        .merge(collection_routes::<TenantGateway>())
        .merge(collection_routes::<Speaker>())
        .merge(collection_routes::<Talk>())
        .merge(collection_routes::<Workshop>())
        .fallback(handlers::unknown_route)
        .with_state(ApiState { store });

    match auth_token {
        Some(token) => {
            let secret = Arc::new(SharedSecret::new(token));
            router.layer(middleware::from_fn_with_state(secret, auth::require_secret))
        }
        None => router,
    }
}

/// The four CRUD routes for one collection.
pub fn collection_routes<R: Record>() -> Router<ApiState> {
    let collection = format!("/{}", R::COLLECTION);
    let item = format!("/{}/{{id}}", R::COLLECTION);

    Router::new()
        .route(
            &collection,
            post(handlers::create::<R>).fallback(handlers::method_not_allowed),
        )
        .route(
            &item,
            get(handlers::get::<R>)
                .put(handlers::update::<R>)
                .delete(handlers::delete::<R>)
                .fallback(handlers::method_not_allowed),
        )
}
