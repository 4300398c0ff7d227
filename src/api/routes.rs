use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

use crate::api::handlers::{self, AppState};
use crate::api::{collection_handlers, stats_handlers};
use crate::config::AppConfig;
use crate::model::{AddonSeries, SiteSeries};
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>(config: Arc<AppConfig>) -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .merge(collection_routes::<S>())
        .merge(site_stats_routes::<S>())
        .merge(addon_stats_routes::<S>())
        .layer(Extension(config))
}

fn collection_routes<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        .route(
            "/collections",
            get(collection_handlers::list_collections::<S>)
                .post(collection_handlers::create_collection::<S>),
        )
        .route(
            "/collections/:id",
            get(collection_handlers::get_collection::<S>)
                .patch(collection_handlers::edit_collection::<S>)
                .delete(collection_handlers::delete_collection::<S>),
        )
        .route(
            "/collections/:id/add-app",
            post(collection_handlers::add_app::<S>),
        )
        .route(
            "/collections/:id/remove-app",
            post(collection_handlers::remove_app::<S>),
        )
}

/// Site-wide dashboard, report pages and series
fn site_stats_routes<S: Store + 'static>() -> Router<Arc<S>> {
    let mut router = Router::new()
        .route("/stats/", get(stats_handlers::dashboard))
        .route("/stats/:segment", get(stats_handlers::site_series::<S>))
        .route(
            "/stats/:segment/:group",
            get(stats_handlers::site_summary::<S>),
        );

    for series in SiteSeries::ALL {
        router = router.route(
            &format!("/stats/{}/", series.as_str()),
            get(move || stats_handlers::site_report(series)),
        );
    }

    router
}

/// Per-addon report pages and series, mounted below `/addon/{id}/statistics/`
fn addon_stats_routes<S: Store + 'static>() -> Router<Arc<S>> {
    let mut router = Router::new().route(
        "/addon/:addon_id/statistics/:segment",
        get(stats_handlers::addon_series::<S>),
    );

    for series in AddonSeries::ALL {
        router = router.route(
            &format!("/addon/:addon_id/statistics/{}", series.page_path()),
            get(move |state: State<AppState<S>>, addon_id: Path<String>| {
                stats_handlers::addon_report::<S>(state, addon_id, series)
            }),
        );
    }

    router
}
