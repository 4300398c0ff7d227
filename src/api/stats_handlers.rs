use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::handlers::{error, internal, not_found, ApiError, AppState};
use crate::api::stats_routes::{
    addon_series_template, match_addon_series, match_site_format, match_site_series,
    site_series_template, SeriesSpec, SiteRoute,
};
use crate::config::AppConfig;
use crate::logic::render::{render_csv, render_json, CsvColumns};
use crate::logic::series::SeriesRow;
use crate::logic::stats;
use crate::model::{AddonSeries, DateRange, Id, SeriesFormat, SeriesGroup, SiteSeries};
use crate::store::traits::Store;

/// Descriptor of a report page: which series it shows and where to fetch it
#[derive(Debug, Serialize)]
pub struct ReportPage {
    pub report: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addon_id: Option<Id>,
    pub series_url: String,
    pub groups: Vec<&'static str>,
    pub formats: Vec<&'static str>,
}

impl ReportPage {
    fn new(report: &str, addon_id: Option<Id>, series_url: String) -> Self {
        Self {
            report: report.to_string(),
            addon_id,
            series_url,
            groups: SeriesGroup::ALL.iter().map(|g| g.as_str()).collect(),
            formats: SeriesFormat::ALL.iter().map(|f| f.as_str()).collect(),
        }
    }
}

fn render(
    rows: &[SeriesRow],
    format: SeriesFormat,
    columns: &CsvColumns,
) -> Result<Response, ApiError> {
    let body = match format {
        SeriesFormat::Json => render_json(rows).map_err(|e| internal(e.into()))?,
        SeriesFormat::Csv => render_csv(rows, columns).map_err(internal)?,
    };
    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}

/// Turn the raw dates of a series request into a checked range.
/// Impossible dates and reversed ranges do not name a resource.
fn checked_range(spec: &SeriesSpec, config: &AppConfig) -> Result<DateRange, ApiError> {
    let range = DateRange::parse(&spec.start, &spec.end).ok_or_else(not_found)?;
    if range.days() > i64::from(config.stats.max_range_days) {
        return Err(error(
            StatusCode::BAD_REQUEST,
            &format!(
                "Date range is limited to {} days.",
                config.stats.max_range_days
            ),
        ));
    }
    Ok(range)
}

/// Resolve an addon id from the path; unknown addons are 404
async fn known_addon<S: Store>(store: &S, addon_id: &str) -> Result<Id, ApiError> {
    let addon_id: Id = addon_id.parse().map_err(|_| not_found())?;
    match store.get_app(addon_id).await {
        Ok(Some(_)) => Ok(addon_id),
        Ok(None) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}

/// GET /stats/: temporary redirect to the default report
pub async fn dashboard() -> impl IntoResponse {
    (
        StatusCode::FOUND,
        [(
            header::LOCATION,
            format!("/stats/{}/", SiteSeries::AddonsInUse.as_str()),
        )],
    )
}

/// GET /stats/{key}/
pub async fn site_report(series: SiteSeries) -> Json<ReportPage> {
    Json(ReportPage::new(
        series.as_str(),
        None,
        site_series_template(series),
    ))
}

/// GET /stats/{segment}: site summary or a single site series for a date range
pub async fn site_series<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Path(segment): Path<String>,
) -> Result<Response, ApiError> {
    let route = match_site_series(&segment).ok_or_else(not_found)?;

    match route {
        SiteRoute::Summary(spec) => {
            let range = checked_range(&spec, &config)?;
            let rows = stats::site_summary(&*store, spec.group, range)
                .await
                .map_err(internal)?;
            render(&rows, spec.format, &stats::summary_columns())
        }
        SiteRoute::Series(series, spec) => {
            let range = checked_range(&spec, &config)?;
            let rows = stats::site_series(&*store, series, spec.group, range)
                .await
                .map_err(internal)?;
            render(&rows, spec.format, &CsvColumns::Count)
        }
    }
}

/// GET /stats/site{format}/{group}: site summary for the default window
pub async fn site_summary<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Path((format_segment, group_segment)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (format, group) =
        match_site_format(&format_segment, &group_segment).ok_or_else(not_found)?;

    let today = chrono::Utc::now().date_naive();
    let range = DateRange::ending_on(today, config.stats.site_default_days);
    let rows = stats::site_summary(&*store, group, range)
        .await
        .map_err(internal)?;

    render(&rows, format, &stats::summary_columns())
}

/// GET /addon/{id}/statistics/{page}
pub async fn addon_report<S: Store>(
    State(store): State<AppState<S>>,
    Path(addon_id): Path<String>,
    series: AddonSeries,
) -> Result<Json<ReportPage>, ApiError> {
    let addon_id = known_addon(&*store, &addon_id).await?;
    Ok(Json(ReportPage::new(
        series.as_str(),
        Some(addon_id),
        addon_series_template(addon_id, series),
    )))
}

/// GET /addon/{id}/statistics/{series}-{group}-{start}-{end}.{format}
pub async fn addon_series<S: Store>(
    State(store): State<AppState<S>>,
    Extension(config): Extension<Arc<AppConfig>>,
    Path((addon_id, segment)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (series, spec) = match_addon_series(&segment).ok_or_else(not_found)?;
    let addon_id = known_addon(&*store, &addon_id).await?;
    let range = checked_range(&spec, &config)?;

    let rows = stats::addon_series(&*store, addon_id, series, spec.group, range)
        .await
        .map_err(internal)?;

    render(&rows, spec.format, &stats::addon_columns(series))
}
