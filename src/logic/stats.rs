use anyhow::Result;

use crate::logic::render::CsvColumns;
use crate::logic::series::{group_series, merge_columns, SeriesRow};
use crate::model::{AddonSeries, Aggregation, DateRange, Id, SeriesGroup, SiteSeries};
use crate::store::traits::StatsStore;

const DOWNLOADS_COLUMN: &str = "downloads";
const UPDATES_COLUMN: &str = "updates";

/// CSV layout of a per-addon series. The overview carries one column per
/// merged series; the others carry a count.
pub fn addon_columns(series: AddonSeries) -> CsvColumns {
    match series {
        AddonSeries::Overview => CsvColumns::Named(vec![
            DOWNLOADS_COLUMN.to_string(),
            UPDATES_COLUMN.to_string(),
        ]),
        _ => CsvColumns::Count,
    }
}

/// CSV layout of the site summary: one column per site series
pub fn summary_columns() -> CsvColumns {
    CsvColumns::Named(SiteSeries::ALL.iter().map(|s| s.as_str().to_string()).collect())
}

/// Fetch and group one per-addon series
pub async fn addon_series<S: StatsStore + ?Sized>(
    store: &S,
    addon_id: Id,
    series: AddonSeries,
    group: SeriesGroup,
    range: DateRange,
) -> Result<Vec<SeriesRow>> {
    let rows = match series {
        AddonSeries::Overview => {
            let downloads = store.download_counts(addon_id, range).await?;
            let updates = store.update_counts(addon_id, range, None).await?;
            return Ok(merge_columns(vec![
                (
                    DOWNLOADS_COLUMN.to_string(),
                    group_series(downloads, group, Aggregation::Sum),
                ),
                (
                    UPDATES_COLUMN.to_string(),
                    group_series(updates, group, Aggregation::Average),
                ),
            ]));
        }
        AddonSeries::Downloads => {
            let mut downloads = store.download_counts(addon_id, range).await?;
            for day in &mut downloads {
                day.breakdown.clear();
            }
            group_series(downloads, group, Aggregation::Sum)
        }
        AddonSeries::Sources => {
            group_series(store.download_counts(addon_id, range).await?, group, Aggregation::Sum)
        }
        AddonSeries::Usage => group_series(
            store.update_counts(addon_id, range, None).await?,
            group,
            Aggregation::Average,
        ),
        breakdown => group_series(
            store
                .update_counts(addon_id, range, breakdown.usage_field())
                .await?,
            group,
            Aggregation::Average,
        ),
    };

    Ok(rows)
}

/// Fetch and group one site-wide series
pub async fn site_series<S: StatsStore + ?Sized>(
    store: &S,
    series: SiteSeries,
    group: SeriesGroup,
    range: DateRange,
) -> Result<Vec<SeriesRow>> {
    let rows = store.global_counts(series, range).await?;
    Ok(group_series(rows, group, series.aggregation()))
}

/// Every site-wide series side by side, one column each
pub async fn site_summary<S: StatsStore + ?Sized>(
    store: &S,
    group: SeriesGroup,
    range: DateRange,
) -> Result<Vec<SeriesRow>> {
    let mut columns = Vec::with_capacity(SiteSeries::ALL.len());
    for series in SiteSeries::ALL {
        columns.push((
            series.as_str().to_string(),
            site_series(store, series, group, range).await?,
        ));
    }
    Ok(merge_columns(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailyStat, UsageField};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn range() -> DateRange {
        DateRange::parse("20240101", "20240131").unwrap()
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.record_downloads(
            5,
            DailyStat::with_breakdown(day(1), 10, [("search", 7), ("api", 3)]),
        );
        store.record_downloads(5, DailyStat::with_breakdown(day(2), 4, [("search", 4)]));
        store.record_updates(
            5,
            day(1),
            100,
            [(
                UsageField::Oses,
                BTreeMap::from([("Linux".to_string(), 60), ("Mac".to_string(), 40)]),
            )],
        );
        store.record_updates(5, day(2), 120, []);
        store
    }

    #[tokio::test]
    async fn test_overview_combines_downloads_and_updates() {
        let store = seeded();
        let rows = addon_series(&store, 5, AddonSeries::Overview, SeriesGroup::Day, range())
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, day(2));
        assert_eq!(rows[0].data["downloads"], 4);
        assert_eq!(rows[0].data["updates"], 120);
        assert_eq!(rows[0].count, None);
    }

    #[tokio::test]
    async fn test_downloads_drop_sources_breakdown() {
        let store = seeded();
        let downloads = addon_series(&store, 5, AddonSeries::Downloads, SeriesGroup::Month, range())
            .await
            .unwrap();
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].count, Some(14));
        assert!(downloads[0].data.is_empty());

        let sources = addon_series(&store, 5, AddonSeries::Sources, SeriesGroup::Month, range())
            .await
            .unwrap();
        assert_eq!(sources[0].data["search"], 11);
        assert_eq!(sources[0].data["api"], 3);
    }

    #[tokio::test]
    async fn test_usage_breakdown_is_averaged() {
        let store = seeded();
        let usage = addon_series(&store, 5, AddonSeries::Usage, SeriesGroup::Month, range())
            .await
            .unwrap();
        assert_eq!(usage[0].count, Some(110));

        let oses = addon_series(&store, 5, AddonSeries::Os, SeriesGroup::Day, range())
            .await
            .unwrap();
        assert_eq!(oses[1].data["Linux"], 60);
        assert!(oses[0].data.is_empty());
    }

    #[tokio::test]
    async fn test_site_summary_has_every_series_column() {
        let store = MemoryStore::new();
        store.record_global(SiteSeries::UsersCreated, day(3), 9);

        let rows = site_summary(&store, SeriesGroup::Day, range()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data.len(), SiteSeries::ALL.len());
        assert_eq!(rows[0].data["users_created"], 9);
        assert_eq!(rows[0].data["addons_in_use"], 0);
    }

    #[test]
    fn test_csv_columns_follow_series_kind() {
        assert_eq!(
            addon_columns(AddonSeries::Overview),
            CsvColumns::Named(vec!["downloads".to_string(), "updates".to_string()])
        );
        for series in AddonSeries::ALL.into_iter().skip(1) {
            assert_eq!(addon_columns(series), CsvColumns::Count);
        }

        let CsvColumns::Named(columns) = summary_columns() else {
            panic!("site summary has named columns");
        };
        assert_eq!(columns.len(), SiteSeries::ALL.len());
        assert_eq!(columns[0], "addons_in_use");
    }
}
