use chrono::{Datelike, Duration, NaiveDate};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Aggregation, DailyStat, SeriesGroup};

/// One rendered point of a time series.
///
/// `end` is set for week and month buckets. `count` is absent for
/// summaries that only carry named columns in `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRow {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    pub data: BTreeMap<String, i64>,
}

/// First day of the bucket holding `date`
pub fn bucket_start(date: NaiveDate, group: SeriesGroup) -> NaiveDate {
    match group {
        SeriesGroup::Day => date,
        SeriesGroup::Week => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        SeriesGroup::Month => date.with_day(1).unwrap_or(date),
    }
}

/// Last day of the bucket starting at `start`
pub fn bucket_end(start: NaiveDate, group: SeriesGroup) -> NaiveDate {
    match group {
        SeriesGroup::Day => start,
        SeriesGroup::Week => start + Duration::days(6),
        SeriesGroup::Month => {
            let (year, month) = if start.month() == 12 {
                (start.year() + 1, 1)
            } else {
                (start.year(), start.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)
                .map(|next| next - Duration::days(1))
                .unwrap_or(start)
        }
    }
}

fn combine(total: i64, days: i64, aggregation: Aggregation) -> i64 {
    match aggregation {
        Aggregation::Sum => total,
        Aggregation::Average if days > 0 => (total as f64 / days as f64).round() as i64,
        Aggregation::Average => 0,
    }
}

/// Group daily rows into buckets, newest bucket first.
pub fn group_series(
    mut rows: Vec<DailyStat>,
    group: SeriesGroup,
    aggregation: Aggregation,
) -> Vec<SeriesRow> {
    rows.sort_by_key(|row| row.date);

    let chunks = rows.into_iter().chunk_by(|row| bucket_start(row.date, group));
    let mut grouped: Vec<SeriesRow> = (&chunks)
        .into_iter()
        .map(|(start, days)| {
            let days: Vec<DailyStat> = days.collect();
            let n = days.len() as i64;

            let total: i64 = days.iter().map(|d| d.count).sum();
            let mut data: BTreeMap<String, i64> = BTreeMap::new();
            for day in &days {
                for (key, value) in &day.breakdown {
                    *data.entry(key.clone()).or_default() += value;
                }
            }
            for value in data.values_mut() {
                *value = combine(*value, n, aggregation);
            }

            SeriesRow {
                date: start,
                end: (group != SeriesGroup::Day).then(|| bucket_end(start, group)),
                count: Some(combine(total, n, aggregation)),
                data,
            }
        })
        .collect();

    grouped.reverse();
    grouped
}

/// Merge several grouped series into one row per bucket, each series
/// becoming a named column of `data`. Buckets missing from a series read 0.
pub fn merge_columns(columns: Vec<(String, Vec<SeriesRow>)>) -> Vec<SeriesRow> {
    let names: Vec<String> = columns.iter().map(|(name, _)| name.clone()).collect();
    let mut merged: BTreeMap<NaiveDate, SeriesRow> = BTreeMap::new();

    for (name, rows) in columns {
        for row in rows {
            let entry = merged.entry(row.date).or_insert_with(|| SeriesRow {
                date: row.date,
                end: row.end,
                count: None,
                data: names.iter().map(|n| (n.clone(), 0)).collect(),
            });
            entry.data.insert(name.clone(), row.count.unwrap_or_default());
        }
    }

    merged.into_values().rev().collect()
}
