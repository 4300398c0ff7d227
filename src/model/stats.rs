use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Time bucket used when grouping daily rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesGroup {
    Day,
    Week,
    Month,
}

impl SeriesGroup {
    pub const ALL: [SeriesGroup; 3] = [SeriesGroup::Day, SeriesGroup::Week, SeriesGroup::Month];

    /// Path spelling in series URLs
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesGroup::Day => "day",
            SeriesGroup::Week => "week",
            SeriesGroup::Month => "month",
        }
    }

    /// Path spelling in the site summary URLs, where days are called "date"
    pub fn as_date_str(&self) -> &'static str {
        match self {
            SeriesGroup::Day => "date",
            other => other.as_str(),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }

    pub fn parse_date(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_date_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesFormat {
    Json,
    Csv,
}

impl SeriesFormat {
    pub const ALL: [SeriesFormat; 2] = [SeriesFormat::Json, SeriesFormat::Csv];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesFormat::Json => "json",
            SeriesFormat::Csv => "csv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            SeriesFormat::Json => "application/json",
            SeriesFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

/// Breakdown column of the update counts table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageField {
    Oses,
    Locales,
    Statuses,
    Versions,
    Applications,
}

impl UsageField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageField::Oses => "oses",
            UsageField::Locales => "locales",
            UsageField::Statuses => "statuses",
            UsageField::Versions => "versions",
            UsageField::Applications => "applications",
        }
    }
}

/// Per-addon series and report pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddonSeries {
    Overview,
    Downloads,
    Usage,
    Sources,
    Os,
    Locales,
    Statuses,
    Versions,
    Apps,
}

impl AddonSeries {
    pub const ALL: [AddonSeries; 9] = [
        AddonSeries::Overview,
        AddonSeries::Downloads,
        AddonSeries::Usage,
        AddonSeries::Sources,
        AddonSeries::Os,
        AddonSeries::Locales,
        AddonSeries::Statuses,
        AddonSeries::Versions,
        AddonSeries::Apps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AddonSeries::Overview => "overview",
            AddonSeries::Downloads => "downloads",
            AddonSeries::Usage => "usage",
            AddonSeries::Sources => "sources",
            AddonSeries::Os => "os",
            AddonSeries::Locales => "locales",
            AddonSeries::Statuses => "statuses",
            AddonSeries::Versions => "versions",
            AddonSeries::Apps => "apps",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s2| s2.as_str() == s)
    }

    /// Page path below `/addon/{id}/statistics/`
    pub fn page_path(&self) -> &'static str {
        match self {
            AddonSeries::Overview => "",
            AddonSeries::Downloads => "downloads/",
            AddonSeries::Sources => "downloads/sources/",
            AddonSeries::Usage => "usage/",
            AddonSeries::Locales => "usage/languages/",
            AddonSeries::Versions => "usage/versions/",
            AddonSeries::Statuses => "usage/status/",
            AddonSeries::Apps => "usage/applications/",
            AddonSeries::Os => "usage/os/",
        }
    }

    /// Breakdown field served by the usage breakdown handler, if any
    pub fn usage_field(&self) -> Option<UsageField> {
        match self {
            AddonSeries::Os => Some(UsageField::Oses),
            AddonSeries::Locales => Some(UsageField::Locales),
            AddonSeries::Statuses => Some(UsageField::Statuses),
            AddonSeries::Versions => Some(UsageField::Versions),
            AddonSeries::Apps => Some(UsageField::Applications),
            _ => None,
        }
    }
}

/// Site-wide series and report pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteSeries {
    AddonsInUse,
    AddonsUpdated,
    AddonsDownloaded,
    AddonsCreated,
    CollectionsCreated,
    ReviewsCreated,
    UsersCreated,
}

impl SiteSeries {
    pub const ALL: [SiteSeries; 7] = [
        SiteSeries::AddonsInUse,
        SiteSeries::AddonsUpdated,
        SiteSeries::AddonsDownloaded,
        SiteSeries::AddonsCreated,
        SiteSeries::CollectionsCreated,
        SiteSeries::ReviewsCreated,
        SiteSeries::UsersCreated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SiteSeries::AddonsInUse => "addons_in_use",
            SiteSeries::AddonsUpdated => "addons_updated",
            SiteSeries::AddonsDownloaded => "addons_downloaded",
            SiteSeries::AddonsCreated => "addons_created",
            SiteSeries::CollectionsCreated => "collections_created",
            SiteSeries::ReviewsCreated => "reviews_created",
            SiteSeries::UsersCreated => "users_created",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s2| s2.as_str() == s)
    }

    /// How daily values combine inside a week or month bucket
    pub fn aggregation(&self) -> Aggregation {
        match self {
            SiteSeries::AddonsInUse | SiteSeries::AddonsUpdated => Aggregation::Average,
            _ => Aggregation::Sum,
        }
    }
}

/// Daily counts of downloads are summed; daily active user counts are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Average,
}

/// Inclusive range of days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Parse two `YYYYMMDD` dates. Returns `None` for invalid dates or when
    /// `start` is after `end`.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        let start = NaiveDate::parse_from_str(start, "%Y%m%d").ok()?;
        let end = NaiveDate::parse_from_str(end, "%Y%m%d").ok()?;
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// The `days` days ending on (and including) `end`
    pub fn ending_on(end: NaiveDate, days: u32) -> Self {
        let start = end - chrono::Duration::days(i64::from(days.max(1)) - 1);
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%Y%m%d"),
            self.end.format("%Y%m%d")
        )
    }
}

/// One precomputed daily row read from the stats tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub count: i64,
    #[serde(default)]
    pub breakdown: BTreeMap<String, i64>,
}

impl DailyStat {
    pub fn new(date: NaiveDate, count: i64) -> Self {
        Self {
            date,
            count,
            breakdown: BTreeMap::new(),
        }
    }

    pub fn with_breakdown<K: Into<String>>(
        date: NaiveDate,
        count: i64,
        breakdown: impl IntoIterator<Item = (K, i64)>,
    ) -> Self {
        Self {
            date,
            count,
            breakdown: breakdown.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
