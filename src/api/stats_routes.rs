//! Route table for the statistics pages and time series.
//!
//! Series URLs pack several parameters into one path segment
//! (`{series}-{group}-{start}-{end}.{format}`), so they are matched against
//! patterns compiled from the series, group and format constants.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::model::{AddonSeries, SeriesFormat, SeriesGroup, SiteSeries};

fn group_re() -> String {
    format!(
        "(?P<group>{})",
        SeriesGroup::ALL.iter().map(|g| g.as_str()).join("|")
    )
}

fn group_date_re() -> String {
    format!(
        "(?P<group>{})",
        SeriesGroup::ALL.iter().map(|g| g.as_date_str()).join("|")
    )
}

fn format_re() -> String {
    format!(
        "(?P<format>{})",
        SeriesFormat::ALL.iter().map(|f| f.as_str()).join("|")
    )
}

const RANGE_RE: &str = r"(?P<start>\d{8})-(?P<end>\d{8})";

/// `{group}-{start}-{end}.{format}` anchored at the end of the segment
fn series_re() -> String {
    format!(r"{}-{}\.{}$", group_re(), RANGE_RE, format_re())
}

fn compile(pattern: String) -> Regex {
    // Patterns are assembled from fixed constants only.
    Regex::new(&pattern)
        .unwrap_or_else(|e| panic!("invalid stats route pattern {}: {}", pattern, e))
}

static ADDON_SERIES: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        "^(?P<series>{})-{}",
        AddonSeries::ALL.iter().map(|s| s.as_str()).join("|"),
        series_re()
    ))
});

static SITE_SERIES: Lazy<Regex> = Lazy::new(|| {
    compile(format!(
        "^(?P<series>{})-{}",
        SiteSeries::ALL.iter().map(|s| s.as_str()).join("|"),
        series_re()
    ))
});

static SITE_RANGE: Lazy<Regex> = Lazy::new(|| compile(format!("^site-{}", series_re())));

static SITE_FORMAT: Lazy<Regex> = Lazy::new(|| compile(format!("^site{}$", format_re())));

static SITE_GROUP: Lazy<Regex> = Lazy::new(|| compile(format!("^{}$", group_date_re())));

/// Grouping, raw date bounds and output format of a series request.
/// Dates are passed through unparsed; handlers validate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSpec {
    pub group: SeriesGroup,
    pub start: String,
    pub end: String,
    pub format: SeriesFormat,
}

/// What a segment below `/stats/` resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteRoute {
    Summary(SeriesSpec),
    Series(SiteSeries, SeriesSpec),
}

fn spec_from(caps: &Captures<'_>) -> Option<SeriesSpec> {
    Some(SeriesSpec {
        group: SeriesGroup::parse(caps.name("group")?.as_str())?,
        start: caps.name("start")?.as_str().to_string(),
        end: caps.name("end")?.as_str().to_string(),
        format: SeriesFormat::parse(caps.name("format")?.as_str())?,
    })
}

/// Match `{series}-{group}-{start}-{end}.{format}` below
/// `/addon/{id}/statistics/`
pub fn match_addon_series(segment: &str) -> Option<(AddonSeries, SeriesSpec)> {
    let caps = ADDON_SERIES.captures(segment)?;
    let series = AddonSeries::parse(caps.name("series")?.as_str())?;
    Some((series, spec_from(&caps)?))
}

/// Match a series segment below `/stats/`
pub fn match_site_series(segment: &str) -> Option<SiteRoute> {
    if let Some(caps) = SITE_RANGE.captures(segment) {
        return spec_from(&caps).map(SiteRoute::Summary);
    }

    let caps = SITE_SERIES.captures(segment)?;
    let series = SiteSeries::parse(caps.name("series")?.as_str())?;
    Some(SiteRoute::Series(series, spec_from(&caps)?))
}

/// Match `/stats/site{format}/{group}`
pub fn match_site_format(
    format_segment: &str,
    group_segment: &str,
) -> Option<(SeriesFormat, SeriesGroup)> {
    let format = SITE_FORMAT.captures(format_segment)?;
    let group = SITE_GROUP.captures(group_segment)?;
    Some((
        SeriesFormat::parse(format.name("format")?.as_str())?,
        SeriesGroup::parse_date(group.name("group")?.as_str())?,
    ))
}

/// URL template of an addon series, as advertised by its report page
pub fn addon_series_template(addon_id: i64, series: AddonSeries) -> String {
    format!(
        "/addon/{}/statistics/{}-{{group}}-{{start}}-{{end}}.{{format}}",
        addon_id,
        series.as_str()
    )
}

pub fn site_series_template(series: SiteSeries) -> String {
    format!(
        "/stats/{}-{{group}}-{{start}}-{{end}}.{{format}}",
        series.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(group: SeriesGroup, format: SeriesFormat) -> SeriesSpec {
        SeriesSpec {
            group,
            start: "20240101".to_string(),
            end: "20240131".to_string(),
            format,
        }
    }

    #[test]
    fn test_every_addon_series_is_routable() {
        for series in AddonSeries::ALL {
            for group in SeriesGroup::ALL {
                for format in SeriesFormat::ALL {
                    let segment = format!(
                        "{}-{}-20240101-20240131.{}",
                        series.as_str(),
                        group.as_str(),
                        format.as_str()
                    );
                    assert_eq!(
                        match_addon_series(&segment),
                        Some((series, spec(group, format))),
                        "{}",
                        segment
                    );
                }
            }
        }
    }

    #[test]
    fn test_addon_series_rejects_malformed_segments() {
        for segment in [
            "downloads-year-20240101-20240131.json",
            "downloads-day-2024011-20240131.json",
            "downloads-day-20240101-20240131.xml",
            "downloads-day-20240101-20240131.json.bak",
            "addons_in_use-day-20240101-20240131.json",
            "xdownloads-day-20240101-20240131.json",
            "downloads",
        ] {
            assert_eq!(match_addon_series(segment), None, "{}", segment);
        }
    }

    #[test]
    fn test_site_series_segments() {
        assert_eq!(
            match_site_series("site-week-20240101-20240131.csv"),
            Some(SiteRoute::Summary(spec(SeriesGroup::Week, SeriesFormat::Csv)))
        );
        assert_eq!(
            match_site_series("users_created-month-20240101-20240131.json"),
            Some(SiteRoute::Series(
                SiteSeries::UsersCreated,
                spec(SeriesGroup::Month, SeriesFormat::Json)
            ))
        );
        assert_eq!(match_site_series("downloads-day-20240101-20240131.json"), None);
        assert_eq!(match_site_series("site-date-20240101-20240131.json"), None);
    }

    #[test]
    fn test_site_format_route() {
        assert_eq!(
            match_site_format("sitejson", "date"),
            Some((SeriesFormat::Json, SeriesGroup::Day))
        );
        assert_eq!(
            match_site_format("sitecsv", "month"),
            Some((SeriesFormat::Csv, SeriesGroup::Month))
        );
        assert_eq!(match_site_format("sitejson", "day"), None);
        assert_eq!(match_site_format("sitexml", "week"), None);
    }

    #[test]
    fn test_templates() {
        assert_eq!(
            addon_series_template(3, AddonSeries::Os),
            "/addon/3/statistics/os-{group}-{start}-{end}.{format}"
        );
        assert_eq!(
            site_series_template(SiteSeries::AddonsInUse),
            "/stats/addons_in_use-{group}-{start}-{end}.{format}"
        );
    }
}
