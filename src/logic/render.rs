use std::collections::BTreeSet;

use anyhow::{anyhow, Result};

use crate::logic::series::SeriesRow;

/// Column layout of a CSV series. Fixed layouts keep their header when the
/// range holds no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvColumns {
    /// `date,count`, then every breakdown key found in the rows
    Count,
    /// `date`, then exactly these columns
    Named(Vec<String>),
}

/// Render rows as CSV. Values missing from a row render as 0.
pub fn render_csv(rows: &[SeriesRow], columns: &CsvColumns) -> Result<String> {
    let (with_count, keys): (bool, Vec<&str>) = match columns {
        CsvColumns::Count => (
            true,
            rows.iter()
                .flat_map(|row| row.data.keys().map(String::as_str))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        ),
        CsvColumns::Named(names) => (false, names.iter().map(String::as_str).collect()),
    };

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["date"];
    if with_count {
        header.push("count");
    }
    header.extend(keys.iter().copied());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![row.date.format("%Y-%m-%d").to_string()];
        if with_count {
            record.push(row.count.unwrap_or_default().to_string());
        }
        record.extend(
            keys.iter()
                .map(|key| row.data.get(*key).copied().unwrap_or_default().to_string()),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

pub fn render_json(rows: &[SeriesRow]) -> serde_json::Result<String> {
    serde_json::to_string(rows)
}
