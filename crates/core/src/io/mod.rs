//! CSV boundary: raw device exports in, synchronized tables out.

use std::path::Path;

use crate::{ChannelSeries, Record, Result, SyncError};

/// Header of the leading row-index column in written tables.
pub const INDEX_COLUMN: &str = "sample";

/// Reads a numeric table. Empty fields are missing samples. Rows holding any
/// other non-numeric field are placeholders (repeated headers, device status
/// lines) and are skipped.
pub fn read_table(path: &Path) -> Result<Record> {
    if !path.is_file() {
        return Err(SyncError::not_found(format!("table {}", path.display())));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    let mut skipped = 0usize;

    for row in reader.records() {
        let row = row?;
        let Some(values) = parse_row(&row) else {
            skipped += 1;
            continue;
        };
        for (column, value) in columns.iter_mut().zip(values) {
            column.push(value);
        }
    }

    if skipped > 0 {
        tracing::warn!(path = %path.display(), skipped, "skipped non-numeric placeholder rows");
    }

    Record::from_channels(
        headers
            .into_iter()
            .zip(columns)
            .map(|(name, samples)| ChannelSeries::new(name, samples))
            .collect(),
    )
}

fn parse_row(row: &csv::StringRecord) -> Option<Vec<f64>> {
    row.iter()
        .map(|field| {
            if field.is_empty() {
                Some(f64::NAN)
            } else {
                field.parse::<f64>().ok()
            }
        })
        .collect()
}

/// Reads an EEG export and names its columns after `electrodes`, in order.
pub fn read_eeg(path: &Path, electrodes: &[String]) -> Result<Record> {
    let raw = read_table(path)?;
    if raw.channels().len() != electrodes.len() {
        return Err(SyncError::invalid(format!(
            "{} has {} columns but {} electrodes are configured",
            path.display(),
            raw.channels().len(),
            electrodes.len()
        )));
    }

    Record::from_channels(
        raw.channels()
            .iter()
            .zip(electrodes)
            .map(|(channel, name)| ChannelSeries::new(name.clone(), channel.samples().to_vec()))
            .collect(),
    )
}

/// Reads an eye-tracker export without its device timestamp column.
pub fn read_eye_tracker(path: &Path, timestamp_column: &str) -> Result<Record> {
    let raw = read_table(path)?;
    raw.channel(timestamp_column)?;
    Record::from_channels(
        raw.channels()
            .iter()
            .filter(|channel| channel.name() != timestamp_column)
            .cloned()
            .collect(),
    )
}

/// Writes `record` with a zero-based index column. Missing samples are
/// written as empty fields.
pub fn write_table(path: &Path, record: &Record) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(std::iter::once(INDEX_COLUMN).chain(record.channel_names()))?;

    let mut row = Vec::with_capacity(record.channels().len() + 1);
    for index in 0..record.len() {
        row.clear();
        row.push(index.to_string());
        row.extend(record.channels().iter().map(|channel| {
            let value = channel.samples()[index];
            if value.is_nan() {
                String::new()
            } else {
                value.to_string()
            }
        }));
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}
