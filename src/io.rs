//! CSV input and output of location datasets.
//!
//! Layout: `track_id,segment,time,x,y` followed by one column per numeric
//! covariate. `track_id` carries the display label (`A_2` for segment 2 of
//! track `A`) and `segment` the sub-track number, empty for unsegmented
//! tracks. Empty `x`/`y` cells mark a missing observation and empty
//! covariate cells an absent value. Times are RFC 3339; on input the
//! `YYYY-MM-DD HH:MM:SS[.fff]` form used by Movebank exports is also
//! accepted and read as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, StringRecord, Writer};
use geo::Coord;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{OptionExt, Result, TrackError};
use crate::{LocationRecord, MovementRecord, TrackId};

const TRACK_ID: &str = "track_id";
const SEGMENT: &str = "segment";
const TIME: &str = "time";
const X: &str = "x";
const Y: &str = "y";

/// Column positions resolved from a header row.
struct Columns {
    track_id: usize,
    segment: Option<usize>,
    time: usize,
    x: usize,
    y: usize,
    covariates: Vec<(usize, String)>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).ok_or_parse(1, format!("missing column '{name}'"));

        let track_id = require(TRACK_ID)?;
        let time = require(TIME)?;
        let x = require(X)?;
        let y = require(Y)?;
        let segment = find(SEGMENT);

        let covariates = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| ![track_id, time, x, y].contains(i) && Some(*i) != segment)
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Self {
            track_id,
            segment,
            time,
            x,
            y,
            covariates,
        })
    }
}

/// Read location records from CSV.
pub fn read_records(reader: impl Read) -> Result<Vec<LocationRecord>> {
    let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let columns = Columns::from_headers(csv.headers()?)?;

    let mut records = Vec::new();
    for row in csv.records() {
        let row = row?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(parse_row(&row, &columns, line)?);
    }

    Ok(records)
}

fn parse_row(row: &StringRecord, columns: &Columns, line: u64) -> Result<LocationRecord> {
    let cell = |i: usize| row.get(i).map(str::trim).unwrap_or("");

    let label = cell(columns.track_id);
    if label.is_empty() {
        return Err(TrackError::Parse {
            line,
            message: "empty track_id".to_string(),
        });
    }

    let segment = match columns.segment.map(cell) {
        Some(s) if !s.is_empty() => Some(s.parse::<u32>().ok().ok_or_parse(
            line,
            format!("segment '{s}' is not a non-negative integer"),
        )?),
        _ => None,
    };

    let track_id = match segment {
        Some(n) => {
            let base = label
                .strip_suffix(&format!("_{n}"))
                .ok_or_parse(line, format!("track_id '{label}' does not end in '_{n}'"))?;
            TrackId::segmented(base, n)
        }
        None => TrackId::new(label),
    };

    let time = parse_time(cell(columns.time)).ok_or_parse(
        line,
        format!("unrecognised time '{}'", cell(columns.time)),
    )?;

    let x = parse_optional_f64(cell(columns.x), line, X)?;
    let y = parse_optional_f64(cell(columns.y), line, Y)?;
    let position = match (x, y) {
        (Some(x), Some(y)) => Some(Coord { x, y }),
        (None, None) => None,
        _ => {
            return Err(TrackError::Parse {
                line,
                message: "only one of x and y is present".to_string(),
            });
        }
    };

    let mut covariates = BTreeMap::new();
    for (i, name) in &columns.covariates {
        if let Some(value) = parse_optional_f64(cell(*i), line, name)? {
            covariates.insert(name.clone(), value);
        }
    }

    Ok(LocationRecord {
        track_id,
        time,
        position,
        covariates,
    })
}

/// Parse RFC 3339, falling back to a naive `YYYY-MM-DD HH:MM:SS[.f]` in UTC.
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_optional_f64(s: &str, line: u64, column: &str) -> Result<Option<f64>> {
    if s.is_empty() || s.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(TrackError::Parse {
            line,
            message: format!("column '{column}': '{s}' is not a finite number"),
        }),
    }
}

fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn format_optional(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn covariate_names<'a>(records: impl Iterator<Item = &'a LocationRecord>) -> Vec<String> {
    let names: BTreeSet<&String> = records.flat_map(|r| r.covariates.keys()).collect();
    names.into_iter().cloned().collect()
}

fn record_fields(record: &LocationRecord, covariates: &[String]) -> Vec<String> {
    let mut fields = vec![
        record.track_id.to_string(),
        record.track_id.segment.map(|n| n.to_string()).unwrap_or_default(),
        format_time(&record.time),
        format_optional(record.position.map(|c| c.x)),
        format_optional(record.position.map(|c| c.y)),
    ];
    fields.extend(
        covariates
            .iter()
            .map(|name| format_optional(record.covariates.get(name).copied())),
    );
    fields
}

fn header(covariates: &[String], extra: &[&str]) -> Vec<String> {
    [TRACK_ID, SEGMENT, TIME, X, Y]
        .iter()
        .map(|s| s.to_string())
        .chain(covariates.iter().cloned())
        .chain(extra.iter().map(|s| s.to_string()))
        .collect()
}

/// Write location records as CSV.
pub fn write_records(writer: impl Write, records: &[LocationRecord]) -> Result<()> {
    let covariates = covariate_names(records.iter());
    let mut csv = Writer::from_writer(writer);

    csv.write_record(header(&covariates, &[]))?;
    for record in records {
        csv.write_record(record_fields(record, &covariates))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write records with their step and angle columns as CSV.
pub fn write_metrics(writer: impl Write, rows: &[MovementRecord]) -> Result<()> {
    let covariates = covariate_names(rows.iter().map(|m| &m.record));
    let mut csv = Writer::from_writer(writer);

    csv.write_record(header(&covariates, &["step", "angle"]))?;
    for row in rows {
        let mut fields = record_fields(&row.record, &covariates);
        fields.push(format_optional(row.step));
        fields.push(format_optional(row.angle));
        csv.write_record(fields)?;
    }
    csv.flush()?;
    Ok(())
}

/// Read location records from a CSV file.
pub fn read_csv_file(path: impl AsRef<Path>) -> Result<Vec<LocationRecord>> {
    read_records(BufReader::new(File::open(path)?))
}

/// Write location records to a CSV file.
pub fn write_csv_file(path: impl AsRef<Path>, records: &[LocationRecord]) -> Result<()> {
    write_records(BufWriter::new(File::create(path)?), records)
}
