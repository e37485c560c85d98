//! Flattening of raw provider JSON into tables, and CSV output under
//! `<root>/processed/<source>/`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use serde_json::{Map, Value};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    provider::ProviderId,
};

const METEOSTAT_TIME_COLUMNS: &[&str] = &["date", "time"];

const DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

/// Row-major table of JSON scalars. Missing cells are `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build from row records. Columns are the union of record keys in the
    /// order they are first seen.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a Map<String, Value>>) -> Self {
        let records: Vec<&Map<String, Value>> = records.into_iter().collect();

        let mut columns: Vec<String> = Vec::new();
        for key in records.iter().flat_map(|r| r.keys()) {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }

        let rows = records
            .iter()
            .map(|r| columns.iter().map(|c| r.get(c).cloned().unwrap_or(Value::Null)).collect())
            .collect();

        Self { columns, rows }
    }

    /// Build from a column-oriented object such as `{"time": [..], "t": [..]}`.
    pub fn from_columns(columns: &Map<String, Value>) -> Result<Self> {
        let mut names = Vec::with_capacity(columns.len());
        let mut values: Vec<&Vec<Value>> = Vec::with_capacity(columns.len());

        for (name, column) in columns {
            let column = column.as_array().ok_or_else(|| {
                Error::MalformedResponse(format!("Column '{name}' is not an array"))
            })?;
            names.push(name.clone());
            values.push(column);
        }

        let len = values.first().map_or(0, |c| c.len());
        if let Some(pos) = values.iter().position(|c| c.len() != len) {
            return Err(Error::MalformedResponse(format!(
                "Column '{}' has {} values, expected {len}",
                names[pos],
                values[pos].len()
            )));
        }

        let rows = (0..len).map(|i| values.iter().map(|c| c[i].clone()).collect()).collect();
        Ok(Self { columns: names, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Rewrite `column` as canonical timestamps. A column where every value
    /// falls on midnight is written as plain dates.
    pub fn normalize_timestamps(&mut self, column: &str) -> Result<()> {
        let idx = self
            .column_index(column)
            .ok_or_else(|| Error::MalformedResponse(format!("Missing '{column}' column")))?;

        let parsed = self
            .rows
            .iter()
            .map(|row| match &row[idx] {
                Value::Null => Ok(None),
                Value::String(s) => parse_timestamp(s).map(Some).ok_or_else(|| {
                    Error::MalformedResponse(format!("Unparseable timestamp '{s}' in '{column}'"))
                }),
                other => Err(Error::MalformedResponse(format!(
                    "Expected a timestamp string in '{column}', got {other}"
                ))),
            })
            .collect::<Result<Vec<Option<NaiveDateTime>>>>()?;

        let dates_only = parsed.iter().flatten().all(|ts| ts.time() == NaiveTime::MIN);
        let format = if dates_only { "%Y-%m-%d" } else { "%Y-%m-%d %H:%M:%S" };

        for (row, ts) in self.rows.iter_mut().zip(parsed) {
            if let Some(ts) = ts {
                row[idx] = Value::String(ts.format(format).to_string());
            }
        }
        Ok(())
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Meteostat point response → one row per record in `data`.
pub fn flatten_meteostat(doc: &Value) -> Result<Table> {
    let records = match doc.get("data") {
        None | Some(Value::Null) => return Ok(Table::default()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    Error::MalformedResponse("Meteostat 'data' entries must be objects".into())
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(_) => {
            return Err(Error::MalformedResponse("Meteostat 'data' must be an array".into()));
        }
    };

    let mut table = Table::from_records(records);
    if table.is_empty() {
        return Ok(table);
    }

    // Daily records carry `date`, hourly ones `time`.
    let present: Vec<&str> = METEOSTAT_TIME_COLUMNS
        .iter()
        .copied()
        .filter(|c| table.column_index(c).is_some())
        .collect();
    if present.is_empty() {
        return Err(Error::MalformedResponse(
            "Meteostat records have neither a 'date' nor a 'time' column".into(),
        ));
    }
    for column in present {
        table.normalize_timestamps(column)?;
    }
    Ok(table)
}

/// Open-Meteo forecast response → `current` (one row) and `hourly` tables.
pub fn flatten_openmeteo(doc: &Value) -> Result<Vec<(&'static str, Table)>> {
    let current = doc.get("current_weather").and_then(Value::as_object).ok_or_else(|| {
        Error::MalformedResponse("Open-Meteo response has no 'current_weather' object".into())
    })?;
    let mut current = Table::from_records([current]);
    current.normalize_timestamps("time")?;

    let hourly = doc.get("hourly").and_then(Value::as_object).ok_or_else(|| {
        Error::MalformedResponse("Open-Meteo response has no 'hourly' object".into())
    })?;
    let mut hourly = Table::from_columns(hourly)?;
    if hourly.column_index("time").is_some() {
        hourly.normalize_timestamps("time")?;
    }

    Ok(vec![("current", current), ("hourly", hourly)])
}

/// Flatten `doc` according to its source. Meteostat yields a single unnamed
/// table, Open-Meteo one table per section.
pub fn flatten(source: ProviderId, doc: &Value) -> Result<Vec<(Option<&'static str>, Table)>> {
    match source {
        ProviderId::Meteostat => Ok(vec![(None, flatten_meteostat(doc)?)]),
        ProviderId::OpenMeteo => Ok(flatten_openmeteo(doc)?
            .into_iter()
            .map(|(key, table)| (Some(key), table))
            .collect()),
    }
}

#[derive(Debug, Clone)]
pub struct ProcessedStore {
    root: PathBuf,
}

impl ProcessedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, source: ProviderId, name: &str) -> PathBuf {
        self.root.join("processed").join(source.dir_name()).join(format!("{name}.csv"))
    }

    pub fn save(&self, source: ProviderId, name: &str, table: &Table) -> Result<PathBuf> {
        let path = self.path(source, name);
        write_csv(&path, table)?;
        Ok(path)
    }
}

/// Write `table` as CSV with a header row. A table without columns produces
/// an empty file.
pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let csv_err = |source| Error::Csv { path: path.to_path_buf(), source };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    if !table.columns.is_empty() {
        writer.write_record(&table.columns).map_err(csv_err)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(cell)).map_err(csv_err)?;
        }
    }
    writer.flush().map_err(|e| Error::io(path, e))?;

    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meteostat_daily_dates_stay_plain_dates() {
        let doc = json!({
            "data": [
                { "date": "2024-01-01", "tavg": 2.5, "prcp": null },
                { "date": "2024-01-02", "tavg": -1.0, "prcp": 0.4 }
            ]
        });

        let table = flatten_meteostat(&doc).unwrap();

        assert_eq!(table.columns, vec!["date", "tavg", "prcp"]);
        assert_eq!(table.rows[0], vec![json!("2024-01-01"), json!(2.5), Value::Null]);
        assert_eq!(table.rows[1][0], json!("2024-01-02"));
    }

    #[test]
    fn meteostat_hourly_keeps_time_of_day() {
        let doc = json!({
            "data": [
                { "time": "2024-01-01 00:00:00", "temp": 1.0 },
                { "time": "2024-01-01T01:00", "temp": 0.8 }
            ]
        });

        let table = flatten_meteostat(&doc).unwrap();

        assert_eq!(table.columns, vec!["time", "temp"]);
        assert_eq!(table.rows[0][0], json!("2024-01-01 00:00:00"));
        assert_eq!(table.rows[1][0], json!("2024-01-01 01:00:00"));
    }

    #[test]
    fn meteostat_hourly_file_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let doc = json!({
            "data": [
                { "time": "2024-01-31 23:00:00", "temp": -0.5 },
                { "time": "2024-02-01 00:00:00", "temp": -0.7 }
            ]
        });

        let table = flatten_meteostat(&doc).unwrap();
        let path = ProcessedStore::new(dir.path()).save(ProviderId::Meteostat, "hourly", &table).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "time,temp\n2024-01-31 23:00:00,-0.5\n2024-02-01 00:00:00,-0.7\n"
        );
    }

    #[test]
    fn meteostat_columns_are_union_in_first_seen_order() {
        let doc = json!({
            "data": [
                { "date": "2024-01-01", "tavg": 1.0 },
                { "date": "2024-01-02", "snow": 30, "tavg": 2.0 }
            ]
        });

        let table = flatten_meteostat(&doc).unwrap();

        assert_eq!(table.columns, vec!["date", "tavg", "snow"]);
        assert_eq!(table.rows[0][2], Value::Null);
        assert_eq!(table.rows[1][2], json!(30));
    }

    #[test]
    fn meteostat_without_data_is_empty() {
        assert!(flatten_meteostat(&json!({})).unwrap().columns.is_empty());
        assert!(flatten_meteostat(&json!({ "data": [] })).unwrap().is_empty());
    }

    #[test]
    fn meteostat_records_without_date_or_time_are_malformed() {
        let err = flatten_meteostat(&json!({ "data": [{ "tavg": 1.0 }] })).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
        assert!(err.to_string().contains("neither a 'date' nor a 'time'"));
    }

    #[test]
    fn meteostat_unparseable_date_is_malformed() {
        let err = flatten_meteostat(&json!({ "data": [{ "date": "yesterday" }] })).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }

    fn openmeteo_doc() -> Value {
        json!({
            "latitude": 48.86,
            "current_weather": { "time": "2024-06-01T10:00", "temperature": 21.3, "windspeed": 7.2 },
            "hourly": {
                "time": ["2024-06-01T00:00", "2024-06-01T01:00"],
                "temperature_2m": [15.1, 14.8],
                "precipitation": [0.0, null]
            }
        })
    }

    #[test]
    fn openmeteo_splits_current_and_hourly() {
        let tables = flatten_openmeteo(&openmeteo_doc()).unwrap();

        assert_eq!(tables.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec!["current", "hourly"]);

        let current = &tables[0].1;
        assert_eq!(current.len(), 1);
        let time = current.column_index("time").unwrap();
        assert_eq!(current.rows[0][time], json!("2024-06-01 10:00:00"));

        let hourly = &tables[1].1;
        assert_eq!(hourly.len(), 2);
        let time = hourly.column_index("time").unwrap();
        assert_eq!(hourly.rows[1][time], json!("2024-06-01 01:00:00"));
        let precip = hourly.column_index("precipitation").unwrap();
        assert_eq!(hourly.rows[1][precip], Value::Null);
    }

    #[test]
    fn openmeteo_without_current_weather_is_malformed() {
        let err = flatten_openmeteo(&json!({ "hourly": {} })).unwrap_err();
        assert!(err.to_string().contains("current_weather"));
    }

    #[test]
    fn openmeteo_uneven_hourly_columns_are_malformed() {
        let doc = json!({
            "current_weather": { "time": "2024-06-01T10:00" },
            "hourly": { "time": ["2024-06-01T00:00"], "temperature_2m": [1.0, 2.0] }
        });

        let err = flatten_openmeteo(&doc).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn flatten_dispatches_by_source() {
        let meteostat = flatten(ProviderId::Meteostat, &json!({ "data": [] })).unwrap();
        assert_eq!(meteostat.len(), 1);
        assert_eq!(meteostat[0].0, None);

        let openmeteo = flatten(ProviderId::OpenMeteo, &openmeteo_doc()).unwrap();
        assert_eq!(openmeteo[1].0, Some("hourly"));
    }

    #[test]
    fn parse_timestamp_accepts_known_layouts() {
        for s in ["2024-06-01", "2024-06-01 10:00", "2024-06-01T10:00", "2024-06-01 10:00:00"] {
            assert!(parse_timestamp(s).is_some(), "{s}");
        }
        assert!(parse_timestamp("06/01/2024").is_none());
    }

    #[test]
    fn csv_output_has_header_and_empty_cells_for_null() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProcessedStore::new(dir.path());
        let table = flatten_meteostat(&json!({
            "data": [
                { "date": "2024-01-01", "tavg": 2.5, "prcp": null },
                { "date": "2024-01-02", "tavg": -1.0, "prcp": 0.4 }
            ]
        }))
        .unwrap();

        let path = store.save(ProviderId::Meteostat, "berlin", &table).unwrap();

        assert_eq!(path, dir.path().join("processed/meteostat/berlin.csv"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,tavg,prcp\n2024-01-01,2.5,\n2024-01-02,-1.0,0.4\n"
        );
    }

    #[test]
    fn csv_for_empty_table_is_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&path, &Table::default()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn openmeteo_tables_land_in_open_meteo_dir() {
        let store = ProcessedStore::new("data");
        assert_eq!(
            store.path(ProviderId::OpenMeteo, "paris_hourly"),
            PathBuf::from("data/processed/open_meteo/paris_hourly.csv")
        );
    }
}
