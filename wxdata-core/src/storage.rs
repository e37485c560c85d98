//! Raw artifacts: upstream JSON persisted verbatim under `<root>/raw/<source>/`.

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    model::{DateRange, Granularity},
    provider::ProviderId,
};

/// UTC timestamp suffix of raw file names, e.g. `20240201T0930Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%MZ";

#[derive(Debug, Clone)]
pub struct RawStore {
    root: PathBuf,
}

impl RawStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn dir(&self, source: ProviderId) -> PathBuf {
        self.root.join("raw").join(source.dir_name())
    }

    pub fn meteostat_path(
        &self,
        name: &str,
        granularity: Granularity,
        range: DateRange,
        fetched_at: DateTime<Utc>,
    ) -> PathBuf {
        let file = format!(
            "{name}_{}_{granularity}_{}_{}_{}.json",
            ProviderId::Meteostat,
            range.start,
            range.end,
            fetched_at.format(TIMESTAMP_FORMAT),
        );
        self.dir(ProviderId::Meteostat).join(file)
    }

    pub fn openmeteo_path(&self, name: &str, fetched_at: DateTime<Utc>) -> PathBuf {
        let file =
            format!("{name}_{}_{}.json", ProviderId::OpenMeteo, fetched_at.format(TIMESTAMP_FORMAT));
        self.dir(ProviderId::OpenMeteo).join(file)
    }

    pub fn save_meteostat<S: Serialize>(
        &self,
        data: &S,
        name: &str,
        granularity: Granularity,
        range: DateRange,
        fetched_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let path = self.meteostat_path(name, granularity, range, fetched_at);
        write_json(&path, data)?;
        Ok(path)
    }

    pub fn save_openmeteo<S: Serialize>(
        &self,
        data: &S,
        name: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        let path = self.openmeteo_path(name, fetched_at);
        write_json(&path, data)?;
        Ok(path)
    }
}

/// Write `data` as JSON indented by two spaces, creating parent directories.
pub fn write_json<S: Serialize>(path: &Path, data: &S) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let body = serde_json::to_vec_pretty(data)
        .map_err(|source| Error::Json { path: path.to_path_buf(), source })?;
    fs::write(path, body).map_err(|e| Error::io(path, e))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Value> {
    let contents = fs::read(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_slice(&contents).map_err(|source| Error::Json { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WeatherResponse;
    use chrono::TimeZone;
    use serde_json::json;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 11, 9, 5, 42).unwrap()
    }

    #[test]
    fn meteostat_file_name_pattern() {
        let store = RawStore::new("data");
        let range = DateRange::parse("2024-01-15", "2024-03-10").unwrap();

        let path = store.meteostat_path("berlin", Granularity::Hourly, range, fetched_at());

        assert_eq!(
            path,
            PathBuf::from("data/raw/meteostat/berlin_meteostat_hourly_2024-01-15_2024-03-10_20240311T0905Z.json")
        );
    }

    #[test]
    fn openmeteo_file_name_pattern() {
        let store = RawStore::new("data");

        let path = store.openmeteo_path("paris", fetched_at());

        assert_eq!(path, PathBuf::from("data/raw/open_meteo/paris_openmeteo_20240311T0905Z.json"));
    }

    #[test]
    fn saved_response_loads_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = RawStore::new(dir.path());
        let body = json!({ "meta": { "source": "test" }, "data": [{ "date": "2024-01-01", "tavg": 1.0 }] });
        let response = WeatherResponse::from(body.clone());
        let range = DateRange::parse("2024-01-01", "2024-01-01").unwrap();

        let path = store
            .save_meteostat(&response, "loc", Granularity::Daily, range, fetched_at())
            .unwrap();

        assert!(path.starts_with(dir.path().join("raw").join("meteostat")));
        assert_eq!(load_json(&path).unwrap(), body);

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"data\""), "expected two-space indentation:\n{text}");
        assert!(text.find("\"meta\"") < text.find("\"data\""), "upstream key order lost:\n{text}");
    }

    #[test]
    fn load_json_reports_path_on_bad_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_json(&path).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn load_json_missing_file_is_io_error() {
        let err = load_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
