//! Meteostat point API (via RapidAPI): historical daily and hourly data.

use log::{debug, info, warn};
use serde_json::Value;

use crate::{
    Config,
    chunk::month_chunks,
    error::{Error, Result},
    model::{DateRange, GeoPoint, Granularity, WeatherResponse},
    provider::ProviderId,
    transport::{HttpRequest, HttpTransport, ReqwestTransport},
};

pub const BASE_URL: &str = "https://meteostat.p.rapidapi.com/point";
const RAPIDAPI_HOST: &str = "meteostat.p.rapidapi.com";

#[derive(Debug, Clone)]
pub struct MeteostatClient<T = ReqwestTransport> {
    api_key: String,
    base_url: String,
    transport: T,
}

impl MeteostatClient<ReqwestTransport> {
    /// Build a client from config. Fails before any request is made when no
    /// API key is available.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key(ProviderId::Meteostat)?.to_owned();
        Ok(Self::new(api_key, ReqwestTransport::new(config.timeout())?))
    }
}

impl<T: HttpTransport> MeteostatClient<T> {
    pub fn new(api_key: String, transport: T) -> Self {
        Self { api_key, base_url: BASE_URL.to_string(), transport }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch observations for `point` over `range`.
    ///
    /// Daily data is a single request whose body is returned as is. Hourly
    /// data is requested one calendar month at a time, strictly in order, and
    /// the `data` lists are concatenated. The first failing request aborts the
    /// whole fetch and nothing fetched so far is returned.
    pub async fn fetch(
        &self,
        point: GeoPoint,
        range: DateRange,
        granularity: Granularity,
    ) -> Result<WeatherResponse> {
        if range.is_inverted() {
            warn!("Requested {granularity} range {range} is inverted; it covers no days");
        }

        match granularity {
            Granularity::Daily => self.fetch_daily(point, range).await,
            Granularity::Hourly => self.fetch_hourly(point, range).await,
        }
    }

    async fn fetch_daily(&self, point: GeoPoint, range: DateRange) -> Result<WeatherResponse> {
        debug!("Fetching daily {range} for ({}, {})", point.lat, point.lon);
        let body = self.transport.get_json(&self.request(Granularity::Daily, point, range)).await?;
        Ok(WeatherResponse::from(body))
    }

    async fn fetch_hourly(&self, point: GeoPoint, range: DateRange) -> Result<WeatherResponse> {
        let mut data = Vec::new();

        for chunk in month_chunks(range) {
            info!("Fetching hourly {chunk} ...");
            let body =
                self.transport.get_json(&self.request(Granularity::Hourly, point, chunk)).await?;
            let records = chunk_records(body)?;
            debug!("Received {} hourly records for {chunk}", records.len());
            data.extend(records);
        }

        Ok(WeatherResponse::from_records(data))
    }

    fn request(&self, granularity: Granularity, point: GeoPoint, range: DateRange) -> HttpRequest {
        HttpRequest::get(format!("{}/{}", self.base_url, granularity))
            .header("x-rapidapi-host", RAPIDAPI_HOST)
            .header("x-rapidapi-key", self.api_key.as_str())
            .query("lat", point.lat)
            .query("lon", point.lon)
            .query("start", range.start)
            .query("end", range.end)
    }
}

/// The `data` list of one hourly chunk. A missing or null `data` contributes
/// nothing.
fn chunk_records(mut body: Value) -> Result<Vec<Value>> {
    match body.get_mut("data").map(Value::take) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(records)) => Ok(records),
        Some(other) => Err(Error::MalformedResponse(format!(
            "Meteostat 'data' must be a list, got {other}"
        ))),
    }
}
