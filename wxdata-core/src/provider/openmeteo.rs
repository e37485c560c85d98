//! Open-Meteo forecast API: current conditions plus an hourly forecast.

use log::debug;
use serde_json::Value;

use crate::{
    Config,
    error::Result,
    model::GeoPoint,
    transport::{HttpRequest, HttpTransport, ReqwestTransport},
};

pub const BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const HOURLY_FIELDS: &[&str] = &["temperature_2m", "relativehumidity_2m", "precipitation"];

#[derive(Debug, Clone)]
pub struct OpenMeteoClient<T = ReqwestTransport> {
    base_url: String,
    transport: T,
}

impl OpenMeteoClient<ReqwestTransport> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(ReqwestTransport::new(config.timeout())?))
    }
}

impl<T: HttpTransport> OpenMeteoClient<T> {
    pub fn new(transport: T) -> Self {
        Self { base_url: BASE_URL.to_string(), transport }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current weather plus the hourly forecast covering the next `hours`.
    /// The API only serves whole days, so anything past 24 hours asks for a
    /// full week.
    pub async fn fetch_current_and_forecast(&self, point: GeoPoint, hours: u32) -> Result<Value> {
        let request = HttpRequest::get(&self.base_url)
            .query("latitude", point.lat)
            .query("longitude", point.lon)
            .query("current_weather", true)
            .query("hourly", HOURLY_FIELDS.join(","))
            .query("forecast_days", forecast_days(hours))
            .query("timezone", "auto");

        debug!("Fetching forecast for ({}, {}), {hours}h ahead", point.lat, point.lon);
        self.transport.get_json(&request).await
    }
}

fn forecast_days(hours: u32) -> u32 {
    if hours <= 24 { 1 } else { 7 }
}
