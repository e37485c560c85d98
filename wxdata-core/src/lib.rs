//! Core library for the `wxdata` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the Meteostat (historical) and Open-Meteo (forecast) APIs,
//!   including month-chunked hourly fetching
//! - Raw JSON persistence and flattening into CSV tables
//!
//! It is used by `wxdata-cli`, but can also be reused by other binaries or services.

pub mod chunk;
pub mod config;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod provider;
pub mod storage;
pub mod transport;

pub use config::{Config, ProviderConfig};
pub use error::{Error, Result, UpstreamFailure};
pub use model::{DateRange, GeoPoint, Granularity, WeatherResponse};
pub use preprocess::{ProcessedStore, Table};
pub use provider::{MeteostatClient, OpenMeteoClient, ProviderId};
pub use storage::RawStore;
