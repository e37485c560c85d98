use std::{convert::TryFrom, fmt};

use crate::error::Error;

pub mod meteostat;
pub mod openmeteo;

pub use meteostat::MeteostatClient;
pub use openmeteo::OpenMeteoClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Meteostat,
    OpenMeteo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Meteostat => "meteostat",
            ProviderId::OpenMeteo => "openmeteo",
        }
    }

    /// Directory name used under `raw/` and `processed/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ProviderId::Meteostat => "meteostat",
            ProviderId::OpenMeteo => "open_meteo",
        }
    }

    /// Environment variable that overrides the stored API key, if the
    /// provider needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderId::Meteostat => Some("METEOSTAT_RAPIDAPI_KEY"),
            ProviderId::OpenMeteo => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::Meteostat, ProviderId::OpenMeteo]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "meteostat" => Ok(ProviderId::Meteostat),
            "openmeteo" | "open_meteo" | "open-meteo" => Ok(ProviderId::OpenMeteo),
            _ => Err(Error::InvalidArgument(format!(
                "Unknown provider '{value}'. Supported providers: meteostat, openmeteo."
            ))),
        }
    }
}
