//! REST service configuration.
//!
//! Configuration is resolved once at process startup and shared with handlers through
//! [`crate::AppState`]. Handlers never read process environment variables.

use std::net::SocketAddr;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Environment variable holding the REST bind address.
pub const REST_ADDR_ENV: &str = "HMS_FHIR_REST_ADDR";

/// Environment variable toggling UUID assignment for created Conditions.
pub const ASSIGN_IDS_ENV: &str = "HMS_FHIR_ASSIGN_IDS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid REST address '{value}': {source}")]
    InvalidAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("invalid boolean for {name}: '{value}' (expected true/false/1/0/yes/no)")]
    InvalidFlag { name: &'static str, value: String },
}

/// Service configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    rest_addr: SocketAddr,
    assign_resource_ids: bool,
}

impl ServiceConfig {
    pub fn new(rest_addr: SocketAddr, assign_resource_ids: bool) -> Self {
        Self {
            rest_addr,
            assign_resource_ids,
        }
    }

    /// Build configuration from optional raw environment values.
    ///
    /// Missing or blank values use the defaults: bind to [`DEFAULT_REST_ADDR`] and assign ids.
    pub fn from_env_values(
        rest_addr: Option<String>,
        assign_ids: Option<String>,
    ) -> Result<Self, ConfigError> {
        let rest_addr = non_blank(rest_addr).unwrap_or_else(|| DEFAULT_REST_ADDR.to_owned());
        let rest_addr = rest_addr
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidAddr {
                value: rest_addr.clone(),
                source,
            })?;

        let assign_resource_ids = non_blank(assign_ids)
            .map(|value| parse_flag(ASSIGN_IDS_ENV, &value))
            .transpose()?
            .unwrap_or(true);

        Ok(Self::new(rest_addr, assign_resource_ids))
    }

    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    pub fn assign_resource_ids(&self) -> bool {
        self.assign_resource_ids
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_owned(),
        }),
    }
}
