/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Gateway configuration, loaded from JSON5.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default)]
    pub destinations: Destinations,
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

/// Broker destination names used by the gateway.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Destinations {
    pub connect: String,
    pub disconnect: String,
    pub sensor_updates: String,
    /// Fan-out exchange used to solicit actuator announcements.
    pub registration_exchange: String,
    /// Appended to a device name to form its connection-response destination.
    pub reply_suffix: String,
}

impl Default for Destinations {
    fn default() -> Self {
        Self {
            connect: "connect".to_string(),
            disconnect: "disconnect".to_string(),
            sensor_updates: "sensor_updates".to_string(),
            registration_exchange: "actuator_registration".to_string(),
            reply_suffix: "_id".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct IngestionConfig {
    pub mode: IngestionMode,
    /// Create records for sensors that stream on the shared destination before
    /// completing a handshake.
    pub adopt_unknown_sensors: bool,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            mode: IngestionMode::default(),
            adopt_unknown_sensors: true,
        }
    }
}

/// Which sensor update paths the gateway runs.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestionMode {
    /// One consumer task per sensor on its private destination.
    PerSensor,
    /// One consumer of the shared updates destination.
    Shared,
    #[default]
    Both,
}

impl IngestionMode {
    pub fn per_sensor(self) -> bool {
        matches!(self, IngestionMode::PerSensor | IngestionMode::Both)
    }

    pub fn shared(self) -> bool {
        matches!(self, IngestionMode::Shared | IngestionMode::Both)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(json5::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "unable to read config file: {err}"),
            ConfigError::Parse(err) => write!(f, "unable to parse config file: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl GatewayConfig {
    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        json5::from_str(contents).map_err(ConfigError::Parse)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json5_str(&contents)
    }

    /// Destination a device listens on for its assigned identity.
    pub fn reply_destination(&self, device_name: &str) -> String {
        format!("{device_name}{}", self.destinations.reply_suffix)
    }
}
