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

//! Live device records and their per-record state.

use crate::proto;
use crate::transport::ActuatorClient;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

/// Gateway-assigned identity of one device session.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct DeviceIdentity(Uuid);

impl DeviceIdentity {
    /// Generates a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the URN, hyphenated or simple UUID forms.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Wire form carried in protobuf messages.
    pub fn to_urn(&self) -> String {
        self.0.urn().to_string()
    }
}

impl Display for DeviceIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DeviceType {
    Sensor,
    Actuator,
}

impl TryFrom<proto::DeviceType> for DeviceType {
    type Error = proto::DeviceType;

    fn try_from(value: proto::DeviceType) -> Result<Self, Self::Error> {
        match value {
            proto::DeviceType::Sensor => Ok(DeviceType::Sensor),
            proto::DeviceType::Actuator => Ok(DeviceType::Actuator),
            other => Err(other),
        }
    }
}

impl Display for DeviceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(crate::observability::fields::format_device_type(*self))
    }
}

/// A live sensor and the last reading it reported.
pub struct SensorRecord {
    identity: DeviceIdentity,
    name: String,
    pub(crate) last_data: RwLock<String>,
    retired: CancellationToken,
}

impl SensorRecord {
    pub fn new(
        identity: DeviceIdentity,
        name: &str,
        initial_data: &str,
        retired: CancellationToken,
    ) -> Self {
        Self {
            identity,
            name: name.to_string(),
            last_data: RwLock::new(initial_data.to_string()),
            retired,
        }
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn last_data(&self) -> String {
        self.last_data.read().await.clone()
    }

    /// Replaces the cached reading. Returns `false` once the record is retired.
    pub async fn apply_update(&self, data: &str) -> bool {
        let mut last_data = self.last_data.write().await;
        if self.retired.is_cancelled() {
            return false;
        }
        *last_data = data.to_string();
        true
    }

    pub fn is_retired(&self) -> bool {
        self.retired.is_cancelled()
    }

    /// Resolves once the record has been offboarded, replaced or shut down.
    pub fn retired(&self) -> WaitForCancellationFuture<'_> {
        self.retired.cancelled()
    }

    /// Fires the retirement signal while holding the payload lock, so no update
    /// lands once this returns.
    pub(crate) async fn retire(&self) {
        let _last_data = self.last_data.write().await;
        self.retired.cancel();
    }
}

/// A live actuator, the handle used to command it and its last confirmed state.
pub struct ActuatorRecord {
    identity: DeviceIdentity,
    name: String,
    address: String,
    client: Arc<dyn ActuatorClient>,
    pub(crate) last_state: RwLock<String>,
    retired: CancellationToken,
}

impl ActuatorRecord {
    pub fn new(
        identity: DeviceIdentity,
        name: &str,
        address: &str,
        client: Arc<dyn ActuatorClient>,
        initial_state: &str,
        retired: CancellationToken,
    ) -> Self {
        Self {
            identity,
            name: name.to_string(),
            address: address.to_string(),
            client,
            last_state: RwLock::new(initial_state.to_string()),
            retired,
        }
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn client(&self) -> Arc<dyn ActuatorClient> {
        self.client.clone()
    }

    pub async fn last_state(&self) -> String {
        self.last_state.read().await.clone()
    }

    pub fn is_retired(&self) -> bool {
        self.retired.is_cancelled()
    }

    pub fn retired(&self) -> WaitForCancellationFuture<'_> {
        self.retired.cancelled()
    }

    pub(crate) async fn retire(&self) {
        let _last_state = self.last_state.write().await;
        self.retired.cancel();
    }
}

/// Either kind of live record, as returned by name lookups.
#[derive(Clone)]
pub enum DeviceRecord {
    Sensor(Arc<SensorRecord>),
    Actuator(Arc<ActuatorRecord>),
}

impl DeviceRecord {
    pub fn identity(&self) -> DeviceIdentity {
        match self {
            DeviceRecord::Sensor(record) => record.identity(),
            DeviceRecord::Actuator(record) => record.identity(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DeviceRecord::Sensor(record) => record.name(),
            DeviceRecord::Actuator(record) => record.name(),
        }
    }

    pub fn device_type(&self) -> DeviceType {
        match self {
            DeviceRecord::Sensor(_) => DeviceType::Sensor,
            DeviceRecord::Actuator(_) => DeviceType::Actuator,
        }
    }
}
