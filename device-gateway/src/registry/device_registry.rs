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

use crate::observability::{events, fields};
use crate::registry::record::{
    ActuatorRecord, DeviceIdentity, DeviceRecord, DeviceType, SensorRecord,
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

const COMPONENT: &str = "device_registry";

#[derive(Debug, Eq, PartialEq)]
pub enum RegistryError {
    /// The record was retired before it could be stored, e.g. during shutdown.
    RecordRetired { device_name: String },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::RecordRetired { device_name } => {
                write!(f, "record for {device_name} was retired before registration")
            }
        }
    }
}

impl Error for RegistryError {}

/// Common surface of records stored in a device map.
#[async_trait]
trait LiveRecord: Send + Sync {
    fn identity(&self) -> DeviceIdentity;
    fn is_retired(&self) -> bool;
    async fn retire(&self);
}

#[async_trait]
impl LiveRecord for SensorRecord {
    fn identity(&self) -> DeviceIdentity {
        SensorRecord::identity(self)
    }

    fn is_retired(&self) -> bool {
        SensorRecord::is_retired(self)
    }

    async fn retire(&self) {
        SensorRecord::retire(self).await
    }
}

#[async_trait]
impl LiveRecord for ActuatorRecord {
    fn identity(&self) -> DeviceIdentity {
        ActuatorRecord::identity(self)
    }

    fn is_retired(&self) -> bool {
        ActuatorRecord::is_retired(self)
    }

    async fn retire(&self) {
        ActuatorRecord::retire(self).await
    }
}

type DeviceMap<R> = RwLock<HashMap<String, Arc<R>>>;

/// In-memory registry of live devices shared by every gateway task.
#[derive(Default)]
pub struct DeviceRegistry {
    sensors: DeviceMap<SensorRecord>,
    actuators: DeviceMap<ActuatorRecord>,
    identity_types: RwLock<HashMap<DeviceIdentity, DeviceType>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn upsert<R: LiveRecord>(
        &self,
        devices: &DeviceMap<R>,
        device_type: DeviceType,
        name: &str,
        record: Arc<R>,
    ) -> Result<Option<Arc<R>>, RegistryError> {
        let mut devices = devices.write().await;
        if record.is_retired() {
            return Err(RegistryError::RecordRetired {
                device_name: name.to_string(),
            });
        }
        let mut identity_types = self.identity_types.write().await;

        let replaced = devices
            .insert(name.to_string(), record.clone())
            .filter(|previous| !Arc::ptr_eq(previous, &record));
        if let Some(previous) = replaced.as_ref() {
            previous.retire().await;
            identity_types.remove(&previous.identity());
        }
        identity_types.insert(record.identity(), device_type);
        drop(identity_types);
        drop(devices);

        if let Some(previous) = replaced.as_ref() {
            debug!(
                event = events::REGISTRY_RECORD_RETIRED,
                component = COMPONENT,
                device_name = name,
                device_type = fields::format_device_type(device_type),
                identity = %previous.identity(),
                reason = "replaced",
                "retired replaced record"
            );
        }
        Ok(replaced)
    }

    async fn remove<R: LiveRecord>(
        &self,
        devices: &DeviceMap<R>,
        device_type: DeviceType,
        name: &str,
        expected_identity: Option<DeviceIdentity>,
    ) -> Option<Arc<R>> {
        let mut devices = devices.write().await;

        let record = devices.get(name)?;
        if expected_identity.is_some_and(|identity| identity != record.identity()) {
            return None;
        }
        record.retire().await;

        let mut identity_types = self.identity_types.write().await;
        let removed = devices.remove(name)?;
        identity_types.remove(&removed.identity());
        drop(identity_types);
        drop(devices);

        debug!(
            event = events::REGISTRY_RECORD_RETIRED,
            component = COMPONENT,
            device_name = name,
            device_type = fields::format_device_type(device_type),
            identity = %removed.identity(),
            reason = "removed",
            "retired removed record"
        );
        Some(removed)
    }

    /// Inserts a sensor, replacing and retiring any live sensor with the same name.
    /// Returns the replaced record. A record that is already retired is refused.
    pub async fn upsert_sensor(
        &self,
        record: Arc<SensorRecord>,
    ) -> Result<Option<Arc<SensorRecord>>, RegistryError> {
        let name = record.name().to_string();
        self.upsert(&self.sensors, DeviceType::Sensor, &name, record)
            .await
    }

    /// Inserts a live sensor only when no live sensor uses its name or identity.
    /// Returns `true` when the record was inserted.
    pub async fn insert_sensor_if_absent(&self, record: Arc<SensorRecord>) -> bool {
        let mut sensors = self.sensors.write().await;
        if record.is_retired() {
            return false;
        }
        let mut identity_types = self.identity_types.write().await;

        if sensors.contains_key(record.name()) || identity_types.contains_key(&record.identity()) {
            return false;
        }
        identity_types.insert(record.identity(), DeviceType::Sensor);
        sensors.insert(record.name().to_string(), record);
        true
    }

    /// Inserts an actuator, replacing and retiring any live actuator with the same name.
    pub async fn upsert_actuator(
        &self,
        record: Arc<ActuatorRecord>,
    ) -> Result<Option<Arc<ActuatorRecord>>, RegistryError> {
        let name = record.name().to_string();
        self.upsert(&self.actuators, DeviceType::Actuator, &name, record)
            .await
    }

    /// Retires and removes the record named `name`, returning its identity.
    pub async fn remove_by_name(&self, device_type: DeviceType, name: &str) -> Option<DeviceIdentity> {
        match device_type {
            DeviceType::Sensor => self
                .remove(&self.sensors, device_type, name, None)
                .await
                .map(|record| record.identity()),
            DeviceType::Actuator => self
                .remove(&self.actuators, device_type, name, None)
                .await
                .map(|record| record.identity()),
        }
    }

    /// Retires and removes the record named `name` only while it still carries
    /// `identity`. Returns `true` when a record was removed.
    pub async fn remove_if_identity(
        &self,
        device_type: DeviceType,
        name: &str,
        identity: DeviceIdentity,
    ) -> bool {
        match device_type {
            DeviceType::Sensor => self
                .remove(&self.sensors, device_type, name, Some(identity))
                .await
                .is_some(),
            DeviceType::Actuator => self
                .remove(&self.actuators, device_type, name, Some(identity))
                .await
                .is_some(),
        }
    }

    pub async fn lookup_by_name(&self, device_type: DeviceType, name: &str) -> Option<DeviceRecord> {
        match device_type {
            DeviceType::Sensor => self.sensor(name).await.map(DeviceRecord::Sensor),
            DeviceType::Actuator => self.actuator(name).await.map(DeviceRecord::Actuator),
        }
    }

    pub async fn sensor(&self, name: &str) -> Option<Arc<SensorRecord>> {
        self.sensors.read().await.get(name).cloned()
    }

    pub async fn actuator(&self, name: &str) -> Option<Arc<ActuatorRecord>> {
        self.actuators.read().await.get(name).cloned()
    }

    pub async fn type_of(&self, identity: &DeviceIdentity) -> Option<DeviceType> {
        self.identity_types.read().await.get(identity).copied()
    }

    pub async fn list_names(&self, device_type: DeviceType) -> BTreeSet<String> {
        match device_type {
            DeviceType::Sensor => self.sensors.read().await.keys().cloned().collect(),
            DeviceType::Actuator => self.actuators.read().await.keys().cloned().collect(),
        }
    }

    pub async fn len(&self, device_type: DeviceType) -> usize {
        match device_type {
            DeviceType::Sensor => self.sensors.read().await.len(),
            DeviceType::Actuator => self.actuators.read().await.len(),
        }
    }

    /// Snapshot of the identity to type projection.
    pub async fn identities(&self) -> HashMap<DeviceIdentity, DeviceType> {
        self.identity_types.read().await.clone()
    }

    /// Retires and drops every record. Returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let mut sensors = self.sensors.write().await;
        let mut actuators = self.actuators.write().await;
        let mut identity_types = self.identity_types.write().await;

        for record in sensors.values() {
            record.retire().await;
        }
        for record in actuators.values() {
            record.retire().await;
        }
        let cleared = sensors.len() + actuators.len();

        sensors.clear();
        actuators.clear();
        identity_types.clear();
        drop(identity_types);
        drop(actuators);
        drop(sensors);

        debug!(
            event = events::REGISTRY_CLEARED,
            component = COMPONENT,
            cleared,
            "cleared device registry"
        );
        cleared
    }
}
