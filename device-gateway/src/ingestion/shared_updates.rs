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

//! Shared consumer of the common sensor-updates destination.

use crate::ingestion::{apply_sensor_update, UpdateOutcome};
use crate::observability::{events, fields};
use crate::proto::SensorDataUpdate;
use crate::registry::{DeviceIdentity, DeviceRegistry, SensorRecord};
use crate::transport::Deliveries;
use prost::Message;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "shared_updates";

/// Applies `{name, identity, data}` updates from one shared destination.
pub(crate) struct SharedUpdateListener {
    registry: Arc<DeviceRegistry>,
    adopt_unknown_sensors: bool,
    shutdown: CancellationToken,
}

impl SharedUpdateListener {
    pub(crate) fn new(
        registry: Arc<DeviceRegistry>,
        adopt_unknown_sensors: bool,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            adopt_unknown_sensors,
            shutdown,
        }
    }

    /// Consumes `deliveries` until shutdown or until the source closes.
    pub(crate) async fn run(self, destination: String, mut deliveries: Deliveries) {
        info!(
            event = events::LISTENER_START,
            component = COMPONENT,
            destination = destination.as_str(),
            "listening for shared sensor updates"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(
                        event = events::LISTENER_STOP,
                        component = COMPONENT,
                        destination = destination.as_str(),
                        reason = fields::REASON_SHUTDOWN,
                        "stopping shared sensor updates"
                    );
                    break;
                }
                body = deliveries.recv() => match body {
                    Some(body) => self.handle_message(&body).await,
                    None => {
                        info!(
                            event = events::LISTENER_STOP,
                            component = COMPONENT,
                            destination = destination.as_str(),
                            reason = fields::REASON_SOURCE_CLOSED,
                            "shared update source closed"
                        );
                        break;
                    }
                },
            }
        }
    }

    pub(crate) async fn handle_message(&self, body: &[u8]) {
        let update = match SensorDataUpdate::decode(body) {
            Ok(update) if !update.queue_name.is_empty() => update,
            Ok(_) => {
                warn!(
                    event = events::INGEST_UPDATE_MALFORMED,
                    component = COMPONENT,
                    reason = "missing_device_name",
                    "dropping sensor update without a device name"
                );
                return;
            }
            Err(err) => {
                warn!(
                    event = events::INGEST_UPDATE_MALFORMED,
                    component = COMPONENT,
                    err = %err,
                    "unable to decode sensor update"
                );
                return;
            }
        };

        let device_name = update.queue_name.as_str();
        let Some(record) = self.registry.sensor(device_name).await else {
            self.adopt(&update).await;
            return;
        };

        match apply_sensor_update(&record, &update).await {
            UpdateOutcome::Applied => {
                debug!(
                    event = events::INGEST_UPDATE_APPLIED,
                    component = COMPONENT,
                    device_name,
                    data = update.data.as_str(),
                    "applied sensor update"
                );
            }
            UpdateOutcome::IdentityMismatch => {
                let expected = fields::format_identity(&record.identity());
                warn!(
                    event = events::INGEST_IDENTITY_MISMATCH,
                    component = COMPONENT,
                    device_name,
                    identity = expected.as_str(),
                    reported_identity = update.id.as_str(),
                    "received update with wrong identity"
                );
            }
            UpdateOutcome::Retired => {
                debug!(
                    event = events::INGEST_UNKNOWN_SENSOR_DROPPED,
                    component = COMPONENT,
                    device_name,
                    reason = fields::REASON_RETIRED,
                    "sensor retired while applying update"
                );
            }
        }
    }

    /// Creates a record for a sensor that streams before completing a handshake.
    async fn adopt(&self, update: &SensorDataUpdate) {
        let device_name = update.queue_name.as_str();

        if !self.adopt_unknown_sensors {
            debug!(
                event = events::INGEST_UNKNOWN_SENSOR_DROPPED,
                component = COMPONENT,
                device_name,
                reason = "adoption_disabled",
                "dropping update from unregistered sensor"
            );
            return;
        }

        let Some(identity) = DeviceIdentity::parse(&update.id) else {
            warn!(
                event = events::INGEST_UNKNOWN_SENSOR_DROPPED,
                component = COMPONENT,
                device_name,
                reported_identity = update.id.as_str(),
                reason = "invalid_identity",
                "dropping update from unregistered sensor"
            );
            return;
        };

        let record = Arc::new(SensorRecord::new(
            identity,
            device_name,
            &update.data,
            self.shutdown.child_token(),
        ));
        if self.registry.insert_sensor_if_absent(record).await {
            info!(
                event = events::INGEST_SENSOR_ADOPTED,
                component = COMPONENT,
                device_name,
                identity = %identity,
                "adopted sensor from first update"
            );
        } else {
            warn!(
                event = events::INGEST_UNKNOWN_SENSOR_DROPPED,
                component = COMPONENT,
                device_name,
                identity = %identity,
                reason = "name_or_identity_in_use",
                "dropping update from unregistered sensor"
            );
        }
    }
}
