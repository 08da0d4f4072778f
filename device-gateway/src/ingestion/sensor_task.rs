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

//! Per-sensor update task consuming the sensor's private destination.

use crate::ingestion::{apply_sensor_update, UpdateOutcome};
use crate::observability::{events, fields};
use crate::proto::SensorDataUpdate;
use crate::registry::SensorRecord;
use crate::transport::Deliveries;
use prost::Message;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMPONENT: &str = "sensor_task";

/// Update consumer bound to the lifetime of one [`SensorRecord`].
pub(crate) struct SensorUpdateTask;

impl SensorUpdateTask {
    /// Spawns the ingestion loop for `record`.
    pub(crate) fn spawn(record: Arc<SensorRecord>, deliveries: Deliveries) -> JoinHandle<()> {
        tokio::spawn(Self::run(record, deliveries))
    }

    /// Applies updates in arrival order until the record is retired or the source
    /// closes. Retirement wins over queued deliveries.
    pub(crate) async fn run(record: Arc<SensorRecord>, mut deliveries: Deliveries) {
        let device_name = record.name();
        let identity_value = fields::format_identity(&record.identity());
        let identity = identity_value.as_str();

        debug!(
            event = events::INGEST_TASK_START,
            component = COMPONENT,
            device_name,
            identity,
            "listening for sensor updates"
        );

        loop {
            let body = tokio::select! {
                biased;
                _ = record.retired() => {
                    info!(
                        event = events::INGEST_TASK_STOP,
                        component = COMPONENT,
                        device_name,
                        identity,
                        reason = fields::REASON_RETIRED,
                        "stopping sensor updates"
                    );
                    break;
                }
                body = deliveries.recv() => match body {
                    Some(body) => body,
                    None => {
                        info!(
                            event = events::INGEST_TASK_STOP,
                            component = COMPONENT,
                            device_name,
                            identity,
                            reason = fields::REASON_SOURCE_CLOSED,
                            "update source closed"
                        );
                        break;
                    }
                },
            };

            let update = match SensorDataUpdate::decode(body.as_slice()) {
                Ok(update) => update,
                Err(err) => {
                    warn!(
                        event = events::INGEST_UPDATE_MALFORMED,
                        component = COMPONENT,
                        device_name,
                        err = %err,
                        "unable to decode sensor update"
                    );
                    continue;
                }
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
                    warn!(
                        event = events::INGEST_IDENTITY_MISMATCH,
                        component = COMPONENT,
                        device_name,
                        identity,
                        reported_identity = update.id.as_str(),
                        "received update with wrong identity"
                    );
                }
                UpdateOutcome::Retired => break,
            }
        }
    }
}
