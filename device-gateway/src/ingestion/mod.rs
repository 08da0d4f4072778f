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

//! Sensor update ingestion.
//!
//! Two paths feed sensor readings into the registry: a dedicated task per sensor
//! consuming its private destination, and one shared consumer of the common updates
//! destination. Both validate the reported identity the same way.

pub(crate) mod sensor_task;
pub(crate) mod shared_updates;

use crate::proto::SensorDataUpdate;
use crate::registry::{DeviceIdentity, SensorRecord};

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum UpdateOutcome {
    Applied,
    IdentityMismatch,
    Retired,
}

/// Applies `update` to `record` when the reported identity matches the record's.
pub(crate) async fn apply_sensor_update(
    record: &SensorRecord,
    update: &SensorDataUpdate,
) -> UpdateOutcome {
    if DeviceIdentity::parse(&update.id) != Some(record.identity()) {
        return UpdateOutcome::IdentityMismatch;
    }
    if record.apply_update(&update.data).await {
        UpdateOutcome::Applied
    } else {
        UpdateOutcome::Retired
    }
}
