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

//! Canonical structured field values and format helpers.

use crate::registry::{DeviceIdentity, DeviceType};

pub const REASON_SHUTDOWN: &str = "shutdown";
pub const REASON_RETIRED: &str = "retired";
pub const REASON_SOURCE_CLOSED: &str = "source_closed";

pub fn format_identity(identity: &DeviceIdentity) -> String {
    identity.to_string()
}

pub fn format_device_type(device_type: DeviceType) -> &'static str {
    match device_type {
        DeviceType::Sensor => "sensor",
        DeviceType::Actuator => "actuator",
    }
}
