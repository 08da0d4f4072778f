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

//! Device registry.
//!
//! Three independently locked projections: sensors by name, actuators by name and
//! identity to device type. Structural changes take the device map first and the
//! identity map second, so a record and its identity entry always appear and
//! disappear together. Record payloads sit behind their own locks inside the
//! records, never behind the structural ones.

mod device_registry;
mod record;

pub use device_registry::{DeviceRegistry, RegistryError};
pub use record::{ActuatorRecord, DeviceIdentity, DeviceRecord, DeviceType, SensorRecord};
