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

//! Protobuf wire messages exchanged with devices.
//!
//! Field tags match the device-side `messages.proto` / `services.proto` schema so
//! that any protobuf runtime on the device can talk to the gateway.

use prost::Message;

/// Device kind as declared on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum DeviceType {
    Unspecified = 0,
    Sensor = 1,
    Actuator = 2,
}

/// Sent by a device to the shared connect destination to ask for admission.
#[derive(Clone, PartialEq, Message)]
pub struct ConnectionRequest {
    #[prost(string, tag = "1")]
    pub queue_name: String,
    #[prost(enumeration = "DeviceType", tag = "2")]
    pub r#type: i32,
    /// Network address of the actuator's command endpoint.
    #[prost(string, optional, tag = "3")]
    pub address: Option<String>,
    #[prost(string, tag = "4")]
    pub initial_data: String,
}

/// Published to `"<name>_id"` with the identity the gateway assigned.
#[derive(Clone, PartialEq, Message)]
pub struct ConnectionResponse {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct DisconnectionRequest {
    #[prost(string, tag = "1")]
    pub queue_name: String,
    #[prost(string, tag = "2")]
    pub id: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct SensorDataUpdate {
    #[prost(string, tag = "1")]
    pub queue_name: String,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub data: String,
}

/// Request and reply of the actuator `ChangeState` remote call.
#[derive(Clone, PartialEq, Message)]
pub struct ActuatorState {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub state: String,
}

impl ConnectionRequest {
    pub fn sensor(queue_name: &str, initial_data: &str) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            r#type: DeviceType::Sensor as i32,
            address: None,
            initial_data: initial_data.to_string(),
        }
    }

    pub fn actuator(queue_name: &str, address: &str, initial_data: &str) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            r#type: DeviceType::Actuator as i32,
            address: Some(address.to_string()),
            initial_data: initial_data.to_string(),
        }
    }

    /// Declared device kind, `Unspecified` for unknown enum values.
    pub fn device_type(&self) -> DeviceType {
        DeviceType::try_from(self.r#type).unwrap_or(DeviceType::Unspecified)
    }
}
