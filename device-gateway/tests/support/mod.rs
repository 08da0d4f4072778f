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

#![allow(dead_code)]

use device_gateway::proto::{ConnectionRequest, DisconnectionRequest, SensorDataUpdate};
use device_gateway::registry::{DeviceIdentity, DeviceType};
use device_gateway::transport::MessageBroker;
use device_gateway::{DeviceGateway, GatewayConfig};
use integration_test_utils::{wait_for_identity, FakeActuatorConnector, InMemoryBroker};
use prost::Message;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct Harness {
    pub(crate) gateway: DeviceGateway,
    pub(crate) broker: Arc<InMemoryBroker>,
    pub(crate) connector: Arc<FakeActuatorConnector>,
}

pub(crate) async fn start_gateway(config: GatewayConfig) -> Harness {
    integration_test_utils::init_logging();

    let broker = Arc::new(InMemoryBroker::new());
    let connector = Arc::new(FakeActuatorConnector::new());
    let gateway = DeviceGateway::new(config, broker.clone(), connector.clone());
    gateway.start().await.expect("gateway starts");

    Harness {
        gateway,
        broker,
        connector,
    }
}

pub(crate) async fn publish(broker: &InMemoryBroker, destination: &str, payload: Vec<u8>) {
    broker
        .publish(destination, payload)
        .await
        .expect("in-memory publish never fails");
}

pub(crate) async fn connect_sensor(
    broker: &InMemoryBroker,
    name: &str,
    initial_data: &str,
) -> DeviceIdentity {
    publish(
        broker,
        "connect",
        ConnectionRequest::sensor(name, initial_data).encode_to_vec(),
    )
    .await;
    wait_for_identity(broker, name).await
}

pub(crate) async fn connect_actuator(
    broker: &InMemoryBroker,
    name: &str,
    address: &str,
    initial_state: &str,
) -> DeviceIdentity {
    publish(
        broker,
        "connect",
        ConnectionRequest::actuator(name, address, initial_state).encode_to_vec(),
    )
    .await;
    wait_for_identity(broker, name).await
}

pub(crate) async fn send_update(
    broker: &InMemoryBroker,
    destination: &str,
    name: &str,
    identity: &str,
    data: &str,
) {
    let update = SensorDataUpdate {
        queue_name: name.to_string(),
        id: identity.to_string(),
        data: data.to_string(),
    };
    publish(broker, destination, update.encode_to_vec()).await;
}

pub(crate) async fn disconnect(broker: &InMemoryBroker, name: &str, identity: &str) {
    let request = DisconnectionRequest {
        queue_name: name.to_string(),
        id: identity.to_string(),
    };
    publish(broker, "disconnect", request.encode_to_vec()).await;
}

/// Identity projection rebuilt from the live records.
pub(crate) async fn live_identities(gateway: &DeviceGateway) -> HashMap<DeviceIdentity, DeviceType> {
    let registry = gateway.registry();
    let mut live = HashMap::new();
    for name in registry.list_names(DeviceType::Sensor).await {
        if let Some(record) = registry.sensor(&name).await {
            live.insert(record.identity(), DeviceType::Sensor);
        }
    }
    for name in registry.list_names(DeviceType::Actuator).await {
        if let Some(record) = registry.actuator(&name).await {
            live.insert(record.identity(), DeviceType::Actuator);
        }
    }
    live
}
