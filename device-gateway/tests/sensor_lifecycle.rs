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

mod support;

use device_gateway::registry::{DeviceIdentity, DeviceType};
use device_gateway::{GatewayConfig, GatewayError, IngestionMode};
use integration_test_utils::eventually;
use std::time::Duration;
use support::{connect_sensor, disconnect, send_update, start_gateway};

async fn sensor_data_is(gateway: &device_gateway::DeviceGateway, name: &str, expected: &str) -> bool {
    eventually(|| async move {
        gateway
            .sensor_data(name)
            .await
            .map(|data| data == expected)
            .unwrap_or(false)
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn onboarded_sensor_streams_on_its_private_destination() {
    let harness = start_gateway(GatewayConfig::default()).await;
    let broker = &harness.broker;
    let gateway = &harness.gateway;

    let identity = connect_sensor(broker, "temp1", "20.0").await;
    assert!(sensor_data_is(gateway, "temp1", "20.0").await);

    send_update(broker, "temp1", "temp1", &identity.to_urn(), "21.5").await;
    assert!(sensor_data_is(gateway, "temp1", "21.5").await);

    let foreign = DeviceIdentity::generate();
    send_update(broker, "temp1", "temp1", &foreign.to_urn(), "99.9").await;
    send_update(broker, "temp1", "temp1", &identity.to_string(), "22.0").await;
    assert!(sensor_data_is(gateway, "temp1", "22.0").await);

    assert_eq!(
        gateway.sensor_names().await.into_iter().collect::<Vec<_>>(),
        vec!["temp1".to_string()]
    );
    assert_eq!(
        gateway.registry().type_of(&identity).await,
        Some(DeviceType::Sensor)
    );

    harness.gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shared_destination_validates_identity_like_private_one() {
    let harness = start_gateway(GatewayConfig::default()).await;
    let broker = &harness.broker;
    let gateway = &harness.gateway;

    let identity = connect_sensor(broker, "temp1", "").await;
    send_update(broker, "sensor_updates", "temp1", &identity.to_urn(), "18.0").await;
    assert!(sensor_data_is(gateway, "temp1", "18.0").await);

    send_update(
        broker,
        "sensor_updates",
        "temp1",
        &DeviceIdentity::generate().to_urn(),
        "50.0",
    )
    .await;
    send_update(broker, "sensor_updates", "temp1", &identity.to_urn(), "18.5").await;
    assert!(sensor_data_is(gateway, "temp1", "18.5").await);

    harness.gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shared_destination_adopts_sensors_that_skip_the_handshake() {
    let harness = start_gateway(GatewayConfig::default()).await;
    let reported = DeviceIdentity::generate();

    send_update(
        &harness.broker,
        "sensor_updates",
        "pressure",
        &reported.to_urn(),
        "1013",
    )
    .await;
    assert!(sensor_data_is(&harness.gateway, "pressure", "1013").await);
    assert_eq!(
        harness.gateway.registry().type_of(&reported).await,
        Some(DeviceType::Sensor)
    );

    disconnect(&harness.broker, "pressure", &reported.to_urn()).await;
    let gateway = &harness.gateway;
    assert!(eventually(|| async move { gateway.sensor_names().await.is_empty() }).await);

    harness.gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shared_only_mode_without_adoption_ignores_unknown_sensors() {
    let config = GatewayConfig::from_json5_str(
        r#"{ ingestion: { mode: "shared", adopt_unknown_sensors: false } }"#,
    )
    .expect("valid config");
    assert_eq!(config.ingestion.mode, IngestionMode::Shared);
    let harness = start_gateway(config).await;
    let broker = &harness.broker;
    let gateway = &harness.gateway;

    send_update(
        broker,
        "sensor_updates",
        "pressure",
        &DeviceIdentity::generate().to_urn(),
        "1013",
    )
    .await;

    let identity = connect_sensor(broker, "temp1", "").await;
    assert!(!broker.is_consumed("temp1"));
    send_update(broker, "sensor_updates", "temp1", &identity.to_urn(), "19.0").await;
    assert!(sensor_data_is(gateway, "temp1", "19.0").await);

    assert!(matches!(
        gateway.sensor_data("pressure").await,
        Err(GatewayError::SensorNotFound(name)) if name == "pressure"
    ));

    harness.gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disconnect_of_unregistered_identity_changes_nothing() {
    let harness = start_gateway(GatewayConfig::default()).await;
    let broker = &harness.broker;
    let gateway = &harness.gateway;

    let identity = connect_sensor(broker, "temp1", "20.0").await;
    assert!(sensor_data_is(gateway, "temp1", "20.0").await);
    let before = gateway.registry().identities().await;

    disconnect(broker, "temp1", &DeviceIdentity::generate().to_urn()).await;
    disconnect(broker, "humidity", &DeviceIdentity::generate().to_urn()).await;
    disconnect(broker, "temp1", "not-a-uuid").await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    send_update(broker, "temp1", "temp1", &identity.to_urn(), "20.5").await;
    assert!(sensor_data_is(gateway, "temp1", "20.5").await);

    assert_eq!(gateway.registry().identities().await, before);
    assert_eq!(gateway.sensor_names().await.len(), 1);

    harness.gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reonboarding_replaces_the_previous_session() {
    let harness = start_gateway(GatewayConfig::default()).await;
    let broker = &harness.broker;
    let gateway = &harness.gateway;

    let first = connect_sensor(broker, "temp1", "1").await;
    assert!(sensor_data_is(gateway, "temp1", "1").await);
    let first_record = gateway
        .registry()
        .sensor("temp1")
        .await
        .expect("first session registered");

    let second = connect_sensor(broker, "temp1", "2").await;
    assert_ne!(first, second);
    assert!(sensor_data_is(gateway, "temp1", "2").await);

    assert!(first_record.is_retired());
    assert_eq!(gateway.registry().type_of(&first).await, None);
    assert_eq!(
        gateway.registry().type_of(&second).await,
        Some(DeviceType::Sensor)
    );

    send_update(broker, "temp1", "temp1", &first.to_urn(), "stale").await;
    send_update(broker, "temp1", "temp1", &second.to_urn(), "3").await;
    assert!(sensor_data_is(gateway, "temp1", "3").await);
    assert_eq!(first_record.last_data().await, "1");

    // The old session's disconnect must not evict the new one.
    disconnect(broker, "temp1", &first.to_urn()).await;
    send_update(broker, "temp1", "temp1", &second.to_urn(), "4").await;
    assert!(sensor_data_is(gateway, "temp1", "4").await);

    disconnect(broker, "temp1", &second.to_urn()).await;
    assert!(eventually(|| async move { gateway.sensor_names().await.is_empty() }).await);
    assert!(gateway.registry().identities().await.is_empty());

    harness.gateway.shutdown().await;
}
