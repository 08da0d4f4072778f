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

use device_gateway::proto::ConnectionResponse;
use device_gateway::registry::DeviceIdentity;
use prost::Message;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::InMemoryBroker;

pub const EVENTUALLY_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Installs a test-writer `tracing` subscriber once per test binary. Honors `RUST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Polls `condition` until it holds or [`EVENTUALLY_TIMEOUT`] elapses.
pub async fn eventually<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + EVENTUALLY_TIMEOUT;
    loop {
        if condition().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Waits for the gateway to publish the identity it assigned to `device_name`, as the
/// device itself would on `"<device_name>_id"`. Returns the latest one.
pub async fn wait_for_identity(broker: &InMemoryBroker, device_name: &str) -> DeviceIdentity {
    let destination = format!("{device_name}_id");
    let deadline = Instant::now() + EVENTUALLY_TIMEOUT;
    loop {
        let identity = broker
            .take_published(&destination)
            .last()
            .and_then(|payload| ConnectionResponse::decode(payload.as_slice()).ok())
            .and_then(|response| DeviceIdentity::parse(&response.id));
        if let Some(identity) = identity {
            return identity;
        }
        assert!(
            Instant::now() < deadline,
            "no identity published for {device_name}"
        );
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
