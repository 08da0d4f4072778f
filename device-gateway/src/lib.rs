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

//! # device-gateway
//!
//! `device-gateway` bridges sensors and actuators that talk over a message broker and a
//! remote-call channel to in-process consumers.
//!
//! Devices announce themselves on a shared connect destination and get a fresh identity
//! back on `"<name>_id"`. Sensors then stream readings, actuators are dialed and
//! commanded through [`DeviceGateway::change_actuator_state`]. A disconnect carrying the
//! identity ends the session.
//!
//! ```
//! use std::sync::Arc;
//! use device_gateway::{DeviceGateway, GatewayConfig, GatewayError};
//! use device_gateway::proto::ConnectionRequest;
//! use device_gateway::transport::MessageBroker;
//! use integration_test_utils::{
//!     eventually, wait_for_identity, ActuatorBehavior, FakeActuator, FakeActuatorConnector,
//!     InMemoryBroker,
//! };
//! use prost::Message;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let broker = Arc::new(InMemoryBroker::new());
//! let connector = Arc::new(FakeActuatorConnector::new());
//! connector.register("10.0.0.7:50051", FakeActuator::new(ActuatorBehavior::Apply));
//!
//! let gateway = DeviceGateway::new(GatewayConfig::default(), broker.clone(), connector);
//! gateway.start().await.unwrap();
//!
//! broker
//!     .publish(
//!         "connect",
//!         ConnectionRequest::actuator("lamp", "10.0.0.7:50051", "OFF").encode_to_vec(),
//!     )
//!     .await
//!     .unwrap();
//! wait_for_identity(&broker, "lamp").await;
//! let gateway_ref = &gateway;
//! assert!(eventually(|| async move { gateway_ref.actuator_state("lamp").await.is_ok() }).await);
//!
//! assert_eq!(gateway.change_actuator_state("lamp", "ON").await.unwrap(), "ON");
//! assert!(matches!(
//!     gateway.sensor_data("temp1").await,
//!     Err(GatewayError::SensorNotFound(_))
//! ));
//!
//! gateway.shutdown().await;
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`DeviceGateway`] owns the registry and every background loop
//! - Registry: live sensor and actuator records plus the identity projection
//! - Lifecycle: onboarding, offboarding and the actuator registration broadcast
//! - Ingestion: per-sensor update tasks and the shared update listener
//! - Dispatch: actuator state changes requested by consumers
//! - Transport: the broker and remote-call seams implemented by the embedding process
//!
//! Every record carries a retirement token that is a child of the gateway's shutdown
//! token. Offboarding, replacement and shutdown all retire records the same way.
//!
//! ## Observability model
//!
//! Events are emitted with `tracing`, each carrying a canonical `event` name and a
//! `component`. Library code never installs a global subscriber; embedding processes
//! and tests are responsible for one-time `tracing_subscriber` initialization.

pub mod config;
pub use config::{ConfigError, GatewayConfig, IngestionMode};

pub mod dispatch;
pub use dispatch::{CommandDispatcher, DispatchError};

mod gateway;
pub use gateway::{DeviceGateway, GatewayError};

mod ingestion;

mod lifecycle;
pub use lifecycle::OnboardingError;

#[doc(hidden)]
pub mod observability;
pub mod proto;
pub mod registry;
pub mod transport;
