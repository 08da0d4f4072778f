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

//! Seams to the device-facing transports.
//!
//! The gateway never talks to a broker or RPC library directly. Production adapters
//! (an AMQP client, a gRPC channel) and in-memory test doubles implement these
//! traits and are injected into [`DeviceGateway`](crate::DeviceGateway).

use crate::proto::ActuatorState;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Ordered stream of raw message bodies consumed from one destination.
///
/// The stream ends when the broker closes the consumer.
pub type Deliveries = mpsc::Receiver<Vec<u8>>;

/// Broker failures surfaced to the gateway.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BrokerError {
    DestinationUnavailable { destination: String, reason: String },
    PublishFailed { destination: String, reason: String },
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BrokerError::DestinationUnavailable {
                destination,
                reason,
            } => write!(f, "unable to consume from {destination}: {reason}"),
            BrokerError::PublishFailed {
                destination,
                reason,
            } => write!(f, "unable to publish to {destination}: {reason}"),
        }
    }
}

impl Error for BrokerError {}

/// Remote-call failures surfaced to the gateway.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RpcError {
    Unreachable { address: String, reason: String },
    CallFailed(String),
}

impl Display for RpcError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Unreachable { address, reason } => {
                write!(f, "unable to reach {address}: {reason}")
            }
            RpcError::CallFailed(reason) => write!(f, "remote call failed: {reason}"),
        }
    }
}

impl Error for RpcError {}

/// Asynchronous message broker facing the devices.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Declares `destination` if needed and starts consuming it.
    async fn consume(&self, destination: &str) -> Result<Deliveries, BrokerError>;

    /// Publishes one message to a point-to-point destination.
    async fn publish(&self, destination: &str, payload: Vec<u8>) -> Result<(), BrokerError>;

    /// Publishes one message to every queue bound to a fan-out exchange.
    async fn broadcast(&self, exchange: &str, payload: Vec<u8>) -> Result<(), BrokerError>;
}

/// Dials actuator command endpoints.
#[async_trait]
pub trait ActuatorConnector: Send + Sync {
    async fn dial(&self, address: &str) -> Result<Arc<dyn ActuatorClient>, RpcError>;
}

/// Remote-call handle bound to one actuator.
#[async_trait]
pub trait ActuatorClient: Send + Sync {
    /// Asks the actuator to apply `request.state`; the reply carries the state it
    /// actually applied.
    async fn change_state(&self, request: ActuatorState) -> Result<ActuatorState, RpcError>;
}
