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

//! Actuator announcement broadcast and the connect destination listener.

use crate::lifecycle::Onboarding;
use crate::observability::{events, fields};
use crate::transport::{Deliveries, MessageBroker};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const COMPONENT: &str = "registration_broadcast";

/// Solicits actuator announcements, then feeds every connection request arriving on
/// the connect destination into onboarding.
pub(crate) struct RegistrationBroadcast {
    broker: Arc<dyn MessageBroker>,
    exchange: String,
    onboarding: Onboarding,
    shutdown: CancellationToken,
}

impl RegistrationBroadcast {
    pub(crate) fn new(
        broker: Arc<dyn MessageBroker>,
        exchange: &str,
        onboarding: Onboarding,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            broker,
            exchange: exchange.to_string(),
            onboarding,
            shutdown,
        }
    }

    /// `deliveries` must already be consuming the connect destination so that no
    /// announcement triggered by the broadcast is lost.
    pub(crate) async fn run(self, destination: String, mut deliveries: Deliveries) {
        let destination = destination.as_str();
        let exchange = self.exchange.as_str();

        match self.broker.broadcast(exchange, Vec::new()).await {
            Ok(()) => info!(
                event = events::REGISTRATION_BROADCAST_OK,
                component = COMPONENT,
                exchange,
                "asked actuators to announce themselves"
            ),
            Err(err) => warn!(
                event = events::REGISTRATION_BROADCAST_FAILED,
                component = COMPONENT,
                exchange,
                err = %err,
                "registration broadcast failed, only self-announcing devices will connect"
            ),
        }

        info!(
            event = events::LISTENER_START,
            component = COMPONENT,
            destination,
            "listening for connection requests"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!(
                        event = events::LISTENER_STOP,
                        component = COMPONENT,
                        destination,
                        reason = fields::REASON_SHUTDOWN,
                        "stopping connection listener"
                    );
                    break;
                }
                body = deliveries.recv() => match body {
                    Some(body) => {
                        self.onboarding.spawn(body);
                    }
                    None => {
                        info!(
                            event = events::LISTENER_STOP,
                            component = COMPONENT,
                            destination,
                            reason = fields::REASON_SOURCE_CLOSED,
                            "connect source closed"
                        );
                        break;
                    }
                },
            }
        }
    }
}
