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

//! Removal of devices that announce a disconnect.

use crate::observability::{events, fields};
use crate::proto::DisconnectionRequest;
use crate::registry::{DeviceIdentity, DeviceRegistry, DeviceType};
use crate::transport::Deliveries;
use prost::Message;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "offboarding";

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum OffboardOutcome {
    Removed(DeviceType),
    UnknownIdentity,
    /// The name is now held by a newer session.
    StaleIdentity,
    Malformed,
}

#[derive(Clone)]
pub(crate) struct Offboarding {
    registry: Arc<DeviceRegistry>,
}

impl Offboarding {
    pub(crate) fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Handles every disconnect in its own task until shutdown or source close.
    pub(crate) async fn run(
        self,
        destination: String,
        mut deliveries: Deliveries,
        shutdown: CancellationToken,
    ) {
        let destination = destination.as_str();
        info!(
            event = events::LISTENER_START,
            component = COMPONENT,
            destination,
            "listening for disconnect requests"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!(
                        event = events::LISTENER_STOP,
                        component = COMPONENT,
                        destination,
                        reason = fields::REASON_SHUTDOWN,
                        "stopping disconnect listener"
                    );
                    break;
                }
                body = deliveries.recv() => match body {
                    Some(body) => {
                        self.spawn(body);
                    }
                    None => {
                        info!(
                            event = events::LISTENER_STOP,
                            component = COMPONENT,
                            destination,
                            reason = fields::REASON_SOURCE_CLOSED,
                            "disconnect source closed"
                        );
                        break;
                    }
                },
            }
        }
    }

    pub(crate) fn spawn(&self, body: Vec<u8>) -> JoinHandle<OffboardOutcome> {
        let offboarding = self.clone();
        tokio::spawn(async move { offboarding.handle_message(&body).await })
    }

    pub(crate) async fn handle_message(&self, body: &[u8]) -> OffboardOutcome {
        let request = match DisconnectionRequest::decode(body) {
            Ok(request) => request,
            Err(err) => {
                warn!(
                    event = events::OFFBOARD_REQUEST_MALFORMED,
                    component = COMPONENT,
                    err = %err,
                    "unable to decode disconnect request"
                );
                return OffboardOutcome::Malformed;
            }
        };
        let device_name = request.queue_name.as_str();

        let Some(identity) = DeviceIdentity::parse(&request.id) else {
            warn!(
                event = events::OFFBOARD_REQUEST_MALFORMED,
                component = COMPONENT,
                device_name,
                reported_identity = request.id.as_str(),
                "disconnect request carries no valid identity"
            );
            return OffboardOutcome::Malformed;
        };

        debug!(
            event = events::OFFBOARD_REQUEST_RECEIVED,
            component = COMPONENT,
            device_name,
            identity = %identity,
            "received disconnect request"
        );

        let Some(device_type) = self.registry.type_of(&identity).await else {
            info!(
                event = events::OFFBOARD_UNKNOWN_IDENTITY,
                component = COMPONENT,
                device_name,
                identity = %identity,
                "ignoring disconnect for unregistered identity"
            );
            return OffboardOutcome::UnknownIdentity;
        };

        if !self
            .registry
            .remove_if_identity(device_type, device_name, identity)
            .await
        {
            warn!(
                event = events::OFFBOARD_STALE_IDENTITY,
                component = COMPONENT,
                device_name,
                device_type = fields::format_device_type(device_type),
                identity = %identity,
                "disconnect does not match the live session, ignoring"
            );
            return OffboardOutcome::StaleIdentity;
        }

        info!(
            event = events::OFFBOARD_OK,
            component = COMPONENT,
            device_name,
            device_type = fields::format_device_type(device_type),
            identity = %identity,
            "device offboarded"
        );
        OffboardOutcome::Removed(device_type)
    }
}
