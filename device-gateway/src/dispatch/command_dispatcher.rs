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

use crate::observability::events;
use crate::proto::ActuatorState;
use crate::registry::DeviceRegistry;
use crate::transport::RpcError;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tracing::{debug, info, warn};

const COMPONENT: &str = "command_dispatcher";

#[derive(Debug)]
pub enum DispatchError {
    /// No live actuator carries the name. No remote call was made.
    NotFound(String),
    /// The actuator rejected the call or could not be reached.
    Remote { name: String, source: RpcError },
    /// The actuator was offboarded or replaced while the call was in flight.
    Retired(String),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound(name) => write!(f, "no actuator named {name}"),
            DispatchError::Remote { name, source } => {
                write!(f, "actuator {name} did not apply the state: {source}")
            }
            DispatchError::Retired(name) => {
                write!(f, "actuator {name} disconnected before the call completed")
            }
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DispatchError::Remote { source, .. } => Some(source),
            DispatchError::NotFound(_) | DispatchError::Retired(_) => None,
        }
    }
}

/// Sends desired states to actuators and caches what they confirm.
#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<DeviceRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self { registry }
    }

    /// Asks actuator `name` to switch to `desired_state` and returns the state it
    /// reports back.
    ///
    /// The cached state is only overwritten on success, and never once the record has
    /// been retired. No timeout is applied to the remote call.
    pub async fn change_actuator_state(
        &self,
        name: &str,
        desired_state: &str,
    ) -> Result<String, DispatchError> {
        let Some(record) = self.registry.actuator(name).await else {
            debug!(
                event = events::DISPATCH_NOT_FOUND,
                component = COMPONENT,
                device_name = name,
                "no live actuator with this name"
            );
            return Err(DispatchError::NotFound(name.to_string()));
        };

        let identity = record.identity();
        debug!(
            event = events::DISPATCH_START,
            component = COMPONENT,
            device_name = name,
            identity = %identity,
            desired_state,
            "changing actuator state"
        );

        let request = ActuatorState {
            id: identity.to_urn(),
            state: desired_state.to_string(),
        };
        let client = record.client();
        let reply = tokio::select! {
            biased;
            _ = record.retired() => None,
            reply = client.change_state(request) => Some(reply),
        };

        let reply = match reply {
            Some(Ok(reply)) => reply,
            Some(Err(source)) => {
                warn!(
                    event = events::DISPATCH_REMOTE_FAILED,
                    component = COMPONENT,
                    device_name = name,
                    identity = %identity,
                    err = %source,
                    "actuator call failed, cached state unchanged"
                );
                return Err(DispatchError::Remote {
                    name: name.to_string(),
                    source,
                });
            }
            None => return Err(self.retired_error(name)),
        };

        let mut last_state = record.last_state.write().await;
        if record.is_retired() {
            drop(last_state);
            return Err(self.retired_error(name));
        }
        *last_state = reply.state.clone();
        drop(last_state);

        info!(
            event = events::DISPATCH_OK,
            component = COMPONENT,
            device_name = name,
            identity = %identity,
            state = reply.state.as_str(),
            "actuator state changed"
        );
        Ok(reply.state)
    }

    fn retired_error(&self, name: &str) -> DispatchError {
        warn!(
            event = events::DISPATCH_RETIRED,
            component = COMPONENT,
            device_name = name,
            "actuator retired during call, reply discarded"
        );
        DispatchError::Retired(name.to_string())
    }
}
