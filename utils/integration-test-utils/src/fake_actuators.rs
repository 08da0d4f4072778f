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

use async_trait::async_trait;
use device_gateway::proto::ActuatorState;
use device_gateway::transport::{ActuatorClient, ActuatorConnector, RpcError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// How a [`FakeActuator`] answers `change_state`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActuatorBehavior {
    /// Echo the requested state back as applied.
    Apply,
    Fail,
    /// Never answer.
    Hang,
}

/// Scriptable actuator command endpoint that records every call it receives.
pub struct FakeActuator {
    behavior: Mutex<ActuatorBehavior>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ActuatorState>>,
    called: Notify,
}

impl FakeActuator {
    pub fn new(behavior: ActuatorBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            called: Notify::new(),
        })
    }

    pub fn set_behavior(&self, behavior: ActuatorBehavior) {
        *self
            .behavior
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = behavior;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ActuatorState> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Resolves once the next call reaches this actuator.
    pub async fn called(&self) {
        self.called.notified().await;
    }
}

#[async_trait]
impl ActuatorClient for FakeActuator {
    async fn change_state(&self, request: ActuatorState) -> Result<ActuatorState, RpcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        let behavior = *self
            .behavior
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.called.notify_one();

        match behavior {
            ActuatorBehavior::Apply => Ok(request),
            ActuatorBehavior::Fail => Err(RpcError::CallFailed(format!(
                "actuator refused state {}",
                request.state
            ))),
            ActuatorBehavior::Hang => std::future::pending().await,
        }
    }
}

/// Resolves addresses to registered [`FakeActuator`]s; anything else is unreachable.
#[derive(Default)]
pub struct FakeActuatorConnector {
    actuators: Mutex<HashMap<String, Arc<FakeActuator>>>,
    dials: AtomicUsize,
}

impl FakeActuatorConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, address: &str, actuator: Arc<FakeActuator>) {
        self.actuators
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(address.to_string(), actuator);
    }

    pub fn dial_count(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActuatorConnector for FakeActuatorConnector {
    async fn dial(&self, address: &str) -> Result<Arc<dyn ActuatorClient>, RpcError> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let actuator = self
            .actuators
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(address)
            .cloned();

        match actuator {
            Some(actuator) => Ok(actuator),
            None => Err(RpcError::Unreachable {
                address: address.to_string(),
                reason: "no actuator listening".to_string(),
            }),
        }
    }
}
