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

//! Consumer-facing facade owning the registry and every background loop.

use crate::config::GatewayConfig;
use crate::dispatch::{CommandDispatcher, DispatchError};
use crate::ingestion::shared_updates::SharedUpdateListener;
use crate::lifecycle::{Offboarding, Onboarding, RegistrationBroadcast};
use crate::observability::events;
use crate::registry::{DeviceRegistry, DeviceType};
use crate::transport::{ActuatorConnector, BrokerError, Deliveries, MessageBroker};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const COMPONENT: &str = "gateway";

#[derive(Debug)]
pub enum GatewayError {
    SensorNotFound(String),
    ActuatorNotFound(String),
    /// A destination the gateway listens on could not be consumed.
    ListenerUnavailable {
        destination: String,
        source: BrokerError,
    },
    Dispatch(DispatchError),
    /// `start` was already called on this gateway.
    AlreadyStarted,
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::SensorNotFound(name) => write!(f, "no sensor named {name}"),
            GatewayError::ActuatorNotFound(name) => write!(f, "no actuator named {name}"),
            GatewayError::ListenerUnavailable {
                destination,
                source,
            } => write!(f, "unable to listen on {destination}: {source}"),
            GatewayError::Dispatch(err) => write!(f, "{err}"),
            GatewayError::AlreadyStarted => write!(f, "gateway already started"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GatewayError::ListenerUnavailable { source, .. } => Some(source),
            GatewayError::Dispatch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DispatchError> for GatewayError {
    fn from(value: DispatchError) -> Self {
        GatewayError::Dispatch(value)
    }
}

/// Bridges devices on a message broker to in-process consumers.
///
/// Nothing listens until [`DeviceGateway::start`] is called. Dropping the gateway stops
/// every background task it spawned.
pub struct DeviceGateway {
    config: Arc<GatewayConfig>,
    registry: Arc<DeviceRegistry>,
    broker: Arc<dyn MessageBroker>,
    connector: Arc<dyn ActuatorConnector>,
    dispatcher: CommandDispatcher,
    shutdown: CancellationToken,
    started: AtomicBool,
    listeners: Mutex<Vec<JoinHandle<()>>>,
}

impl DeviceGateway {
    pub fn new(
        config: GatewayConfig,
        broker: Arc<dyn MessageBroker>,
        connector: Arc<dyn ActuatorConnector>,
    ) -> Self {
        let registry = Arc::new(DeviceRegistry::new());
        Self {
            config: Arc::new(config),
            dispatcher: CommandDispatcher::new(registry.clone()),
            registry,
            broker,
            connector,
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Opens the connect, disconnect and (when enabled) shared update destinations,
    /// broadcasts the actuator registration request and spawns the listener loops.
    ///
    /// Fails without spawning anything if any destination cannot be consumed; the
    /// gateway may then be started again.
    pub async fn start(&self) -> Result<(), GatewayError> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GatewayError::AlreadyStarted);
        }

        let destinations = &self.config.destinations;
        let sources = async {
            let connect = self.listen(&destinations.connect).await?;
            let disconnect = self.listen(&destinations.disconnect).await?;
            let shared = if self.config.ingestion.mode.shared() {
                Some(self.listen(&destinations.sensor_updates).await?)
            } else {
                None
            };
            Ok::<_, GatewayError>((connect, disconnect, shared))
        };
        let (connect, disconnect, shared) = match sources.await {
            Ok(sources) => sources,
            Err(err) => {
                self.started.store(false, Ordering::Release);
                return Err(err);
            }
        };

        let onboarding = Onboarding::new(
            self.registry.clone(),
            self.broker.clone(),
            self.connector.clone(),
            self.config.clone(),
            self.shutdown.clone(),
        );
        let broadcast = RegistrationBroadcast::new(
            self.broker.clone(),
            &destinations.registration_exchange,
            onboarding,
            self.shutdown.clone(),
        );

        let mut listeners = self.listeners.lock().await;
        listeners.push(tokio::spawn(
            broadcast.run(destinations.connect.clone(), connect),
        ));
        listeners.push(tokio::spawn(Offboarding::new(self.registry.clone()).run(
            destinations.disconnect.clone(),
            disconnect,
            self.shutdown.clone(),
        )));
        if let Some(shared) = shared {
            let listener = SharedUpdateListener::new(
                self.registry.clone(),
                self.config.ingestion.adopt_unknown_sensors,
                self.shutdown.clone(),
            );
            listeners.push(tokio::spawn(
                listener.run(destinations.sensor_updates.clone(), shared),
            ));
        }

        info!(
            event = events::GATEWAY_START,
            component = COMPONENT,
            listeners = listeners.len(),
            "device gateway started"
        );
        Ok(())
    }

    async fn listen(&self, destination: &str) -> Result<Deliveries, GatewayError> {
        self.broker.consume(destination).await.map_err(|source| {
            warn!(
                event = events::LISTENER_SOURCE_FAILED,
                component = COMPONENT,
                destination,
                err = %source,
                "unable to consume destination"
            );
            GatewayError::ListenerUnavailable {
                destination: destination.to_string(),
                source,
            }
        })
    }

    /// Stops every loop and task, retires every record and waits for the listeners to
    /// exit.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let listeners = std::mem::take(&mut *self.listeners.lock().await);
        for listener in listeners {
            if let Err(err) = listener.await {
                warn!(
                    event = events::GATEWAY_SHUTDOWN,
                    component = COMPONENT,
                    err = %err,
                    "listener task ended abnormally"
                );
            }
        }
        let cleared = self.registry.clear().await;

        info!(
            event = events::GATEWAY_SHUTDOWN,
            component = COMPONENT,
            cleared,
            "device gateway stopped"
        );
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub async fn sensor_names(&self) -> BTreeSet<String> {
        self.registry.list_names(DeviceType::Sensor).await
    }

    pub async fn actuator_names(&self) -> BTreeSet<String> {
        self.registry.list_names(DeviceType::Actuator).await
    }

    /// Last reading reported by sensor `name`.
    pub async fn sensor_data(&self, name: &str) -> Result<String, GatewayError> {
        match self.registry.sensor(name).await {
            Some(record) => Ok(record.last_data().await),
            None => Err(GatewayError::SensorNotFound(name.to_string())),
        }
    }

    /// Last state confirmed by actuator `name`.
    pub async fn actuator_state(&self, name: &str) -> Result<String, GatewayError> {
        match self.registry.actuator(name).await {
            Some(record) => Ok(record.last_state().await),
            None => Err(GatewayError::ActuatorNotFound(name.to_string())),
        }
    }

    pub async fn change_actuator_state(
        &self,
        name: &str,
        desired_state: &str,
    ) -> Result<String, GatewayError> {
        Ok(self
            .dispatcher
            .change_actuator_state(name, desired_state)
            .await?)
    }
}

impl Drop for DeviceGateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
