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

//! Admission of devices announced on the connect destination.

use crate::config::GatewayConfig;
use crate::ingestion::sensor_task::SensorUpdateTask;
use crate::observability::{events, fields};
use crate::proto::{ConnectionRequest, ConnectionResponse};
use crate::registry::{
    ActuatorRecord, DeviceIdentity, DeviceRegistry, DeviceType, RegistryError, SensorRecord,
};
use crate::transport::{ActuatorConnector, BrokerError, MessageBroker, RpcError};
use prost::Message;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPONENT: &str = "onboarding";

/// Why a single device could not be admitted. Never fatal to the gateway.
#[derive(Debug)]
pub enum OnboardingError {
    Malformed {
        reason: &'static str,
    },
    MissingAddress {
        device_name: String,
    },
    DialFailed {
        device_name: String,
        source: RpcError,
    },
    SourceUnavailable {
        device_name: String,
        source: BrokerError,
    },
    ResponseNotDelivered {
        device_name: String,
        source: BrokerError,
    },
    /// The gateway shut down while the device was being admitted.
    Rejected(RegistryError),
}

impl Display for OnboardingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OnboardingError::Malformed { reason } => {
                write!(f, "malformed connection request: {reason}")
            }
            OnboardingError::MissingAddress { device_name } => {
                write!(f, "actuator {device_name} did not declare an address")
            }
            OnboardingError::DialFailed {
                device_name,
                source,
            } => write!(f, "unable to dial actuator {device_name}: {source}"),
            OnboardingError::SourceUnavailable {
                device_name,
                source,
            } => write!(
                f,
                "unable to open update source for sensor {device_name}: {source}"
            ),
            OnboardingError::ResponseNotDelivered {
                device_name,
                source,
            } => write!(
                f,
                "unable to deliver identity to sensor {device_name}: {source}"
            ),
            OnboardingError::Rejected(err) => write!(f, "device not registered: {err}"),
        }
    }
}

impl Error for OnboardingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OnboardingError::Malformed { .. } | OnboardingError::MissingAddress { .. } => None,
            OnboardingError::DialFailed { source, .. } => Some(source),
            OnboardingError::SourceUnavailable { source, .. }
            | OnboardingError::ResponseNotDelivered { source, .. } => Some(source),
            OnboardingError::Rejected(err) => Some(err),
        }
    }
}

/// Handles connection requests. Cheap to clone; each request runs in its own task.
#[derive(Clone)]
pub(crate) struct Onboarding {
    registry: Arc<DeviceRegistry>,
    broker: Arc<dyn MessageBroker>,
    connector: Arc<dyn ActuatorConnector>,
    config: Arc<GatewayConfig>,
    shutdown: CancellationToken,
}

impl Onboarding {
    pub(crate) fn new(
        registry: Arc<DeviceRegistry>,
        broker: Arc<dyn MessageBroker>,
        connector: Arc<dyn ActuatorConnector>,
        config: Arc<GatewayConfig>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            broker,
            connector,
            config,
            shutdown,
        }
    }

    pub(crate) fn spawn(&self, body: Vec<u8>) -> JoinHandle<()> {
        let onboarding = self.clone();
        tokio::spawn(async move { onboarding.handle_message(&body).await })
    }

    pub(crate) async fn handle_message(&self, body: &[u8]) {
        let request = match ConnectionRequest::decode(body) {
            Ok(request) => request,
            Err(err) => {
                warn!(
                    event = events::ONBOARD_REQUEST_MALFORMED,
                    component = COMPONENT,
                    err = %err,
                    "unable to decode connection request"
                );
                return;
            }
        };

        debug!(
            event = events::ONBOARD_REQUEST_RECEIVED,
            component = COMPONENT,
            device_name = request.queue_name.as_str(),
            declared_type = request.r#type,
            "received connection request"
        );

        match self.onboard(request).await {
            Ok(_) => {}
            Err(err @ OnboardingError::Malformed { .. }) => {
                warn!(
                    event = events::ONBOARD_REQUEST_MALFORMED,
                    component = COMPONENT,
                    err = %err,
                    "dropping connection request"
                );
            }
            Err(err) => {
                warn!(
                    event = events::ONBOARD_FAILED,
                    component = COMPONENT,
                    err = %err,
                    "device admission failed"
                );
            }
        }
    }

    /// Admits one device and returns the identity assigned to it.
    pub(crate) async fn onboard(
        &self,
        request: ConnectionRequest,
    ) -> Result<DeviceIdentity, OnboardingError> {
        if request.queue_name.is_empty() {
            return Err(OnboardingError::Malformed {
                reason: "missing device name",
            });
        }

        match DeviceType::try_from(request.device_type()) {
            Ok(DeviceType::Sensor) => self.onboard_sensor(request).await,
            Ok(DeviceType::Actuator) => self.onboard_actuator(request).await,
            Err(_) => Err(OnboardingError::Malformed {
                reason: "unspecified device type",
            }),
        }
    }

    async fn onboard_sensor(
        &self,
        request: ConnectionRequest,
    ) -> Result<DeviceIdentity, OnboardingError> {
        let device_name = request.queue_name.as_str();

        let deliveries = if self.config.ingestion.mode.per_sensor() {
            let deliveries = self.broker.consume(device_name).await.map_err(|source| {
                OnboardingError::SourceUnavailable {
                    device_name: device_name.to_string(),
                    source,
                }
            })?;
            Some(deliveries)
        } else {
            None
        };

        let identity = DeviceIdentity::generate();
        self.send_identity(device_name, identity)
            .await
            .map_err(|source| OnboardingError::ResponseNotDelivered {
                device_name: device_name.to_string(),
                source,
            })?;

        let record = Arc::new(SensorRecord::new(
            identity,
            device_name,
            &request.initial_data,
            self.shutdown.child_token(),
        ));
        let replaced = self
            .registry
            .upsert_sensor(record.clone())
            .await
            .map_err(OnboardingError::Rejected)?;
        if let Some(previous) = replaced {
            self.warn_replaced(DeviceType::Sensor, device_name, previous.identity());
        }
        if let Some(deliveries) = deliveries {
            SensorUpdateTask::spawn(record, deliveries);
        }

        info!(
            event = events::ONBOARD_SENSOR_OK,
            component = COMPONENT,
            device_name,
            device_type = fields::format_device_type(DeviceType::Sensor),
            identity = %identity,
            "sensor onboarded"
        );
        Ok(identity)
    }

    async fn onboard_actuator(
        &self,
        request: ConnectionRequest,
    ) -> Result<DeviceIdentity, OnboardingError> {
        let device_name = request.queue_name.as_str();
        let address = match request.address.as_deref().map(str::trim) {
            Some(address) if !address.is_empty() => address,
            _ => {
                return Err(OnboardingError::MissingAddress {
                    device_name: device_name.to_string(),
                })
            }
        };

        let client = self.connector.dial(address).await.map_err(|source| {
            OnboardingError::DialFailed {
                device_name: device_name.to_string(),
                source,
            }
        })?;

        let identity = DeviceIdentity::generate();
        let record = Arc::new(ActuatorRecord::new(
            identity,
            device_name,
            address,
            client,
            &request.initial_data,
            self.shutdown.child_token(),
        ));
        let replaced = self
            .registry
            .upsert_actuator(record)
            .await
            .map_err(OnboardingError::Rejected)?;
        if let Some(previous) = replaced {
            self.warn_replaced(DeviceType::Actuator, device_name, previous.identity());
        }

        if let Err(err) = self.send_identity(device_name, identity).await {
            warn!(
                event = events::ONBOARD_RESPONSE_PUBLISH_FAILED,
                component = COMPONENT,
                device_name,
                identity = %identity,
                err = %err,
                "actuator admitted without identity reply"
            );
        }

        info!(
            event = events::ONBOARD_ACTUATOR_OK,
            component = COMPONENT,
            device_name,
            device_type = fields::format_device_type(DeviceType::Actuator),
            identity = %identity,
            address,
            "actuator onboarded"
        );
        Ok(identity)
    }

    async fn send_identity(
        &self,
        device_name: &str,
        identity: DeviceIdentity,
    ) -> Result<(), BrokerError> {
        let response = ConnectionResponse {
            id: identity.to_urn(),
        };
        self.broker
            .publish(
                &self.config.reply_destination(device_name),
                response.encode_to_vec(),
            )
            .await
    }

    fn warn_replaced(&self, device_type: DeviceType, device_name: &str, previous: DeviceIdentity) {
        warn!(
            event = events::ONBOARD_REPLACE_EXISTING,
            component = COMPONENT,
            device_name,
            device_type = fields::format_device_type(device_type),
            identity = %previous,
            "device re-onboarded, replaced live record"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{Onboarding, OnboardingError};
    use crate::config::{GatewayConfig, IngestionMode};
    use crate::proto::{ActuatorState, ConnectionRequest, ConnectionResponse, SensorDataUpdate};
    use crate::registry::{DeviceIdentity, DeviceRegistry, DeviceType};
    use crate::transport::{
        ActuatorClient, ActuatorConnector, BrokerError, Deliveries, MessageBroker, RpcError,
    };
    use async_trait::async_trait;
    use prost::Message;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct RecordingBroker {
        sources: Mutex<HashMap<String, mpsc::Sender<Vec<u8>>>>,
        published: Mutex<Vec<(String, Vec<u8>)>>,
        fail_consume: bool,
        fail_publish: bool,
    }

    impl RecordingBroker {
        fn source(&self, destination: &str) -> mpsc::Sender<Vec<u8>> {
            self.sources
                .lock()
                .expect("sources lock")
                .get(destination)
                .cloned()
                .expect("destination consumed")
        }

        fn published_to(&self, destination: &str) -> Vec<Vec<u8>> {
            self.published
                .lock()
                .expect("published lock")
                .iter()
                .filter(|(to, _)| to == destination)
                .map(|(_, payload)| payload.clone())
                .collect()
        }
    }

    #[async_trait]
    impl MessageBroker for RecordingBroker {
        async fn consume(&self, destination: &str) -> Result<Deliveries, BrokerError> {
            if self.fail_consume {
                return Err(BrokerError::DestinationUnavailable {
                    destination: destination.to_string(),
                    reason: "refused".to_string(),
                });
            }
            let (sender, receiver) = mpsc::channel(16);
            self.sources
                .lock()
                .expect("sources lock")
                .insert(destination.to_string(), sender);
            Ok(receiver)
        }

        async fn publish(&self, destination: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
            if self.fail_publish {
                return Err(BrokerError::PublishFailed {
                    destination: destination.to_string(),
                    reason: "refused".to_string(),
                });
            }
            self.published
                .lock()
                .expect("published lock")
                .push((destination.to_string(), payload));
            Ok(())
        }

        async fn broadcast(&self, _exchange: &str, _payload: Vec<u8>) -> Result<(), BrokerError> {
            Ok(())
        }
    }

    struct EchoActuator;

    #[async_trait]
    impl ActuatorClient for EchoActuator {
        async fn change_state(&self, request: ActuatorState) -> Result<ActuatorState, RpcError> {
            Ok(request)
        }
    }

    #[derive(Default)]
    struct CountingConnector {
        dials: AtomicUsize,
    }

    #[async_trait]
    impl ActuatorConnector for CountingConnector {
        async fn dial(&self, address: &str) -> Result<Arc<dyn ActuatorClient>, RpcError> {
            self.dials.fetch_add(1, Ordering::Relaxed);
            if address.starts_with("unreachable") {
                return Err(RpcError::Unreachable {
                    address: address.to_string(),
                    reason: "connection refused".to_string(),
                });
            }
            Ok(Arc::new(EchoActuator))
        }
    }

    struct Fixture {
        registry: Arc<DeviceRegistry>,
        broker: Arc<RecordingBroker>,
        connector: Arc<CountingConnector>,
        onboarding: Onboarding,
    }

    fn fixture_with(broker: RecordingBroker, config: GatewayConfig) -> Fixture {
        fixture_under(broker, config, CancellationToken::new())
    }

    fn fixture_under(
        broker: RecordingBroker,
        config: GatewayConfig,
        shutdown: CancellationToken,
    ) -> Fixture {
        let registry = Arc::new(DeviceRegistry::new());
        let broker = Arc::new(broker);
        let connector = Arc::new(CountingConnector::default());
        let onboarding = Onboarding::new(
            registry.clone(),
            broker.clone(),
            connector.clone(),
            Arc::new(config),
            shutdown,
        );
        Fixture {
            registry,
            broker,
            connector,
            onboarding,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingBroker::default(), GatewayConfig::default())
    }

    fn assigned_identity(payload: &[u8]) -> DeviceIdentity {
        let response = ConnectionResponse::decode(payload).expect("valid connection response");
        DeviceIdentity::parse(&response.id).expect("identity on the wire")
    }

    #[tokio::test]
    async fn sensor_gets_identity_record_and_update_task() {
        let fixture = fixture();

        let identity = fixture
            .onboarding
            .onboard(ConnectionRequest::sensor("temp1", "20.5"))
            .await
            .expect("sensor admitted");

        let replies = fixture.broker.published_to("temp1_id");
        assert_eq!(replies.len(), 1);
        assert_eq!(assigned_identity(&replies[0]), identity);

        let record = fixture.registry.sensor("temp1").await.expect("registered");
        assert_eq!(record.identity(), identity);
        assert_eq!(record.last_data().await, "20.5");
        assert_eq!(
            fixture.registry.type_of(&identity).await,
            Some(DeviceType::Sensor)
        );

        let update = SensorDataUpdate {
            queue_name: "temp1".to_string(),
            id: identity.to_urn(),
            data: "21.0".to_string(),
        };
        fixture
            .broker
            .source("temp1")
            .send(update.encode_to_vec())
            .await
            .expect("task is listening");

        for _ in 0..100 {
            if record.last_data().await == "21.0" {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("update task never applied the reading");
    }

    #[tokio::test]
    async fn shared_only_mode_skips_private_source() {
        let mut config = GatewayConfig::default();
        config.ingestion.mode = IngestionMode::Shared;
        let fixture = fixture_with(RecordingBroker::default(), config);

        fixture
            .onboarding
            .onboard(ConnectionRequest::sensor("temp1", ""))
            .await
            .expect("sensor admitted");

        assert!(fixture.broker.sources.lock().expect("sources lock").is_empty());
        assert!(fixture.registry.sensor("temp1").await.is_some());
    }

    #[tokio::test]
    async fn sensor_admission_fails_without_source_or_reply() {
        let no_source = fixture_with(
            RecordingBroker {
                fail_consume: true,
                ..Default::default()
            },
            GatewayConfig::default(),
        );
        let err = no_source
            .onboarding
            .onboard(ConnectionRequest::sensor("temp1", ""))
            .await
            .expect_err("source refused");
        assert!(matches!(err, OnboardingError::SourceUnavailable { .. }));
        assert_eq!(no_source.registry.len(DeviceType::Sensor).await, 0);

        let no_reply = fixture_with(
            RecordingBroker {
                fail_publish: true,
                ..Default::default()
            },
            GatewayConfig::default(),
        );
        let err = no_reply
            .onboarding
            .onboard(ConnectionRequest::sensor("temp1", ""))
            .await
            .expect_err("reply refused");
        assert!(matches!(err, OnboardingError::ResponseNotDelivered { .. }));
        assert!(no_reply.registry.identities().await.is_empty());
    }

    #[tokio::test]
    async fn actuator_is_dialed_and_registered() {
        let fixture = fixture();

        let identity = fixture
            .onboarding
            .onboard(ConnectionRequest::actuator("lamp", "10.0.0.7:50051", "OFF"))
            .await
            .expect("actuator admitted");

        let record = fixture.registry.actuator("lamp").await.expect("registered");
        assert_eq!(record.identity(), identity);
        assert_eq!(record.address(), "10.0.0.7:50051");
        assert_eq!(record.last_state().await, "OFF");
        assert_eq!(fixture.connector.dials.load(Ordering::Relaxed), 1);
        assert_eq!(
            assigned_identity(&fixture.broker.published_to("lamp_id")[0]),
            identity
        );
    }

    #[tokio::test]
    async fn actuator_admission_survives_missing_reply_destination() {
        let fixture = fixture_with(
            RecordingBroker {
                fail_publish: true,
                ..Default::default()
            },
            GatewayConfig::default(),
        );

        fixture
            .onboarding
            .onboard(ConnectionRequest::actuator("lamp", "10.0.0.7:50051", "OFF"))
            .await
            .expect("actuator admitted");

        assert!(fixture.registry.actuator("lamp").await.is_some());
    }

    #[tokio::test]
    async fn actuator_without_usable_address_is_not_admitted() {
        let fixture = fixture();

        let mut missing = ConnectionRequest::actuator("lamp", "", "OFF");
        missing.address = None;
        let err = fixture.onboarding.onboard(missing).await.expect_err("no address");
        assert!(matches!(err, OnboardingError::MissingAddress { .. }));

        let err = fixture
            .onboarding
            .onboard(ConnectionRequest::actuator("lamp", "  ", "OFF"))
            .await
            .expect_err("blank address");
        assert!(matches!(err, OnboardingError::MissingAddress { .. }));
        assert_eq!(fixture.connector.dials.load(Ordering::Relaxed), 0);

        let err = fixture
            .onboarding
            .onboard(ConnectionRequest::actuator("lamp", "unreachable:1", "OFF"))
            .await
            .expect_err("dial refused");
        assert!(matches!(err, OnboardingError::DialFailed { .. }));
        assert!(fixture.registry.actuator("lamp").await.is_none());
    }

    #[tokio::test]
    async fn reonboarding_replaces_and_retires_previous_record() {
        let fixture = fixture();

        let first = fixture
            .onboarding
            .onboard(ConnectionRequest::sensor("temp1", "1"))
            .await
            .expect("first admission");
        let old_record = fixture.registry.sensor("temp1").await.expect("registered");
        let second = fixture
            .onboarding
            .onboard(ConnectionRequest::sensor("temp1", "2"))
            .await
            .expect("second admission");

        assert_ne!(first, second);
        assert!(old_record.is_retired());
        assert_eq!(fixture.registry.type_of(&first).await, None);
        assert_eq!(
            fixture.registry.type_of(&second).await,
            Some(DeviceType::Sensor)
        );
        assert_eq!(fixture.registry.len(DeviceType::Sensor).await, 1);
    }

    #[tokio::test]
    async fn malformed_requests_are_rejected() {
        let fixture = fixture();

        let err = fixture
            .onboarding
            .onboard(ConnectionRequest::sensor("", "1"))
            .await
            .expect_err("nameless");
        assert!(matches!(err, OnboardingError::Malformed { .. }));

        let unspecified = ConnectionRequest {
            queue_name: "temp1".to_string(),
            ..Default::default()
        };
        let err = fixture
            .onboarding
            .onboard(unspecified)
            .await
            .expect_err("untyped");
        assert!(matches!(err, OnboardingError::Malformed { .. }));

        fixture.onboarding.handle_message(&[0xff, 0xff]).await;
        assert!(fixture.registry.identities().await.is_empty());
        assert!(fixture.broker.published.lock().expect("published lock").is_empty());
    }

    #[tokio::test]
    async fn nothing_is_admitted_after_shutdown() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        let fixture = fixture_under(RecordingBroker::default(), GatewayConfig::default(), shutdown);

        let err = fixture
            .onboarding
            .onboard(ConnectionRequest::sensor("temp1", "1"))
            .await
            .expect_err("gateway stopped");
        assert!(matches!(err, OnboardingError::Rejected(_)));

        let err = fixture
            .onboarding
            .onboard(ConnectionRequest::actuator("lamp", "10.0.0.7:50051", "OFF"))
            .await
            .expect_err("gateway stopped");
        assert!(matches!(err, OnboardingError::Rejected(_)));

        assert!(fixture.registry.identities().await.is_empty());
        assert_eq!(fixture.registry.len(DeviceType::Sensor).await, 0);
        assert_eq!(fixture.registry.len(DeviceType::Actuator).await, 0);
    }
}
