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
use device_gateway::transport::{BrokerError, Deliveries, MessageBroker};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

const CONSUMER_CAPACITY: usize = 1024;

#[derive(Default)]
struct BrokerState {
    consumers: HashMap<String, mpsc::Sender<Vec<u8>>>,
    pending: HashMap<String, VecDeque<Vec<u8>>>,
    broadcasts: Vec<(String, Vec<u8>)>,
    refused: HashSet<String>,
}

/// Point-to-point queues plus a broadcast log, all in process.
///
/// Messages published to a destination nobody consumes stay queued until a consumer
/// attaches or a test drains them with [`InMemoryBroker::take_published`]. A new
/// consumer of a destination replaces (and closes) the previous one.
#[derive(Default)]
pub struct InMemoryBroker {
    state: Mutex<BrokerState>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, BrokerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes `consume(destination)` fail from now on.
    pub fn refuse(&self, destination: &str) {
        self.state().refused.insert(destination.to_string());
    }

    /// Lifts a refusal set with [`InMemoryBroker::refuse`].
    pub fn accept(&self, destination: &str) {
        self.state().refused.remove(destination);
    }

    /// Closes the consumer of `destination`, as a broker connection loss would.
    pub fn close(&self, destination: &str) {
        self.state().consumers.remove(destination);
    }

    pub fn is_consumed(&self, destination: &str) -> bool {
        self.state()
            .consumers
            .get(destination)
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Drains messages queued on a destination without a consumer.
    pub fn take_published(&self, destination: &str) -> Vec<Vec<u8>> {
        self.state()
            .pending
            .remove(destination)
            .map(Vec::from)
            .unwrap_or_default()
    }

    pub fn broadcasts(&self) -> Vec<(String, Vec<u8>)> {
        self.state().broadcasts.clone()
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn consume(&self, destination: &str) -> Result<Deliveries, BrokerError> {
        let mut state = self.state();
        if state.refused.contains(destination) {
            return Err(BrokerError::DestinationUnavailable {
                destination: destination.to_string(),
                reason: "refused by test broker".to_string(),
            });
        }

        let (sender, receiver) = mpsc::channel(CONSUMER_CAPACITY);
        if let Some(pending) = state.pending.remove(destination) {
            for payload in pending {
                let _ = sender.try_send(payload);
            }
        }
        state.consumers.insert(destination.to_string(), sender);
        debug!(destination, "consumer attached");
        Ok(receiver)
    }

    async fn publish(&self, destination: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let consumer = self.state().consumers.get(destination).cloned();
        let payload = match consumer {
            Some(sender) => match sender.send(payload).await {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(payload)) => {
                    let mut state = self.state();
                    if state
                        .consumers
                        .get(destination)
                        .is_some_and(|current| current.same_channel(&sender))
                    {
                        state.consumers.remove(destination);
                    }
                    payload
                }
            },
            None => payload,
        };

        self.state()
            .pending
            .entry(destination.to_string())
            .or_default()
            .push_back(payload);
        Ok(())
    }

    async fn broadcast(&self, exchange: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.state()
            .broadcasts
            .push((exchange.to_string(), payload));
        Ok(())
    }
}
