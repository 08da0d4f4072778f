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

mod fake_actuators;
pub use fake_actuators::{ActuatorBehavior, FakeActuator, FakeActuatorConnector};

mod in_memory_broker;
pub use in_memory_broker::InMemoryBroker;

mod integration_test_utils;
pub use integration_test_utils::{eventually, init_logging, wait_for_identity, EVENTUALLY_TIMEOUT};
