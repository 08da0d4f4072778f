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

//! Device session lifecycle: admission, removal and the actuator announcement loop.

mod offboarding;
mod onboarding;
mod registration_broadcast;

pub use onboarding::OnboardingError;

pub(crate) use offboarding::Offboarding;
pub(crate) use onboarding::Onboarding;
pub(crate) use registration_broadcast::RegistrationBroadcast;
