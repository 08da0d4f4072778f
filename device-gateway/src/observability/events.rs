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

//! Canonical structured event names used across `device-gateway`.

// Onboarding events.
pub const ONBOARD_REQUEST_RECEIVED: &str = "onboard_request_received";
pub const ONBOARD_REQUEST_MALFORMED: &str = "onboard_request_malformed";
pub const ONBOARD_REPLACE_EXISTING: &str = "onboard_replace_existing";
pub const ONBOARD_SENSOR_OK: &str = "onboard_sensor_ok";
pub const ONBOARD_ACTUATOR_OK: &str = "onboard_actuator_ok";
pub const ONBOARD_FAILED: &str = "onboard_failed";
pub const ONBOARD_RESPONSE_PUBLISH_FAILED: &str = "onboard_response_publish_failed";

// Offboarding events.
pub const OFFBOARD_REQUEST_RECEIVED: &str = "offboard_request_received";
pub const OFFBOARD_REQUEST_MALFORMED: &str = "offboard_request_malformed";
pub const OFFBOARD_UNKNOWN_IDENTITY: &str = "offboard_unknown_identity";
pub const OFFBOARD_STALE_IDENTITY: &str = "offboard_stale_identity";
pub const OFFBOARD_OK: &str = "offboard_ok";

// Registry events.
pub const REGISTRY_RECORD_RETIRED: &str = "registry_record_retired";
pub const REGISTRY_CLEARED: &str = "registry_cleared";

// Ingestion events.
pub const INGEST_TASK_START: &str = "ingest_task_start";
pub const INGEST_TASK_STOP: &str = "ingest_task_stop";
pub const INGEST_UPDATE_APPLIED: &str = "ingest_update_applied";
pub const INGEST_UPDATE_MALFORMED: &str = "ingest_update_malformed";
pub const INGEST_IDENTITY_MISMATCH: &str = "ingest_identity_mismatch";
pub const INGEST_SENSOR_ADOPTED: &str = "ingest_sensor_adopted";
pub const INGEST_UNKNOWN_SENSOR_DROPPED: &str = "ingest_unknown_sensor_dropped";

// Listener loop events.
pub const LISTENER_START: &str = "listener_start";
pub const LISTENER_STOP: &str = "listener_stop";
pub const LISTENER_SOURCE_FAILED: &str = "listener_source_failed";
pub const REGISTRATION_BROADCAST_OK: &str = "registration_broadcast_ok";
pub const REGISTRATION_BROADCAST_FAILED: &str = "registration_broadcast_failed";

// Command dispatch events.
pub const DISPATCH_START: &str = "dispatch_start";
pub const DISPATCH_OK: &str = "dispatch_ok";
pub const DISPATCH_NOT_FOUND: &str = "dispatch_not_found";
pub const DISPATCH_REMOTE_FAILED: &str = "dispatch_remote_failed";
pub const DISPATCH_RETIRED: &str = "dispatch_retired";

// Gateway lifecycle events.
pub const GATEWAY_START: &str = "gateway_start";
pub const GATEWAY_SHUTDOWN: &str = "gateway_shutdown";
