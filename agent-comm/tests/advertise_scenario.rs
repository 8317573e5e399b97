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

mod support;

use agent_comm::{AdvertiseEvent, CommError, CommObject, CoreType};
use integration_test_utils::{assert_silent_for, next_within, DEFAULT_WAIT};
use loopback_transport::LoopbackBroker;
use std::sync::Arc;
use std::time::Duration;
use support::{await_loopback_subscription, make_manager, start_ok};

#[tokio::test(flavor = "multi_thread")]
async fn advertise_observers_only_see_their_core_type() {
    integration_test_utils::init_logging();

    let broker = LoopbackBroker::new();
    let watcher_client = broker.client();
    let watcher = make_manager(Arc::new(watcher_client.clone()), "watcher");
    let publisher = make_manager(Arc::new(broker.client()), "publisher");
    start_ok(&watcher).await;
    start_ok(&publisher).await;

    let mut logs = watcher
        .observe_advertise_with_core_type(CoreType::Log)
        .unwrap()
        .attach()
        .unwrap();
    let mut tasks = watcher
        .observe_advertise_with_core_type(CoreType::Task)
        .unwrap()
        .attach()
        .unwrap();
    await_loopback_subscription(&watcher_client, "ADV:Log/").await;
    await_loopback_subscription(&watcher_client, "ADV:Task/").await;

    let entry = CommObject::new(CoreType::Log, "boiler-pressure-high");
    publisher
        .publish_advertise(AdvertiseEvent::new(entry.clone()))
        .unwrap();

    let advertised = next_within(&mut logs, DEFAULT_WAIT)
        .await
        .expect("log advertise should arrive");
    assert_eq!(advertised.data.object, entry);
    assert_eq!(advertised.source_id, publisher.identity().object_id);
    assert_eq!(advertised.event_type_filter.as_deref(), Some("Log"));
    assert_silent_for(&mut tasks, Duration::from_millis(50)).await;
    assert_silent_for(&mut logs, Duration::from_millis(20)).await;

    publisher.stop().await.unwrap();
    watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn custom_object_types_reach_both_core_and_object_type_observers() {
    integration_test_utils::init_logging();

    let broker = LoopbackBroker::new();
    let watcher_client = broker.client();
    let watcher = make_manager(Arc::new(watcher_client.clone()), "watcher");
    let publisher = make_manager(Arc::new(broker.client()), "publisher");
    start_ok(&watcher).await;
    start_ok(&publisher).await;

    let mut by_core = watcher
        .observe_advertise_with_core_type(CoreType::Object)
        .unwrap()
        .attach()
        .unwrap();
    let mut by_type = watcher
        .observe_advertise_with_object_type("com.example.Sensor")
        .unwrap()
        .attach()
        .unwrap();
    await_loopback_subscription(&watcher_client, "ADV:Object/").await;
    await_loopback_subscription(&watcher_client, "ADV::com.example.Sensor/").await;

    let sensor = CommObject::with_object_type(CoreType::Object, "com.example.Sensor", "probe");
    publisher
        .publish_advertise(AdvertiseEvent::new(sensor.clone()))
        .unwrap();

    let core = next_within(&mut by_core, DEFAULT_WAIT).await.expect("core advertise");
    let typed = next_within(&mut by_type, DEFAULT_WAIT).await.expect("typed advertise");
    assert_eq!(core.data.object.object_id, sensor.object_id);
    assert_eq!(typed.data.object.object_id, sensor.object_id);
    assert_silent_for(&mut by_core, Duration::from_millis(30)).await;
    assert_silent_for(&mut by_type, Duration::from_millis(30)).await;

    publisher.stop().await.unwrap();
    watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn observing_an_invalid_object_type_fails_synchronously() {
    integration_test_utils::init_logging();

    let broker = LoopbackBroker::new();
    let watcher = make_manager(Arc::new(broker.client()), "watcher");
    for object_type in ["a/b", "sensor#", ""] {
        assert!(matches!(
            watcher.observe_advertise_with_object_type(object_type),
            Err(CommError::InvalidArgument(_))
        ));
    }
}
