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

use agent_comm::{CommError, CoreType, OperatingState};
use integration_test_utils::{
    next_within, wait_until, RecordedCall, RecordingTransport, DEFAULT_WAIT,
};
use loopback_transport::LoopbackBroker;
use std::sync::Arc;
use support::{await_loopback_subscription, make_manager, start_ok, NAMESPACE};
use tokio_stream::StreamExt;

#[tokio::test(flavor = "multi_thread")]
async fn identity_is_advertised_online_and_deadvertised_on_stop() {
    integration_test_utils::init_logging();

    let broker = LoopbackBroker::new();
    let watcher_client = broker.client();
    let watcher = make_manager(Arc::new(watcher_client.clone()), "watcher");
    start_ok(&watcher).await;

    let mut identities = watcher
        .observe_advertise_with_core_type(CoreType::Identity)
        .unwrap()
        .attach()
        .unwrap();
    let mut departures = watcher.observe_deadvertise().unwrap().attach().unwrap();
    await_loopback_subscription(&watcher_client, "ADV:Identity/").await;
    await_loopback_subscription(&watcher_client, "/DAD/").await;

    let agent = make_manager(Arc::new(broker.client()), "short-lived");
    start_ok(&agent).await;
    let agent_id = agent.identity().object_id;

    // The watcher may also see its own identity, depending on subscription timing.
    let advertised = loop {
        let event = next_within(&mut identities, DEFAULT_WAIT)
            .await
            .expect("identity should be advertised");
        if event.source_id == agent_id {
            break event;
        }
    };
    assert_eq!(advertised.data.object.object_id, agent_id);
    assert_eq!(advertised.data.object.name, "short-lived");

    agent.stop().await.unwrap();
    let departed = next_within(&mut departures, DEFAULT_WAIT)
        .await
        .expect("graceful stop should deadvertise");
    assert_eq!(departed.data.object_ids, vec![agent_id]);

    watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn last_will_deadvertises_after_connection_loss() {
    integration_test_utils::init_logging();

    let broker = LoopbackBroker::new();
    let watcher_client = broker.client();
    let watcher = make_manager(Arc::new(watcher_client.clone()), "watcher");
    start_ok(&watcher).await;
    let mut departures = watcher.observe_deadvertise().unwrap().attach().unwrap();
    await_loopback_subscription(&watcher_client, "/DAD/").await;

    let doomed_client = broker.client();
    let doomed = make_manager(Arc::new(doomed_client.clone()), "doomed");
    start_ok(&doomed).await;
    doomed_client.interrupt();

    let departed = next_within(&mut departures, DEFAULT_WAIT)
        .await
        .expect("last will should be delivered");
    assert_eq!(departed.data.object_ids, vec![doomed.identity().object_id]);
    assert_eq!(departed.source_id, doomed.identity().object_id);

    doomed.stop().await.unwrap();
    watcher.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn start_registers_the_last_will_and_stop_is_idempotent() {
    integration_test_utils::init_logging();

    let transport = Arc::new(RecordingTransport::new());
    let manager = make_manager(transport.clone(), "will-writer");
    let mut states = manager.observe_operating_state();
    assert_eq!(states.next().await, Some(OperatingState::Stopped));

    start_ok(&manager).await;
    start_ok(&manager).await;
    let identity_id = manager.identity().object_id;
    let connects: Vec<RecordedCall> = transport
        .calls()
        .into_iter()
        .filter(|call| matches!(call, RecordedCall::Connect(_)))
        .collect();
    assert_eq!(connects.len(), 1);
    let RecordedCall::Connect(Some(will)) = &connects[0] else {
        panic!("connect should carry a last will");
    };
    assert_eq!(will.topic, format!("v1/{NAMESPACE}/DAD/{identity_id}"));
    let advertise = format!("v1/{NAMESPACE}/ADV:Identity/{identity_id}");
    assert!(
        wait_until(DEFAULT_WAIT, || transport
            .published_topics()
            .contains(&advertise))
        .await
    );

    manager.stop().await.unwrap();
    manager.stop().await.unwrap();
    assert_eq!(manager.operating_state(), OperatingState::Stopped);
    assert_eq!(transport.count(|call| matches!(call, RecordedCall::Disconnect)), 1);

    // The graceful deadvertise is handed to the transport before the disconnect.
    let calls = transport.calls();
    let deadvertise = calls
        .iter()
        .position(|call| matches!(call, RecordedCall::Publish(topic, _) if topic == &will.topic));
    let disconnect = calls
        .iter()
        .position(|call| matches!(call, RecordedCall::Disconnect));
    assert!(deadvertise.is_some());
    assert!(deadvertise < disconnect);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_connects_leave_the_manager_stopped_and_restartable() {
    integration_test_utils::init_logging();

    let transport = Arc::new(RecordingTransport::new());
    transport.fail_connect(true);
    let manager = make_manager(transport.clone(), "flaky");

    assert!(matches!(manager.start().await, Err(CommError::Transport(_))));
    assert_eq!(manager.operating_state(), OperatingState::Stopped);

    transport.fail_connect(false);
    start_ok(&manager).await;
    assert!(
        wait_until(DEFAULT_WAIT, || transport
            .count(|call| matches!(call, RecordedCall::Subscribe(_)))
            > 0)
        .await
    );
    manager.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn managers_restart_after_a_stop() {
    integration_test_utils::init_logging();

    let broker = LoopbackBroker::new();
    let client = broker.client();
    let manager = make_manager(Arc::new(client.clone()), "restarter");
    start_ok(&manager).await;
    manager.stop().await.unwrap();
    start_ok(&manager).await;

    let mut channel = manager.observe_channel("loop").unwrap().attach().unwrap();
    await_loopback_subscription(&client, "CHN:loop").await;
    manager
        .publish_channel(
            "loop",
            agent_comm::ChannelEvent::with_objects(Vec::new()),
        )
        .unwrap();
    let echoed = next_within(&mut channel, DEFAULT_WAIT)
        .await
        .expect("own channel event should loop back");
    assert_eq!(echoed.data.objects, Some(Vec::new()));

    manager.stop().await.unwrap();
}
