use agent_comm::{CommunicationManager, CommunicationOptions, IoNode, OperatingState, Transport};
use integration_test_utils::{wait_until, RecordedCall, RecordingTransport, DEFAULT_WAIT};
use loopback_transport::LoopbackTransport;
use std::sync::Arc;

pub(crate) const NAMESPACE: &str = "plant-1";

pub(crate) fn options(name: &str) -> CommunicationOptions {
    CommunicationOptions::default()
        .with_identity_name(name)
        .with_namespace(NAMESPACE)
}

pub(crate) fn make_manager(transport: Arc<dyn Transport>, name: &str) -> CommunicationManager {
    CommunicationManager::new(transport, options(name)).expect("manager creation should succeed")
}

#[allow(dead_code)]
pub(crate) fn make_io_manager(
    transport: Arc<dyn Transport>,
    name: &str,
    io_node: IoNode,
) -> CommunicationManager {
    CommunicationManager::new(transport, options(name).with_io_node(io_node))
        .expect("manager creation should succeed")
}

pub(crate) async fn start_ok(manager: &CommunicationManager) {
    assert!(manager.start().await.is_ok());
    assert_eq!(manager.operating_state(), OperatingState::Started);
}

/// Waits until the recording transport has seen `topic` subscribed at least `count` times.
#[allow(dead_code)]
pub(crate) async fn await_subscribes(transport: &RecordingTransport, topic: &str, count: usize) {
    assert!(
        wait_until(DEFAULT_WAIT, || transport.subscribe_count(topic) >= count).await,
        "expected {count} subscribe(s) of {topic}, calls: {:?}",
        transport.calls()
    );
}

/// Waits until the loopback client holds a subscription containing `needle`.
#[allow(dead_code)]
pub(crate) async fn await_loopback_subscription(client: &LoopbackTransport, needle: &str) {
    assert!(
        wait_until(DEFAULT_WAIT, || client
            .subscriptions()
            .iter()
            .any(|topic| topic.contains(needle)))
        .await,
        "expected a subscription containing {needle}, have {:?}",
        client.subscriptions()
    );
}

/// Every publish recorded on `topic`, in call order.
#[allow(dead_code)]
pub(crate) fn publishes_on(transport: &RecordingTransport, topic: &str) -> Vec<RecordedCall> {
    transport
        .calls()
        .into_iter()
        .filter(|call| matches!(call, RecordedCall::Publish(t, _) if t == topic))
        .collect()
}
