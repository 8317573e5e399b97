//! In-crate transport double for unit tests.

use crate::transport::{
    ConnectionState, LastWill, Payload, Transport, TransportError, TransportMessage,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{broadcast, watch};

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RecordedCall {
    Connect(Option<LastWill>),
    Disconnect,
    Subscribe(String),
    Unsubscribe(String),
    Publish(String, Payload),
}

/// Records successful calls and lets tests drive the connection state.
pub(crate) struct RecordingTransport {
    calls: Mutex<Vec<RecordedCall>>,
    fail_publishes: AtomicBool,
    messages: broadcast::Sender<TransportMessage>,
    state: watch::Sender<ConnectionState>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        let (messages, _) = broadcast::channel(64);
        let (state, _) = watch::channel(ConnectionState::Offline);
        Self {
            calls: Mutex::new(Vec::new()),
            fail_publishes: AtomicBool::new(false),
            messages,
            state,
        }
    }
}

impl RecordingTransport {
    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub(crate) fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn connect(&self, last_will: Option<LastWill>) -> Result<(), TransportError> {
        self.record(RecordedCall::Connect(last_will));
        self.set_state(ConnectionState::Online);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.record(RecordedCall::Disconnect);
        self.set_state(ConnectionState::Offline);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), TransportError> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(TransportError::new("publish rejected"));
        }
        self.record(RecordedCall::Publish(topic.to_string(), payload));
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.record(RecordedCall::Subscribe(topic.to_string()));
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.record(RecordedCall::Unsubscribe(topic.to_string()));
        Ok(())
    }

    fn messages(&self) -> broadcast::Receiver<TransportMessage> {
        self.messages.subscribe()
    }

    fn connection_states(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}
