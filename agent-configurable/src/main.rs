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

mod config;

use crate::config::Config;
use agent_comm::{
    AdvertiseEvent, CommError, CommObject, CommunicationManager, CommunicationOptions, CoreType,
    EventData, EventStream,
};
use clap::Parser;
use loopback_transport::LoopbackBroker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Runs a communication agent on an in-process loopback broker")]
struct AgentArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

/// Logs every event of `stream` until it ends.
fn log_events<D>(label: String, stream: EventStream<D>) -> Result<JoinHandle<()>, CommError>
where
    D: EventData,
{
    let mut events = stream.attach()?;
    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            info!(
                stream = label.as_str(),
                source_id = %event.source_id,
                "observed {:?}",
                event.data
            );
        }
    }))
}

fn spawn_observers(
    manager: &CommunicationManager,
    config: &Config,
) -> Result<Vec<JoinHandle<()>>, CommError> {
    let mut tasks = Vec::new();
    for core_type in &config.observe.core_types {
        tasks.push(log_events(
            format!("advertise:{core_type}"),
            manager.observe_advertise_with_core_type(*core_type)?,
        )?);
    }
    for object_type in &config.observe.object_types {
        tasks.push(log_events(
            format!("advertise::{object_type}"),
            manager.observe_advertise_with_object_type(object_type)?,
        )?);
    }
    for channel in &config.observe.channels {
        tasks.push(log_events(
            format!("channel:{channel}"),
            manager.observe_channel(channel)?,
        )?);
    }
    tasks.push(log_events(
        "deadvertise".to_string(),
        manager.observe_deadvertise()?,
    )?);
    Ok(tasks)
}

async fn start_peer(
    broker: &LoopbackBroker,
    namespace: &str,
    name: &str,
) -> Result<CommunicationManager, CommError> {
    let options = CommunicationOptions::default()
        .with_namespace(namespace)
        .with_identity_name(name);
    let peer = CommunicationManager::new(Arc::new(broker.client()), options)?;
    peer.start().await?;
    let note = CommObject::new(CoreType::Log, format!("{name} joined"));
    peer.publish_advertise(AdvertiseEvent::new(note))?;
    Ok(peer)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    let args = AgentArgs::parse();
    let config = Config::load(&args.config)
        .map_err(|e| format!("Unable to load config file {}: {e}", args.config))?;

    let broker = LoopbackBroker::new();
    let agent = CommunicationManager::new(
        Arc::new(broker.client()),
        config.communication.clone(),
    )?;
    info!(
        identity = %agent.identity().object_id,
        namespace = agent.namespace(),
        "Started agent-configurable"
    );

    let observers = spawn_observers(&agent, &config)?;
    agent.start().await?;

    let mut peers = Vec::with_capacity(config.peers.len());
    for name in &config.peers {
        peers.push(start_peer(&broker, agent.namespace(), name).await?);
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    for peer in &peers {
        if let Err(err) = peer.stop().await {
            warn!(err = %err, "peer did not stop cleanly");
        }
    }
    agent.stop().await?;
    for observer in observers {
        let _ = observer.await;
    }
    Ok(())
}
