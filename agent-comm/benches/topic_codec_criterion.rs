use agent_comm::{
    topic_matches, ChannelEvent, CommObject, CommunicationManager, CommunicationOptions, CoreType,
    EventType, Topic,
};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use loopback_transport::LoopbackBroker;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder;
use tokio_stream::StreamExt;
use uuid::Uuid;

const FILTER_ROWS: usize = 256;
const CHANNEL_BATCH: usize = 16;

fn topic_codec_criterion(c: &mut Criterion) {
    let source_id = Uuid::new_v4();
    let one_way = Topic::one_way("plant-1", EventType::Channel, Some("alerts"), source_id);
    let two_way = Topic::two_way(
        "plant-1",
        EventType::Call,
        Some("switch"),
        source_id,
        "f3a5c2d1-5f1e-4e5b-9f62-2b1a6cf0a001",
    );
    let encoded_one_way = one_way.encode().expect("one-way topic should encode");
    let encoded_two_way = two_way.encode().expect("two-way topic should encode");

    let mut codec_group = c.benchmark_group("topic_codec");
    codec_group.bench_function("encode_one_way", |b| {
        b.iter(|| black_box(one_way.encode()));
    });
    codec_group.bench_function("decode_one_way", |b| {
        b.iter(|| black_box(Topic::decode(black_box(&encoded_one_way))));
    });
    codec_group.bench_function("decode_two_way", |b| {
        b.iter(|| black_box(Topic::decode(black_box(&encoded_two_way))));
    });
    codec_group.finish();

    let filters: Vec<String> = (0..FILTER_ROWS)
        .map(|row| match row % 3 {
            0 => format!("v1/plant-{row}/CHN:alerts/+"),
            1 => format!("v1/+/CHN:{row}/#"),
            _ => "v1/+/CHN:alerts/+".to_string(),
        })
        .collect();

    let mut matching_group = c.benchmark_group("topic_matching");
    matching_group.bench_function("wildcard_filters", |b| {
        b.iter(|| {
            let count = filters
                .iter()
                .filter(|filter| topic_matches(&encoded_one_way, filter))
                .count();
            black_box(count);
        });
    });
    matching_group.finish();

    let runtime = Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("benchmark runtime should build");

    let mut dispatch_group = c.benchmark_group("loopback_dispatch");
    dispatch_group.sample_size(20);
    dispatch_group.bench_function("channel_round_trip", |b| {
        b.iter_batched(
            || runtime.block_on(ChannelFixture::new()),
            |fixture| runtime.block_on(fixture.round_trip(CHANNEL_BATCH)),
            BatchSize::LargeInput,
        );
    });
    dispatch_group.finish();
}

struct ChannelFixture {
    sender: CommunicationManager,
    receiver: CommunicationManager,
    stream: agent_comm::EventSubscription<agent_comm::CommunicationEvent<ChannelEvent>>,
}

impl ChannelFixture {
    async fn new() -> Self {
        let broker = LoopbackBroker::new();
        let receiver_client = broker.client();
        let sender = CommunicationManager::new(
            Arc::new(broker.client()),
            CommunicationOptions::default().with_identity_name("bench-sender"),
        )
        .expect("sender should build");
        let receiver = CommunicationManager::new(
            Arc::new(receiver_client.clone()),
            CommunicationOptions::default().with_identity_name("bench-receiver"),
        )
        .expect("receiver should build");
        sender.start().await.expect("sender should start");
        receiver.start().await.expect("receiver should start");

        let stream = receiver
            .observe_channel("bench")
            .expect("channel should be observable")
            .attach()
            .expect("first attach should succeed");
        while !receiver_client
            .subscriptions()
            .iter()
            .any(|topic| topic.contains("CHN:bench"))
        {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        Self {
            sender,
            receiver,
            stream,
        }
    }

    async fn round_trip(mut self, batch: usize) {
        for index in 0..batch {
            let object = CommObject::new(CoreType::Log, format!("entry-{index}"));
            self.sender
                .publish_channel("bench", ChannelEvent::with_object(object))
                .expect("publish should be accepted");
        }
        for _ in 0..batch {
            black_box(self.stream.next().await);
        }
        let _ = self.receiver.stop().await;
        let _ = self.sender.stop().await;
    }
}

criterion_group!(benches, topic_codec_criterion);
criterion_main!(benches);
