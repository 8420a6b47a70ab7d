//! Performance benchmarks for StreamFramer and Dispatcher.
//!
//! These benchmarks measure reassembly throughput for streams delivered in
//! small reads, and the cost of the full receive pipeline per packet.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench framer_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use portframe_core::{
    DispatcherConfig, EventKeyRule, KeyWindow, PacketDescriptor, ValidDataWindow,
};
use portframe_protocol::{Dispatcher, PacketData, PacketHandler, StreamFramer};
use std::hint::black_box;

const PACKET_LEN: usize = 16;

/// Handler that only counts callbacks.
#[derive(Default)]
struct Counter {
    packets: usize,
    events: usize,
}

impl PacketHandler for Counter {
    fn on_packet(&mut self, data: &PacketData) {
        black_box(data);
        self.packets += 1;
    }

    fn on_event(&mut self, _event: &str, _data: &PacketData) {
        self.events += 1;
    }
}

/// Build `count` back-to-back fixed-length packets.
fn create_stream(count: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(count * PACKET_LEN);
    for i in 0..count {
        stream.extend_from_slice(&[0xAA, 0xBB, (i % 4) as u8]);
        stream.extend((3..PACKET_LEN).map(|j| (i + j) as u8));
    }
    stream
}

fn framer() -> StreamFramer {
    StreamFramer::new(PacketDescriptor::framed("AABB", Some(PACKET_LEN))).unwrap()
}

/// Benchmark framing a whole stream delivered in one read.
fn bench_frame_single_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_single_read");

    for count in [10, 100, 1000].iter() {
        let stream = create_stream(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &stream, |b, stream| {
            b.iter(|| {
                let mut framer = framer();
                framer.feed(black_box(stream));
                black_box(framer.drain_packets().count());
            });
        });
    }

    group.finish();
}

/// Benchmark framing a stream delivered in small chunks.
fn bench_frame_chunked(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_chunked");
    let stream = create_stream(100);
    group.throughput(Throughput::Bytes(stream.len() as u64));

    for chunk_size in [1, 7, 64].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("chunk_{}_bytes", chunk_size)),
            chunk_size,
            |b, &size| {
                b.iter(|| {
                    let mut framer = framer();
                    let mut total = 0;
                    for chunk in stream.chunks(size) {
                        framer.feed(black_box(chunk));
                        total += framer.drain_packets().count();
                    }
                    black_box(total);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the full receive pipeline with event routing.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    let config = DispatcherConfig {
        packet: PacketDescriptor::framed("AABB", Some(PACKET_LEN)),
        valid_data: ValidDataWindow::new(2, None),
        use_event_keys: true,
        event_key: KeyWindow::new(0, Some(2)),
        events: (0..4)
            .map(|i| EventKeyRule::new(format!("event_{i}"), format!("{i:02X}")))
            .collect(),
        ..Default::default()
    };
    let stream = create_stream(100);
    group.throughput(Throughput::Elements(100));

    group.bench_function("dispatch_100_packets", |b| {
        b.iter(|| {
            let mut dispatcher = Dispatcher::new(&config).unwrap();
            let mut counter = Counter::default();
            dispatcher.process_binary(black_box(&stream), &mut counter);
            black_box((counter.packets, counter.events));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_single_read,
    bench_frame_chunked,
    bench_dispatch,
);

criterion_main!(benches);
