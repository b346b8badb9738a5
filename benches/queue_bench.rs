use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mqperf::{QueueConfig, SharedQueue};
use std::sync::atomic::{AtomicU32, Ordering};

fn unique_config(tag: &str, capacity: usize, element_size: usize) -> QueueConfig {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let name = format!(
        "mqperf_bench_{}_{}_{}",
        tag,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    );
    QueueConfig::new(name, capacity, element_size)
}

fn benchmark_enqueue_dequeue_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("SharedQueue_FillDrain");

    for &capacity in [16, 64, 256].iter() {
        group.throughput(Throughput::Elements(capacity as u64));
        group.bench_with_input(
            BenchmarkId::new("fill_drain_268B", capacity),
            &capacity,
            |b, &capacity| {
                let queue =
                    SharedQueue::open_or_create(unique_config("fill", capacity, 268)).unwrap();
                let element = vec![7u8; 268];
                let mut out = vec![0u8; 268];

                b.iter(|| {
                    for _ in 0..capacity {
                        queue.try_enqueue(&element).unwrap();
                    }
                    for _ in 0..capacity {
                        queue.try_dequeue(&mut out).unwrap();
                    }
                });

                queue.destroy(true).unwrap();
            },
        );
    }

    group.finish();
}

fn benchmark_element_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("SharedQueue_ElementSizes");

    for &element_size in [16, 268, 4096].iter() {
        group.throughput(Throughput::Bytes(element_size as u64));
        group.bench_with_input(
            BenchmarkId::new("single_transfer", element_size),
            &element_size,
            |b, &element_size| {
                let queue =
                    SharedQueue::open_or_create(unique_config("size", 64, element_size)).unwrap();
                let element = vec![7u8; element_size];
                let mut out = vec![0u8; element_size];

                b.iter(|| {
                    queue.try_enqueue(&element).unwrap();
                    queue.try_dequeue(&mut out).unwrap();
                });

                queue.destroy(true).unwrap();
            },
        );
    }

    group.finish();
}

fn benchmark_signal_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("SharedQueue_SignalOverhead");
    let element = vec![7u8; 268];

    group.bench_function("enqueue_plain", |b| {
        let queue = SharedQueue::open_or_create(unique_config("plain", 64, 268)).unwrap();
        let mut out = vec![0u8; 268];
        b.iter(|| {
            queue.try_enqueue(&element).unwrap();
            queue.try_dequeue(&mut out).unwrap();
        });
        queue.destroy(true).unwrap();
    });

    group.bench_function("enqueue_signal", |b| {
        let queue = SharedQueue::open_or_create(unique_config("signal", 64, 268)).unwrap();
        let mut out = vec![0u8; 268];
        b.iter(|| {
            queue.try_enqueue_signal(&element).unwrap();
            queue.try_dequeue(&mut out).unwrap();
        });
        queue.destroy(true).unwrap();
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_enqueue_dequeue_cycle,
    benchmark_element_sizes,
    benchmark_signal_overhead
);
criterion_main!(benches);
