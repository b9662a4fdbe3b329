use criterion::{Criterion, criterion_group, criterion_main};
use raycount::{
    PendingReadback, RayCountAggregator, RayCountConfig, RayCountError, RayCountValue,
    ReadbackProducer, ReadbackStatus,
};

/// Producer whose readbacks are finished the moment they are issued.
struct InstantProducer {
    counters: [u32; 5],
}

struct InstantReadback {
    payload: Vec<u8>,
}

impl PendingReadback for InstantReadback {
    fn status(&self) -> ReadbackStatus {
        ReadbackStatus::Ready
    }

    fn read(&mut self) -> Result<Vec<u8>, RayCountError> {
        Ok(std::mem::take(&mut self.payload))
    }
}

impl ReadbackProducer for InstantProducer {
    type Request = InstantReadback;

    fn clear_counters(&mut self) {
        self.counters = [0; 5];
    }

    fn request_read(&mut self, _byte_count: u64, _offset: u64) -> InstantReadback {
        self.counters[1] = self.counters[1].wrapping_add(1);
        InstantReadback {
            payload: bytemuck::cast_slice(&self.counters).to_vec(),
        }
    }
}

fn bench_frame(c: &mut Criterion) {
    let producer = InstantProducer { counters: [0; 5] };
    let mut rays = RayCountAggregator::new(producer, RayCountConfig::default());

    c.bench_function("frame_submit_and_query", |b| {
        b.iter(|| {
            rays.activate(true);
            rays.submit_request();
            rays.query(RayCountValue::Total)
        })
    });

    c.bench_function("drain_64_queued", |b| {
        b.iter(|| {
            rays.activate(true);
            for _ in 0..64 {
                rays.submit_request();
            }
            rays.drain()
        })
    });
}

criterion_group!(benches, bench_frame);
criterion_main!(benches);
