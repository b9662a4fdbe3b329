//! Round trip through a real device. Skipped when no adapter is available.

use std::time::{Duration, Instant};

use raycount::{
    CounterSnapshot, GpuContext, GpuRayCounter, PendingReadback, RayCountAggregator, RayCountConfig,
    RayCountValue, ReadbackProducer, ReadbackStatus,
};

fn gpu() -> Option<GpuContext> {
    match GpuContext::headless() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

fn wait_for(readback: &impl PendingReadback) -> ReadbackStatus {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let status = readback.status();
        if status.is_finished() || Instant::now() > deadline {
            return status;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn reads_back_written_counters() {
    let Some(gpu) = gpu() else { return };
    let config = RayCountConfig::new();
    let mut counter = GpuRayCounter::new(&gpu, &config);

    let values: [u32; 5] = [10, 20, 30, 40, 50];
    gpu.queue
        .write_buffer(counter.buffer(), 0, bytemuck::cast_slice(&values));

    let mut readback = counter.request_read(20, 0);
    assert_eq!(wait_for(&readback), ReadbackStatus::Ready);

    let bytes = readback.read().unwrap();
    let snapshot = CounterSnapshot::from_bytes(&bytes).unwrap();
    assert_eq!(snapshot.values(), &values);
}

#[test]
fn clear_zeroes_counters() {
    let Some(gpu) = gpu() else { return };
    let config = RayCountConfig::new();
    let mut counter = GpuRayCounter::new(&gpu, &config);

    gpu.queue
        .write_buffer(counter.buffer(), 0, bytemuck::cast_slice(&[7u32; 5]));
    counter.clear_counters();

    let mut readback = counter.request_read(20, 0);
    assert_eq!(wait_for(&readback), ReadbackStatus::Ready);
    assert_eq!(readback.read().unwrap(), vec![0u8; 20]);
}

#[test]
fn out_of_range_read_fails_immediately() {
    let Some(gpu) = gpu() else { return };
    let mut counter = GpuRayCounter::new(&gpu, &RayCountConfig::new());

    assert_eq!(counter.request_read(24, 0).status(), ReadbackStatus::Failed);
    assert_eq!(counter.request_read(4, 20).status(), ReadbackStatus::Failed);
    assert_eq!(counter.request_read(3, 0).status(), ReadbackStatus::Failed);
}

#[test]
fn staging_buffers_are_recycled() {
    let Some(gpu) = gpu() else { return };
    let config = RayCountConfig::new().staging_pool_size(1);
    let mut counter = GpuRayCounter::new(&gpu, &config);

    let mut first = counter.request_read(20, 0);
    let mut second = counter.request_read(20, 0);
    assert_eq!(wait_for(&first), ReadbackStatus::Ready);
    assert_eq!(wait_for(&second), ReadbackStatus::Ready);
    first.read().unwrap();
    second.read().unwrap();
    drop(first);
    drop(second);

    assert_eq!(counter.idle_staging_buffers(), 1);
}

#[test]
fn aggregator_picks_up_gpu_counts() {
    let Some(gpu) = gpu() else { return };
    let config = RayCountConfig::new();
    let counter = GpuRayCounter::new(&gpu, &config);
    let mut rays = RayCountAggregator::new(counter, config);

    rays.activate(true);
    gpu.queue.write_buffer(
        rays.producer().buffer(),
        0,
        bytemuck::cast_slice(&[1u32, 2, 3, 4, 5]),
    );
    rays.submit_request();

    let deadline = Instant::now() + Duration::from_secs(5);
    while rays.pending_len() > 0 && Instant::now() < deadline {
        rays.drain();
        std::thread::sleep(Duration::from_millis(1));
    }

    assert_eq!(rays.query(RayCountValue::Shadow), 2);
    assert_eq!(rays.query(RayCountValue::Total), 15);
}

#[test]
fn in_flight_readback_is_not_recycled() {
    let Some(gpu) = gpu() else { return };
    let config = RayCountConfig::new().staging_pool_size(2);
    let mut counter = GpuRayCounter::new(&gpu, &config);

    // Dropped before the device is polled, so the map callback has not run.
    let in_flight = counter.request_read(20, 0);
    drop(in_flight);
    assert_eq!(counter.idle_staging_buffers(), 0);

    // The abandoned map resolves harmlessly and later readbacks still work.
    gpu.poll();
    let mut readback = counter.request_read(20, 0);
    assert_eq!(wait_for(&readback), ReadbackStatus::Ready);
    assert_eq!(readback.read().unwrap(), vec![0u8; 20]);
    drop(readback);
    assert_eq!(counter.idle_staging_buffers(), 1);
}
