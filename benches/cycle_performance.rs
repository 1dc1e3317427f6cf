use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeMap;
use traffic_signal::{
    config::IntersectionConfig,
    output::SimulatedOutput,
    simulation::{Approach, ManualClock, QueueScheduler, RandomDemand, ServiceOrder, ShutdownSignal, SignalController},
};

fn benchmark_full_cycle(c: &mut Criterion) {
    let config = IntersectionConfig::default();
    let clock = ManualClock::new();

    let mut controller = SignalController::new(
        SimulatedOutput::new(),
        clock.clone(),
        &config.signals.approaches,
        config.timing.yellow_dwell(),
        ShutdownSignal::new(),
    );
    controller.initialize().expect("Failed to initialize simulated outputs");

    let mut scheduler = QueueScheduler::new(controller, RandomDemand::new(Some(42)), &config.timing, &config.demand);

    c.bench_function("scheduler_full_cycle", |b| {
        b.iter(|| {
            black_box(scheduler.run_cycle().unwrap());
            // Keep the recorded sleeps from growing without bound
            clock.clear_sleeps();
        })
    });
}

fn benchmark_service_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_order");

    for (name, sizes) in [("distinct", [5, 20, 3]), ("tied", [15, 7, 15]), ("equal", [9, 9, 9])] {
        let queues: BTreeMap<Approach, u32> = sizes
            .iter()
            .enumerate()
            .map(|(i, len)| (Approach(i as u8 + 1), *len))
            .collect();

        group.bench_function(name, |b| {
            b.iter(|| ServiceOrder::by_demand(black_box(&queues)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_full_cycle,
    benchmark_service_order
);
criterion_main!(benches);
