use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deferred_printf::{defer_printf, printf, Arg, DeferredPrintf, Ptr};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Once;
use std::time::Instant;
use tempfile::tempdir;
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

const ARENA_SIZE: usize = 4 * 1024 * 1024; // 4MB arena
// Record footprint for the benchmark signature: vtable + format + (&str, usize, f64, u64, Ptr)
const RECORD_SIZE_ESTIMATE: usize = 72;
const ITERATIONS: usize = ARENA_SIZE / RECORD_SIZE_ESTIMATE;
const FORMAT: &str = "Test perf: iteration=%zu id=%s load=%.2f big=%llu at=%p\n";
const DESCRIPTION: &str = "sensor-array-7";

static LOGGER_INIT: Once = Once::new();

fn setup_log4rs(log_file: &str) {
    LOGGER_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} - {m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(LevelFilter::Info))
            .unwrap();

        log4rs::init_config(config).unwrap();
    });
}

// Capture cost only: nothing is formatted, the arena is rewound between passes.
fn bench_record(c: &mut Criterion) {
    let mut logger = DeferredPrintf::<ARENA_SIZE>::new();
    let origin = Ptr::of(&logger);

    c.bench_function("deferred_record", |b| {
        b.iter(|| {
            for i in 0..ITERATIONS {
                defer_printf!(logger, FORMAT, DESCRIPTION, i, i as f64 * 0.5, u64::MAX, origin).unwrap();
            }
            logger.clear();
        })
    });
}

fn bench_immediate_format(c: &mut Criterion) {
    let origin = Ptr::null();

    c.bench_function("immediate_format", |b| {
        b.iter(|| {
            for i in 0..ITERATIONS {
                let line = printf::format(
                    FORMAT,
                    &[
                        Arg::Str(DESCRIPTION),
                        Arg::Uint(i as u64),
                        Arg::Float(i as f64 * 0.5),
                        Arg::Uint(u64::MAX),
                        Arg::Ptr(origin.addr()),
                    ],
                )
                .unwrap();
                black_box(line);
            }
        })
    });
}

fn bench_logging_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logging Comparison");
    group.sample_size(10); // Fewer samples due to I/O operations

    group.bench_function("deferred_vs_traditional", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let deferred_path = dir.path().join("deferred.log");
            let traditional_path = dir.path().join("traditional.log");

            // Deferred: capture on the hot path, format into a file afterwards.
            let mut logger = DeferredPrintf::<ARENA_SIZE>::new();
            let origin = Ptr::of(&logger);

            let record_start = Instant::now();
            for i in 0..ITERATIONS {
                defer_printf!(logger, FORMAT, DESCRIPTION, i, i as f64 * 0.5, u64::MAX, origin).unwrap();
            }
            let record_duration = record_start.elapsed();

            let replay_start = Instant::now();
            let mut out = BufWriter::new(File::create(&deferred_path).unwrap());
            let summary = logger.replay_all_to(&mut out, printf::vfprintf);
            out.flush().unwrap();
            let replay_duration = replay_start.elapsed();
            assert!(summary.is_clean());

            // Traditional logging using log4rs - formats and writes per call
            setup_log4rs(traditional_path.to_str().unwrap());
            let traditional_start = Instant::now();
            for i in 0..ITERATIONS {
                info!(
                    "Test perf: iteration={} id={} load={:.2} big={} at={:p}",
                    i, DESCRIPTION, i as f64 * 0.5, u64::MAX, &logger
                );
            }
            let traditional_duration = traditional_start.elapsed();

            println!("\nPerformance comparison ({} records, {} MB arena):",
                    ITERATIONS, ARENA_SIZE as f64 / (1024.0 * 1024.0));
            println!("Deferred record (hot path): {:?}", record_duration);
            println!("Deferred replay to file: {:?}", replay_duration);
            println!("Traditional logging (with I/O): {:?}", traditional_duration);
            println!("Hot path speedup: {:.2}x", traditional_duration.as_secs_f64() / record_duration.as_secs_f64());
            println!("Record throughput: {:.2} million msgs/sec",
                    ITERATIONS as f64 / record_duration.as_secs_f64() / 1_000_000.0);

            black_box((record_duration, replay_duration, traditional_duration))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_record, bench_immediate_format, bench_logging_comparison);
criterion_main!(benches);
