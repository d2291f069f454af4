use std::io;

use deferred_printf::{defer_printf, printf, DeferredPrintf, Ptr, ReplayPolicy};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CAPACITY: usize = 64 * 1024;

fn main() -> io::Result<()> {
    let (writer, _guard) = tracing_appender::non_blocking(io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .init();

    let mut logger = DeferredPrintf::<CAPACITY>::new().with_policy(ReplayPolicy::continue_on_failure());
    let label = String::from("demo");
    let origin = Ptr::of(&label);

    for i in 0..1000u32 {
        if let Err(err) = defer_printf!(logger, "[%s] step %4u: load=%5.1f%% ptr=%p\n", label.clone(), i, f64::from(i % 100), origin) {
            warn!(%err, step = i, "stopping early");
            break;
        }
    }
    info!(records = logger.len(), bytes = logger.arena().bytes_used(), "recorded");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = logger.replay_all_to(&mut out, printf::vfprintf);
    info!(records = summary.records, chars = summary.chars, failures = summary.failures.len(), "replayed");

    match summary.into_result() {
        Ok(_) => Ok(()),
        Err(err) => Err(io::Error::other(err)),
    }
}
