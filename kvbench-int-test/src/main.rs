use kvbench::driver::BenchmarkDriver;
use kvbench::errors::BenchResult;
use kvbench::namespace::Namespace;
use kvbench::workload::WorkloadConfig;
use kvbench_int_test::stores::{create_context, Backend};
use std::time::Duration;

fn main() -> BenchResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = WorkloadConfig::quick();
    log::info!(
        "Running {} batches of {} bytes against every backend",
        config.number_of_batches,
        config.batch_size_bytes
    );

    for backend in Backend::all().into_iter().chain(Backend::write_batch()) {
        let ctx = create_context(backend)?;
        let mut driver = BenchmarkDriver::new(
            ctx.store(),
            Namespace::named(b"TestBucket"),
            config.clone(),
        )?
        .with_sampling(Duration::from_millis(100));
        let report = driver.run()?;

        log::info!(
            "{} ({}): {} batches, {} bytes written, {} entries iterated in {:.3}s",
            backend,
            report.backend,
            report.batches.len(),
            report.bytes_written(),
            report.items_iterated(),
            report.total_elapsed
        );
        log::info!("{} memory:\n{}", backend, report.stats);
    }
    Ok(())
}
