use kvbench::driver::{BenchmarkDriver, RunReport};
use kvbench::errors::BenchResult;
use kvbench::namespace::Namespace;
use kvbench::store::BenchStore;
use kvbench::workload::WorkloadConfig;
use kvbench_int_test::stores::{create_context, Backend};
use kvbench_int_test::test_util::{run_on_all_backends, run_test, scan};

#[ctor::ctor]
fn init() {
    colog::init();
}

fn run_experiment(
    store: BenchStore,
    ns: Namespace,
    config: WorkloadConfig,
) -> BenchResult<RunReport> {
    let mut driver = BenchmarkDriver::new(store, ns, config)?;
    driver.run()
}

fn ten_megabyte_batch() -> WorkloadConfig {
    WorkloadConfig::new()
        .number_of_batches(1)
        .batch_size_bytes(10_000_000)
        .batch_size_items(100)
        .items_removed(20)
        .items_retrieved(20)
        .items_iterated(20)
}

#[test]
fn test_single_ten_megabyte_batch() {
    run_on_all_backends(|ctx| {
        let ns = Namespace::named(b"TestBucket");
        let report = run_experiment(ctx.store(), ns.clone(), ten_megabyte_batch())?;

        assert_eq!(report.batches.len(), 1);
        let batch = &report.batches[0];
        assert_eq!(batch.items_written, 100);
        assert_eq!(batch.bytes_written, 10_000_000);
        assert_eq!(batch.items_removed, 20);
        assert_eq!(batch.items_retrieved, 20);
        assert!(batch.items_iterated >= 20);

        let entries = scan(&ctx.store(), &ns)?;
        assert_eq!(entries.len(), 80);
        assert!(entries.iter().all(|(key, value)| key.len() == 32 && value.len() == 100_000));
        Ok(())
    });
}

#[test]
fn test_quick_workload_in_nested_namespace() {
    run_on_all_backends(|ctx| {
        let parent = Namespace::named(b"TestBucket");
        let child = parent.nested(b"NestedBucket");
        let report = run_experiment(ctx.store(), child.clone(), WorkloadConfig::quick())?;

        assert_eq!(report.batches.len(), 5);
        assert_eq!(scan(&ctx.store(), &child)?.len(), 5 * 80);
        assert!(scan(&ctx.store(), &parent)?.is_empty());
        Ok(())
    });
}

#[test]
fn test_single_batch_through_write_batches() {
    for backend in Backend::write_batch() {
        run_test(backend, |ctx| {
            let ns = Namespace::named(b"TestBucket");
            let report = run_experiment(ctx.store(), ns.clone(), ten_megabyte_batch())?;
            assert_eq!(report.batches[0].items_retrieved, 20);
            assert_eq!(scan(&ctx.store(), &ns)?.len(), 80);
            Ok(())
        });
    }
}

#[test]
fn test_report_names_the_engine() {
    for (backend, prefix) in [
        (Backend::InMemory, "inmemory"),
        (Backend::Redb, "redb-"),
        (Backend::Fjall, "fjall-"),
    ] {
        run_test(backend, |ctx| {
            let config = WorkloadConfig::quick().number_of_batches(1);
            let report = run_experiment(ctx.store(), Namespace::root(), config)?;
            assert!(report.backend.starts_with(prefix));
            assert_eq!(report.stats.samples, 4);
            Ok(())
        });
    }
}

fn run_full_experiment(backend: Backend, config: WorkloadConfig) {
    let ctx = create_context(backend).unwrap();
    let ns = Namespace::named(b"TestBucket");
    let report = run_experiment(ctx.store(), ns, config.clone()).unwrap();
    assert_eq!(report.batches.len(), config.number_of_batches);
    assert_eq!(Some(report.bytes_written()), config.total_bytes());
}

#[test]
#[ignore]
fn test_redb_10mb_batches() {
    run_full_experiment(Backend::Redb, WorkloadConfig::experiment_10mb_batch());
}

#[test]
#[ignore]
fn test_redb_25mb_batches() {
    run_full_experiment(Backend::Redb, WorkloadConfig::experiment_25mb_batch());
}

#[test]
#[ignore]
fn test_redb_100mb_batches() {
    run_full_experiment(Backend::Redb, WorkloadConfig::experiment_100mb_batch());
}

#[test]
#[ignore]
fn test_fjall_10mb_batches() {
    run_full_experiment(Backend::FjallHighThroughput, WorkloadConfig::experiment_10mb_batch());
}

#[test]
#[ignore]
fn test_fjall_25mb_batches() {
    run_full_experiment(Backend::FjallHighThroughput, WorkloadConfig::experiment_25mb_batch());
}

#[test]
#[ignore]
fn test_fjall_100mb_batches() {
    run_full_experiment(Backend::FjallHighThroughput, WorkloadConfig::experiment_100mb_batch());
}

#[test]
#[ignore]
fn test_fjall_default_profile_10mb_batches() {
    run_full_experiment(Backend::Fjall, WorkloadConfig::experiment_10mb_batch());
}

#[test]
#[ignore]
fn test_fjall_write_batch_10mb_batches() {
    run_full_experiment(Backend::FjallWriteBatch, WorkloadConfig::experiment_10mb_batch());
}

#[test]
#[ignore]
fn test_fjall_high_throughput_write_batch_10mb_batches() {
    run_full_experiment(
        Backend::FjallHighThroughputWriteBatch,
        WorkloadConfig::experiment_10mb_batch(),
    );
}

#[test]
#[ignore]
fn test_fjall_high_throughput_write_batch_100mb_batches() {
    run_full_experiment(
        Backend::FjallHighThroughputWriteBatch,
        WorkloadConfig::experiment_100mb_batch(),
    );
}
