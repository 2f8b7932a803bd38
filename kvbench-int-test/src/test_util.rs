use crate::stores::{create_context, Backend, BenchContext};
use kvbench::errors::BenchResult;
use kvbench::namespace::Namespace;
use kvbench::store::{BenchStore, BenchTransaction};

/// Runs `test` against a fresh context for `backend`.
///
/// The context is dropped (closed and cleaned up) whether the test passes,
/// fails or panics. Failures are re-raised as a panic naming the backend.
pub fn run_test<T>(backend: Backend, test: T)
where
    T: FnOnce(&BenchContext) -> BenchResult<()> + std::panic::UnwindSafe,
{
    let result = std::panic::catch_unwind(|| {
        let ctx = create_context(backend)
            .map_err(|e| format!("Before run failed: {:?}", e))?;
        test(&ctx).map_err(|e| format!("Test failed: {:?}", e))
    });

    match result {
        Ok(Ok(())) => {}
        Ok(Err(msg)) => panic!("[{}] {}", backend, msg),
        Err(e) => {
            let panic_msg = if let Some(msg) = e.downcast_ref::<String>() {
                msg.clone()
            } else if let Some(msg) = e.downcast_ref::<&str>() {
                msg.to_string()
            } else {
                format!("{:?}", e)
            };
            panic!("[{}] Test execution failed with panic: {}", backend, panic_msg);
        }
    }
}

/// Runs `test` once per backend, each against its own fresh context.
pub fn run_on_all_backends<T>(test: T)
where
    T: Fn(&BenchContext) -> BenchResult<()> + std::panic::RefUnwindSafe,
{
    for backend in Backend::all() {
        run_test(backend, |ctx| test(ctx));
    }
}

/// Writes `entries` in one update.
pub fn put_all(store: &BenchStore, ns: &Namespace, entries: &[(&[u8], &[u8])]) -> BenchResult<()> {
    store.update(ns, &mut |tx: &mut dyn BenchTransaction| {
        for (key, value) in entries {
            tx.set(key, value)?;
        }
        Ok(())
    })
}

/// Reads one key in a view.
pub fn read(store: &BenchStore, ns: &Namespace, key: &[u8]) -> BenchResult<Option<Vec<u8>>> {
    let mut found = None;
    store.view(ns, &mut |tx: &mut dyn BenchTransaction| {
        found = tx.get(key)?;
        Ok(())
    })?;
    Ok(found)
}

/// Every entry of a namespace in iteration order.
pub fn scan(store: &BenchStore, ns: &Namespace) -> BenchResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut entries = Vec::new();
    store.view(ns, &mut |tx: &mut dyn BenchTransaction| {
        entries.clear();
        let mut iter = tx.iterator()?;
        while iter.next() {
            let value = iter.value()?;
            entries.push((iter.key().unwrap_or_default(), value));
        }
        iter.close();
        Ok(())
    })?;
    Ok(entries)
}
