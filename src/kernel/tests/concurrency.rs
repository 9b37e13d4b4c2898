use std::sync::{Arc, Barrier};
use std::thread;

use w32sem::sync::ReleaseError;
use w32sem::{Creation, SyncConfig, SyncRuntime, Win32Error};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn concurrent_named_create_has_one_creator() {
    init_logging();

    for _ in 0..50 {
        let rt = Arc::new(SyncRuntime::default());
        let barrier = Arc::new(Barrier::new(2));

        let workers: Vec<_> = (0..2)
            .map(|_| {
                let rt = Arc::clone(&rt);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    rt.create_semaphore(0, 1, Some("A")).unwrap()
                })
            })
            .collect();
        let results: Vec<Creation> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        let created = results
            .iter()
            .filter(|c| c.status() == Win32Error::Success)
            .count();
        let opened = results
            .iter()
            .filter(|c| c.status() == Win32Error::AlreadyExists)
            .count();
        assert_eq!((created, opened), (1, 1));
        assert_eq!(results[0].handle(), results[1].handle());

        // Both handles see the same counter.
        rt.release_semaphore(results[0].handle(), 1).unwrap();
        assert_eq!(
            rt.release_semaphore(results[1].handle(), 1),
            Err(ReleaseError::Overflow { previous: 1 })
        );
    }
}

#[test]
fn concurrent_releases_never_exceed_max() {
    init_logging();

    for _ in 0..200 {
        let rt = Arc::new(SyncRuntime::default());
        let handle = rt.create_semaphore(0, 4, None).unwrap().handle();
        let barrier = Arc::new(Barrier::new(2));

        let workers: Vec<_> = [2, 3]
            .into_iter()
            .map(|n| {
                let rt = Arc::clone(&rt);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    rt.release_semaphore(handle, n)
                })
            })
            .collect();
        let results: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        let info = rt.query_semaphore(handle).unwrap();
        assert!(info.count == 2 || info.count == 3);
        assert!(info.count <= 4);

        // The loser saw the winner's count.
        let failed = results.iter().find_map(|r| r.err()).unwrap();
        assert_eq!(failed.previous_count(), Some(info.count));
    }
}

#[test]
fn releases_and_claims_keep_count_in_bounds() {
    init_logging();

    const MAX: i32 = 8;
    let rt = Arc::new(SyncRuntime::default());
    let handle = rt.create_semaphore(MAX / 2, MAX, None).unwrap().handle();

    let releasers: Vec<_> = (0..4)
        .map(|_| {
            let rt = Arc::clone(&rt);
            thread::spawn(move || {
                for _ in 0..500 {
                    match rt.release_semaphore(handle, 1) {
                        Ok(previous) => assert!(previous < MAX as u32),
                        Err(err) => assert_eq!(err.previous_count(), Some(MAX as u32)),
                    }
                }
            })
        })
        .collect();
    let claimers: Vec<_> = (0..4)
        .map(|_| {
            let rt = Arc::clone(&rt);
            thread::spawn(move || {
                for _ in 0..500 {
                    rt.table().try_own(handle).unwrap();
                    let info = rt.query_semaphore(handle).unwrap();
                    assert!(info.count <= MAX as u32);
                    assert_eq!(info.signaled, info.count > 0);
                }
            })
        })
        .collect();

    for worker in releasers.into_iter().chain(claimers) {
        worker.join().unwrap();
    }

    let info = rt.query_semaphore(handle).unwrap();
    assert!(info.count <= MAX as u32);
    assert_eq!(info.signaled, info.count > 0);
}

#[test]
fn concurrent_create_and_close_leaves_no_stale_names() {
    init_logging();

    let rt = Arc::new(SyncRuntime::new(SyncConfig::default().with_max_handles(64)));
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let rt = Arc::clone(&rt);
            thread::spawn(move || {
                for _ in 0..200 {
                    let handle = rt.create_semaphore(1, 1, Some("churn")).unwrap().handle();
                    // The handle stays usable until this thread closes it.
                    rt.query_semaphore(handle).unwrap();
                    rt.close_handle(handle).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(rt.table().live_handles(), 0);
    assert!(rt.namespace().is_empty());
    assert_eq!(rt.open_semaphore("churn"), Err(Win32Error::FileNotFound));
}
