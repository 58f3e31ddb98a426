//! Concurrency tests for the telemetry store
//!
//! Writers and readers hammer the store from separate OS threads; every
//! snapshot must be internally consistent and respect the retention cap.

use crate::test_utils::{base_time, numbered_reading};
use rand::Rng;
use redap_telemetry::{HistorySnapshot, LevelThresholds, SensorQuery, SensorReading, TelemetryStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

const CAP: usize = 50;
const WRITERS: u32 = 4;
const APPENDS_PER_WRITER: u32 = 3_000;

/// Entries from one writer must appear in the order that writer appended them.
fn assert_writer_order(snapshot: &HistorySnapshot) {
    let mut last_seq = [None::<f64>; WRITERS as usize];
    for (seq, writer) in snapshot.temp.iter().zip(&snapshot.hum) {
        let slot = &mut last_seq[*writer as usize];
        if let Some(prev) = *slot {
            assert!(*seq > prev, "writer {writer} reordered: {prev} then {seq}");
        }
        *slot = Some(*seq);
    }
}

#[test]
fn test_interleaved_writers_never_tear_histories() {
    let store = Arc::new(TelemetryStore::with_max_history(CAP));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut observed = 0usize;
                while !done.load(Ordering::Acquire) {
                    for (_, snapshot) in store.snapshot_all() {
                        assert!(snapshot.is_consistent());
                        assert!(snapshot.len() <= CAP);
                        assert_writer_order(&snapshot);
                        observed += 1;
                    }
                }
                observed
            })
        })
        .collect();

    let writers: Vec<_> = (0..WRITERS)
        .map(|writer| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for seq in 0..APPENDS_PER_WRITER {
                    let sensor = if rng.gen_bool(0.5) { "s1" } else { "s2" };
                    // temp carries the per-writer sequence, hum the writer id.
                    store.append(SensorReading::new(
                        sensor,
                        base_time(),
                        f64::from(seq),
                        f64::from(writer),
                        rng.gen_range(0.0..35.0),
                    ));
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().expect("writer panicked");
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().expect("reader observed a torn history");
    }

    let stats = store.stats();
    assert_eq!(stats.total_appends, u64::from(WRITERS * APPENDS_PER_WRITER));
    assert_eq!(stats.sensors, 2);
    for id in ["s1", "s2"] {
        let snapshot = store.snapshot(id).expect("both sensors were written");
        assert_eq!(snapshot.len(), CAP);
        assert!(snapshot.is_consistent());
        assert_writer_order(&snapshot);
    }
    assert_eq!(
        stats.total_evictions,
        stats.total_appends - (2 * CAP) as u64
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_readers_alongside_blocking_writer() {
    let store = Arc::new(TelemetryStore::new());
    let query = SensorQuery::new(Arc::clone(&store), LevelThresholds::default());

    let writer = {
        let store = Arc::clone(&store);
        tokio::task::spawn_blocking(move || {
            for n in 1..=2_000 {
                store.append(numbered_reading("tank-1", n));
            }
        })
    };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let query = query.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    if let Some(snapshot) = query.sensor("tank-1") {
                        assert!(snapshot.is_consistent());
                        assert!(snapshot.len() <= 50);
                        assert!(snapshot.temp.windows(2).all(|w| w[0] < w[1]));
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    let snapshot = query.sensor("tank-1").unwrap();
    let expected: Vec<f64> = (1_951..=2_000).map(f64::from).collect();
    assert_eq!(snapshot.temp, expected);
}
