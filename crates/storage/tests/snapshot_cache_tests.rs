//! Snapshot cache behaviour under overlapping cycles.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use forecast_common::{
    estimate, CanonicalRecord, CurrentConditions, DayForecast, Location, MonthOutlook, SeasonalOutlook,
    ShortRangeForecast, SourceKind,
};
use storage::{CacheEntry, SnapshotCache};
use test_utils::temp_test_dir_with_prefix;

fn short_range(precipitation: f64) -> CanonicalRecord {
    let now = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
    let derived = estimate(precipitation);
    CanonicalRecord::ShortRange(ShortRangeForecast {
        current: CurrentConditions::new(precipitation, 30.0, derived, now),
        days: (0..7)
            .map(|d| DayForecast::new(d, now.date_naive(), precipitation, 30.0, derived))
            .collect(),
        location: Location::yucatan_site(),
        produced_at: now,
    })
}

fn seasonal() -> CanonicalRecord {
    CanonicalRecord::Seasonal(SeasonalOutlook {
        months: ["2026-10", "2026-11", "2026-12"]
            .iter()
            .map(|k| MonthOutlook {
                month_key: k.to_string(),
                precipitation_mm: 80.0,
                probability_pct: 50.0,
            })
            .collect(),
        location: Location::yucatan_site(),
        produced_at: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
    })
}

// ============================================================================
// Overwrite semantics
// ============================================================================

#[tokio::test]
async fn test_second_write_overwrites_first() {
    let dir = temp_test_dir_with_prefix("snapshot_");
    let cache = SnapshotCache::new(dir.path());

    cache.write(&short_range(1.0)).await.unwrap();
    let second = cache.write(&short_range(9.0)).await.unwrap();

    let read = cache.read(SourceKind::ShortRange).await.unwrap().unwrap();
    assert_eq!(read, second);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_kinds_are_independent() {
    let dir = temp_test_dir_with_prefix("snapshot_");
    let cache = SnapshotCache::new(dir.path());

    cache.write(&short_range(3.0)).await.unwrap();
    cache.write(&seasonal()).await.unwrap();

    let short = cache.read(SourceKind::ShortRange).await.unwrap().unwrap();
    let long = cache.read(SourceKind::Seasonal).await.unwrap().unwrap();
    assert_eq!(short.record, short_range(3.0));
    assert_eq!(long.record, seasonal());
}

#[tokio::test]
async fn test_snapshot_file_round_trips() {
    let dir = temp_test_dir_with_prefix("snapshot_");
    let cache = SnapshotCache::new(dir.path());
    let written = cache.write(&seasonal()).await.unwrap();

    let bytes = std::fs::read(cache.path_for(SourceKind::Seasonal)).unwrap();
    let parsed: CacheEntry = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed, written);

    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["kind"], "seasonal");
    assert!(doc["storedAt"].is_string());
    assert_eq!(doc["record"]["seasonal"]["months"][2]["monthKey"], "2026-12");
}

#[tokio::test]
async fn test_decoded_values_read_back_bit_exact() {
    let dir = temp_test_dir_with_prefix("snapshot_");
    let cache = SnapshotCache::new(dir.path());

    // Float variables widened to f64, and packed shorts times scale_factor.
    let now = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
    let widened = f64::from(913.901_733_398_437_5_f32);
    let record = CanonicalRecord::ShortRange(ShortRangeForecast {
        current: CurrentConditions::new(widened, f64::from(0.1_f32), estimate(widened), now),
        days: (0..7u32)
            .map(|t| {
                let precipitation = (t * 100 + 1) as f64 * 0.01;
                DayForecast::new(t, now.date_naive(), precipitation, f64::from(40.3_f32), estimate(precipitation))
            })
            .collect(),
        location: Location::new(20.6537, -88.446, "Tahcabo, Yucatán"),
        produced_at: now,
    });

    let written = cache.write(&record).await.unwrap();
    let read = cache.read(SourceKind::ShortRange).await.unwrap().unwrap();
    assert_eq!(read, written);
    assert_eq!(read.record, record);

    let days = match read.record {
        CanonicalRecord::ShortRange(f) => f.days,
        other => panic!("unexpected record {:?}", other),
    };
    for (t, day) in days.iter().enumerate() {
        let expected = (t as u32 * 100 + 1) as f64 * 0.01;
        assert_eq!(day.precipitation_mm.to_bits(), expected.to_bits(), "day {}", t);
    }
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_leave_one_complete_snapshot() {
    let dir = temp_test_dir_with_prefix("snapshot_");
    let cache = Arc::new(SnapshotCache::new(dir.path()));

    let mut handles = Vec::new();
    for i in 0..16 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            let record = if i % 2 == 0 { short_range(i as f64) } else { seasonal() };
            cache.write(&record).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let short = cache.read(SourceKind::ShortRange).await.unwrap().unwrap();
    assert_eq!(short.kind, SourceKind::ShortRange);
    let precipitation = match short.record {
        CanonicalRecord::ShortRange(f) => f.current.precipitation_mm,
        other => panic!("unexpected record {:?}", other),
    };
    assert!((0..16).step_by(2).any(|i| i as f64 == precipitation));

    assert!(cache.read(SourceKind::Seasonal).await.unwrap().is_some());
}
