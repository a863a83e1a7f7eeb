use tracing::{debug, warn};

use crate::model::{Target, clamp_frequency};
use crate::store::{StoreError, TargetStore, decode};

/// A target selected for probing, with the record as it was read.
#[derive(Debug, Clone)]
pub struct DueTarget {
    pub key: String,
    pub target: Target,
    /// Stored JSON at selection time, the expected value of a conditional write
    pub snapshot: String,
}

/// Whether `target` should be probed at `now` (epoch seconds).
///
/// Never-checked targets are always due. Otherwise a target is due once its
/// interval has fully elapsed, the boundary included. Stored intervals below
/// `floor` count as `floor`.
pub fn is_due(target: &Target, now: i64, floor: u64) -> bool {
    let interval = clamp_frequency(target.frequency, floor);
    match target.last_checked_at {
        None => true,
        Some(last) => now.saturating_sub(last) >= i64::try_from(interval).unwrap_or(i64::MAX),
    }
}

/// Read up to `limit` targets and keep the ones due at `now`, with intervals
/// raised to `floor`.
///
/// Records that vanished, cannot be read or do not decode are skipped. Only a
/// failure to list the keys is an error, in which case nothing is selected.
pub async fn select_due(
    store: &TargetStore,
    now: i64,
    limit: usize,
    floor: u64,
) -> Result<Vec<DueTarget>, StoreError> {
    let keys = store.list_keys(limit).await?;
    debug!("Listed {} target keys", keys.len());

    let mut due = Vec::new();
    for key in keys {
        let snapshot = match store.get_raw(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "target removed since listing, skipping");
                continue;
            }
            Err(e) => {
                warn!(key = %key, "failed to read target, skipping: {e}");
                continue;
            }
        };

        let target = match decode(&snapshot) {
            Ok(target) => target,
            Err(e) => {
                warn!(key = %key, "malformed target record, skipping: {e}");
                continue;
            }
        };

        if is_due(&target, now, floor) {
            due.push(DueTarget { key, target, snapshot });
        }
    }

    Ok(due)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DEFAULT_MIN_FREQUENCY, target_key};
    use crate::store::{KvStore, MemoryStore};
    use std::sync::Arc;

    const T: i64 = 1_700_000_000;

    fn checked(url: &str, frequency: u64, last: i64) -> Target {
        let mut target = Target::new(url, frequency, T - 3600);
        target.last_checked_at = Some(last);
        target
    }

    #[test]
    fn test_never_checked_is_always_due() {
        let target = Target::new("https://a.test", 3600, T);
        for now in [i64::MIN, 0, T, i64::MAX] {
            assert!(is_due(&target, now, DEFAULT_MIN_FREQUENCY));
        }
    }

    #[test]
    fn test_interval_boundary_is_inclusive() {
        let target = checked("https://a.test", 60, T);

        assert!(!is_due(&target, T, DEFAULT_MIN_FREQUENCY));
        assert!(!is_due(&target, T + 59, DEFAULT_MIN_FREQUENCY));
        assert!(is_due(&target, T + 60, DEFAULT_MIN_FREQUENCY));
        assert!(is_due(&target, T + 61, DEFAULT_MIN_FREQUENCY));
    }

    #[test]
    fn test_interval_below_floor_counts_as_floor() {
        let target = checked("https://a.test", 10, T);

        assert!(!is_due(&target, T + 10, DEFAULT_MIN_FREQUENCY));
        assert!(!is_due(&target, T + 59, DEFAULT_MIN_FREQUENCY));
        assert!(is_due(&target, T + 60, DEFAULT_MIN_FREQUENCY));
        assert!(!is_due(&checked("https://a.test", 60, T), T + 60, 300));
    }

    #[tokio::test]
    async fn test_select_due_applies_floor_to_stored_records() {
        let kv = Arc::new(MemoryStore::new());
        let store = TargetStore::new(kv.clone());
        let raw = r#"{"url":"https://legacy.test","frequency":10,"lastCheckedAt":1000,"createdAt":1,"status":"up","responseTime":20,"statusCode":200}"#;
        kv.put(&target_key("https://legacy.test"), raw).await.unwrap();

        assert!(select_due(&store, 1010, 1000, DEFAULT_MIN_FREQUENCY).await.unwrap().is_empty());
        assert_eq!(select_due(&store, 1060, 1000, DEFAULT_MIN_FREQUENCY).await.unwrap().len(), 1);
    }

    #[test]
    fn test_clock_going_backwards_is_not_due() {
        assert!(!is_due(&checked("https://a.test", 60, T), T - 120, DEFAULT_MIN_FREQUENCY));
    }

    #[tokio::test]
    async fn test_select_due_filters_and_skips_malformed() {
        let kv = Arc::new(MemoryStore::new());
        let store = TargetStore::new(kv.clone());

        store.put_target(&Target::new("https://new.test", 60, T)).await.unwrap();
        store.put_target(&checked("https://fresh.test", 60, T)).await.unwrap();
        store.put_target(&checked("https://stale.test", 60, T - 60)).await.unwrap();
        kv.put(&target_key("https://broken.test"), "not json").await.unwrap();

        let due = select_due(&store, T + 30, 1000, DEFAULT_MIN_FREQUENCY).await.unwrap();
        let urls: Vec<_> = due.iter().map(|d| d.target.url.as_str()).collect();

        assert_eq!(urls, vec!["https://new.test", "https://stale.test"]);
        assert_eq!(due[0].key, target_key("https://new.test"));
        assert_eq!(due[0].snapshot, kv.get(&due[0].key).await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn test_select_due_respects_listing_limit() {
        let store = TargetStore::new(Arc::new(MemoryStore::new()));
        for i in 0..5 {
            store.put_target(&Target::new(format!("https://{i}.test"), 60, T)).await.unwrap();
        }

        assert_eq!(select_due(&store, T, 3, DEFAULT_MIN_FREQUENCY).await.unwrap().len(), 3);
    }
}
