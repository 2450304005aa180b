use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::repository::DeltaRepository;

/// Last processed timestamp, or the epoch on a first run.
pub fn get_cursor(repo: &impl DeltaRepository) -> Result<DateTime<Utc>> {
    Ok(repo.latest_delta()?.unwrap_or_default())
}

/// Moves the cursor forward. A timestamp older than the stored one is ignored
/// so the cursor never goes backwards.
pub fn advance(repo: &impl DeltaRepository, new_delta: DateTime<Utc>) -> Result<bool> {
    if let Some(current) = repo.latest_delta()? {
        if new_delta <= current {
            warn!(current = %current, requested = %new_delta, "shop delta not advanced");
            return Ok(false);
        }
    }
    repo.save_delta(new_delta)?;
    debug!(delta = %new_delta, "shop delta advanced");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_first_run_starts_at_epoch() {
        let (_dir, conn) = test_db();
        assert_eq!(get_cursor(&conn).unwrap().timestamp(), 0);
    }

    #[test]
    fn test_advance_moves_cursor() {
        let (_dir, conn) = test_db();
        assert!(advance(&conn, ts("2025-03-01T08:00:00Z")).unwrap());
        assert_eq!(get_cursor(&conn).unwrap(), ts("2025-03-01T08:00:00Z"));
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let (_dir, conn) = test_db();
        advance(&conn, ts("2025-03-01T08:00:00Z")).unwrap();
        assert!(!advance(&conn, ts("2025-02-01T08:00:00Z")).unwrap());
        assert_eq!(get_cursor(&conn).unwrap(), ts("2025-03-01T08:00:00Z"));
    }
}
