//! Narrow storage interfaces consumed by the engine. The SQLite connection
//! implements all of them; the engine never issues SQL directly.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{Result, SyncError};
use crate::models::{PendingDocument, ShareholderMapping};

pub trait DeltaRepository {
    /// Most recently saved cursor.
    fn latest_delta(&self) -> Result<Option<DateTime<Utc>>>;
    fn save_delta(&self, delta: DateTime<Utc>) -> Result<()>;
}

pub trait ShareholderMappingRepository {
    fn find_mapping(&self, shop_id: &str, ubo_number: u32) -> Result<Option<ShareholderMapping>>;
    fn find_mapping_by_code(&self, shareholder_code: &str) -> Result<Option<ShareholderMapping>>;
    fn find_mappings_for_shop(&self, shop_id: &str) -> Result<Vec<ShareholderMapping>>;
    /// Returns false when the key or the code is already mapped; existing rows are never replaced.
    fn save_mapping(&self, mapping: &ShareholderMapping) -> Result<bool>;
    fn all_mappings(&self) -> Result<Vec<ShareholderMapping>>;
}

pub trait DocRetryRepository {
    fn find_pending(&self, doc_id: &str) -> Result<Option<PendingDocument>>;
    fn find_pending_for_shop(&self, shop_id: &str) -> Result<Vec<PendingDocument>>;
    /// Inserts a new pending row or bumps `times_failed` on the existing one.
    fn record_failure(&self, doc_id: &str, shop_id: &str) -> Result<()>;
    fn delete_pending(&self, doc_id: &str) -> Result<()>;
    fn all_pending(&self) -> Result<Vec<PendingDocument>>;
}

fn mapping_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShareholderMapping> {
    Ok(ShareholderMapping {
        id: row.get(0)?,
        shop_id: row.get(1)?,
        ubo_number: row.get(2)?,
        shareholder_code: row.get(3)?,
    })
}

fn pending_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingDocument> {
    Ok(PendingDocument {
        id: row.get(0)?,
        doc_id: row.get(1)?,
        shop_id: row.get(2)?,
        times_failed: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl DeltaRepository for Connection {
    fn latest_delta(&self) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .query_row("SELECT delta FROM shop_delta ORDER BY id DESC LIMIT 1", [], |row| row.get(0))
            .optional()?;
        match raw {
            Some(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| SyncError::Other(format!("corrupt shop delta {s:?}: {e}"))),
            None => Ok(None),
        }
    }

    fn save_delta(&self, delta: DateTime<Utc>) -> Result<()> {
        self.execute("INSERT INTO shop_delta (delta) VALUES (?1)", [delta.to_rfc3339()])?;
        Ok(())
    }
}

impl ShareholderMappingRepository for Connection {
    fn find_mapping(&self, shop_id: &str, ubo_number: u32) -> Result<Option<ShareholderMapping>> {
        let mapping = self
            .query_row(
                "SELECT id, shop_id, ubo_number, shareholder_code FROM shareholder_mapping \
                 WHERE shop_id = ?1 AND ubo_number = ?2",
                rusqlite::params![shop_id, ubo_number],
                mapping_from_row,
            )
            .optional()?;
        Ok(mapping)
    }

    fn find_mapping_by_code(&self, shareholder_code: &str) -> Result<Option<ShareholderMapping>> {
        let mapping = self
            .query_row(
                "SELECT id, shop_id, ubo_number, shareholder_code FROM shareholder_mapping \
                 WHERE shareholder_code = ?1",
                [shareholder_code],
                mapping_from_row,
            )
            .optional()?;
        Ok(mapping)
    }

    fn find_mappings_for_shop(&self, shop_id: &str) -> Result<Vec<ShareholderMapping>> {
        let mut stmt = self.prepare(
            "SELECT id, shop_id, ubo_number, shareholder_code FROM shareholder_mapping \
             WHERE shop_id = ?1 ORDER BY ubo_number",
        )?;
        let rows = stmt
            .query_map([shop_id], mapping_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn save_mapping(&self, mapping: &ShareholderMapping) -> Result<bool> {
        let inserted = self.execute(
            "INSERT OR IGNORE INTO shareholder_mapping (shop_id, ubo_number, shareholder_code) VALUES (?1, ?2, ?3)",
            rusqlite::params![mapping.shop_id, mapping.ubo_number, mapping.shareholder_code],
        )?;
        Ok(inserted == 1)
    }

    fn all_mappings(&self) -> Result<Vec<ShareholderMapping>> {
        let mut stmt = self.prepare(
            "SELECT id, shop_id, ubo_number, shareholder_code FROM shareholder_mapping \
             ORDER BY shop_id, ubo_number",
        )?;
        let rows = stmt
            .query_map([], mapping_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl DocRetryRepository for Connection {
    fn find_pending(&self, doc_id: &str) -> Result<Option<PendingDocument>> {
        let pending = self
            .query_row(
                "SELECT id, doc_id, shop_id, times_failed, created_at FROM doc_retry WHERE doc_id = ?1",
                [doc_id],
                pending_from_row,
            )
            .optional()?;
        Ok(pending)
    }

    fn find_pending_for_shop(&self, shop_id: &str) -> Result<Vec<PendingDocument>> {
        let mut stmt = self.prepare(
            "SELECT id, doc_id, shop_id, times_failed, created_at FROM doc_retry \
             WHERE shop_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([shop_id], pending_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn record_failure(&self, doc_id: &str, shop_id: &str) -> Result<()> {
        self.execute(
            "INSERT INTO doc_retry (doc_id, shop_id, times_failed) VALUES (?1, ?2, 1) \
             ON CONFLICT(doc_id) DO UPDATE SET times_failed = times_failed + 1",
            rusqlite::params![doc_id, shop_id],
        )?;
        Ok(())
    }

    fn delete_pending(&self, doc_id: &str) -> Result<()> {
        self.execute("DELETE FROM doc_retry WHERE doc_id = ?1", [doc_id])?;
        Ok(())
    }

    fn all_pending(&self) -> Result<Vec<PendingDocument>> {
        let mut stmt = self.prepare(
            "SELECT id, doc_id, shop_id, times_failed, created_at FROM doc_retry ORDER BY shop_id, id",
        )?;
        let rows = stmt
            .query_map([], pending_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn mapping(shop_id: &str, ubo_number: u32, code: &str) -> ShareholderMapping {
        ShareholderMapping {
            id: None,
            shop_id: shop_id.to_string(),
            ubo_number,
            shareholder_code: code.to_string(),
        }
    }

    #[test]
    fn test_delta_round_trip() {
        let (_dir, conn) = test_db();
        assert_eq!(conn.latest_delta().unwrap(), None);
        let first = DateTime::parse_from_rfc3339("2025-01-15T10:00:00Z").unwrap().with_timezone(&Utc);
        let second = DateTime::parse_from_rfc3339("2025-01-16T10:00:00Z").unwrap().with_timezone(&Utc);
        conn.save_delta(first).unwrap();
        conn.save_delta(second).unwrap();
        assert_eq!(conn.latest_delta().unwrap(), Some(second));
    }

    #[test]
    fn test_save_and_find_mapping() {
        let (_dir, conn) = test_db();
        assert!(conn.save_mapping(&mapping("shop1", 1, "SH1")).unwrap());
        let found = conn.find_mapping("shop1", 1).unwrap().unwrap();
        assert_eq!(found.shareholder_code, "SH1");
        assert!(found.id.is_some());
        assert_eq!(conn.find_mapping_by_code("SH1").unwrap().unwrap().ubo_number, 1);
        assert!(conn.find_mapping("shop1", 2).unwrap().is_none());
    }

    #[test]
    fn test_find_mappings_for_shop_is_ordered_by_ubo() {
        let (_dir, conn) = test_db();
        conn.save_mapping(&mapping("shop1", 3, "SH3")).unwrap();
        conn.save_mapping(&mapping("shop1", 1, "SH1")).unwrap();
        conn.save_mapping(&mapping("shop2", 1, "SH9")).unwrap();
        let codes: Vec<String> = conn
            .find_mappings_for_shop("shop1")
            .unwrap()
            .into_iter()
            .map(|m| m.shareholder_code)
            .collect();
        assert_eq!(codes, vec!["SH1", "SH3"]);
    }

    #[test]
    fn test_existing_mapping_is_never_overwritten() {
        let (_dir, conn) = test_db();
        assert!(conn.save_mapping(&mapping("shop1", 1, "SH1")).unwrap());
        assert!(!conn.save_mapping(&mapping("shop1", 1, "SH9")).unwrap());
        assert_eq!(conn.find_mapping("shop1", 1).unwrap().unwrap().shareholder_code, "SH1");
        assert!(conn.find_mapping_by_code("SH9").unwrap().is_none());
    }

    #[test]
    fn test_code_is_attached_to_one_key_only() {
        let (_dir, conn) = test_db();
        assert!(conn.save_mapping(&mapping("shop1", 1, "SH1")).unwrap());
        assert!(!conn.save_mapping(&mapping("shop2", 3, "SH1")).unwrap());
        assert!(conn.find_mapping("shop2", 3).unwrap().is_none());
        assert_eq!(conn.all_mappings().unwrap().len(), 1);
    }

    #[test]
    fn test_record_failure_bumps_counter() {
        let (_dir, conn) = test_db();
        conn.record_failure("doc1", "shop1").unwrap();
        conn.record_failure("doc1", "shop1").unwrap();
        conn.record_failure("doc2", "shop1").unwrap();
        let pending = conn.find_pending("doc1").unwrap().unwrap();
        assert_eq!(pending.times_failed, 2);
        assert_eq!(conn.find_pending_for_shop("shop1").unwrap().len(), 2);
        conn.delete_pending("doc1").unwrap();
        assert!(conn.find_pending("doc1").unwrap().is_none());
        assert_eq!(conn.all_pending().unwrap().len(), 1);
    }
}
