//! DuckDB-backed persistence for cached analyses and negotiations.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use duckdb::{Connection, Row, params};
use tcguard_core::normalize::stored_analysis;
use tcguard_core::{CachedAnalysis, ContractFingerprint, NegotiationRecord};
use tracing::info;

use crate::{CacheStore, NegotiationStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS global_contracts (
    fingerprint     VARCHAR PRIMARY KEY,
    analysis        VARCHAR NOT NULL,
    last_analyzed   VARCHAR NOT NULL,
    access_count    BIGINT  NOT NULL DEFAULT 1,
    company_name    VARCHAR NOT NULL,
    document_title  VARCHAR NOT NULL
);
CREATE TABLE IF NOT EXISTS negotiations (
    id              VARCHAR PRIMARY KEY,
    user_id         VARCHAR NOT NULL,
    record          VARCHAR NOT NULL,
    status          VARCHAR NOT NULL,
    created_at      VARCHAR NOT NULL
);
";

/// DuckDB store holding both the `global_contracts` cache table and the
/// `negotiations` table.
///
/// Supports in-memory ([`open`](Self::open)) and file-backed
/// ([`open_persistent`](Self::open_persistent)) modes. Timestamps are stored
/// as RFC 3339 strings; analyses and negotiation records as JSON.
///
/// Queries from the async trait impls run on tokio's blocking pool.
#[derive(Clone)]
pub struct DuckStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open or create a persistent DuckDB database at the given path.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let store = Self::init(Connection::open(path)?)?;
        info!(path = %path.display(), "opened duckdb store");
        Ok(store)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&DuckStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Unavailable(format!("duckdb task failed: {e}")))?
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("duckdb connection lock poisoned".into()))
    }

    /// Number of cached contracts.
    pub fn contract_count(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let n: i64 =
            conn.query_row("SELECT count(*)::BIGINT FROM global_contracts", [], |row| {
                row.get(0)
            })?;
        Ok(n as usize)
    }

    // ── Cache ──

    fn get_contract(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Result<Option<CachedAnalysis>, StoreError> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT fingerprint, analysis, last_analyzed, access_count, company_name, document_title
             FROM global_contracts WHERE fingerprint = ?",
            [fingerprint.as_str()],
            RawContract::from_row,
        );
        match row {
            Ok(raw) => raw.decode().map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_contract(&self, record: &CachedAnalysis) -> Result<(), StoreError> {
        let analysis = serde_json::to_string(&record.analysis)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO global_contracts
             (fingerprint, analysis, last_analyzed, access_count, company_name, document_title)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                record.fingerprint.as_str(),
                analysis,
                record.last_analyzed.to_rfc3339(),
                record.access_count as i64,
                record.company_name,
                record.document_title,
            ],
        )?;
        Ok(())
    }

    fn increment_contract(&self, fingerprint: &ContractFingerprint) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE global_contracts SET access_count = access_count + 1 WHERE fingerprint = ?",
            [fingerprint.as_str()],
        )?;
        Ok(())
    }

    // ── Negotiations ──

    fn upsert_negotiation(&self, record: &NegotiationRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO negotiations (id, user_id, record, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                record.id,
                record.user_id,
                json,
                record.status.as_str(),
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn negotiation_by_id(&self, id: &str) -> Result<Option<NegotiationRecord>, StoreError> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT record FROM negotiations WHERE id = ?",
            [id],
            |row| row.get::<_, String>(0),
        );
        match row {
            Ok(json) => decode_negotiation(id, &json).map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn negotiations_for_user(&self, user_id: &str) -> Result<Vec<NegotiationRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, record FROM negotiations WHERE user_id = ? ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (id, json) = row?;
            records.push(decode_negotiation(&id, &json)?);
        }
        Ok(records)
    }
}

struct RawContract {
    fingerprint: String,
    analysis: String,
    last_analyzed: String,
    access_count: i64,
    company_name: String,
    document_title: String,
}

impl RawContract {
    fn from_row(row: &Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            fingerprint: row.get(0)?,
            analysis: row.get(1)?,
            last_analyzed: row.get(2)?,
            access_count: row.get(3)?,
            company_name: row.get(4)?,
            document_title: row.get(5)?,
        })
    }

    fn decode(self) -> Result<CachedAnalysis, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            key: self.fingerprint.clone(),
            reason,
        };
        let fingerprint = ContractFingerprint::from_hex(&self.fingerprint)
            .ok_or_else(|| corrupt("fingerprint is not a sha-256 hex digest".into()))?;
        let value: serde_json::Value = serde_json::from_str(&self.analysis)?;
        let analysis = stored_analysis(value).map_err(|e| corrupt(e.to_string()))?;
        let last_analyzed = parse_timestamp(&self.last_analyzed).map_err(corrupt)?;
        Ok(CachedAnalysis {
            fingerprint,
            analysis,
            last_analyzed,
            access_count: self.access_count.max(0) as u64,
            company_name: self.company_name,
            document_title: self.document_title,
        })
    }
}

fn decode_negotiation(id: &str, json: &str) -> Result<NegotiationRecord, StoreError> {
    serde_json::from_str(json).map_err(|e| StoreError::Corrupt {
        key: id.to_string(),
        reason: e.to_string(),
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {s:?}: {e}"))
}

#[async_trait]
impl CacheStore for DuckStore {
    async fn get(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Result<Option<CachedAnalysis>, StoreError> {
        let fingerprint = fingerprint.clone();
        self.blocking(move |store| store.get_contract(&fingerprint)).await
    }

    async fn put(&self, record: CachedAnalysis) -> Result<(), StoreError> {
        self.blocking(move |store| store.put_contract(&record)).await
    }

    async fn increment_access_count(
        &self,
        fingerprint: &ContractFingerprint,
    ) -> Result<(), StoreError> {
        let fingerprint = fingerprint.clone();
        self.blocking(move |store| store.increment_contract(&fingerprint)).await
    }
}

#[async_trait]
impl NegotiationStore for DuckStore {
    async fn save_negotiation(&self, record: &NegotiationRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.blocking(move |store| store.upsert_negotiation(&record)).await
    }

    async fn get_negotiation(&self, id: &str) -> Result<Option<NegotiationRecord>, StoreError> {
        let id = id.to_string();
        self.blocking(move |store| store.negotiation_by_id(&id)).await
    }

    async fn list_negotiations(
        &self,
        user_id: &str,
    ) -> Result<Vec<NegotiationRecord>, StoreError> {
        let user_id = user_id.to_string();
        self.blocking(move |store| store.negotiations_for_user(&user_id)).await
    }

    async fn update_negotiation(&self, record: &NegotiationRecord) -> Result<(), StoreError> {
        let record = record.clone();
        self.blocking(move |store| {
            if store.negotiation_by_id(&record.id)?.is_none() {
                return Err(StoreError::NotFound(record.id.clone()));
            }
            store.upsert_negotiation(&record)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tcguard_core::{
        AnalysisResult, CacheMetadata, ClauseAnalysis, NegotiationPayload, NegotiationStatus,
        fingerprint,
    };

    fn record(text: &str) -> CachedAnalysis {
        CachedAnalysis::new(
            fingerprint(text),
            AnalysisResult {
                document_summary: "Arbitration clause found.".into(),
                overall_danger_score: 70,
                clauses: vec![ClauseAnalysis {
                    id: "c1".into(),
                    clause_text: "You waive class actions.".into(),
                    category: "Arbitration".into(),
                    simplified_explanation: String::new(),
                    severity_score: 8,
                    legal_context: "CCPA".into(),
                    actionable_step: "Opt out".into(),
                    flags: vec!["Red Flag".into()],
                }],
            },
            CacheMetadata::default(),
        )
    }

    fn negotiation(user: &str) -> NegotiationRecord {
        let (party, clause) = NegotiationPayload::from_value(serde_json::json!({
            "user_id": user,
            "document_title": "ToS",
            "company_name": "Acme",
            "clause_id": "c1",
            "clause_text": "No refunds.",
            "issue_description": "refunds"
        }))
        .unwrap()
        .into_parts();
        NegotiationRecord::new(party, clause)
    }

    #[test]
    fn open_in_memory_has_empty_cache() {
        let store = DuckStore::open().unwrap();
        assert_eq!(store.contract_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let store = DuckStore::open().unwrap();
        let rec = record("terms");
        store.put(rec.clone()).await.unwrap();
        let got = store.get(&rec.fingerprint).await.unwrap().unwrap();
        assert_eq!(got.analysis, rec.analysis);
        assert_eq!(got.access_count, 1);
        assert_eq!(got.company_name, "Unknown");
    }

    #[tokio::test]
    async fn upsert_and_increment() {
        let store = DuckStore::open().unwrap();
        let mut rec = record("terms");
        store.put(rec.clone()).await.unwrap();
        rec.analysis.overall_danger_score = 20;
        store.put(rec.clone()).await.unwrap();
        store.increment_access_count(&rec.fingerprint).await.unwrap();

        let got = store.get(&rec.fingerprint).await.unwrap().unwrap();
        assert_eq!(got.analysis.overall_danger_score, 20);
        assert_eq!(got.access_count, 2);
        assert_eq!(store.contract_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn reads_legacy_wrapped_analysis() {
        let store = DuckStore::open().unwrap();
        let rec = record("terms");
        let wrapped = serde_json::json!({ "analysis_result": rec.analysis }).to_string();
        store
            .conn()
            .unwrap()
            .execute(
                "INSERT INTO global_contracts VALUES (?, ?, ?, 4, 'Unknown', 'Uploaded Contract')",
                params![rec.fingerprint.as_str(), wrapped, rec.last_analyzed.to_rfc3339()],
            )
            .unwrap();
        let got = store.get(&rec.fingerprint).await.unwrap().unwrap();
        assert_eq!(got.analysis, rec.analysis);
        assert_eq!(got.access_count, 4);
    }

    #[tokio::test]
    async fn persistent_reopen_keeps_records() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("cache.duckdb");
        let rec = record("terms");

        let store = DuckStore::open_persistent(&db_path).unwrap();
        store.put(rec.clone()).await.unwrap();
        drop(store);

        let store = DuckStore::open_persistent(&db_path).unwrap();
        let got = store.get(&rec.fingerprint).await.unwrap().unwrap();
        assert_eq!(got.analysis, rec.analysis);
    }

    #[tokio::test]
    async fn negotiation_lifecycle() {
        let store = DuckStore::open().unwrap();
        let rec = negotiation("alice");
        store.save_negotiation(&rec).await.unwrap();
        store.save_negotiation(&negotiation("bob")).await.unwrap();

        let listed = store.list_negotiations("alice").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].clause_category, "Unknown");

        let updated = rec.clone().with_email("Dear Acme".into());
        store.update_negotiation(&updated).await.unwrap();
        let got = store.get_negotiation(&rec.id).await.unwrap().unwrap();
        assert_eq!(got.status, NegotiationStatus::DraftGenerated);
        assert!(store.get_negotiation("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_negotiation_fails() {
        let store = DuckStore::open().unwrap();
        assert!(matches!(
            store.update_negotiation(&negotiation("alice")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn queries_leave_the_runtime_free() {
        let store = DuckStore::open().unwrap();
        let fp = fingerprint("terms");
        let guard = store.conn().unwrap();

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.get(&fp).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        drop(guard);
        assert!(pending.await.unwrap().unwrap().is_none());
    }
}
