//! Upserts and identifier lookups for the synchronized matter tables.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;

use docketsync_core::errors::{Error, Result};
use docketsync_core::sync::ports::{IdentifierLookup, UpsertWriter};
use docketsync_core::sync::{BatchResult, FailedRecord, SyncEntity, SyncRecord, UserRecord};

use super::model::{
    case_rows, contact_rows, expense_rows, invoice_rows, task_rows, UserDB, UserLinkDB,
};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{cases, contacts, expenses, invoices, tasks, users};
use crate::sync::timestamp_to_db;

/// Stay well below SQLite's bound-parameter limit.
const LOOKUP_CHUNK_SIZE: usize = 500;

diesel::define_sql_function! {
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpsertOutcome {
    Written,
    /// Nothing to write (a user with no internal account).
    Skipped,
}

pub struct SyncRecordRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncRecordRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    pub fn resolve_external_ids_impl(
        &self,
        entity: SyncEntity,
        external_ids: &[String],
    ) -> Result<HashMap<String, i64>> {
        let mut conn = get_connection(&self.pool)?;
        let mut resolved = HashMap::with_capacity(external_ids.len());
        for chunk in external_ids.chunks(LOOKUP_CHUNK_SIZE) {
            let rows = lookup_chunk(&mut conn, entity, chunk.to_vec()).map_err(StorageError::from)?;
            resolved.extend(
                rows.into_iter()
                    .filter_map(|(internal_id, external_id)| external_id.map(|e| (e, internal_id))),
            );
        }
        Ok(resolved)
    }

    /// Number of rows of `entity` that carry an external id.
    pub fn count_synced(&self, entity: SyncEntity) -> Result<i64> {
        let mut conn = get_connection(&self.pool)?;
        let count = match entity {
            SyncEntity::Case => cases::table
                .filter(cases::external_id.is_not_null())
                .count()
                .get_result(&mut conn),
            SyncEntity::Contact => contacts::table
                .filter(contacts::external_id.is_not_null())
                .count()
                .get_result(&mut conn),
            SyncEntity::User => users::table
                .filter(users::external_id.is_not_null())
                .count()
                .get_result(&mut conn),
            SyncEntity::Task => tasks::table
                .filter(tasks::external_id.is_not_null())
                .count()
                .get_result(&mut conn),
            SyncEntity::Invoice => invoices::table
                .filter(invoices::external_id.is_not_null())
                .count()
                .get_result(&mut conn),
            SyncEntity::Expense => expenses::table
                .filter(expenses::external_id.is_not_null())
                .count()
                .get_result(&mut conn),
        }
        .map_err(StorageError::from)?;
        Ok(count)
    }

    /// Write a batch in one transaction; on failure retry each record in its
    /// own savepoint so only the offending records are rejected.
    pub async fn upsert_batch(
        &self,
        entity: SyncEntity,
        records: Vec<SyncRecord>,
    ) -> Result<BatchResult> {
        if records.is_empty() {
            return Ok(BatchResult::AllSucceeded { count: 0 });
        }

        self.writer
            .exec(move |conn| {
                let now = timestamp_to_db(Utc::now());

                let batch = conn.transaction::<usize, StorageError, _>(|conn| {
                    let mut written = 0;
                    for record in &records {
                        if upsert_one(conn, entity, record, &now)? == UpsertOutcome::Written {
                            written += 1;
                        }
                    }
                    Ok(written)
                });

                let err = match batch {
                    Ok(count) => return Ok(BatchResult::AllSucceeded { count }),
                    Err(err) => err,
                };
                warn!(
                    "[MatterSync] {} batch of {} failed ({}), retrying record by record",
                    entity,
                    records.len(),
                    err
                );

                let mut succeeded = 0;
                let mut failed = Vec::new();
                for record in &records {
                    match conn.transaction::<UpsertOutcome, StorageError, _>(|conn| {
                        upsert_one(conn, entity, record, &now)
                    }) {
                        Ok(UpsertOutcome::Written) => succeeded += 1,
                        Ok(UpsertOutcome::Skipped) => {}
                        Err(err) => failed.push(FailedRecord {
                            external_id: record.external_id().to_string(),
                            reason: err.to_string(),
                        }),
                    }
                }
                Ok(BatchResult::from_outcome(succeeded, failed))
            })
            .await
    }
}

fn lookup_chunk(
    conn: &mut SqliteConnection,
    entity: SyncEntity,
    chunk: Vec<String>,
) -> QueryResult<Vec<(i64, Option<String>)>> {
    match entity {
        SyncEntity::Case => cases::table
            .filter(cases::external_id.eq_any(chunk))
            .select((cases::id, cases::external_id))
            .load(conn),
        SyncEntity::Contact => contacts::table
            .filter(contacts::external_id.eq_any(chunk))
            .select((contacts::id, contacts::external_id))
            .load(conn),
        SyncEntity::User => users::table
            .filter(users::external_id.eq_any(chunk))
            .select((users::id, users::external_id))
            .load(conn),
        SyncEntity::Task => tasks::table
            .filter(tasks::external_id.eq_any(chunk))
            .select((tasks::id, tasks::external_id))
            .load(conn),
        SyncEntity::Invoice => invoices::table
            .filter(invoices::external_id.eq_any(chunk))
            .select((invoices::id, invoices::external_id))
            .load(conn),
        SyncEntity::Expense => expenses::table
            .filter(expenses::external_id.eq_any(chunk))
            .select((expenses::id, expenses::external_id))
            .load(conn),
    }
}

fn upsert_one(
    conn: &mut SqliteConnection,
    entity: SyncEntity,
    record: &SyncRecord,
    now: &str,
) -> std::result::Result<UpsertOutcome, StorageError> {
    if record.entity() != entity {
        return Err(StorageError::Core(Error::validation(format!(
            "{} record in a {} batch",
            record.entity(),
            entity
        ))));
    }

    match record {
        SyncRecord::Case(r) => {
            let (row, changes) = case_rows(r, now);
            diesel::insert_into(cases::table)
                .values(&row)
                .on_conflict(cases::external_id)
                .do_update()
                .set(&changes)
                .execute(conn)?;
        }
        SyncRecord::Contact(r) => {
            let (row, changes) = contact_rows(r, now);
            diesel::insert_into(contacts::table)
                .values(&row)
                .on_conflict(contacts::external_id)
                .do_update()
                .set(&changes)
                .execute(conn)?;
        }
        SyncRecord::User(r) => return link_user(conn, r, now),
        SyncRecord::Task(r) => {
            let (row, changes) = task_rows(r, now);
            diesel::insert_into(tasks::table)
                .values(&row)
                .on_conflict(tasks::external_id)
                .do_update()
                .set(&changes)
                .execute(conn)?;
        }
        SyncRecord::Invoice(r) => {
            let (row, changes) = invoice_rows(r, now);
            diesel::insert_into(invoices::table)
                .values(&row)
                .on_conflict(invoices::external_id)
                .do_update()
                .set(&changes)
                .execute(conn)?;
        }
        SyncRecord::Expense(r) => {
            let (row, changes) = expense_rows(r, now);
            diesel::insert_into(expenses::table)
                .values(&row)
                .on_conflict(expenses::external_id)
                .do_update()
                .set(&changes)
                .execute(conn)?;
        }
    }
    Ok(UpsertOutcome::Written)
}

/// Link an existing internal user to its external account by email.
fn link_user(
    conn: &mut SqliteConnection,
    record: &UserRecord,
    now: &str,
) -> std::result::Result<UpsertOutcome, StorageError> {
    let linked = users::table
        .filter(users::external_id.eq(&record.external_id))
        .select(UserDB::as_select())
        .first::<UserDB>(conn)
        .optional()?;

    let target = match linked {
        Some(user) => user,
        None => {
            let by_email = users::table
                .filter(lower(users::email).eq(record.email.to_lowercase()))
                .select(UserDB::as_select())
                .first::<UserDB>(conn)
                .optional()?;
            match by_email {
                None => {
                    debug!(
                        "[MatterSync] No internal user with email {} for external user {}",
                        record.email, record.external_id
                    );
                    return Ok(UpsertOutcome::Skipped);
                }
                Some(user) => {
                    if let Some(existing) = user.external_id.as_deref() {
                        return Err(StorageError::Core(Error::conflict(format!(
                            "user {} is already linked to external id {}",
                            user.email, existing
                        ))));
                    }
                    user
                }
            }
        }
    };

    diesel::update(users::table.find(target.id))
        .set(&UserLinkDB {
            external_id: target
                .external_id
                .is_none()
                .then(|| record.external_id.clone()),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            synced_at: now.to_string(),
            updated_at: now.to_string(),
        })
        .execute(conn)?;
    Ok(UpsertOutcome::Written)
}

#[async_trait]
impl IdentifierLookup for SyncRecordRepository {
    async fn resolve_external_ids(
        &self,
        entity: SyncEntity,
        external_ids: Vec<String>,
    ) -> std::result::Result<HashMap<String, i64>, String> {
        self.resolve_external_ids_impl(entity, &external_ids)
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl UpsertWriter for SyncRecordRepository {
    async fn upsert_records(
        &self,
        entity: SyncEntity,
        records: Vec<SyncRecord>,
    ) -> std::result::Result<BatchResult, String> {
        self.upsert_batch(entity, records)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use crate::sync::records::model::{CaseDB, InvoiceDB, TaskDB};
    use docketsync_core::sync::{
        CaseRecord, CaseStatus, InvoiceRecord, InvoiceStatus, TaskRecord, TaskStatus,
    };
    use rust_decimal_macros::dec;
    use tempfile::{tempdir, TempDir};

    fn setup_db() -> (TempDir, Arc<DbPool>, SyncRecordRepository) {
        let dir = tempdir().expect("tempdir");
        let db_path = init(&dir.path().to_string_lossy()).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        let repo = SyncRecordRepository::new(pool.clone(), writer);
        (dir, pool, repo)
    }

    fn case(external_id: &str, title: &str) -> SyncRecord {
        SyncRecord::Case(CaseRecord {
            external_id: external_id.to_string(),
            title: title.to_string(),
            case_number: Some("2026-0001".to_string()),
            status: CaseStatus::Active,
            description: None,
            practice_area: None,
            open_date: None,
            close_date: None,
        })
    }

    fn task(external_id: &str, case_id: Option<i64>) -> SyncRecord {
        SyncRecord::Task(TaskRecord {
            external_id: external_id.to_string(),
            title: "Draft motion".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: "normal".to_string(),
            due_date: None,
            case_id,
            assigned_user_id: None,
        })
    }

    fn insert_user(pool: &DbPool, user_id: i64, email: &str, external_id: Option<&str>) {
        let mut conn = get_connection(pool).expect("conn");
        diesel::insert_into(users::table)
            .values(&UserDB {
                id: user_id,
                external_id: external_id.map(str::to_string),
                email: email.to_string(),
                first_name: None,
                last_name: None,
                is_active: true,
                synced_at: None,
                created_at: "2026-01-01T00:00:00.000000Z".to_string(),
                updated_at: "2026-01-01T00:00:00.000000Z".to_string(),
            })
            .execute(&mut conn)
            .expect("insert user");
    }

    fn load_cases(pool: &DbPool) -> Vec<CaseDB> {
        let mut conn = get_connection(pool).expect("conn");
        cases::table
            .order(cases::id)
            .select(CaseDB::as_select())
            .load(&mut conn)
            .expect("load cases")
    }

    #[tokio::test]
    async fn upsert_is_idempotent_and_keeps_identity() {
        let (_dir, pool, repo) = setup_db();

        let first = repo
            .upsert_batch(SyncEntity::Case, vec![case("m-1", "Doe v. Roe")])
            .await
            .expect("first upsert");
        assert_eq!(first, BatchResult::AllSucceeded { count: 1 });
        let before = load_cases(&pool);

        repo.upsert_batch(SyncEntity::Case, vec![case("m-1", "Doe v. Roe (amended)")])
            .await
            .expect("second upsert");
        let after = load_cases(&pool);

        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[0].created_at, before[0].created_at);
        assert_eq!(after[0].external_id.as_deref(), Some("m-1"));
        assert_eq!(after[0].title, "Doe v. Roe (amended)");
        assert_eq!(after[0].status, "active");
    }

    #[tokio::test]
    async fn resolves_only_known_external_ids() {
        let (_dir, _pool, repo) = setup_db();
        repo.upsert_batch(
            SyncEntity::Case,
            vec![case("m-1", "One"), case("m-2", "Two")],
        )
        .await
        .expect("upsert");

        let resolved = repo
            .resolve_external_ids_impl(
                SyncEntity::Case,
                &["m-1".to_string(), "m-404".to_string()],
            )
            .expect("resolve");

        assert_eq!(resolved.len(), 1);
        assert!(resolved.contains_key("m-1"));
        assert_eq!(repo.count_synced(SyncEntity::Case).expect("count"), 2);
    }

    #[tokio::test]
    async fn unresolved_reference_is_written_as_null_and_cleared_on_update() {
        let (_dir, pool, repo) = setup_db();
        repo.upsert_batch(SyncEntity::Case, vec![case("m-1", "One")])
            .await
            .expect("case");
        let case_id = load_cases(&pool)[0].id;

        repo.upsert_batch(SyncEntity::Task, vec![task("t-1", Some(case_id))])
            .await
            .expect("task with case");
        repo.upsert_batch(SyncEntity::Task, vec![task("t-1", None)])
            .await
            .expect("task without case");

        let mut conn = get_connection(&pool).expect("conn");
        let stored = tasks::table
            .select(TaskDB::as_select())
            .first(&mut conn)
            .expect("task row");
        assert_eq!(stored.case_id, None);
    }

    #[tokio::test]
    async fn bad_record_fails_alone() {
        let (_dir, pool, repo) = setup_db();

        let result = repo
            .upsert_batch(
                SyncEntity::Task,
                vec![task("t-1", None), task("t-2", Some(9999)), task("t-3", None)],
            )
            .await
            .expect("batch");

        assert_eq!(result.succeeded(), 2);
        assert_eq!(result.failed().len(), 1);
        assert_eq!(result.failed()[0].external_id, "t-2");

        let mut conn = get_connection(&pool).expect("conn");
        let stored: i64 = tasks::table.count().get_result(&mut conn).expect("count");
        assert_eq!(stored, 2);
    }

    #[tokio::test]
    async fn invoice_amounts_are_stored_as_decimal_text() {
        let (_dir, pool, repo) = setup_db();
        let invoice = SyncRecord::Invoice(InvoiceRecord {
            external_id: "i-1".to_string(),
            invoice_number: Some("INV-1".to_string()),
            issue_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1),
            due_date: None,
            subtotal: dec!(1500.00),
            tax: dec!(0.00),
            discount: dec!(0.00),
            total: dec!(1500.00),
            paid: dec!(0.00),
            outstanding: dec!(1500.00),
            status: InvoiceStatus::Unpaid,
            case_id: None,
            contact_id: None,
        });

        repo.upsert_batch(SyncEntity::Invoice, vec![invoice])
            .await
            .expect("invoice");

        let mut conn = get_connection(&pool).expect("conn");
        let stored = invoices::table
            .select(InvoiceDB::as_select())
            .first(&mut conn)
            .expect("invoice row");
        assert_eq!(stored.total, "1500.00");
        assert_eq!(stored.issue_date.as_deref(), Some("2026-03-01"));
        assert_eq!(stored.status, "unpaid");
    }

    #[tokio::test]
    async fn users_are_linked_by_email_never_created() {
        let (_dir, pool, repo) = setup_db();
        insert_user(&pool, 1, "Lead@Firm.Example", None);
        insert_user(&pool, 2, "other@firm.example", Some("u-other"));

        let result = repo
            .upsert_batch(
                SyncEntity::User,
                vec![
                    SyncRecord::User(UserRecord {
                        external_id: "u-1".to_string(),
                        email: "lead@firm.example".to_string(),
                        first_name: Some("Lee".to_string()),
                        last_name: None,
                    }),
                    SyncRecord::User(UserRecord {
                        external_id: "u-2".to_string(),
                        email: "other@firm.example".to_string(),
                        first_name: None,
                        last_name: None,
                    }),
                    SyncRecord::User(UserRecord {
                        external_id: "u-3".to_string(),
                        email: "nobody@firm.example".to_string(),
                        first_name: None,
                        last_name: None,
                    }),
                ],
            )
            .await
            .expect("users");

        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.failed().len(), 1);
        assert_eq!(result.failed()[0].external_id, "u-2");

        let resolved = repo
            .resolve_external_ids_impl(SyncEntity::User, &["u-1".to_string(), "u-3".to_string()])
            .expect("resolve");
        assert_eq!(resolved.get("u-1"), Some(&1));
        assert!(!resolved.contains_key("u-3"));

        let mut conn = get_connection(&pool).expect("conn");
        let total: i64 = users::table.count().get_result(&mut conn).expect("count");
        assert_eq!(total, 2);
    }
}
