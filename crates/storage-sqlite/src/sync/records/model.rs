//! Database models for the synchronized matter tables.
//!
//! Each table has an insert row (carries `external_id` and `created_at`) and
//! a changeset (business fields plus `synced_at`/`updated_at` only), so the
//! update path can never rewrite identity columns.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use docketsync_core::sync::{
    CaseRecord, ContactRecord, ExpenseRecord, InvoiceRecord, TaskRecord,
};

fn date_to_db(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

// ── Cases ────────────────────────────────────────────────────────────────

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::cases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CaseDB {
    pub id: i64,
    pub external_id: Option<String>,
    pub title: String,
    pub case_number: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub practice_area: Option<String>,
    pub open_date: Option<String>,
    pub close_date: Option<String>,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::cases)]
pub struct NewCaseDB {
    pub external_id: String,
    pub title: String,
    pub case_number: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub practice_area: Option<String>,
    pub open_date: Option<String>,
    pub close_date: Option<String>,
    pub synced_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::cases)]
#[diesel(treat_none_as_null = true)]
pub struct CaseChangesDB {
    pub title: String,
    pub case_number: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub practice_area: Option<String>,
    pub open_date: Option<String>,
    pub close_date: Option<String>,
    pub synced_at: String,
    pub updated_at: String,
}

pub fn case_rows(record: &CaseRecord, now: &str) -> (NewCaseDB, CaseChangesDB) {
    let changes = CaseChangesDB {
        title: record.title.clone(),
        case_number: record.case_number.clone(),
        status: record.status.as_str().to_string(),
        description: record.description.clone(),
        practice_area: record.practice_area.clone(),
        open_date: date_to_db(record.open_date),
        close_date: date_to_db(record.close_date),
        synced_at: now.to_string(),
        updated_at: now.to_string(),
    };
    let insert = NewCaseDB {
        external_id: record.external_id.clone(),
        title: changes.title.clone(),
        case_number: changes.case_number.clone(),
        status: changes.status.clone(),
        description: changes.description.clone(),
        practice_area: changes.practice_area.clone(),
        open_date: changes.open_date.clone(),
        close_date: changes.close_date.clone(),
        synced_at: now.to_string(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    (insert, changes)
}

// ── Contacts ─────────────────────────────────────────────────────────────

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::contacts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContactDB {
    pub id: i64,
    pub external_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub contact_type: String,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::contacts)]
pub struct NewContactDB {
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub contact_type: String,
    pub synced_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::contacts)]
#[diesel(treat_none_as_null = true)]
pub struct ContactChangesDB {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub contact_type: String,
    pub synced_at: String,
    pub updated_at: String,
}

pub fn contact_rows(record: &ContactRecord, now: &str) -> (NewContactDB, ContactChangesDB) {
    let insert = NewContactDB {
        external_id: record.external_id.clone(),
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        email: record.email.clone(),
        phone: record.phone.clone(),
        company: record.company.clone(),
        contact_type: record.kind.as_str().to_string(),
        synced_at: now.to_string(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    let changes = ContactChangesDB {
        first_name: insert.first_name.clone(),
        last_name: insert.last_name.clone(),
        email: insert.email.clone(),
        phone: insert.phone.clone(),
        company: insert.company.clone(),
        contact_type: insert.contact_type.clone(),
        synced_at: now.to_string(),
        updated_at: now.to_string(),
    };
    (insert, changes)
}

// ── Users ────────────────────────────────────────────────────────────────

/// Internal users are provisioned elsewhere; the sync only links them.
#[derive(
    Queryable, Identifiable, Insertable, Selectable, Debug, Clone, Serialize, Deserialize,
)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: i64,
    pub external_id: Option<String>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Link-time update: names are only overwritten when the source has them.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct UserLinkDB {
    pub external_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub synced_at: String,
    pub updated_at: String,
}

// ── Tasks ────────────────────────────────────────────────────────────────

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskDB {
    pub id: i64,
    pub external_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<String>,
    pub case_id: Option<i64>,
    pub assigned_user_id: Option<i64>,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTaskDB {
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<String>,
    pub case_id: Option<i64>,
    pub assigned_user_id: Option<i64>,
    pub synced_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangesDB {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub due_date: Option<String>,
    pub case_id: Option<i64>,
    pub assigned_user_id: Option<i64>,
    pub synced_at: String,
    pub updated_at: String,
}

pub fn task_rows(record: &TaskRecord, now: &str) -> (NewTaskDB, TaskChangesDB) {
    let insert = NewTaskDB {
        external_id: record.external_id.clone(),
        title: record.title.clone(),
        description: record.description.clone(),
        status: record.status.as_str().to_string(),
        priority: record.priority.clone(),
        due_date: date_to_db(record.due_date),
        case_id: record.case_id,
        assigned_user_id: record.assigned_user_id,
        synced_at: now.to_string(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    let changes = TaskChangesDB {
        title: insert.title.clone(),
        description: insert.description.clone(),
        status: insert.status.clone(),
        priority: insert.priority.clone(),
        due_date: insert.due_date.clone(),
        case_id: insert.case_id,
        assigned_user_id: insert.assigned_user_id,
        synced_at: now.to_string(),
        updated_at: now.to_string(),
    };
    (insert, changes)
}

// ── Invoices ─────────────────────────────────────────────────────────────

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::invoices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InvoiceDB {
    pub id: i64,
    pub external_id: Option<String>,
    pub invoice_number: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub subtotal: String,
    pub tax: String,
    pub discount: String,
    pub total: String,
    pub paid: String,
    pub outstanding: String,
    pub status: String,
    pub case_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::invoices)]
pub struct NewInvoiceDB {
    pub external_id: String,
    pub invoice_number: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub subtotal: String,
    pub tax: String,
    pub discount: String,
    pub total: String,
    pub paid: String,
    pub outstanding: String,
    pub status: String,
    pub case_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub synced_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::invoices)]
#[diesel(treat_none_as_null = true)]
pub struct InvoiceChangesDB {
    pub invoice_number: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub subtotal: String,
    pub tax: String,
    pub discount: String,
    pub total: String,
    pub paid: String,
    pub outstanding: String,
    pub status: String,
    pub case_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub synced_at: String,
    pub updated_at: String,
}

pub fn invoice_rows(record: &InvoiceRecord, now: &str) -> (NewInvoiceDB, InvoiceChangesDB) {
    let insert = NewInvoiceDB {
        external_id: record.external_id.clone(),
        invoice_number: record.invoice_number.clone(),
        issue_date: date_to_db(record.issue_date),
        due_date: date_to_db(record.due_date),
        subtotal: record.subtotal.to_string(),
        tax: record.tax.to_string(),
        discount: record.discount.to_string(),
        total: record.total.to_string(),
        paid: record.paid.to_string(),
        outstanding: record.outstanding.to_string(),
        status: record.status.as_str().to_string(),
        case_id: record.case_id,
        contact_id: record.contact_id,
        synced_at: now.to_string(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    let changes = InvoiceChangesDB {
        invoice_number: insert.invoice_number.clone(),
        issue_date: insert.issue_date.clone(),
        due_date: insert.due_date.clone(),
        subtotal: insert.subtotal.clone(),
        tax: insert.tax.clone(),
        discount: insert.discount.clone(),
        total: insert.total.clone(),
        paid: insert.paid.clone(),
        outstanding: insert.outstanding.clone(),
        status: insert.status.clone(),
        case_id: insert.case_id,
        contact_id: insert.contact_id,
        synced_at: now.to_string(),
        updated_at: now.to_string(),
    };
    (insert, changes)
}

// ── Expenses ─────────────────────────────────────────────────────────────

#[derive(Queryable, Identifiable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::expenses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExpenseDB {
    pub id: i64,
    pub external_id: Option<String>,
    pub description: Option<String>,
    pub expense_date: Option<String>,
    pub quantity: String,
    pub price: String,
    pub amount: String,
    pub is_billable: bool,
    pub case_id: Option<i64>,
    pub user_id: Option<i64>,
    pub synced_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::expenses)]
pub struct NewExpenseDB {
    pub external_id: String,
    pub description: Option<String>,
    pub expense_date: Option<String>,
    pub quantity: String,
    pub price: String,
    pub amount: String,
    pub is_billable: bool,
    pub case_id: Option<i64>,
    pub user_id: Option<i64>,
    pub synced_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::expenses)]
#[diesel(treat_none_as_null = true)]
pub struct ExpenseChangesDB {
    pub description: Option<String>,
    pub expense_date: Option<String>,
    pub quantity: String,
    pub price: String,
    pub amount: String,
    pub is_billable: bool,
    pub case_id: Option<i64>,
    pub user_id: Option<i64>,
    pub synced_at: String,
    pub updated_at: String,
}

pub fn expense_rows(record: &ExpenseRecord, now: &str) -> (NewExpenseDB, ExpenseChangesDB) {
    let insert = NewExpenseDB {
        external_id: record.external_id.clone(),
        description: record.description.clone(),
        expense_date: date_to_db(record.expense_date),
        quantity: record.quantity.to_string(),
        price: record.price.to_string(),
        amount: record.amount.to_string(),
        is_billable: record.is_billable,
        case_id: record.case_id,
        user_id: record.user_id,
        synced_at: now.to_string(),
        created_at: now.to_string(),
        updated_at: now.to_string(),
    };
    let changes = ExpenseChangesDB {
        description: insert.description.clone(),
        expense_date: insert.expense_date.clone(),
        quantity: insert.quantity.clone(),
        price: insert.price.clone(),
        amount: insert.amount.clone(),
        is_billable: insert.is_billable,
        case_id: insert.case_id,
        user_id: insert.user_id,
        synced_at: now.to_string(),
        updated_at: now.to_string(),
    };
    (insert, changes)
}
