//! Internal record shapes produced by the transformers and consumed by the
//! upsert writer. Foreign keys are internal ids, already resolved.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SyncEntity;

/// Internal case status vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Active,
    Completed,
    Pending,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Active => "active",
            CaseStatus::Completed => "completed",
            CaseStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Individual,
    Organization,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Individual => "individual",
            ContactKind::Organization => "organization",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Pending,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Completed => "completed",
            TaskStatus::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Paid,
    Partial,
    Unpaid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Partial => "partial",
            InvoiceStatus::Unpaid => "unpaid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub external_id: String,
    pub title: String,
    pub case_number: Option<String>,
    pub status: CaseStatus,
    pub description: Option<String>,
    pub practice_area: Option<String>,
    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Set only when the account reference is an organization.
    pub company: Option<String>,
    pub kind: ContactKind,
}

/// Link between an existing internal user and its external account.
///
/// Users are matched by email and never created by the sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub external_id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub external_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub case_id: Option<i64>,
    pub assigned_user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub external_id: String,
    pub invoice_number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub paid: Decimal,
    pub outstanding: Decimal,
    pub status: InvoiceStatus,
    pub case_id: Option<i64>,
    pub contact_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub external_id: String,
    pub description: Option<String>,
    pub expense_date: Option<NaiveDate>,
    pub quantity: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
    pub is_billable: bool,
    pub case_id: Option<i64>,
    pub user_id: Option<i64>,
}

/// A transformed record ready for the upsert writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum SyncRecord {
    Case(CaseRecord),
    Contact(ContactRecord),
    User(UserRecord),
    Task(TaskRecord),
    Invoice(InvoiceRecord),
    Expense(ExpenseRecord),
}

impl SyncRecord {
    pub fn entity(&self) -> SyncEntity {
        match self {
            SyncRecord::Case(_) => SyncEntity::Case,
            SyncRecord::Contact(_) => SyncEntity::Contact,
            SyncRecord::User(_) => SyncEntity::User,
            SyncRecord::Task(_) => SyncEntity::Task,
            SyncRecord::Invoice(_) => SyncEntity::Invoice,
            SyncRecord::Expense(_) => SyncEntity::Expense,
        }
    }

    pub fn external_id(&self) -> &str {
        match self {
            SyncRecord::Case(r) => &r.external_id,
            SyncRecord::Contact(r) => &r.external_id,
            SyncRecord::User(r) => &r.external_id,
            SyncRecord::Task(r) => &r.external_id,
            SyncRecord::Invoice(r) => &r.external_id,
            SyncRecord::Expense(r) => &r.external_id,
        }
    }
}
