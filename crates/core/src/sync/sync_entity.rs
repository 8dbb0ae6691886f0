use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six record types pulled from the matter API.
///
/// Variant order is the dependency order: referenced types come before the
/// types that reference them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SyncEntity {
    Case,
    Contact,
    User,
    Task,
    Invoice,
    Expense,
}

/// Fixed step order for a sync run.
///
/// Cases precede tasks, invoices and expenses (case reference); contacts
/// precede invoices (billing contact); users precede tasks and expenses.
pub const SYNC_ORDER: [SyncEntity; 6] = [
    SyncEntity::Case,
    SyncEntity::Contact,
    SyncEntity::User,
    SyncEntity::Task,
    SyncEntity::Invoice,
    SyncEntity::Expense,
];

impl SyncEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncEntity::Case => "case",
            SyncEntity::Contact => "contact",
            SyncEntity::User => "user",
            SyncEntity::Task => "task",
            SyncEntity::Invoice => "invoice",
            SyncEntity::Expense => "expense",
        }
    }

    /// Path segment of the external list endpoint.
    pub fn api_resource(&self) -> &'static str {
        match self {
            SyncEntity::Case => "matters",
            SyncEntity::Contact => "contacts",
            SyncEntity::User => "users",
            SyncEntity::Task => "tasks",
            SyncEntity::Invoice => "invoices",
            SyncEntity::Expense => "expenses",
        }
    }
}

impl fmt::Display for SyncEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncEntity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SYNC_ORDER
            .iter()
            .copied()
            .find(|entity| entity.as_str() == value)
            .ok_or_else(|| format!("Unknown sync entity '{}'", value))
    }
}
