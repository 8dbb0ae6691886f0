//! Record shapes as returned by the matter API list endpoints.
//!
//! Only the fields the transformers read are modelled; unknown fields are
//! ignored. Identifiers may arrive as JSON strings or integers and are always
//! normalized to strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Int(i64),
}

fn normalize_id(repr: IdRepr) -> String {
    match repr {
        IdRepr::Text(value) => value.trim().to_string(),
        IdRepr::Int(value) => value.to_string(),
    }
}

pub(crate) fn deserialize_external_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = normalize_id(IdRepr::deserialize(deserializer)?);
    if id.is_empty() {
        return Err(serde::de::Error::custom("external id is empty"));
    }
    Ok(id)
}

/// Reference from one external record to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    #[serde(deserialize_with = "deserialize_external_id")]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalMatter {
    #[serde(deserialize_with = "deserialize_external_id")]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub practice_area: Option<String>,
    #[serde(default)]
    pub open_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    #[serde(default)]
    pub account_ref: Option<ExternalRef>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalContact {
    #[serde(deserialize_with = "deserialize_external_id")]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_mobile: Option<String>,
    #[serde(default)]
    pub phone_work: Option<String>,
    #[serde(default)]
    pub account_ref: Option<ExternalRef>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalUser {
    #[serde(deserialize_with = "deserialize_external_id")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTask {
    #[serde(deserialize_with = "deserialize_external_id")]
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub matter_ref: Option<ExternalRef>,
    #[serde(default)]
    pub assigned_to_users: Vec<ExternalRef>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Invoice amounts are integer minor units (hundredths).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalInvoice {
    #[serde(deserialize_with = "deserialize_external_id")]
    pub id: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub subtotal: Option<i64>,
    #[serde(default)]
    pub tax: Option<i64>,
    #[serde(default)]
    pub discount: Option<i64>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub total_paid: Option<i64>,
    #[serde(default)]
    pub total_outstanding: Option<i64>,
    #[serde(default)]
    pub matter_ref: Option<ExternalRef>,
    #[serde(default)]
    pub contact_ref: Option<ExternalRef>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Expense price and amount are integer minor units; quantity is a plain
/// number (hours, items).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalExpense {
    #[serde(deserialize_with = "deserialize_external_id")]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub qty: Option<Decimal>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub is_billable: Option<bool>,
    #[serde(default)]
    pub matter_ref: Option<ExternalRef>,
    #[serde(default)]
    pub user_ref: Option<ExternalRef>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
