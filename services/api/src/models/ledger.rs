//! Ledger transaction model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a credit mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditOperation {
    Add,
    Subtract,
}

impl CreditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditOperation::Add => "add",
            CreditOperation::Subtract => "subtract",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(CreditOperation::Add),
            "subtract" => Some(CreditOperation::Subtract),
            _ => None,
        }
    }
}

/// Ledger audit record; one row is appended per balance mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: i64,
    pub tx_type: CreditOperation,
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}
