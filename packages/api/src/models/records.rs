use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Record for Client {
    const TABLE: &'static str = "clients";
}

/// Embedded `clients(name)` projection on joined selects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub client_id: String,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, rename = "clients")]
    pub client: Option<ClientRef>,
}

impl Record for Appointment {
    const TABLE: &'static str = "appointments";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    /// Amount in cents.
    pub amount_cents: i64,
    pub description: String,
    pub occurred_on: NaiveDate,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Record for Transaction {
    const TABLE: &'static str = "financial_transactions";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: i32,
    #[serde(default)]
    pub minimum_quantity: i32,
    #[serde(default)]
    pub category: Option<String>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.minimum_quantity
    }
}

impl Record for InventoryItem {
    const TABLE: &'static str = "inventory_items";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collaborator {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub supervisor_id: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Record for Collaborator {
    const TABLE: &'static str = "collaborators";
}

/// Clinical record for a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prontuario {
    pub id: String,
    pub client_id: String,
    pub opened_on: NaiveDate,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, rename = "clients")]
    pub client: Option<ClientRef>,
}

impl Record for Prontuario {
    const TABLE: &'static str = "prontuarios";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anamnesis {
    pub id: String,
    pub client_id: String,
    pub recorded_on: NaiveDate,
    #[serde(default)]
    pub complaint: Option<String>,
    #[serde(default, rename = "clients")]
    pub client: Option<ClientRef>,
}

impl Record for Anamnesis {
    const TABLE: &'static str = "anamnesis";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub min_age: Option<u8>,
    #[serde(default)]
    pub max_age: Option<u8>,
}

impl Record for TestCatalogEntry {
    const TABLE: &'static str = "test_catalog";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisionSession {
    pub id: String,
    pub intern_id: String,
    pub supervisor_id: String,
    pub held_on: NaiveDate,
    #[serde(default)]
    pub hours: f32,
    #[serde(default)]
    pub topic: Option<String>,
}

impl Record for SupervisionSession {
    const TABLE: &'static str = "supervision_sessions";
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appointment_decodes_embedded_client() {
        let row = serde_json::json!({
            "id": "a1",
            "client_id": "c1",
            "scheduled_at": "2026-03-02T13:00:00Z",
            "status": "confirmed",
            "clients": { "name": "Maria Silva" }
        });
        let appt: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appt.client.unwrap().name, "Maria Silva");
        assert_eq!(appt.status.as_deref(), Some("confirmed"));
    }

    #[test]
    fn test_client_defaults_to_active() {
        let client: Client =
            serde_json::from_value(serde_json::json!({ "id": "c1", "name": "João" })).unwrap();
        assert!(client.active);
        assert!(client.birth_date.is_none());
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let item = InventoryItem {
            id: "i1".into(),
            name: "WISC-IV answer sheets".into(),
            quantity: 5,
            minimum_quantity: 5,
            category: None,
        };
        assert!(item.is_low_stock());
    }

    #[test]
    fn test_transaction_kind_is_lowercase_on_the_wire() {
        let tx: Transaction = serde_json::from_value(serde_json::json!({
            "id": "t1",
            "kind": "expense",
            "amount_cents": 12000,
            "description": "Testes",
            "occurred_on": "2026-01-15"
        }))
        .unwrap();
        assert_eq!(tx.kind, TransactionKind::Expense);
    }
}
