//! # Records owned by the backend
//!
//! The client never enforces relational integrity; these structs are transient
//! copies of backend rows. Foreign keys (appointment → client, ...) are resolved
//! by embedded selects at query time, which is why some records carry an
//! optional joined struct.
//!
//! | Struct | Table |
//! |--------|-------|
//! | [`ProfileRow`] | `profiles` |
//! | [`Client`] | `clients` |
//! | [`Appointment`] | `appointments` |
//! | [`Transaction`] | `financial_transactions` |
//! | [`InventoryItem`] | `inventory_items` |
//! | [`Collaborator`] | `collaborators` |
//! | [`Prontuario`] | `prontuarios` |
//! | [`Anamnesis`] | `anamnesis` |
//! | [`TestCatalogEntry`] | `test_catalog` |
//! | [`SupervisionSession`] | `supervision_sessions` |

mod profile;
mod records;

pub use profile::ProfileRow;
pub use records::{
    Anamnesis, Appointment, Client, ClientRef, Collaborator, InventoryItem, Prontuario,
    SupervisionSession, TestCatalogEntry, Transaction, TransactionKind,
};

/// A row type stored in a named backend table.
pub trait Record: serde::de::DeserializeOwned {
    const TABLE: &'static str;
}
