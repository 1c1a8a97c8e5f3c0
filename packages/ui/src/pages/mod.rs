//! One page per route.
//!
//! | Route | Page |
//! |-------|------|
//! | login | [`LoginPage`] |
//! | dashboard | [`DashboardPage`] |
//! | reports | [`ReportsPage`] |
//! | everything else | [`RecordListPage`] over the matching record type |

mod dashboard;
pub mod format;
mod login;
mod records;
mod reports;

pub use dashboard::{DashboardPage, DashboardStats};
pub use login::LoginPage;
pub use records::{Listing, RecordListPage};
pub use reports::{MonthSummary, ReportsPage};

use api::{
    Anamnesis, Appointment, Backend, Client, Collaborator, InventoryItem, Prontuario,
    SupervisionSession, TestCatalogEntry, Transaction,
};

use crate::page::{Page, PageRegistry};
use crate::route::Route;

fn list<B: Backend, R: Listing>() -> Box<dyn Page<B>> {
    Box::new(RecordListPage::<R>::default())
}

/// The registry with a page for every route.
pub fn standard_registry<B: Backend + 'static>() -> PageRegistry<B> {
    PageRegistry::new()
        .register(Route::Login, || Box::new(LoginPage))
        .register(Route::Dashboard, || Box::new(DashboardPage))
        .register(Route::Clients, list::<B, Client>)
        .register(Route::Appointments, list::<B, Appointment>)
        .register(Route::Financial, list::<B, Transaction>)
        .register(Route::Inventory, list::<B, InventoryItem>)
        .register(Route::Collaborators, list::<B, Collaborator>)
        .register(Route::Prontuarios, list::<B, Prontuario>)
        .register(Route::Anamnesis, list::<B, Anamnesis>)
        .register(Route::TestCatalog, list::<B, TestCatalogEntry>)
        .register(Route::Reports, || Box::new(ReportsPage))
        .register(Route::Supervision, list::<B, SupervisionSession>)
}
