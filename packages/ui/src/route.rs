use std::fmt;

use crate::permissions::{
    APPOINTMENTS, CLIENTS, CLINICAL_RECORDS, FINANCIAL, INVENTORY, REPORTS, SUPERVISION, TESTS,
};
use crate::session::SessionUser;

/// A logical page, independent of any real URL path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Route {
    Login,
    Dashboard,
    Clients,
    Appointments,
    Financial,
    Inventory,
    Collaborators,
    Prontuarios,
    Anamnesis,
    TestCatalog,
    Reports,
    Supervision,
}

/// Every route, in sidebar order.
pub const ALL_ROUTES: [Route; 12] = [
    Route::Login,
    Route::Dashboard,
    Route::Clients,
    Route::Appointments,
    Route::Financial,
    Route::Inventory,
    Route::Collaborators,
    Route::Prontuarios,
    Route::Anamnesis,
    Route::TestCatalog,
    Route::Reports,
    Route::Supervision,
];

/// What a session needs to open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    CoordinatorOnly,
    Capability(&'static str),
}

impl Access {
    pub fn allows(&self, user: Option<&SessionUser>) -> bool {
        match (self, user) {
            (Access::Public, _) => true,
            (_, None) => false,
            (Access::Authenticated, Some(_)) => true,
            (Access::CoordinatorOnly, Some(u)) => u.profile.role == crate::Role::Coordinator,
            (Access::Capability(p), Some(u)) => u.profile.role.allows(p),
        }
    }
}

impl Route {
    /// Stable identifier used in the `page` query parameter.
    pub fn name(self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Dashboard => "dashboard",
            Route::Clients => "clients",
            Route::Appointments => "appointments",
            Route::Financial => "financial",
            Route::Inventory => "inventory",
            Route::Collaborators => "collaborators",
            Route::Prontuarios => "prontuarios",
            Route::Anamnesis => "anamnesis",
            Route::TestCatalog => "tests",
            Route::Reports => "reports",
            Route::Supervision => "supervision",
        }
    }

    pub fn from_name(name: &str) -> Option<Route> {
        ALL_ROUTES.into_iter().find(|r| r.name() == name)
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Dashboard => "Dashboard",
            Route::Clients => "Clients",
            Route::Appointments => "Appointments",
            Route::Financial => "Financial",
            Route::Inventory => "Inventory",
            Route::Collaborators => "Collaborators",
            Route::Prontuarios => "Prontuários",
            Route::Anamnesis => "Anamnesis",
            Route::TestCatalog => "Test catalog",
            Route::Reports => "Reports",
            Route::Supervision => "Supervision",
        }
    }

    /// The permission table.
    pub fn access(self) -> Access {
        match self {
            Route::Login => Access::Public,
            Route::Dashboard => Access::Authenticated,
            Route::Clients => Access::Capability(CLIENTS),
            Route::Appointments => Access::Capability(APPOINTMENTS),
            Route::Financial => Access::Capability(FINANCIAL),
            Route::Inventory => Access::Capability(INVENTORY),
            Route::Collaborators => Access::CoordinatorOnly,
            Route::Prontuarios | Route::Anamnesis => Access::Capability(CLINICAL_RECORDS),
            Route::TestCatalog => Access::Capability(TESTS),
            Route::Reports => Access::Capability(REPORTS),
            Route::Supervision => Access::Capability(SUPERVISION),
        }
    }

    /// Whether the route renders inside the shared layout.
    pub fn uses_layout(self) -> bool {
        self != Route::Login
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
