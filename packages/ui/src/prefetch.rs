//! Where users tend to go next, used to warm the cache while they read.

use crate::route::Route;

pub fn likely_next(route: Route) -> &'static [Route] {
    match route {
        Route::Login => &[Route::Dashboard],
        Route::Dashboard => &[Route::Appointments, Route::Clients],
        Route::Clients => &[Route::Appointments, Route::Prontuarios],
        Route::Appointments => &[Route::Clients],
        Route::Prontuarios => &[Route::Anamnesis, Route::TestCatalog],
        Route::Anamnesis => &[Route::Prontuarios],
        Route::Financial => &[Route::Reports],
        Route::Reports => &[Route::Financial],
        Route::Inventory | Route::Collaborators | Route::TestCatalog | Route::Supervision => &[],
    }
}
