pub mod draft_handler;
pub mod health_handler;
pub mod result_handler;

use actix_web::web;

pub use draft_handler::{clear_draft, list_draft_fields, upsert_draft_field};
pub use health_handler::{health_check, health_check_ready};
pub use result_handler::score_attempt;

/// Registers every route served by the binary.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_ready)
        .service(upsert_draft_field)
        .service(list_draft_fields)
        .service(clear_draft)
        .service(score_attempt);
}
