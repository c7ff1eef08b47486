pub mod attempt_handler;
pub mod exam_handler;
pub mod health_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub use health_handler::{health_check, health_check_live, health_check_ready};

/// Registers every route. Everything under `/api` requires a bearer token.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_ready)
        .service(health_check_live)
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .service(attempt_handler::create_attempt)
                .service(attempt_handler::resume_attempt)
                .service(attempt_handler::submit_response)
                .service(attempt_handler::finish_attempt)
                .service(attempt_handler::review_attempt)
                .service(attempt_handler::get_results)
                .service(exam_handler::list_exams)
                .service(exam_handler::import_exam)
                .service(exam_handler::get_exam)
                .service(exam_handler::export_exam)
                .service(exam_handler::assign_exam),
        );
}
