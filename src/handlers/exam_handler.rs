use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{ApiResponse, AssignExamRequest, ExamSummary, PaginatedResponse, PaginationParams},
};

#[get("/exams")]
pub async fn list_exams(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let PaginationParams { offset, limit } = query.into_inner();
    let (exams, total) = state
        .exam_service
        .list_exams(&auth.actor(), offset, limit)
        .await?;

    Ok(HttpResponse::Ok().json(PaginatedResponse {
        items: exams.iter().map(ExamSummary::from).collect(),
        total,
        offset,
        limit,
    }))
}

#[get("/exams/{id}")]
pub async fn get_exam(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exam = state.exam_service.get_exam(&auth.actor(), &id).await?;
    Ok(HttpResponse::Ok().json(exam))
}

/// Takes an exported exam document as the raw request body.
#[post("/exams/import")]
pub async fn import_exam(
    state: web::Data<AppState>,
    body: String,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let exam = state.exam_service.import_exam(&auth.actor(), &body).await?;
    Ok(HttpResponse::Created().json(ApiResponse::new(
        ExamSummary::from(&exam),
        "Exam imported successfully",
    )))
}

#[get("/exams/{id}/export")]
pub async fn export_exam(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let document = state.exam_service.export_exam(&auth.actor(), &id).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(document))
}

#[post("/exams/{id}/assignments")]
pub async fn assign_exam(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<AssignExamRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let assignment = state
        .exam_service
        .assign_exam(&auth.actor(), &id, &request.user_id)
        .await?;
    Ok(HttpResponse::Created().json(assignment))
}
