use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{CreateAttemptRequest, SubmitResponseRequest},
};

#[post("/attempts")]
pub async fn create_attempt(
    state: web::Data<AppState>,
    request: web::Json<CreateAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let created = state
        .attempt_service
        .create_attempt(&auth.actor(), &request.assignment_id, request.resume)
        .await?;

    if created.resumed {
        Ok(HttpResponse::Ok().json(created))
    } else {
        Ok(HttpResponse::Created().json(created))
    }
}

#[get("/attempts/{id}/resume")]
pub async fn resume_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let batch = state
        .attempt_service
        .resume_attempt(&auth.actor(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(batch))
}

/// 200 when the value was accepted, 422 when it was stored but is invalid.
#[post("/attempts/{id}/responses/{question_id}")]
pub async fn submit_response(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitResponseRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (attempt_id, question_id) = path.into_inner();
    let outcome = state
        .attempt_service
        .submit_response(&auth.actor(), &attempt_id, &question_id, request.into_inner())
        .await?;

    if outcome.valid {
        Ok(HttpResponse::Ok().json(outcome))
    } else {
        Ok(HttpResponse::UnprocessableEntity().json(outcome))
    }
}

#[post("/attempts/{id}/finish")]
pub async fn finish_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let outcome = state
        .attempt_service
        .finish_attempt(&auth.actor(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[get("/attempts/{id}/review")]
pub async fn review_attempt(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let batch = state
        .attempt_service
        .review_attempt(&auth.actor(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(batch))
}

#[get("/attempts/{id}/results")]
pub async fn get_results(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let results = state
        .attempt_service
        .get_results(&auth.actor(), &id)
        .await?;
    Ok(HttpResponse::Ok().json(results))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    use crate::{
        app_state::AppState,
        auth::{Actor, JwtService, UserRole},
        config::Config,
        handlers,
        test_utils::{
            fixtures,
            test_helpers::{assert_error_status, assert_success_status},
        },
    };

    use super::*;

    struct Seeded {
        state: AppState,
        jwt: JwtService,
        assignment_id: String,
        question_id: String,
    }

    async fn seeded() -> Seeded {
        let config = Config::test_config();
        let jwt = JwtService::new(&config.jwt_secret, 1);
        let state = AppState::in_memory(config);
        let admin = Actor::new("admin", UserRole::Admin);

        let exam = state
            .exam_service
            .create_exam(&admin, fixtures::numeric_exam())
            .await
            .unwrap();
        let assignment = state
            .exam_service
            .assign_exam(&admin, &exam.id, "user-1")
            .await
            .unwrap();

        Seeded {
            state,
            jwt,
            assignment_id: assignment.id,
            question_id: exam.sections[0].questions[0].id.clone(),
        }
    }

    #[actix_web::test]
    async fn test_submission_status_reflects_validity() {
        let seeded = seeded().await;
        let token = seeded
            .jwt
            .create_token("user-1", "candidate", UserRole::User)
            .unwrap();
        let bearer = ("Authorization", format!("Bearer {}", token));

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(seeded.state.clone()))
                .app_data(web::Data::new(seeded.jwt.clone()))
                .configure(handlers::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/attempts")
            .insert_header(bearer.clone())
            .set_json(json!({ "assignment_id": seeded.assignment_id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: serde_json::Value = test::read_body_json(resp).await;
        let attempt_id = created["attempt_id"].as_str().unwrap().to_string();
        let uri = format!("/api/attempts/{}/responses/{}", attempt_id, seeded.question_id);

        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer.clone())
            .set_json(json!({ "value": 42 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["valid"], false);

        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(bearer.clone())
            .set_json(json!({ "value": "5" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_success_status(resp.status());
    }

    #[actix_web::test]
    async fn test_results_before_finishing_is_a_conflict() {
        let seeded = seeded().await;
        let token = seeded
            .jwt
            .create_token("user-1", "candidate", UserRole::User)
            .unwrap();
        let created = seeded
            .state
            .attempt_service
            .create_attempt(&Actor::new("user-1", UserRole::User), &seeded.assignment_id, true)
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(seeded.state.clone()))
                .app_data(web::Data::new(seeded.jwt.clone()))
                .configure(handlers::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/attempts/{}/results", created.attempt_id))
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_error_status(resp.status());
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
