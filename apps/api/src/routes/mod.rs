pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;
use crate::{auth, colleges, community, exams, mentors, payments, profile, users};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        .nest("/api/auth", auth_routes())
        .nest("/api/users", user_routes())
        .nest("/api/exams", exam_routes())
        .nest("/api/colleges", college_routes())
        .nest("/api/mentors", mentor_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/community", community_routes())
        .route(
            "/api/shortlist",
            get(profile::handlers::handle_get_shortlist_ids)
                .post(profile::handlers::handle_add_shortlist_id)
                .delete(profile::handlers::handle_remove_shortlist_id),
        )
        .route(
            "/api/exam-scores",
            get(profile::handlers::handle_get_exam_scores)
                .post(profile::handlers::handle_save_exam_score),
        )
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use auth::handlers::*;
    Router::new()
        .route("/signup", post(handle_signup))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/me", get(handle_me))
        .route("/profile", get(handle_get_profile).put(handle_update_profile))
        .route("/change-password", post(handle_change_password))
}

fn user_routes() -> Router<AppState> {
    use users::handlers::*;
    Router::new().route(
        "/:id",
        get(handle_get_user)
            .put(handle_update_user)
            .delete(handle_delete_user),
    )
}

fn exam_routes() -> Router<AppState> {
    use exams::handlers::*;
    Router::new()
        .route("/", get(handle_list_exams))
        .route("/streams", get(handle_exam_streams))
        .route("/upcoming", get(handle_upcoming_exams))
        .route("/deadlines", get(handle_exam_deadlines))
        .route(
            "/bookmark",
            post(handle_add_bookmark).delete(handle_remove_bookmark),
        )
        .route("/bookmarks", get(handle_list_bookmarks))
        .route("/recommendations", get(handle_exam_recommendations))
        .route("/:id", get(handle_get_exam))
}

fn college_routes() -> Router<AppState> {
    use colleges::handlers::*;
    Router::new()
        .route("/", get(handle_list_colleges))
        .route("/recommendations", post(handle_college_recommendations))
        .route("/compare", post(handle_compare_colleges))
        .route("/categories", get(handle_college_categories))
        .route("/states", get(handle_college_states))
        .route(
            "/shortlist",
            get(handle_get_shortlist).post(handle_add_to_shortlist),
        )
        .route("/shortlist/:id", delete(handle_remove_from_shortlist))
        .route("/:id", get(handle_get_college))
}

fn mentor_routes() -> Router<AppState> {
    use mentors::handlers::*;
    Router::new()
        .route("/", get(handle_list_mentors))
        .route("/search", post(handle_search_mentors))
        .route("/categories", get(handle_mentor_categories))
        .route("/colleges", get(handle_mentor_colleges))
        .route("/:id", get(handle_get_mentor))
        .route("/:id/availability", get(handle_mentor_availability))
        .route("/:id/book", post(handle_book_session))
}

fn payment_routes() -> Router<AppState> {
    use payments::handlers::*;
    Router::new()
        .route("/plans", get(handle_list_plans))
        .route("/create-payment", post(handle_create_payment))
        .route("/simulate-gateway/:id", post(handle_simulate_gateway))
        .route("/verify-payment", post(handle_verify_payment))
        .route("/history", get(handle_payment_history))
        .route("/subscription-status", get(handle_subscription_status))
        .route("/cancel-subscription", post(handle_cancel_subscription))
        .route("/refund", post(handle_refund))
}

fn community_routes() -> Router<AppState> {
    use community::handlers::*;
    Router::new()
        .route(
            "/questions",
            get(handle_list_questions).post(handle_ask_question),
        )
        .route("/questions/:id", get(handle_get_question))
        .route("/questions/:id/answers", post(handle_post_answer))
        .route("/questions/:id/vote", post(handle_vote_question))
        .route(
            "/questions/:question_id/best-answer/:answer_id",
            post(handle_mark_best_answer),
        )
        .route("/answers/:id/vote", post(handle_vote_answer))
        .route("/categories", get(handle_categories))
        .route("/tags", get(handle_popular_tags))
        .route("/my-questions", get(handle_my_questions))
        .route("/my-answers", get(handle_my_answers))
        .route("/stats", get(handle_stats))
}
