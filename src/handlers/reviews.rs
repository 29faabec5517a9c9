// handlers/reviews.rs - review submission and moderation

use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::json;

use crate::auth::Action;
use crate::database::models::Review;
use crate::database::is_unique_violation;
use crate::error::AppError;
use crate::flash::Flash;
use crate::middleware::{backlink, CurrentUser};
use crate::respond::see_other;
use crate::state::AppState;

const ALREADY_REVIEWED: &str = "You have already reviewed this book";

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i32,
    pub text: String,
}

async fn existing_review(
    state: &AppState,
    op: &'static str,
    book_id: i32,
    user_id: i32,
) -> Result<Option<Review>, AppError> {
    state
        .db
        .run(op, move |tx| {
            Box::pin(async move {
                let review: Option<Review> = sqlx::query_as(
                    "SELECT id, book_id, user_id, rating, text FROM reviews \
                     WHERE book_id = $1 AND user_id = $2",
                )
                .bind(book_id)
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?;
                Ok(review)
            })
        })
        .await
}

/// GET /add_review/:book_id - form descriptor; a caller who already reviewed
/// the book is bounced back with a warning before any form is shown
pub async fn add_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(book_id): Path<i32>,
) -> Result<Response, AppError> {
    let back = format!("/view_book/{}", book_id);
    if existing_review(&state, "add_review_check", book_id, user.id).await?.is_some() {
        return Ok(see_other(&back, Some(Flash::warning(ALREADY_REVIEWED))));
    }
    Ok(Json(json!({
        "form": "add_review",
        "book_id": book_id,
        "fields": ["rating", "text"],
    }))
    .into_response())
}

/// POST /add_review/:book_id
///
/// The pre-check gives the friendly warning path, but two concurrent
/// submissions can both pass it; the UNIQUE (book_id, user_id) constraint is
/// what actually holds the invariant, and a violation maps to the same
/// warning.
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(book_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    let back = format!("/view_book/{}", book_id);
    let user_id = user.id;
    let conflict_back = back.clone();

    state
        .db
        .run("add_review", move |tx| {
            Box::pin(async move {
                let existing: Option<i32> = sqlx::query_scalar(
                    "SELECT id FROM reviews WHERE book_id = $1 AND user_id = $2",
                )
                .bind(book_id)
                .bind(user_id)
                .fetch_optional(&mut **tx)
                .await?;
                if existing.is_some() {
                    return Err(AppError::conflict(ALREADY_REVIEWED, &conflict_back));
                }

                let inserted = sqlx::query(
                    "INSERT INTO reviews (book_id, user_id, rating, text) VALUES ($1, $2, $3, $4)",
                )
                .bind(book_id)
                .bind(user_id)
                .bind(form.rating)
                .bind(&form.text)
                .execute(&mut **tx)
                .await;

                match inserted {
                    Ok(_) => Ok(()),
                    Err(err) if is_unique_violation(&err) => {
                        Err(AppError::conflict(ALREADY_REVIEWED, &conflict_back))
                    }
                    Err(err) => Err(err.into()),
                }
            })
        })
        .await?;

    Ok(see_other(&back, Some(Flash::success("Review added"))))
}

/// GET /edit_review/:id - moderator or admin
pub async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Path(review_id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    user.authorize(&state.policy, Action::EditReview, &backlink(&headers))?;

    let review = state
        .db
        .run("edit_review_load", move |tx| {
            Box::pin(async move {
                let review: Option<Review> = sqlx::query_as(
                    "SELECT id, book_id, user_id, rating, text FROM reviews WHERE id = $1",
                )
                .bind(review_id)
                .fetch_optional(&mut **tx)
                .await?;
                review.ok_or_else(|| AppError::not_found("Review not found", "/"))
            })
        })
        .await?;

    Ok(Json(json!({ "form": "edit_review", "review": review })))
}

/// POST /edit_review/:id - overwrites rating and text, back to the book view
pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Path(review_id): Path<i32>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, AppError> {
    user.authorize(&state.policy, Action::EditReview, &backlink(&headers))?;

    let book_id = state
        .db
        .run("edit_review", move |tx| {
            Box::pin(async move {
                let book_id: Option<i32> =
                    sqlx::query_scalar("SELECT book_id FROM reviews WHERE id = $1")
                        .bind(review_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                let book_id =
                    book_id.ok_or_else(|| AppError::not_found("Review not found", "/"))?;

                sqlx::query("UPDATE reviews SET rating = $1, text = $2 WHERE id = $3")
                    .bind(form.rating)
                    .bind(&form.text)
                    .bind(review_id)
                    .execute(&mut **tx)
                    .await?;
                Ok(book_id)
            })
        })
        .await?;

    Ok(see_other(
        &format!("/view_book/{}", book_id),
        Some(Flash::success("Review updated")),
    ))
}
