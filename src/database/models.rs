use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub role_id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::from_code(self.role_id)
    }
}

/// User row including the stored credential digest; only the login path
/// ever selects this shape.
#[derive(Debug, FromRow)]
pub struct Credential {
    pub id: i32,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub year: i32,
    pub publisher: String,
    pub author: String,
    pub pages: i32,
    pub cover_id: String,
}

/// Listing row: book plus per-query aggregates. `average_rating` is rounded
/// to one decimal and 0 when the book has no reviews; `genres` is the
/// comma-joined genre names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub year: i32,
    pub genres: String,
    pub average_rating: f64,
    pub review_count: i64,
}

/// Detail view: all scalar book fields plus the same aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookDetail {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub year: i32,
    pub publisher: String,
    pub author: String,
    pub pages: i32,
    pub cover_id: String,
    pub genres: String,
    pub average_rating: f64,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub text: String,
}

/// Review annotated with the reviewing user's username, as shown on the
/// book detail page.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewWithAuthor {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub text: String,
    pub username: String,
}
