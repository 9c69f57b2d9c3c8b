//! The request/render widgets beside the catalog: analytics, user creation and recommendations.

pub mod analytics;
pub mod recommendations;

use crate::api::{ApiError, CatalogApi};

/// `POST /users/` for the user creation panel. A response without an id is an error.
pub async fn create_user<A: CatalogApi + ?Sized>(api: &A) -> Result<i64, ApiError> {
    api.create_user()
        .await?
        .id
        .ok_or(ApiError::MissingField { field: "id" })
}
