use crate::api::{ApiError, CatalogApi, RecommendedItem};

pub const EMPTY_USER_ID: &str = "Please enter a user ID.";

/// Trims the id and rejects blank input before any request is made.
pub fn validate_user_id(raw: Option<&str>) -> Result<String, &'static str> {
    match raw.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(EMPTY_USER_ID),
    }
}

pub async fn fetch<A: CatalogApi + ?Sized>(
    api: &A,
    user_id: &str,
) -> Result<Vec<RecommendedItem>, ApiError> {
    Ok(api.recommendations(user_id).await?.items)
}
