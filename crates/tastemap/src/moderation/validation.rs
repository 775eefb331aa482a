use super::domain::{NewRestaurant, NewReview};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Rejections raised before a submission reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("rating must be between 1 and 5, got {0}")]
    RatingOutOfRange(i32),
    #[error("restaurant_id must reference a restaurant, got {0}")]
    InvalidRestaurantReference(i64),
    #[error("{0}")]
    InvalidStatus(String),
    /// Body, path or query that could not be decoded into the expected shape.
    #[error("{0}")]
    MalformedRequest(String),
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_restaurant(restaurant: &NewRestaurant) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = [
        ("name", &restaurant.name),
        ("address", &restaurant.address),
        ("city", &restaurant.city),
        ("county", &restaurant.county),
        ("cuisine", &restaurant.cuisine),
    ]
    .into_iter()
    .filter(|(_, value)| blank(value))
    .map(|(field, _)| field)
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

pub fn validate_review(review: &NewReview) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = [
        ("reviewer_name", &review.reviewer_name),
        ("review_text", &review.review_text),
        ("visit_date", &review.visit_date),
    ]
    .into_iter()
    .filter(|(_, value)| blank(value))
    .map(|(field, _)| field)
    .collect();

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }
    if review.restaurant_id <= 0 {
        return Err(ValidationError::InvalidRestaurantReference(
            review.restaurant_id,
        ));
    }
    if !(MIN_RATING..=MAX_RATING).contains(&review.rating) {
        return Err(ValidationError::RatingOutOfRange(review.rating));
    }
    Ok(())
}
