use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Store-assigned identifier shared by restaurant submissions and reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two entity kinds that flow through moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Restaurant,
    Review,
}

impl SubmissionKind {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionKind::Restaurant => "restaurant",
            SubmissionKind::Review => "review",
        }
    }

    /// Human readable noun used in "not found" messages.
    pub const fn noun(self) -> &'static str {
        match self {
            SubmissionKind::Restaurant => "Submission",
            SubmissionKind::Review => "Review",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Moderation status carried by every submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub const ALL: [SubmissionStatus; 3] = [
        SubmissionStatus::Pending,
        SubmissionStatus::Approved,
        SubmissionStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub const fn is_public(self) -> bool {
        matches!(self, SubmissionStatus::Approved)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}', expected one of pending, approved, rejected")]
pub struct UnknownStatus(pub String);

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            _ => Err(UnknownStatus(value.to_string())),
        }
    }
}

/// Status selector used by listing queries; `All` disables filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(SubmissionStatus),
}

impl StatusFilter {
    pub fn matches(self, status: SubmissionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => expected == status,
        }
    }

    pub fn status(self) -> Option<SubmissionStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        value.parse().map(StatusFilter::Only)
    }
}

impl From<SubmissionStatus> for StatusFilter {
    fn from(status: SubmissionStatus) -> Self {
        StatusFilter::Only(status)
    }
}

/// Restaurant payload as received from the public submission form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRestaurant {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub county: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hours: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Stored restaurant submission. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantSubmission {
    pub id: SubmissionId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub cuisine: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub price_range: Option<String>,
    pub description: Option<String>,
    pub hours: Option<String>,
    pub amenities: Vec<String>,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
}

impl RestaurantSubmission {
    pub fn from_new(id: SubmissionId, submitted_at: DateTime<Utc>, new: NewRestaurant) -> Self {
        Self {
            id,
            name: new.name,
            address: new.address,
            city: new.city,
            county: new.county,
            cuisine: new.cuisine,
            phone: new.phone,
            website: new.website,
            price_range: new.price_range,
            description: new.description,
            hours: new.hours,
            amenities: new.amenities,
            submitted_at,
            status: SubmissionStatus::Pending,
        }
    }
}

/// Photo attached to a review. Browsers send numeric ids, so both strings
/// and numbers are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoDescriptor {
    #[serde(deserialize_with = "deserialize_photo_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub preview: String,
}

fn deserialize_photo_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

/// Review payload as received from the public review form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    #[serde(default)]
    pub restaurant_id: i64,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub visit_date: String,
    #[serde(default)]
    pub photos: Vec<PhotoDescriptor>,
}

/// Stored review. `restaurant_id` is not checked against existing restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: SubmissionId,
    pub restaurant_id: i64,
    pub reviewer_name: String,
    pub rating: i32,
    pub review_text: String,
    pub visit_date: String,
    pub photos: Vec<PhotoDescriptor>,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
}

impl Review {
    pub fn from_new(id: SubmissionId, submitted_at: DateTime<Utc>, new: NewReview) -> Self {
        Self {
            id,
            restaurant_id: new.restaurant_id,
            reviewer_name: new.reviewer_name,
            rating: new.rating,
            review_text: new.review_text,
            visit_date: new.visit_date,
            photos: new.photos,
            submitted_at,
            status: SubmissionStatus::Pending,
        }
    }

    pub fn public_view(&self) -> PublicReview {
        PublicReview {
            id: self.id,
            restaurant_id: self.restaurant_id,
            reviewer_name: self.reviewer_name.clone(),
            rating: self.rating,
            review_text: self.review_text.clone(),
            visit_date: self.visit_date.clone(),
            photos: self.photos.clone(),
            submitted_at: self.submitted_at,
        }
    }
}

/// Review fields exposed to catalogue readers. Carries no moderation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicReview {
    pub id: SubmissionId,
    pub restaurant_id: i64,
    pub reviewer_name: String,
    pub rating: i32,
    pub review_text: String,
    pub visit_date: String,
    pub photos: Vec<PhotoDescriptor>,
    pub submitted_at: DateTime<Utc>,
}

/// Approved restaurant enriched with aggregates over its approved reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicRestaurant {
    #[serde(flatten)]
    pub restaurant: RestaurantSubmission,
    pub rating: f32,
    pub review_count: u32,
}

/// Per-status record totals for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: SubmissionStatus) {
        match status {
            SubmissionStatus::Pending => self.pending += 1,
            SubmissionStatus::Approved => self.approved += 1,
            SubmissionStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.pending + self.approved + self.rejected
    }
}

/// Moderation dashboard summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub pending_restaurants: u64,
    pub approved_restaurants: u64,
    pub rejected_restaurants: u64,
    pub pending_reviews: u64,
    pub approved_reviews: u64,
    pub rejected_reviews: u64,
    pub newsletter_subscribers: u64,
}

impl DashboardStats {
    pub fn new(restaurants: StatusCounts, reviews: StatusCounts, subscribers: u64) -> Self {
        Self {
            pending_restaurants: restaurants.pending,
            approved_restaurants: restaurants.approved,
            rejected_restaurants: restaurants.rejected,
            pending_reviews: reviews.pending,
            approved_reviews: reviews.approved,
            rejected_reviews: reviews.rejected,
            newsletter_subscribers: subscribers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_parses_all_and_single_status() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            " Approved ".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(SubmissionStatus::Approved))
        );
        assert!("archived".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn photo_ids_accept_numbers_and_strings() {
        let photos: Vec<PhotoDescriptor> = serde_json::from_str(
            r#"[{"id": 1736200000123.45, "name": "a.jpg", "preview": "blob:1"},
                {"id": "p-2", "name": "b.jpg", "preview": "blob:2"}]"#,
        )
        .expect("photos parse");

        assert_eq!(photos[0].id, "1736200000123.45");
        assert_eq!(photos[1].id, "p-2");
    }

    #[test]
    fn public_review_serialization_has_no_status() {
        let review = Review::from_new(
            SubmissionId(7),
            Utc::now(),
            NewReview {
                restaurant_id: 1,
                reviewer_name: "Alice".to_string(),
                rating: 5,
                review_text: "Great food".to_string(),
                visit_date: "2025-01-01".to_string(),
                photos: Vec::new(),
            },
        );

        let payload = serde_json::to_value(review.public_view()).expect("serializes");
        assert!(payload.get("status").is_none());
        assert_eq!(payload["reviewer_name"], "Alice");
    }
}
