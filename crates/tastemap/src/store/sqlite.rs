// SQLite-backed store for submissions, reviews and newsletter subscribers.
//
// Tables:
// - restaurant_submissions: restaurant records, amenities as JSON text
// - reviews: review records, photos as JSON text
// - newsletter_subscribers: sign-ups, e-mail unique (case-insensitive)

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;

use crate::moderation::{
    NewRestaurant, NewReview, RestaurantSubmission, Review, StatusCounts, StatusFilter,
    StoreError, SubmissionId, SubmissionKind, SubmissionStatus, SubmissionStore,
};
use crate::newsletter::{NewSubscriber, Subscriber, SubscriberStore};

pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and run migrations.
    ///
    /// In-memory URLs are pinned to a single long-lived connection, otherwise
    /// every pooled connection would see its own empty database.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let url = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{database_url}")
        };
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(storage_error)?
            .create_if_missing(true);

        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(storage_error)?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the required tables.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS restaurant_submissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                city TEXT NOT NULL,
                county TEXT NOT NULL,
                phone TEXT,
                website TEXT,
                cuisine TEXT NOT NULL,
                price_range TEXT,
                description TEXT,
                hours TEXT,
                amenities TEXT NOT NULL DEFAULT '[]',
                submitted_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                restaurant_id INTEGER NOT NULL,
                reviewer_name TEXT NOT NULL,
                rating INTEGER NOT NULL,
                review_text TEXT NOT NULL,
                visit_date TEXT NOT NULL,
                photos TEXT NOT NULL DEFAULT '[]',
                submitted_at TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS newsletter_subscribers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                subscribed_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        debug!("sqlite schema ready");
        Ok(())
    }
}

const fn table(kind: SubmissionKind) -> &'static str {
    match kind {
        SubmissionKind::Restaurant => "restaurant_submissions",
        SubmissionKind::Review => "reviews",
    }
}

fn storage_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict;
        }
    }
    StoreError::Unavailable(err.to_string())
}

// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| StoreError::Unavailable(format!("bad timestamp '{raw}': {err}")))
}

fn encode_list<T: Serialize>(items: &[T]) -> Result<String, StoreError> {
    serde_json::to_string(items).map_err(|err| StoreError::Unavailable(err.to_string()))
}

fn decode_list<T: DeserializeOwned>(raw: Option<String>) -> Result<Vec<T>, StoreError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("null") => Ok(Vec::new()),
        Some(text) => {
            serde_json::from_str(text).map_err(|err| StoreError::Unavailable(err.to_string()))
        }
    }
}

fn decode_status(raw: &str) -> Result<SubmissionStatus, StoreError> {
    raw.parse()
        .map_err(|err: crate::moderation::UnknownStatus| StoreError::Unavailable(err.to_string()))
}

fn restaurant_from_row(row: &SqliteRow) -> Result<RestaurantSubmission, StoreError> {
    let submitted_at: String = row.try_get("submitted_at").map_err(storage_error)?;
    let status: String = row.try_get("status").map_err(storage_error)?;
    Ok(RestaurantSubmission {
        id: SubmissionId(row.try_get("id").map_err(storage_error)?),
        name: row.try_get("name").map_err(storage_error)?,
        address: row.try_get("address").map_err(storage_error)?,
        city: row.try_get("city").map_err(storage_error)?,
        county: row.try_get("county").map_err(storage_error)?,
        cuisine: row.try_get("cuisine").map_err(storage_error)?,
        phone: row.try_get("phone").map_err(storage_error)?,
        website: row.try_get("website").map_err(storage_error)?,
        price_range: row.try_get("price_range").map_err(storage_error)?,
        description: row.try_get("description").map_err(storage_error)?,
        hours: row.try_get("hours").map_err(storage_error)?,
        amenities: decode_list(row.try_get("amenities").map_err(storage_error)?)?,
        submitted_at: decode_time(&submitted_at)?,
        status: decode_status(&status)?,
    })
}

fn review_from_row(row: &SqliteRow) -> Result<Review, StoreError> {
    let submitted_at: String = row.try_get("submitted_at").map_err(storage_error)?;
    let status: String = row.try_get("status").map_err(storage_error)?;
    Ok(Review {
        id: SubmissionId(row.try_get("id").map_err(storage_error)?),
        restaurant_id: row.try_get("restaurant_id").map_err(storage_error)?,
        reviewer_name: row.try_get("reviewer_name").map_err(storage_error)?,
        rating: row.try_get("rating").map_err(storage_error)?,
        review_text: row.try_get("review_text").map_err(storage_error)?,
        visit_date: row.try_get("visit_date").map_err(storage_error)?,
        photos: decode_list(row.try_get("photos").map_err(storage_error)?)?,
        submitted_at: decode_time(&submitted_at)?,
        status: decode_status(&status)?,
    })
}

fn subscriber_from_row(row: &SqliteRow) -> Result<Subscriber, StoreError> {
    let subscribed_at: String = row.try_get("subscribed_at").map_err(storage_error)?;
    Ok(Subscriber {
        id: row.try_get("id").map_err(storage_error)?,
        first_name: row.try_get("first_name").map_err(storage_error)?,
        last_name: row.try_get("last_name").map_err(storage_error)?,
        email: row.try_get("email").map_err(storage_error)?,
        subscribed_at: decode_time(&subscribed_at)?,
    })
}

#[async_trait]
impl SubmissionStore for SqliteStore {
    async fn create_restaurant(
        &self,
        restaurant: NewRestaurant,
    ) -> Result<RestaurantSubmission, StoreError> {
        let submitted_at = now();
        let amenities = encode_list(&restaurant.amenities)?;

        let result = sqlx::query(
            r#"
            INSERT INTO restaurant_submissions
                (name, address, city, county, phone, website, cuisine,
                 price_range, description, hours, amenities, submitted_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(&restaurant.name)
        .bind(&restaurant.address)
        .bind(&restaurant.city)
        .bind(&restaurant.county)
        .bind(&restaurant.phone)
        .bind(&restaurant.website)
        .bind(&restaurant.cuisine)
        .bind(&restaurant.price_range)
        .bind(&restaurant.description)
        .bind(&restaurant.hours)
        .bind(amenities)
        .bind(encode_time(submitted_at))
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        let id = SubmissionId(result.last_insert_rowid());
        Ok(RestaurantSubmission::from_new(id, submitted_at, restaurant))
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let submitted_at = now();
        let photos = encode_list(&review.photos)?;

        let result = sqlx::query(
            r#"
            INSERT INTO reviews
                (restaurant_id, reviewer_name, rating, review_text, visit_date,
                 photos, submitted_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(review.restaurant_id)
        .bind(&review.reviewer_name)
        .bind(review.rating)
        .bind(&review.review_text)
        .bind(&review.visit_date)
        .bind(photos)
        .bind(encode_time(submitted_at))
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        let id = SubmissionId(result.last_insert_rowid());
        Ok(Review::from_new(id, submitted_at, review))
    }

    async fn list_restaurants(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<RestaurantSubmission>, StoreError> {
        let rows = match filter.status() {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT * FROM restaurant_submissions
                    WHERE status = ?
                    ORDER BY submitted_at DESC, id DESC
                    "#,
                )
                .bind(status.label())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM restaurant_submissions ORDER BY submitted_at DESC, id DESC",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(storage_error)?;

        rows.iter().map(restaurant_from_row).collect()
    }

    async fn list_reviews(&self, filter: StatusFilter) -> Result<Vec<Review>, StoreError> {
        let rows = match filter.status() {
            Some(status) => {
                sqlx::query(
                    r#"
                    SELECT * FROM reviews
                    WHERE status = ?
                    ORDER BY submitted_at DESC, id DESC
                    "#,
                )
                .bind(status.label())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM reviews ORDER BY submitted_at DESC, id DESC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(storage_error)?;

        rows.iter().map(review_from_row).collect()
    }

    async fn get_restaurant(&self, id: SubmissionId) -> Result<RestaurantSubmission, StoreError> {
        let row = sqlx::query("SELECT * FROM restaurant_submissions WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or(StoreError::NotFound)?;
        restaurant_from_row(&row)
    }

    async fn get_review(&self, id: SubmissionId) -> Result<Review, StoreError> {
        let row = sqlx::query("SELECT * FROM reviews WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or(StoreError::NotFound)?;
        review_from_row(&row)
    }

    async fn update_status(
        &self,
        kind: SubmissionKind,
        id: SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        let sql = format!("UPDATE {} SET status = ? WHERE id = ?", table(kind));
        let result = sqlx::query(&sql)
            .bind(status.label())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, kind: SubmissionKind, id: SubmissionId) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table(kind));
        let result = sqlx::query(&sql)
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn status_counts(&self, kind: SubmissionKind) -> Result<StatusCounts, StoreError> {
        let sql = format!(
            "SELECT status, COUNT(*) AS count FROM {} GROUP BY status",
            table(kind)
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        let mut counts = StatusCounts::default();
        for row in rows {
            let status: String = row.try_get("status").map_err(storage_error)?;
            let count: i64 = row.try_get("count").map_err(storage_error)?;
            let count = u64::try_from(count).unwrap_or_default();
            match decode_status(&status)? {
                SubmissionStatus::Pending => counts.pending = count,
                SubmissionStatus::Approved => counts.approved = count,
                SubmissionStatus::Rejected => counts.rejected = count,
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl SubscriberStore for SqliteStore {
    async fn create_subscriber(&self, subscriber: NewSubscriber) -> Result<Subscriber, StoreError> {
        let subscribed_at = now();
        let result = sqlx::query(
            r#"
            INSERT INTO newsletter_subscribers (first_name, last_name, email, subscribed_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&subscriber.first_name)
        .bind(&subscriber.last_name)
        .bind(&subscriber.email)
        .bind(encode_time(subscribed_at))
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(Subscriber::from_new(
            result.last_insert_rowid(),
            subscribed_at,
            subscriber,
        ))
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM newsletter_subscribers ORDER BY subscribed_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.iter().map(subscriber_from_row).collect()
    }

    async fn delete_subscriber(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM newsletter_subscribers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn subscriber_count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM newsletter_subscribers")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::PhotoDescriptor;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite opens")
    }

    fn restaurant(name: &str, amenities: &[&str]) -> NewRestaurant {
        NewRestaurant {
            name: name.to_string(),
            address: "2700 Charlotte Ave".to_string(),
            city: "Nashville".to_string(),
            county: "Davidson".to_string(),
            cuisine: "Hot Chicken".to_string(),
            phone: Some("615-555-0100".to_string()),
            amenities: amenities.iter().map(|item| item.to_string()).collect(),
            ..NewRestaurant::default()
        }
    }

    #[tokio::test]
    async fn amenities_round_trip_in_order() {
        let store = memory_store().await;
        let created = store
            .create_restaurant(restaurant("Prince's", &["Patio", "Full Bar"]))
            .await
            .expect("insert");

        let fetched = store.get_restaurant(created.id).await.expect("fetch");
        assert_eq!(fetched.amenities, vec!["Patio", "Full Bar"]);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn photos_round_trip_and_status_defaults_to_pending() {
        let store = memory_store().await;
        let created = store
            .create_review(NewReview {
                restaurant_id: 3,
                reviewer_name: "Alice".to_string(),
                rating: 4,
                review_text: "Crispy".to_string(),
                visit_date: "2025-01-01".to_string(),
                photos: vec![PhotoDescriptor {
                    id: "17".to_string(),
                    name: "plate.jpg".to_string(),
                    preview: "blob:abc".to_string(),
                }],
            })
            .await
            .expect("insert");

        let fetched = store.get_review(created.id).await.expect("fetch");
        assert_eq!(fetched.status, SubmissionStatus::Pending);
        assert_eq!(fetched.photos, created.photos);
    }

    #[tokio::test]
    async fn filters_and_orders_listings() {
        let store = memory_store().await;
        let first = store.create_restaurant(restaurant("A", &[])).await.unwrap();
        let second = store.create_restaurant(restaurant("B", &[])).await.unwrap();
        store
            .update_status(
                SubmissionKind::Restaurant,
                first.id,
                SubmissionStatus::Approved,
            )
            .await
            .unwrap();

        let all = store.list_restaurants(StatusFilter::All).await.unwrap();
        assert_eq!(
            all.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );

        let approved = store
            .list_restaurants(SubmissionStatus::Approved.into())
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first.id);

        let counts = store
            .status_counts(SubmissionKind::Restaurant)
            .await
            .unwrap();
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.rejected, 0);
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        let store = memory_store().await;

        let update = store
            .update_status(
                SubmissionKind::Review,
                SubmissionId(9),
                SubmissionStatus::Rejected,
            )
            .await;
        assert!(matches!(update, Err(StoreError::NotFound)));

        let delete = store.delete(SubmissionKind::Restaurant, SubmissionId(9)).await;
        assert!(matches!(delete, Err(StoreError::NotFound)));
        assert!(store.list_reviews(StatusFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_subscriber_email_conflicts() {
        let store = memory_store().await;
        let subscriber = NewSubscriber {
            first_name: "Dolly".to_string(),
            last_name: "Parton".to_string(),
            email: "dolly@example.com".to_string(),
        };
        store
            .create_subscriber(subscriber.clone())
            .await
            .expect("first insert");

        let duplicate = store
            .create_subscriber(NewSubscriber {
                email: "DOLLY@example.com".to_string(),
                ..subscriber
            })
            .await;
        assert!(matches!(duplicate, Err(StoreError::Conflict)));
        assert_eq!(store.subscriber_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn legacy_blank_amenities_decode_as_empty() {
        let store = memory_store().await;
        sqlx::query(
            r#"
            INSERT INTO restaurant_submissions
                (name, address, city, county, cuisine, amenities, submitted_at)
            VALUES ('Legacy', 'x', 'y', 'z', 'BBQ', '', '2025-01-01T00:00:00.000000Z')
            "#,
        )
        .execute(&store.pool)
        .await
        .expect("raw insert");

        let listed = store.list_restaurants(StatusFilter::All).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].amenities.is_empty());
        assert_eq!(listed[0].status, SubmissionStatus::Pending);
    }
}
