use crate::infra::Services;
use clap::Args;
use std::sync::Arc;
use tastemap::error::AppError;
use tastemap::moderation::{
    NewRestaurant, NewReview, RequestContext, StaticTokenGate, StatusFilter, SubmissionKind,
    SubmissionStatus,
};
use tastemap::newsletter::NewSubscriber;
use tastemap::store::InMemoryStore;

const DEMO_TOKEN: &str = "demo-admin-session";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Name of the restaurant submitted during the demo
    #[arg(long, default_value = "Arnold's Country Kitchen")]
    pub(crate) restaurant: String,
    /// Star rating (1-5) given by the demo reviewer
    #[arg(long, default_value_t = 5)]
    pub(crate) rating: i32,
    /// Reject the review instead of approving it
    #[arg(long)]
    pub(crate) reject_review: bool,
    /// Print the public catalogue as JSON after moderation
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        restaurant,
        rating,
        reject_review,
        json,
    } = args;

    let store = Arc::new(InMemoryStore::new());
    let services = Services::new(
        store,
        StaticTokenGate::new(Some(DEMO_TOKEN.to_string())),
    );
    let moderation = &services.moderation;
    let admin = RequestContext::with_token(DEMO_TOKEN);

    println!("Restaurant directory moderation demo");

    let submitted = moderation
        .submit_restaurant(NewRestaurant {
            name: restaurant,
            address: "605 8th Ave S".to_string(),
            city: "Nashville".to_string(),
            county: "Davidson".to_string(),
            cuisine: "Meat and three".to_string(),
            price_range: Some("$".to_string()),
            amenities: vec!["Lunch".to_string(), "Family friendly".to_string()],
            ..NewRestaurant::default()
        })
        .await?;
    println!(
        "- Submitted restaurant #{} '{}' -> {}",
        submitted.id, submitted.name, submitted.status
    );

    let review = moderation
        .submit_review(NewReview {
            restaurant_id: submitted.id.0,
            reviewer_name: "Alice".to_string(),
            rating,
            review_text: "Fried chicken and chess pie, no notes.".to_string(),
            visit_date: "2024-04-12".to_string(),
            photos: Vec::new(),
        })
        .await?;
    println!(
        "- Submitted review #{} ({} stars) -> {}",
        review.id, review.rating, review.status
    );

    let anonymous = moderation
        .approve(
            &RequestContext::anonymous(),
            SubmissionKind::Restaurant,
            submitted.id,
        )
        .await;
    if let Err(err) = anonymous {
        println!("- Anonymous approval refused: {err}");
    }

    moderation
        .approve(&admin, SubmissionKind::Restaurant, submitted.id)
        .await?;
    if reject_review {
        moderation
            .reject(&admin, SubmissionKind::Review, review.id)
            .await?;
    } else {
        moderation
            .approve(&admin, SubmissionKind::Review, review.id)
            .await?;
    }

    let pending = moderation
        .admin_reviews(&admin, StatusFilter::Only(SubmissionStatus::Pending))
        .await?;
    println!("- Reviews still awaiting moderation: {}", pending.len());

    services
        .newsletter
        .subscribe(NewSubscriber {
            first_name: "Alice".to_string(),
            last_name: "Walker".to_string(),
            email: "alice@example.com".to_string(),
        })
        .await?;

    let catalogue = moderation.public_restaurants().await?;
    println!("\nPublic catalogue");
    for entry in &catalogue {
        println!(
            "  - {} ({}, {}) | {:.1} stars from {} review(s)",
            entry.restaurant.name,
            entry.restaurant.city,
            entry.restaurant.cuisine,
            entry.rating,
            entry.review_count
        );
    }

    let stats = moderation.dashboard_stats(&admin).await?;
    println!("\nDashboard");
    println!(
        "  restaurants: {} pending / {} approved / {} rejected",
        stats.pending_restaurants, stats.approved_restaurants, stats.rejected_restaurants
    );
    println!(
        "  reviews: {} pending / {} approved / {} rejected",
        stats.pending_reviews, stats.approved_reviews, stats.rejected_reviews
    );
    println!("  newsletter subscribers: {}", stats.newsletter_subscribers);

    if json {
        let reviews = moderation.public_reviews(Some(submitted.id.0)).await?;
        let payload = serde_json::json!({
            "restaurants": catalogue,
            "reviews": reviews,
        });
        println!("\n{}", serde_json::to_string_pretty(&payload)?);
    }

    Ok(())
}
