//! Unified review list for title pages.

use cinescope_api::supabase::ReviewWithAuthor;
use cinescope_api::tmdb::TmdbReview;

/// A review from either source.
#[derive(Debug, Clone)]
pub enum Review {
    /// Written on the metadata provider.
    Provider(TmdbReview),
    /// Written by a member of this app.
    Member(ReviewWithAuthor),
}

/// Display shape shared by both review sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewView {
    /// Author display name.
    pub author: String,
    /// Rating out of 10, when the author gave one.
    pub rating: Option<f64>,
    /// Review body.
    pub content: String,
    /// Creation time as reported by the source.
    pub created_at: Option<String>,
    /// `true` for member reviews.
    pub is_member: bool,
}

impl From<Review> for ReviewView {
    fn from(review: Review) -> Self {
        match review {
            Review::Provider(r) => {
                let author = r
                    .author_details
                    .username
                    .filter(|name| !name.is_empty())
                    .unwrap_or(r.author);
                Self {
                    author,
                    rating: r.author_details.rating,
                    content: r.content,
                    created_at: r.created_at,
                    is_member: false,
                }
            }
            Review::Member(m) => Self {
                author: m.username,
                rating: Some(f64::from(m.review.rating.get())),
                content: m.review.content,
                created_at: Some(m.review.created_at.to_rfc3339()),
                is_member: true,
            },
        }
    }
}

/// Member reviews first, then provider reviews, each in source order.
#[must_use]
pub fn merge_reviews(provider: Vec<TmdbReview>, members: Vec<ReviewWithAuthor>) -> Vec<ReviewView> {
    members
        .into_iter()
        .map(Review::Member)
        .chain(provider.into_iter().map(Review::Provider))
        .map(ReviewView::from)
        .collect()
}
