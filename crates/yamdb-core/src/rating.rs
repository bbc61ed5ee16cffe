//! # Rating Aggregation
//!
//! A title's rating is the arithmetic mean of its reviews' scores, or `None`
//! when nobody has reviewed it yet.
//!
//! ## Why Sum + Count?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The store answers one aggregate query per read:                       │
//! │                                                                         │
//! │     SELECT SUM(score), COUNT(score) FROM reviews WHERE title_id = ?    │
//! │                                                                         │
//! │  ScoreAggregate turns that pair into the exposed rating. Nothing is    │
//! │  cached: reviews are edited and deleted concurrently, so the rating    │
//! │  is derived from whatever rows exist at read time.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Sum and count of review scores for one title.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreAggregate {
    pub sum: i64,
    pub count: i64,
}

impl ScoreAggregate {
    pub const fn new(sum: i64, count: i64) -> Self {
        ScoreAggregate { sum, count }
    }

    /// The mean score, or `None` with zero reviews.
    ///
    /// ## Example
    /// ```rust
    /// use yamdb_core::ScoreAggregate;
    ///
    /// assert_eq!(ScoreAggregate::new(12, 2).rating(), Some(6.0));
    /// assert_eq!(ScoreAggregate::default().rating(), None);
    /// ```
    pub fn rating(&self) -> Option<f64> {
        if self.count <= 0 {
            return None;
        }
        Some(self.sum as f64 / self.count as f64)
    }
}
