//! Deterministic review metadata for product cards.
//!
//! The store has no review provider yet, so cards show a rating and review
//! count derived from the product ID. The same ID always produces the same
//! numbers, on every server and across restarts, which keeps cached pages and
//! freshly rendered pages consistent.

use serde::Serialize;

/// Lowest rating that can be produced, in tenths of a star.
const MIN_RATING_TENTHS: u32 = 40;
/// Number of distinct ratings (4.0 through 5.0).
const RATING_STEPS: u32 = 11;
const MIN_COUNT: u32 = 12;
/// Number of distinct counts (12 through 500).
const COUNT_STEPS: u32 = 489;

/// Star rating and review count shown on a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    /// Rating in tenths of a star, `40..=50`.
    pub rating_tenths: u32,
    /// Number of reviews, `12..=500`.
    pub count: u32,
}

impl ReviewSummary {
    /// Derive the summary for a product (or any other) identifier.
    #[must_use]
    pub fn for_id(id: &str) -> Self {
        let mut rng = Mulberry32::new(string_hash(id));
        let rating_tenths = MIN_RATING_TENTHS + scale(rng.next_u32(), RATING_STEPS);
        let count = MIN_COUNT + scale(rng.next_u32(), COUNT_STEPS);
        Self {
            rating_tenths,
            count,
        }
    }

    /// Rating formatted with one decimal, e.g. `4.7`.
    #[must_use]
    pub fn rating(&self) -> String {
        format!("{}.{}", self.rating_tenths / 10, self.rating_tenths % 10)
    }

    /// Full, half and empty stars for a five-star display.
    #[must_use]
    pub const fn stars(&self) -> (u32, u32, u32) {
        let full = self.rating_tenths / 10;
        let half = if full < 5 && self.rating_tenths % 10 >= 5 {
            1
        } else {
            0
        };
        (full, half, 5 - full - half)
    }
}

/// Shorthand for [`ReviewSummary::for_id`].
#[must_use]
pub fn review_summary(id: &str) -> ReviewSummary {
    ReviewSummary::for_id(id)
}

/// 32-bit multiplicative string hash (`h = h * 31 + byte`).
fn string_hash(input: &str) -> u32 {
    input
        .bytes()
        .fold(0u32, |hash, byte| hash.wrapping_mul(31).wrapping_add(u32::from(byte)))
}

/// Map a uniform 32-bit sample onto `0..span`.
#[allow(clippy::cast_possible_truncation)]
const fn scale(sample: u32, span: u32) -> u32 {
    ((sample as u64 * span as u64) >> 32) as u32
}

/// Mulberry32: a tiny PRNG with a single 32-bit state word.
struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        let summary = ReviewSummary::for_id("gid://shopify/Product/1");
        assert_eq!(summary.rating_tenths, 49);
        assert_eq!(summary.count, 198);

        let summary = ReviewSummary::for_id("gid://shopify/Product/8023944626406");
        assert_eq!(summary.rating(), "4.5");
        assert_eq!(summary.count, 146);

        let summary = ReviewSummary::for_id("sunset-tee");
        assert_eq!((summary.rating_tenths, summary.count), (43, 442));
    }

    #[test]
    fn test_empty_id() {
        let summary = review_summary("");
        assert_eq!((summary.rating_tenths, summary.count), (42, 12));
    }

    #[test]
    fn test_deterministic_and_in_range() {
        for n in 0..500 {
            let id = format!("gid://shopify/Product/{n}");
            let a = ReviewSummary::for_id(&id);
            let b = ReviewSummary::for_id(&id);
            assert_eq!(a, b);
            assert!((40..=50).contains(&a.rating_tenths), "{id}: {a:?}");
            assert!((12..=500).contains(&a.count), "{id}: {a:?}");
        }
    }

    #[test]
    fn test_stars_sum_to_five() {
        for tenths in 40..=50 {
            let summary = ReviewSummary {
                rating_tenths: tenths,
                count: 12,
            };
            let (full, half, empty) = summary.stars();
            assert_eq!(full + half + empty, 5);
        }
        let summary = ReviewSummary {
            rating_tenths: 46,
            count: 12,
        };
        assert_eq!(summary.stars(), (4, 1, 0));
        let summary = ReviewSummary {
            rating_tenths: 50,
            count: 12,
        };
        assert_eq!(summary.stars(), (5, 0, 0));
    }
}
