//! Bid strength scoring and the tenant offer cap.
//!
//! The score is a UI affordance: it places an offer on a 10-100% bar against
//! a suggested `[min, max]` range. It does not consult market data.

use serde::Serialize;
use thiserror::Error;

use crate::models::BidSuggestion;

/// Offers within this distance above the suggested minimum still read weak.
pub const DEFAULT_WEAK_MARGIN: f64 = 8000.0;

/// Offers a tenant may make on a single listing.
pub const MAX_TENANT_OFFERS: u32 = 3;

const FLOOR_PERCENT: f64 = 10.0;
const MIN_PERCENT: f64 = 35.0;
const MID_PERCENT: f64 = 65.0;
const MAX_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BiddingError {
    #[error("Suggested range is invalid: min {min}, max {max}")]
    InvalidRange { min: f64, max: f64 },
    #[error("Bid amount must be a positive number")]
    InvalidAmount,
    #[error("You have used all {max} offers on this listing")]
    OfferLimitReached { max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrengthLabel {
    Weak,
    Good,
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Weak => "Weak",
            Self::Good => "Good",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StrengthBand {
    Red,
    Green,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BidStrength {
    pub label: StrengthLabel,
    /// Bar fill, 10.0..=100.0.
    pub percentage: f64,
    pub band: StrengthBand,
}

/// Suggested price range for a listing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuggestedRange {
    min: f64,
    max: f64,
}

impl SuggestedRange {
    pub fn new(min: f64, max: f64) -> Result<Self, BiddingError> {
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || max < min {
            return Err(BiddingError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Score `bid` against `range` with the default weak margin.
pub fn score_bid(bid: f64, range: SuggestedRange) -> Result<BidStrength, BiddingError> {
    score_bid_with_margin(bid, range, DEFAULT_WEAK_MARGIN)
}

pub fn score_bid_with_margin(
    bid: f64,
    range: SuggestedRange,
    weak_margin: f64,
) -> Result<BidStrength, BiddingError> {
    if !bid.is_finite() || bid < 0.0 {
        return Err(BiddingError::InvalidAmount);
    }

    let (min, max, mid) = (range.min(), range.max(), range.midpoint());

    let (label, percentage) = if bid < min {
        (StrengthLabel::Weak, (bid / min * MIN_PERCENT).max(FLOOR_PERCENT))
    } else if bid < mid {
        let t = (bid - min) / (mid - min);
        let label = if bid < min + weak_margin {
            StrengthLabel::Weak
        } else {
            StrengthLabel::Good
        };
        (label, MIN_PERCENT + t * (MID_PERCENT - MIN_PERCENT))
    } else if max > mid {
        let t = (bid - mid) / (max - mid);
        (
            StrengthLabel::Good,
            (MID_PERCENT + t * (MAX_PERCENT - MID_PERCENT)).min(MAX_PERCENT),
        )
    } else {
        // Degenerate range where min == max: anything at or above it is full.
        (StrengthLabel::Good, MAX_PERCENT)
    };

    let band = match label {
        StrengthLabel::Weak => StrengthBand::Red,
        StrengthLabel::Good => StrengthBand::Green,
    };

    Ok(BidStrength {
        label,
        percentage,
        band,
    })
}

/// Offers still available to the tenant on a listing.
pub fn offers_left(tenant_offer_count: u32, max_offers: u32) -> u32 {
    max_offers.saturating_sub(tenant_offer_count)
}

/// Client-side guard run before placing a bid. The backend stays the
/// authority; this only spares a request that is bound to be refused.
pub fn ensure_can_offer(tenant_offer_count: u32, max_offers: u32) -> Result<u32, BiddingError> {
    match offers_left(tenant_offer_count, max_offers) {
        0 => Err(BiddingError::OfferLimitReached { max: max_offers }),
        left => Ok(left),
    }
}

/// What the client knows about an offer before sending it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfferCheck {
    /// Offers left including this one; `None` when no suggestion was loaded.
    pub offers_left: Option<u32>,
    /// Strength against the suggested range, when there is a usable one.
    pub strength: Option<BidStrength>,
}

/// Check an offer against whatever the suggestions endpoint returned.
///
/// Only a reached offer cap refuses the offer. A missing suggestion or an
/// unusable range just leaves the strength unscored.
pub fn check_offer(
    amount: f64,
    suggestion: Option<&BidSuggestion>,
    max_offers: u32,
    weak_margin: f64,
) -> Result<OfferCheck, BiddingError> {
    let Some(suggestion) = suggestion else {
        return Ok(OfferCheck {
            offers_left: None,
            strength: None,
        });
    };

    let left = ensure_can_offer(suggestion.offer_count(), max_offers)?;
    let strength = suggestion
        .range()
        .and_then(|range| score_bid_with_margin(amount, range, weak_margin).ok());
    if strength.is_none() {
        tracing::debug!(
            min = suggestion.suggested_min,
            max = suggestion.suggested_max,
            "No usable suggested range, offer left unscored"
        );
    }

    Ok(OfferCheck {
        offers_left: Some(left),
        strength,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(min: f64, max: f64, count: Option<u32>) -> BidSuggestion {
        BidSuggestion {
            suggested_min: min,
            suggested_max: max,
            tenant_offer_count: count,
        }
    }

    #[test]
    fn test_check_offer_scores_against_suggestion() {
        let s = suggestion(430_000.0, 460_000.0, Some(1));
        let check = check_offer(445_000.0, Some(&s), MAX_TENANT_OFFERS, DEFAULT_WEAK_MARGIN)
            .unwrap();

        assert_eq!(check.offers_left, Some(2));
        assert_eq!(check.strength.map(|s| s.label), Some(StrengthLabel::Good));
    }

    #[test]
    fn test_check_offer_unknown_count_counts_as_none() {
        let s = suggestion(430_000.0, 460_000.0, None);
        let check = check_offer(445_000.0, Some(&s), MAX_TENANT_OFFERS, DEFAULT_WEAK_MARGIN)
            .unwrap();

        assert_eq!(check.offers_left, Some(MAX_TENANT_OFFERS));
    }

    #[test]
    fn test_check_offer_invalid_range_still_allows_offer() {
        let s = suggestion(0.0, 0.0, Some(0));
        let check = check_offer(445_000.0, Some(&s), MAX_TENANT_OFFERS, DEFAULT_WEAK_MARGIN)
            .unwrap();

        assert_eq!(check.offers_left, Some(MAX_TENANT_OFFERS));
        assert!(check.strength.is_none());
    }

    #[test]
    fn test_check_offer_without_suggestion() {
        let check = check_offer(445_000.0, None, MAX_TENANT_OFFERS, DEFAULT_WEAK_MARGIN).unwrap();
        assert_eq!(
            check,
            OfferCheck {
                offers_left: None,
                strength: None
            }
        );
    }

    #[test]
    fn test_check_offer_refuses_at_cap() {
        let s = suggestion(430_000.0, 460_000.0, Some(3));
        assert_eq!(
            check_offer(445_000.0, Some(&s), MAX_TENANT_OFFERS, DEFAULT_WEAK_MARGIN),
            Err(BiddingError::OfferLimitReached { max: 3 })
        );
    }

    fn range() -> SuggestedRange {
        SuggestedRange::new(430_000.0, 460_000.0).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_below_minimum_is_weak_and_scaled() {
        let strength = score_bid(400_000.0, range()).unwrap();
        assert_eq!(strength.label, StrengthLabel::Weak);
        assert_eq!(strength.band, StrengthBand::Red);
        assert!(approx(strength.percentage, 400_000.0 / 430_000.0 * 35.0));
        assert!((strength.percentage - 32.56).abs() < 0.01);
    }

    #[test]
    fn test_tiny_bid_is_floored_at_ten_percent() {
        let strength = score_bid(1_000.0, range()).unwrap();
        assert_eq!(strength.label, StrengthLabel::Weak);
        assert_eq!(strength.percentage, 10.0);
    }

    #[test]
    fn test_weak_margin_boundary_is_exclusive() {
        let just_under = score_bid(437_999.0, range()).unwrap();
        assert_eq!(just_under.label, StrengthLabel::Weak);

        let at_boundary = score_bid(438_000.0, range()).unwrap();
        assert_eq!(at_boundary.label, StrengthLabel::Good);
        assert_eq!(at_boundary.band, StrengthBand::Green);
    }

    #[test]
    fn test_at_minimum_is_thirty_five_percent() {
        let strength = score_bid(430_000.0, range()).unwrap();
        assert!(approx(strength.percentage, 35.0));
        assert_eq!(strength.label, StrengthLabel::Weak);
    }

    #[test]
    fn test_midpoint_is_sixty_five_percent() {
        let strength = score_bid(445_000.0, range()).unwrap();
        assert!(approx(strength.percentage, 65.0));
        assert_eq!(strength.label, StrengthLabel::Good);
    }

    #[test]
    fn test_maximum_and_above_cap_at_hundred() {
        let at_max = score_bid(460_000.0, range()).unwrap();
        assert_eq!(at_max.label, StrengthLabel::Good);
        assert!(approx(at_max.percentage, 100.0));

        let above = score_bid(520_000.0, range()).unwrap();
        assert_eq!(above.percentage, 100.0);
    }

    #[test]
    fn test_degenerate_range_does_not_divide_by_zero() {
        let flat = SuggestedRange::new(100_000.0, 100_000.0).unwrap();
        let strength = score_bid(100_000.0, flat).unwrap();
        assert_eq!(strength.percentage, 100.0);
        assert_eq!(strength.label, StrengthLabel::Good);
    }

    #[test]
    fn test_custom_margin() {
        let strength = score_bid_with_margin(433_000.0, range(), 2_000.0).unwrap();
        assert_eq!(strength.label, StrengthLabel::Good);
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        assert!(SuggestedRange::new(0.0, 10.0).is_err());
        assert!(SuggestedRange::new(500.0, 100.0).is_err());
        assert!(SuggestedRange::new(f64::NAN, 100.0).is_err());
        assert_eq!(
            score_bid(-1.0, range()),
            Err(BiddingError::InvalidAmount)
        );
        assert_eq!(
            score_bid(f64::INFINITY, range()),
            Err(BiddingError::InvalidAmount)
        );
    }

    #[test]
    fn test_offer_cap() {
        assert_eq!(offers_left(0, MAX_TENANT_OFFERS), 3);
        assert_eq!(offers_left(2, MAX_TENANT_OFFERS), 1);
        assert_eq!(offers_left(7, MAX_TENANT_OFFERS), 0);

        assert_eq!(ensure_can_offer(2, MAX_TENANT_OFFERS), Ok(1));
        assert_eq!(
            ensure_can_offer(3, MAX_TENANT_OFFERS),
            Err(BiddingError::OfferLimitReached { max: 3 })
        );
    }

    // ==================== Property-Based Tests ====================

    mod proptest_tests {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn percentage_always_within_bar(
                min in 1_000.0f64..1_000_000.0,
                spread in 0.0f64..500_000.0,
                bid in 0.0f64..3_000_000.0
            ) {
                let range = SuggestedRange::new(min, min + spread).unwrap();
                let strength = score_bid(bid, range).unwrap();
                prop_assert!(strength.percentage >= 10.0 - 1e-9);
                prop_assert!(strength.percentage <= 100.0 + 1e-9);
            }

            #[test]
            fn score_is_monotonic_in_bid(
                min in 1_000.0f64..1_000_000.0,
                spread in 1.0f64..500_000.0,
                a in 0.0f64..2_000_000.0,
                b in 0.0f64..2_000_000.0
            ) {
                let range = SuggestedRange::new(min, min + spread).unwrap();
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                let lo_score = score_bid(lo, range).unwrap().percentage;
                let hi_score = score_bid(hi, range).unwrap().percentage;
                prop_assert!(lo_score <= hi_score + 1e-9);
            }

            #[test]
            fn bids_at_or_above_midpoint_are_good(
                min in 1_000.0f64..1_000_000.0,
                spread in 0.0f64..500_000.0,
                extra in 0.0f64..500_000.0
            ) {
                let range = SuggestedRange::new(min, min + spread).unwrap();
                let bid = range.midpoint() + extra;
                prop_assert_eq!(score_bid(bid, range).unwrap().label, StrengthLabel::Good);
            }
        }
    }
}
