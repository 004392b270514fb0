//! Opportunity Detector
//!
//! Computes the implied spot price from the four conditional-market legs,
//! compares it to the observed spot price, and classifies the resulting
//! flow direction and cheaper conditional leg.
//!
//! Author: AI-Generated
//! Created: 2026-02-02

use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{CheaperLeg, Price, Verdict};

/// The four prices a tick needs to detect an opportunity.
#[derive(Debug, Clone, Copy)]
pub struct TickPrices {
    pub p_yes: Price,
    pub p_no: Price,
    pub p_pred_yes: Price,
    pub p_spot: Price,
}

/// Implied price the spot venue should quote, given the conditional legs:
/// `p_pred_yes * p_yes + (1 - p_pred_yes) * p_no`.
pub fn implied_price(prices: &TickPrices) -> Price {
    let p_no_pred = Decimal::ONE - prices.p_pred_yes;
    prices.p_pred_yes * prices.p_yes + p_no_pred * prices.p_no
}

/// `detect(prices, tolerance) -> Verdict`.
///
/// Exactly at the tolerance boundary, no opportunity is reported
/// (less-than-or-equal). When `p_yes == p_no`, `cheaper = Yes` (stable
/// tie-break).
pub fn detect(prices: &TickPrices, tolerance: Price) -> Verdict {
    let implied = implied_price(prices);
    let dev = (prices.p_spot - implied).abs();

    debug!(
        implied = %implied,
        spot = %prices.p_spot,
        dev = %dev,
        tolerance = %tolerance,
        "opportunity detector evaluated"
    );

    if dev <= tolerance {
        return Verdict::None;
    }

    let cheaper = if prices.p_yes < prices.p_no {
        CheaperLeg::Yes
    } else {
        CheaperLeg::No
    };

    if prices.p_spot > implied {
        Verdict::Buy(cheaper)
    } else {
        Verdict::Sell(cheaper)
    }
}

/// Sanity-checks `p_pred_yes + p_pred_no` against the split-position
/// identity assumed by `implied_price`. Returns an error string describing
/// the deviation if it exceeds `epsilon`; the caller aborts the tick rather
/// than proceed with an inconsistent implied price.
///
/// See the Open Question on re-normalisation: the spec treats the identity
/// as invariant, but this sanity-check path is the implementer-provided
/// abort-on-violation option it invites.
pub fn check_pred_yes_no_identity(p_pred_yes: Price, p_pred_no: Price, epsilon: Price) -> Result<(), String> {
    let sum = p_pred_yes + p_pred_no;
    let dev = (sum - Decimal::ONE).abs();
    if dev > epsilon {
        return Err(format!(
            "p_pred_yes + p_pred_no = {sum} deviates from 1 by {dev}, exceeding epsilon {epsilon}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn prices(p_yes: Decimal, p_no: Decimal, p_pred_yes: Decimal, p_spot: Decimal) -> TickPrices {
        TickPrices {
            p_yes,
            p_no,
            p_pred_yes,
            p_spot,
        }
    }

    #[test]
    fn scenario_a_no_opportunity() {
        let p = prices(dec!(0.50), dec!(0.50), dec!(0.50), dec!(0.50));
        assert_eq!(detect(&p, dec!(0.01)), Verdict::None);
    }

    #[test]
    fn scenario_b_buy_yes_cheaper() {
        let p = prices(dec!(0.40), dec!(0.60), dec!(0.50), dec!(0.55));
        assert_eq!(implied_price(&p), dec!(0.50));
        assert_eq!(detect(&p, dec!(0.01)), Verdict::Buy(CheaperLeg::Yes));
    }

    #[test]
    fn scenario_c_sell_no_cheaper() {
        let p = prices(dec!(0.70), dec!(0.30), dec!(0.50), dec!(0.40));
        assert_eq!(implied_price(&p), dec!(0.50));
        assert_eq!(detect(&p, dec!(0.02)), Verdict::Sell(CheaperLeg::No));
    }

    #[test]
    fn boundary_exactly_at_tolerance_is_no_opportunity() {
        let p = prices(dec!(0.40), dec!(0.60), dec!(0.50), dec!(0.51));
        // implied = 0.5, dev = 0.01, tolerance = 0.01 -> strictly less-than fails
        assert_eq!(detect(&p, dec!(0.01)), Verdict::None);
    }

    #[test]
    fn tie_break_yes_when_equal() {
        let p = prices(dec!(0.50), dec!(0.50), dec!(0.50), dec!(0.60));
        assert_eq!(detect(&p, dec!(0.01)), Verdict::Buy(CheaperLeg::Yes));
    }

    #[test]
    fn detector_monotonicity_spot_increase_never_yields_sell() {
        let low = prices(dec!(0.40), dec!(0.60), dec!(0.50), dec!(0.52));
        let high = prices(dec!(0.40), dec!(0.60), dec!(0.50), dec!(0.70));
        let v_low = detect(&low, dec!(0.01));
        let v_high = detect(&high, dec!(0.01));
        assert!(!matches!(v_low, Verdict::Sell(_)));
        assert!(!matches!(v_high, Verdict::Sell(_)));
    }

    #[test]
    fn symmetric_tolerance_flips_flow_keeps_cheaper_leg() {
        let buy = prices(dec!(0.40), dec!(0.60), dec!(0.50), dec!(0.55));
        let sell = prices(dec!(0.40), dec!(0.60), dec!(0.50), dec!(0.45));
        let v_buy = detect(&buy, dec!(0.01));
        let v_sell = detect(&sell, dec!(0.01));
        assert_eq!(v_buy, Verdict::Buy(CheaperLeg::Yes));
        assert_eq!(v_sell, Verdict::Sell(CheaperLeg::Yes));
    }

    #[test]
    fn implied_price_bounds_within_min_max_of_legs() {
        let p = prices(dec!(0.35), dec!(0.72), dec!(0.3), dec!(0.0));
        let implied = implied_price(&p);
        assert!(implied >= p.p_yes.min(p.p_no));
        assert!(implied <= p.p_yes.max(p.p_no));
    }

    #[test]
    fn identity_check_flags_large_deviation() {
        assert!(check_pred_yes_no_identity(dec!(0.6), dec!(0.6), dec!(0.001)).is_err());
        assert!(check_pred_yes_no_identity(dec!(0.6), dec!(0.4), dec!(0.001)).is_ok());
    }
}
