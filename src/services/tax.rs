//! GST computation. Total tax is a flat 18% of the subtotal after
//! discount; intra-state destinations split it evenly into CGST + SGST,
//! everything else (including a missing destination state) is IGST.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Half of the statutory 18% rate, applied twice for intra-state orders.
const GST_HALF_RATE: Decimal = dec!(0.09);
const GST_RATE: Decimal = dec!(0.18);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GstBreakdown {
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub total: Decimal,
}

impl GstBreakdown {
    pub fn zero() -> Self {
        Self {
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            igst: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }
}

/// Splits 18% GST on `taxable_amount` between CGST/SGST and IGST based on
/// whether the destination state matches the business origin state
/// (case-insensitive, whitespace-trimmed). A missing or blank destination
/// is treated as inter-state.
pub fn compute_gst(taxable_amount: Decimal, destination_state: Option<&str>, business_state: &str) -> GstBreakdown {
    let intra_state = destination_state
        .map(|s| s.trim().eq_ignore_ascii_case(business_state.trim()) && !s.trim().is_empty())
        .unwrap_or(false);

    if intra_state {
        // Round each half independently so cgst == sgst holds exactly.
        let half = (taxable_amount * GST_HALF_RATE).round_dp(2);
        GstBreakdown {
            cgst: half,
            sgst: half,
            igst: Decimal::ZERO,
            total: half + half,
        }
    } else {
        let igst = (taxable_amount * GST_RATE).round_dp(2);
        GstBreakdown {
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            igst,
            total: igst,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test]
    fn intra_state_splits_evenly() {
        let gst = compute_gst(dec!(1000), Some("Maharashtra"), "Maharashtra");
        assert_eq!(gst.cgst, dec!(90));
        assert_eq!(gst.sgst, dec!(90));
        assert_eq!(gst.igst, Decimal::ZERO);
        assert_eq!(gst.total, dec!(180));
    }

    #[test]
    fn inter_state_is_all_igst() {
        let gst = compute_gst(dec!(1000), Some("Karnataka"), "Maharashtra");
        assert_eq!(gst.cgst, Decimal::ZERO);
        assert_eq!(gst.sgst, Decimal::ZERO);
        assert_eq!(gst.igst, dec!(180));
        assert_eq!(gst.total, dec!(180));
    }

    #[test_case("maharashtra" ; "lowercase")]
    #[test_case("MAHARASHTRA" ; "uppercase")]
    #[test_case("  Maharashtra  " ; "padded")]
    fn state_compare_is_case_insensitive(destination: &str) {
        let gst = compute_gst(dec!(500), Some(destination), "Maharashtra");
        assert_eq!(gst.igst, Decimal::ZERO);
        assert_eq!(gst.cgst, gst.sgst);
    }

    #[test]
    fn missing_state_is_inter_state() {
        let gst = compute_gst(dec!(500), None, "Maharashtra");
        assert_eq!(gst.igst, dec!(90));
        assert_eq!(gst.cgst, Decimal::ZERO);

        let blank = compute_gst(dec!(500), Some("   "), "Maharashtra");
        assert_eq!(blank.igst, dec!(90));
    }

    #[test]
    fn zero_subtotal_zero_tax() {
        let gst = compute_gst(Decimal::ZERO, Some("Maharashtra"), "Maharashtra");
        assert_eq!(gst.total, Decimal::ZERO);
    }

    proptest! {
        #[test]
        fn components_always_sum_to_total(
            amount in 0i64..10_000_000,
            intra in proptest::bool::ANY,
        ) {
            let taxable = Decimal::new(amount, 2);
            let destination = if intra { "Maharashtra" } else { "Kerala" };
            let gst = compute_gst(taxable, Some(destination), "Maharashtra");
            prop_assert_eq!(gst.cgst + gst.sgst + gst.igst, gst.total);
            if intra {
                prop_assert_eq!(gst.cgst, gst.sgst);
                prop_assert_eq!(gst.igst, Decimal::ZERO);
            } else {
                prop_assert_eq!(gst.cgst, Decimal::ZERO);
                prop_assert_eq!(gst.sgst, Decimal::ZERO);
            }
        }
    }
}
