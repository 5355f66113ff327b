use super::*;
use crate::test_utils::{arb_date, arb_money};
use proptest::prelude::*;

// ============================================================================
// Depreciation bounds
// ============================================================================

proptest! {
    /// Book value stays between salvage and cost
    #[test]
    fn prop_current_value_is_bounded(
        cost in arb_money(),
        salvage_ratio in 0u32..100u32,
        life in 1i32..40,
        purchase in arb_date(),
        as_of in arb_date(),
    ) {
        let salvage = cost * f64::from(salvage_ratio) / 100.0;
        let dep = straight_line_depreciation(cost, salvage, life, purchase, as_of);
        prop_assert!(dep.current_value <= cost + 1e-9);
        prop_assert!(dep.current_value >= salvage - 1e-9,
            "value {} fell below salvage {}", dep.current_value, salvage);
        prop_assert!((dep.accumulated + dep.current_value - cost).abs() < 1e-6);
    }

    /// Value never goes up as time passes
    #[test]
    fn prop_current_value_is_non_increasing(
        cost in arb_money(),
        life in 1i32..40,
        purchase in arb_date(),
        first in arb_date(),
        extra_days in 0i64..5000,
    ) {
        let later = first + Duration::days(extra_days);
        let earlier_value = straight_line_depreciation(cost, 0.0, life, purchase, first).current_value;
        let later_value = straight_line_depreciation(cost, 0.0, life, purchase, later).current_value;
        prop_assert!(later_value <= earlier_value + 1e-9);
    }

    /// A fully depreciated asset is worth exactly its salvage value
    #[test]
    fn prop_end_of_life_reaches_salvage(
        cost in arb_money(),
        life in 1i32..20,
        purchase in arb_date(),
    ) {
        let salvage = cost / 10.0;
        let as_of = purchase + Duration::days(i64::from(life) * 366 + 1);
        let dep = straight_line_depreciation(cost, salvage, life, purchase, as_of);
        prop_assert!((dep.current_value - salvage).abs() < 1e-9);
    }
}

// ============================================================================
// Thresholds
// ============================================================================

proptest! {
    #[test]
    fn prop_low_stock_matches_comparison(quantity in 0i32..10_000, min in 0i32..10_000) {
        prop_assert_eq!(is_low_stock(quantity, min), quantity <= min);
    }

    /// Returned checkouts are never overdue, whatever the dates
    #[test]
    fn prop_checked_in_is_never_overdue(
        expected in arb_date(),
        returned in arb_date(),
        now in arb_date(),
    ) {
        let at = |d: NaiveDate| d.and_hms_opt(9, 0, 0).unwrap();
        prop_assert!(!is_overdue(Some(at(expected)), Some(at(returned)), at(now)));
    }
}
