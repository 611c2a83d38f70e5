//! Tier policy tests: band boundaries, rates, monotonicity, and the
//! negative-count clamp.

use promoledger_core::tier::Tier;

// ─────────────────────────────────────────────────────────────────────────────
// Band boundaries (inclusive lower, exclusive upper)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn zero_tickets_is_bronze() {
    assert_eq!(Tier::classify(0), Tier::Bronze);
}

#[test]
fn bronze_silver_boundary() {
    assert_eq!(Tier::classify(24), Tier::Bronze);
    assert_eq!(Tier::classify(25), Tier::Silver);
}

#[test]
fn silver_gold_boundary() {
    assert_eq!(Tier::classify(49), Tier::Silver);
    assert_eq!(Tier::classify(50), Tier::Gold);
}

#[test]
fn gold_platinum_boundary() {
    assert_eq!(Tier::classify(99), Tier::Gold);
    assert_eq!(Tier::classify(100), Tier::Platinum);
    assert_eq!(Tier::classify(100_000), Tier::Platinum);
}

// ─────────────────────────────────────────────────────────────────────────────
// Rates
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn rates_match_bands() {
    assert_eq!(Tier::Bronze.rate(), 0.20);
    assert_eq!(Tier::Silver.rate(), 0.25);
    assert_eq!(Tier::Gold.rate(), 0.30);
    assert_eq!(Tier::Platinum.rate(), 0.35);
}

#[test]
fn labels_are_stable() {
    assert_eq!(Tier::classify(10).label(), "Bronze");
    assert_eq!(Tier::classify(30).label(), "Silver");
    assert_eq!(Tier::classify(60).label(), "Gold");
    assert_eq!(Tier::classify(150).label(), "Platinum");
}

// ─────────────────────────────────────────────────────────────────────────────
// Monotonicity and the clamp
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn classification_is_monotonic() {
    let mut last = Tier::Bronze;
    for tickets in 0..=150 {
        let tier = Tier::classify(tickets);
        assert!(
            tier >= last,
            "tier regressed at {tickets} tickets: {last:?} -> {tier:?}"
        );
        last = tier;
    }
}

#[test]
fn negative_count_clamps_to_bronze() {
    // Misapplied reversal arithmetic must classify, not crash.
    assert_eq!(Tier::classify(-1), Tier::Bronze);
    assert_eq!(Tier::classify(-500), Tier::Bronze);
}
