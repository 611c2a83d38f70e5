//! Commission tier policy.
//!
//! A promoter's tier is a pure function of their cumulative ticket count.
//! Nothing else in the system may set a tier or a rate directly.

/// Commission band. Ordering of the variants matches ascending ticket
/// thresholds, so `Ord` gives "higher tier" for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// Classify a cumulative ticket count into a tier.
    ///
    /// Bands (inclusive lower, exclusive upper):
    ///   0–24 Bronze, 25–49 Silver, 50–99 Gold, 100+ Platinum.
    ///
    /// A negative count can only arise from misapplied reversal deltas;
    /// it is clamped to zero and flagged, never a crash.
    pub fn classify(cumulative_tickets: i64) -> Tier {
        let tickets = if cumulative_tickets < 0 {
            log::warn!(
                "negative cumulative ticket count {cumulative_tickets} clamped to 0 for tier classification"
            );
            0
        } else {
            cumulative_tickets
        };
        match tickets {
            0..=24 => Tier::Bronze,
            25..=49 => Tier::Silver,
            50..=99 => Tier::Gold,
            _ => Tier::Platinum,
        }
    }

    pub fn rate(&self) -> f64 {
        match self {
            Tier::Bronze => 0.20,
            Tier::Silver => 0.25,
            Tier::Gold => 0.30,
            Tier::Platinum => 0.35,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
        }
    }
}
