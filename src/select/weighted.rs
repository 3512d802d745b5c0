//! Rarity-weighted trait selection.
//!
//! Draw convention: `r` is uniform in `[0, total)` and the winner is the first trait (in stored
//! order) whose cumulative weight is strictly greater than `r`. Zero-weight traits therefore never
//! win unless every weight is zero, in which case the first trait is returned without drawing.

use rand::Rng;

use crate::model::layers::Trait;

/// Selection weight for a rarity value. Non-finite or negative rarities count as `1`.
pub fn rarity_weight(rarity: f64) -> f64 {
    if rarity.is_finite() && rarity >= 0.0 {
        rarity
    } else {
        1.0
    }
}

/// Sum of the normalized weights of `traits`.
pub fn total_weight(traits: &[Trait]) -> f64 {
    traits.iter().map(|t| rarity_weight(t.rarity)).sum()
}

/// Pick one trait using `rng` as the random source.
///
/// Returns `None` only for an empty slice; callers skip such layers entirely.
pub fn pick<'a, R: Rng + ?Sized>(traits: &'a [Trait], rng: &mut R) -> Option<&'a Trait> {
    let first = traits.first()?;
    let total = total_weight(traits);
    if total <= 0.0 || !total.is_finite() {
        return Some(first);
    }
    let unit: f64 = rng.random();
    pick_at(traits, unit * total)
}

/// Deterministic core of [`pick`]: select with an explicit draw `r` in `[0, total)`.
pub fn pick_at(traits: &[Trait], r: f64) -> Option<&Trait> {
    let first = traits.first()?;
    let total = total_weight(traits);
    if total <= 0.0 || !total.is_finite() {
        return Some(first);
    }

    let mut cumulative = 0.0;
    for t in traits {
        cumulative += rarity_weight(t.rarity);
        if r < cumulative {
            return Some(t);
        }
    }

    // Rounding can leave `r` a hair above the final sum; the last weighted trait owns that tail.
    traits
        .iter()
        .rev()
        .find(|t| rarity_weight(t.rarity) > 0.0)
        .or(Some(first))
}

#[cfg(test)]
#[path = "../../tests/unit/select/weighted.rs"]
mod tests;
