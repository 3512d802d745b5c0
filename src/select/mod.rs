/// Rarity-weighted trait picks.
pub mod weighted;
