// Fixed table of brain types and weighted selection over it.

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrainType {
    pub id: &'static str,
    pub name: &'static str,
    pub rarity: &'static str,
    pub income_per_second: f64,
    /// Relative spawn weight.
    pub weight: u32,
}

pub const BRAIN_TYPES: [BrainType; 4] = [
    BrainType {
        id: "common",
        name: "Soggy Brain",
        rarity: "common",
        income_per_second: 1.0,
        weight: 60,
    },
    BrainType {
        id: "clever",
        name: "Clever Brain",
        rarity: "uncommon",
        income_per_second: 5.0,
        weight: 25,
    },
    BrainType {
        id: "genius",
        name: "Genius Brain",
        rarity: "rare",
        income_per_second: 18.0,
        weight: 10,
    },
    BrainType {
        id: "galaxy",
        name: "Galaxy Brain",
        rarity: "legendary",
        income_per_second: 60.0,
        weight: 5,
    },
];

/// Index into [`BRAIN_TYPES`].
pub type BrainKind = usize;

pub fn brain_type(kind: BrainKind) -> &'static BrainType {
    &BRAIN_TYPES[kind]
}

pub fn kind_by_id(id: &str) -> Option<BrainKind> {
    BRAIN_TYPES.iter().position(|t| t.id == id)
}

pub fn total_weight(table: &[BrainType]) -> u32 {
    table.iter().map(|t| t.weight).sum()
}

/// Resolves a roll in `[0, total_weight)` to a table index.
///
/// Subtracts each weight in table order and returns the first entry that brings the
/// remainder to zero or below. A roll left over after the last entry falls back to index 0.
pub fn pick_weighted(table: &[BrainType], roll: f64) -> usize {
    let mut remaining = roll;
    for (index, entry) in table.iter().enumerate() {
        remaining -= f64::from(entry.weight);
        if remaining <= 0.0 {
            return index;
        }
    }
    0
}

pub fn pick_random<R: Rng + ?Sized>(table: &[BrainType], rng: &mut R) -> usize {
    let total = f64::from(total_weight(table));
    if total <= 0.0 {
        return 0;
    }
    pick_weighted(table, rng.gen_range(0.0..total))
}
