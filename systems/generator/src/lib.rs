#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic procedural generation of cell contents.
//!
//! Every decision is a pure function of the grid coordinate and a salt
//! string, so a coordinate produces the same cell on every visit and in every
//! process without storing anything.

use geo_merge_core::{GameConfig, GridCoord, Token, SPAWN_SALT, VALUE_SALT};
use sha2::{Digest, Sha256};

/// Returns a reproducible pseudo-random value in `[0, 1)` for `coord` and `salt`.
#[must_use]
pub fn luck(coord: GridCoord, salt: &str) -> f64 {
    let mut hasher = Sha256::new();
    hasher.update(coord.i().to_le_bytes());
    hasher.update(coord.j().to_le_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    unit_interval(u64::from_le_bytes(bytes))
}

fn unit_interval(bits: u64) -> f64 {
    const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);
    ((bits >> 11) as f64) * SCALE
}

/// Spawn rules applied to coordinates that the overlay knows nothing about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnTable {
    spawn_chance: f64,
    natural_ranks: u8,
}

impl SpawnTable {
    /// Creates a table spawning with `spawn_chance` and seeding from the
    /// lowest `natural_ranks` table values. A rank count of zero is treated
    /// as one.
    #[must_use]
    pub const fn new(spawn_chance: f64, natural_ranks: u8) -> Self {
        let natural_ranks = if natural_ranks == 0 { 1 } else { natural_ranks };
        Self {
            spawn_chance,
            natural_ranks,
        }
    }

    /// Builds the table described by a session configuration.
    #[must_use]
    pub const fn from_config(config: &GameConfig) -> Self {
        Self::new(config.spawn_chance, config.natural_spawn_ranks)
    }

    /// Reports whether `coord` hosts a cell.
    #[must_use]
    pub fn should_spawn(&self, coord: GridCoord) -> bool {
        luck(coord, SPAWN_SALT) < self.spawn_chance
    }

    /// Token a spawned cell at `coord` is seeded with.
    #[must_use]
    pub fn seed_token(&self, coord: GridCoord) -> Token {
        let ranks = f64::from(self.natural_ranks);
        let index = (luck(coord, VALUE_SALT) * ranks).floor() as u8;
        Token::saturating_from_rank(index.min(self.natural_ranks - 1))
    }

    /// Runs the spawn decision and, when it passes, the value selection.
    #[must_use]
    pub fn generate(&self, coord: GridCoord) -> Option<Token> {
        if self.should_spawn(coord) {
            Some(self.seed_token(coord))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_interval_spans_zero_to_below_one() {
        assert_eq!(unit_interval(0), 0.0);
        assert!(unit_interval(u64::MAX) < 1.0);
    }

    #[test]
    fn zero_rank_count_is_clamped() {
        let table = SpawnTable::new(1.0, 0);
        assert_eq!(table.seed_token(GridCoord::new(3, 4)), Token::MIN);
    }

    #[test]
    fn certain_spawn_chance_always_spawns() {
        let table = SpawnTable::new(1.0, 11);
        assert!(table.generate(GridCoord::new(-5, 9)).is_some());
        let never = SpawnTable::new(0.0, 11);
        assert!(never.generate(GridCoord::new(-5, 9)).is_none());
    }
}
