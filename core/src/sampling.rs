//! Random draws shared by the world and the spawners.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{config::ConfigError, BoundaryParams, CellKind, KindWeight};

/// Closed description of a floating-point range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinMaxF {
    /// Lower bound, always reachable.
    pub min: f32,
    /// Upper bound, never reached unless equal to `min`.
    pub max: f32,
}

impl MinMaxF {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Draws a value uniformly from `[min, max)`.
    ///
    /// A degenerate or inverted range yields `min`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min < self.max {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Integer range whose upper bound is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinMaxI {
    /// Lower bound, inclusive.
    pub min: i32,
    /// Upper bound, exclusive.
    pub max: i32,
}

impl MinMaxI {
    /// Creates a new range.
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Draws an integer from `[min, max)`, or `min` when the range is empty.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        if self.min < self.max {
            rng.gen_range(self.min..self.max)
        } else {
            self.min
        }
    }
}

/// Weighted choice over cell kinds drawn by rejection sampling.
///
/// Each draw picks an entry uniformly and accepts it with probability equal
/// to its weight, retrying until an entry is accepted. Weights therefore act
/// as relative acceptance chances rather than a normalised distribution.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedTable {
    entries: Vec<KindWeight>,
}

impl WeightedTable {
    /// Validates the entries and builds a table.
    pub fn new(entries: Vec<KindWeight>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyWeightTable);
        }
        for entry in &entries {
            if !entry.weight.is_finite() || !(0.0..=1.0).contains(&entry.weight) {
                return Err(ConfigError::InvalidWeight {
                    kind: entry.kind,
                    weight: entry.weight,
                });
            }
        }
        if entries.iter().all(|entry| entry.weight <= 0.0) {
            return Err(ConfigError::UnsatisfiableWeights);
        }
        Ok(Self { entries })
    }

    /// Entries in the order they were provided.
    #[must_use]
    pub fn entries(&self) -> &[KindWeight] {
        &self.entries
    }

    /// Draws a kind.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> CellKind {
        loop {
            let entry = self.entries[rng.gen_range(0..self.entries.len())];
            if rng.gen::<f32>() < entry.weight {
                return entry.kind;
            }
        }
    }
}

/// Interior rectangle in which spawners place new bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arena {
    min: Vec2,
    max: Vec2,
}

impl Arena {
    /// Builds the spawn rectangle by insetting the boundary by its margin.
    #[must_use]
    pub fn from_boundary(boundary: &BoundaryParams) -> Self {
        let margin = Vec2::splat(boundary.margin);
        Self {
            min: margin,
            max: Vec2::new(boundary.width, boundary.height) - margin,
        }
    }

    /// Lower-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Upper-right corner.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Reports whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Draws a point uniformly from the rectangle.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            MinMaxF::new(self.min.x, self.max.x).sample(rng),
            MinMaxF::new(self.min.y, self.max.y).sample(rng),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn degenerate_ranges_return_their_minimum() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(MinMaxF::new(3.0, 3.0).sample(&mut rng), 3.0);
        assert_eq!(MinMaxI::new(4, 4).sample(&mut rng), 4);
        assert_eq!(MinMaxI::new(4, 2).sample(&mut rng), 4);
    }

    #[test]
    fn integer_upper_bound_is_exclusive() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let range = MinMaxI::new(2, 5);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let value = range.sample(&mut rng);
            assert!((2..5).contains(&value), "drew {value}");
            seen[value as usize] = true;
        }
        assert_eq!(seen, [false, false, true, true, true]);
    }

    #[test]
    fn weighted_draws_follow_acceptance_chances() {
        let table = WeightedTable::new(vec![
            KindWeight::new(CellKind::Base, 0.6),
            KindWeight::new(CellKind::Propulsion, 0.3),
            KindWeight::new(CellKind::Weapon, 0.1),
        ])
        .expect("valid table");
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

        let draws = 20_000;
        let mut counts = [0_u32; 3];
        for _ in 0..draws {
            let index = match table.sample(&mut rng) {
                CellKind::Base => 0,
                CellKind::Propulsion => 1,
                CellKind::Weapon => 2,
            };
            counts[index] += 1;
        }

        let share = |count: u32| count as f32 / draws as f32;
        assert!((share(counts[0]) - 0.6).abs() < 0.02, "{counts:?}");
        assert!((share(counts[1]) - 0.3).abs() < 0.02, "{counts:?}");
        assert!((share(counts[2]) - 0.1).abs() < 0.02, "{counts:?}");
    }

    #[test]
    fn zero_weight_entries_are_never_drawn() {
        let table = WeightedTable::new(vec![
            KindWeight::new(CellKind::Base, 0.0),
            KindWeight::new(CellKind::Weapon, 0.2),
        ])
        .expect("valid table");
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..200 {
            assert_eq!(table.sample(&mut rng), CellKind::Weapon);
        }
    }

    #[test]
    fn table_rejects_nan_weights() {
        let error = WeightedTable::new(vec![KindWeight::new(CellKind::Base, f32::NAN)]);
        assert!(matches!(error, Err(ConfigError::InvalidWeight { .. })));
        assert_eq!(
            WeightedTable::new(Vec::new()),
            Err(ConfigError::EmptyWeightTable)
        );
    }

    #[test]
    fn random_points_stay_inside_the_margin() {
        let boundary = BoundaryParams {
            width: 40.0,
            height: 20.0,
            thickness: 1.0,
            margin: 5.0,
        };
        let arena = Arena::from_boundary(&boundary);
        assert_eq!(arena.min(), Vec2::new(5.0, 5.0));
        assert_eq!(arena.max(), Vec2::new(35.0, 15.0));

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..1_000 {
            let point = arena.random_point(&mut rng);
            assert!(arena.contains(point), "{point:?} escaped {arena:?}");
        }
    }
}
