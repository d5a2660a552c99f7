use std::collections::{BTreeMap, BTreeSet};

use colony_core::EntityId;
use glam::Vec2;

/// Uniform bucket grid used to find bodies that may overlap.
///
/// Bucket edges must be at least as long as the largest body diameter so that
/// every overlapping pair lands in the same or in adjacent buckets.
#[derive(Debug)]
pub(crate) struct UniformGrid {
    cell_size: f32,
    buckets: BTreeMap<(i32, i32), Vec<EntityId>>,
}

impl UniformGrid {
    pub(crate) fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            buckets: BTreeMap::new(),
        }
    }

    fn key(&self, position: Vec2) -> (i32, i32) {
        let scaled = (position / self.cell_size).floor();
        (scaled.x as i32, scaled.y as i32)
    }

    pub(crate) fn rebuild(&mut self, bodies: impl Iterator<Item = (EntityId, Vec2)>) {
        self.buckets.clear();
        for (entity, position) in bodies {
            let key = self.key(position);
            self.buckets.entry(key).or_default().push(entity);
        }
    }

    /// Every unordered pair sharing or neighbouring a bucket, smaller id first.
    pub(crate) fn candidate_pairs(&self) -> BTreeSet<(EntityId, EntityId)> {
        let mut pairs = BTreeSet::new();
        for (&(column, row), members) in &self.buckets {
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(others) = self.buckets.get(&(column + dx, row + dy)) else {
                        continue;
                    };
                    for &first in members {
                        for &second in others {
                            if first < second {
                                let _ = pairs.insert((first, second));
                            }
                        }
                    }
                }
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::{CellId, PacketId};

    #[test]
    fn pairs_only_neighbouring_buckets() {
        let near = EntityId::Cell(CellId::new(0));
        let adjacent = EntityId::Cell(CellId::new(1));
        let far = EntityId::Packet(PacketId::new(0));

        let mut grid = UniformGrid::new(2.0);
        grid.rebuild(
            [
                (near, Vec2::new(1.0, 1.0)),
                (adjacent, Vec2::new(2.5, 1.0)),
                (far, Vec2::new(9.0, 9.0)),
            ]
            .into_iter(),
        );

        let pairs: Vec<_> = grid.candidate_pairs().into_iter().collect();
        assert_eq!(pairs, vec![(near, adjacent)]);
    }
}
