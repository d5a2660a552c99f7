//! Cell state together with bonding, sharing and destabilization.

use colony_core::{
    BodySpec, BondId, CellId, CellKind, CellSnapshot, EntityId, Event, OrganismId, Physics,
};
use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::World;

#[derive(Clone, Debug)]
pub(crate) struct Cell {
    pub(crate) id: CellId,
    pub(crate) kind: CellKind,
    pub(crate) energy: f32,
    pub(crate) organism: OrganismId,
    pub(crate) bonds: BondTable,
    /// Torque applied while thrusting. Zero for kinds that do not move.
    pub(crate) torque: f32,
    /// Used when the collaborator no longer reports a position.
    pub(crate) spawn_position: Vec2,
}

impl Cell {
    pub(crate) fn snapshot(&self) -> CellSnapshot {
        CellSnapshot {
            id: self.id,
            kind: self.kind,
            energy: self.energy,
            organism: self.organism,
            neighbors: self.bonds.neighbors(),
        }
    }
}

/// Bonds held by a single cell, in the order they were formed.
#[derive(Clone, Debug, Default)]
pub(crate) struct BondTable {
    entries: Vec<(CellId, BondId)>,
}

impl BondTable {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, neighbor: CellId) -> Option<BondId> {
        self.entries
            .iter()
            .find(|(id, _)| *id == neighbor)
            .map(|(_, bond)| *bond)
    }

    pub(crate) fn insert(&mut self, neighbor: CellId, bond: BondId) {
        debug_assert!(self.get(neighbor).is_none(), "duplicate bond to {neighbor:?}");
        self.entries.push((neighbor, bond));
    }

    pub(crate) fn remove(&mut self, neighbor: CellId) -> Option<BondId> {
        let index = self.entries.iter().position(|(id, _)| *id == neighbor)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn neighbors(&self) -> Vec<CellId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (CellId, BondId)> + '_ {
        self.entries.iter().copied()
    }
}

impl World {
    pub(crate) fn spawn_cell(
        &mut self,
        kind: CellKind,
        position: Vec2,
        energy: f32,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) -> CellId {
        let id = CellId::new(self.next_cell);
        self.next_cell = self.next_cell.saturating_add(1);

        let organism = self.fresh_organism();
        let (heading, torque) = if kind.moves_itself() {
            let heading = self.rng.gen_range(0.0..std::f32::consts::TAU);
            (heading, self.settings.propulsion.torque.sample(&mut self.rng))
        } else {
            (0.0, 0.0)
        };

        physics.insert_body(
            EntityId::Cell(id),
            BodySpec {
                position,
                radius: self.settings.cell.radius,
                heading,
            },
        );
        let _ = self.cells.insert(
            id,
            Cell {
                id,
                kind,
                energy,
                organism,
                bonds: BondTable::default(),
                torque,
                spawn_position: position,
            },
        );

        out_events.push(Event::CellSpawned {
            cell: id,
            kind,
            organism,
            energy,
        });
        id
    }

    pub(crate) fn fresh_organism(&mut self) -> OrganismId {
        OrganismId::new(self.rng.gen())
    }

    /// Contact callback received by `initiator` for a collision with `peer`.
    pub(crate) fn try_bond(
        &mut self,
        initiator: CellId,
        peer: CellId,
        relative_speed: f32,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) {
        let (Some(own), Some(other)) = (self.cells.get(&initiator), self.cells.get(&peer)) else {
            return;
        };

        let max_bonds = self.settings.cell.max_bonds;
        if own.bonds.len() >= max_bonds || other.bonds.len() >= max_bonds {
            return;
        }
        if relative_speed <= self.settings.cell.bond_force {
            return;
        }
        if own.organism == other.organism {
            return;
        }
        if own.bonds.get(peer).is_some() {
            return;
        }

        let organism = own.organism;
        let bond = self.connect(initiator, peer, physics);
        if let Some(cell) = self.cells.get_mut(&peer) {
            cell.organism = organism;
        }

        debug!(?bond, ?initiator, ?peer, organism = organism.get(), "bond formed");
        out_events.push(Event::BondFormed {
            bond,
            initiator,
            peer,
            organism,
        });
    }

    /// Per-tick step shared by every cell kind.
    ///
    /// Tags converge first, energy is shared second, and the cell is destroyed
    /// last when it ends below the minimum. Tag convergence is gossip: each
    /// call moves the larger tag one hop, so a chain of `n` cells needs up to
    /// `n - 1` ticks to agree after its topology changes.
    pub(crate) fn resource_step(
        &mut self,
        id: CellId,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) {
        let Some(cell) = self.cells.get(&id) else {
            return;
        };
        let neighbors = cell.bonds.neighbors();

        for neighbor in &neighbors {
            let (Some(mine), Some(theirs)) = (self.organism_of(id), self.organism_of(*neighbor))
            else {
                continue;
            };
            if mine != theirs {
                let merged = mine.max(theirs);
                self.set_organism(id, merged);
                self.set_organism(*neighbor, merged);
            }
        }

        let share_rate = self.settings.cell.share_rate;
        for neighbor in &neighbors {
            let (Some(mine), Some(theirs)) = (self.energy_of(id), self.energy_of(*neighbor)) else {
                continue;
            };
            if mine >= share_rate && theirs < mine {
                self.add_energy(id, -share_rate);
                self.add_energy(*neighbor, share_rate);
            }
        }

        if self
            .energy_of(id)
            .is_some_and(|energy| energy < self.settings.cell.min_energy)
        {
            self.destabilize(id, physics, out_events);
        }
    }

    /// Tears a cell down, severing its bonds and leaving a packet behind.
    pub(crate) fn destabilize(
        &mut self,
        id: CellId,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) {
        let Some(cell) = self.cells.remove(&id) else {
            return;
        };

        for (neighbor, bond) in cell.bonds.iter() {
            self.sever(bond, physics);
            let organism = self.fresh_organism();
            if let Some(survivor) = self.cells.get_mut(&neighbor) {
                let _ = survivor.bonds.remove(id);
                survivor.organism = organism;
            }
            out_events.push(Event::BondBroken {
                bond,
                survivor: neighbor,
                departed: id,
            });
        }

        let entity = EntityId::Cell(id);
        let position = physics.position(entity).unwrap_or(cell.spawn_position);
        physics.remove_body(entity);

        let remnant = self.settings.cell.remnant_kind;
        let packet = self.spawn_packet(remnant, position, cell.energy, physics, out_events);

        debug!(cell = ?id, residual = cell.energy, ?packet, "cell destabilized");
        out_events.push(Event::CellDestabilized {
            cell: id,
            residual_energy: cell.energy,
            packet,
        });
    }

    pub(crate) fn energy_of(&self, id: CellId) -> Option<f32> {
        self.cells.get(&id).map(|cell| cell.energy)
    }

    pub(crate) fn add_energy(&mut self, id: CellId, delta: f32) {
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.energy += delta;
        }
    }

    fn organism_of(&self, id: CellId) -> Option<OrganismId> {
        self.cells.get(&id).map(|cell| cell.organism)
    }

    fn set_organism(&mut self, id: CellId, organism: OrganismId) {
        if let Some(cell) = self.cells.get_mut(&id) {
            cell.organism = organism;
        }
    }
}
