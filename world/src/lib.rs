#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Colony simulation.
//!
//! The world owns every cell, packet and bond but none of their bodies.
//! Positions, velocities and joints live in the [`Physics`] collaborator that
//! callers pass to [`apply`] alongside each command.

use std::collections::BTreeMap;

use colony_core::{
    BondId, CellId, Command, ConfigError, EntityId, Event, PacketId, Physics, Settings,
    WeightedTable,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

mod bond;
mod cell;
mod packet;
mod propulsion;
mod weapon;

use bond::Bond;
use cell::Cell;
use packet::Packet;

/// Represents the authoritative Colony world state.
#[derive(Debug)]
pub struct World {
    settings: Settings,
    genesis_table: WeightedTable,
    rng: ChaCha8Rng,
    cells: BTreeMap<CellId, Cell>,
    packets: BTreeMap<PacketId, Packet>,
    bonds: BTreeMap<BondId, Bond>,
    graveyard: Vec<PacketId>,
    next_cell: u32,
    next_packet: u32,
    next_bond: u32,
    tick_index: u64,
}

impl World {
    /// Creates an empty world driven by the provided parameters.
    ///
    /// Every random draw the world makes comes from a generator seeded with
    /// `seed`, so identical command streams replay identically.
    pub fn new(settings: Settings, seed: u64) -> Result<Self, ConfigError> {
        settings.validate()?;
        let genesis_table = WeightedTable::new(settings.genesis.weights.clone())?;
        Ok(Self {
            settings,
            genesis_table,
            rng: ChaCha8Rng::seed_from_u64(seed),
            cells: BTreeMap::new(),
            packets: BTreeMap::new(),
            bonds: BTreeMap::new(),
            graveyard: Vec::new(),
            next_cell: 0,
            next_packet: 0,
            next_bond: 0,
            tick_index: 0,
        })
    }

    fn run_tick(&mut self, physics: &mut dyn Physics, out_events: &mut Vec<Event>) {
        let cell_ids: Vec<CellId> = self.cells.keys().copied().collect();
        let packet_ids: Vec<PacketId> = self.packets.keys().copied().collect();
        for id in cell_ids {
            let Some(kind) = self.cells.get(&id).map(|cell| cell.kind) else {
                continue;
            };

            if kind.moves_itself() {
                self.propulsion_step(id, physics, out_events);
            } else {
                self.resource_step(id, physics, out_events);
            }

            if kind.attacks() && self.cells.contains_key(&id) {
                self.attack(id, physics, out_events);
            }
        }

        for id in packet_ids {
            self.genesis_step(id, physics, out_events);
        }
    }

    fn deliver_contact(
        &mut self,
        receiver: EntityId,
        other: EntityId,
        relative_speed: f32,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) {
        match (receiver, other) {
            (EntityId::Cell(cell), EntityId::Cell(peer)) => {
                self.try_bond(cell, peer, relative_speed, physics, out_events);
            }
            (EntityId::Cell(cell), EntityId::Packet(packet)) => {
                self.absorb(cell, packet, out_events);
            }
            (EntityId::Packet(packet), EntityId::Packet(other)) => {
                self.merge(packet, other, out_events);
            }
            (EntityId::Packet(_), EntityId::Cell(_)) => {}
        }
    }

    fn knows(&self, entity: EntityId) -> bool {
        match entity {
            EntityId::Cell(cell) => self.cells.contains_key(&cell),
            EntityId::Packet(packet) => self.packets.contains_key(&packet),
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(
    world: &mut World,
    command: Command,
    physics: &mut dyn Physics,
    out_events: &mut Vec<Event>,
) {
    match command {
        Command::SpawnCell {
            kind,
            position,
            energy,
        } => {
            let _ = world.spawn_cell(kind, position, energy, physics, out_events);
        }
        Command::SpawnPacket { kind, position } => {
            let value = world.settings.packet(kind).value.sample(&mut world.rng);
            let _ = world.spawn_packet(kind, position, value, physics, out_events);
        }
        Command::Collide {
            first,
            second,
            relative_speed,
        } => {
            if first == second {
                return;
            }
            if !world.knows(first) || !world.knows(second) {
                debug!(?first, ?second, "contact names an unknown entity");
                return;
            }
            world.deliver_contact(first, second, relative_speed, physics, out_events);
            world.deliver_contact(second, first, relative_speed, physics, out_events);
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
            world.run_tick(physics, out_events);
        }
    }

    world.flush_graveyard(physics);
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use colony_core::{
        BondId, BondSnapshot, BondView, CellId, CellSnapshot, CellView, OrganismId,
        PacketSnapshot, PacketView, Settings,
    };

    use super::World;

    /// Parameters the world was created with.
    #[must_use]
    pub fn settings(world: &World) -> &Settings {
        &world.settings
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of every live cell.
    #[must_use]
    pub fn cell_view(world: &World) -> CellView {
        CellView::from_snapshots(world.cells.values().map(|cell| cell.snapshot()).collect())
    }

    /// Captures a read-only view of every active packet.
    #[must_use]
    pub fn packet_view(world: &World) -> PacketView {
        PacketView::from_snapshots(
            world
                .packets
                .values()
                .filter(|packet| packet.active)
                .map(|packet| PacketSnapshot {
                    id: packet.id,
                    kind: packet.kind,
                    value: packet.value,
                })
                .collect(),
        )
    }

    /// Captures a read-only view of every live bond.
    #[must_use]
    pub fn bond_view(world: &World) -> BondView {
        BondView::from_snapshots(
            world
                .bonds
                .iter()
                .map(|(id, bond)| BondSnapshot {
                    id: *id,
                    initiator: bond.initiator,
                    peer: bond.peer,
                    joint: bond.joint,
                })
                .collect(),
        )
    }

    /// Snapshot of a single cell, if it is alive.
    #[must_use]
    pub fn cell(world: &World, id: CellId) -> Option<CellSnapshot> {
        world.cells.get(&id).map(|cell| cell.snapshot())
    }

    /// Organism tag currently carried by a cell.
    #[must_use]
    pub fn organism(world: &World, id: CellId) -> Option<OrganismId> {
        world.cells.get(&id).map(|cell| cell.organism)
    }

    /// Energy currently held by a cell.
    #[must_use]
    pub fn energy(world: &World, id: CellId) -> Option<f32> {
        world.cells.get(&id).map(|cell| cell.energy)
    }

    /// Bond table of a cell as `(neighbour, bond)` pairs in insertion order.
    #[must_use]
    pub fn bonds_of(world: &World, id: CellId) -> Vec<(CellId, BondId)> {
        world
            .cells
            .get(&id)
            .map(|cell| cell.bonds.iter().collect())
            .unwrap_or_default()
    }

    /// Bond joining two cells, looked up from the first cell's table.
    #[must_use]
    pub fn bond_between(world: &World, first: CellId, second: CellId) -> Option<BondId> {
        world
            .cells
            .get(&first)
            .and_then(|cell| cell.bonds.get(second))
    }

    /// Sum of all cell energy and active packet value.
    #[must_use]
    pub fn total_energy(world: &World) -> f32 {
        let cells: f32 = world.cells.values().map(|cell| cell.energy).sum();
        let packets: f32 = world
            .packets
            .values()
            .filter(|packet| packet.active)
            .map(|packet| packet.value)
            .sum();
        cells + packets
    }
}
