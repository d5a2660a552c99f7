#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Population census derived from world events and snapshots.

use std::collections::{BTreeSet, VecDeque};

use colony_core::{CellId, CellKind, CellView, Event, PacketView};
use serde::Serialize;

mod structures;

/// Lifecycle events observed since the previous report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EventCounters {
    /// Cells that entered the world, including genesis.
    pub births: u32,
    /// Cells that destabilized.
    pub deaths: u32,
    /// Packets that turned into cells.
    pub genesis: u32,
    /// Bonds formed.
    pub bonds_formed: u32,
    /// Bonds broken.
    pub bonds_broken: u32,
    /// Packet pairs that merged.
    pub merges: u32,
    /// Packets absorbed by cells.
    pub absorptions: u32,
    /// Attacks that landed.
    pub attacks: u32,
}

/// Number of live cells per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    /// Base cells.
    pub base: usize,
    /// Propulsion cells.
    pub propulsion: usize,
    /// Weapon cells.
    pub weapon: usize,
}

/// Snapshot of the population at a given tick.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CensusReport {
    /// Tick the report was taken at.
    pub tick: u64,
    /// Live cells per kind.
    pub cells: KindCounts,
    /// Active packets.
    pub packets: usize,
    /// Live bonds.
    pub bonds: usize,
    /// Distinct organism tags carried by bonded cells.
    pub organisms: usize,
    /// Connected groups of at least two bonded cells.
    pub structures: usize,
    /// Cell count of the largest structure, zero when nothing is bonded.
    pub largest_structure: usize,
    /// Energy held by all cells.
    pub cell_energy: f32,
    /// Value carried by all active packets.
    pub packet_value: f32,
    /// Events observed since the previous report.
    pub events: EventCounters,
}

impl CensusReport {
    /// Total number of live cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.base + self.cells.propulsion + self.cells.weapon
    }
}

/// Pure system that tallies events and produces population reports.
#[derive(Debug, Default)]
pub struct Census {
    counters: EventCounters,
    last_report: Option<CensusReport>,
    frontier: VecDeque<CellId>,
}

impl Census {
    /// Creates a census with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recent report, if any.
    #[must_use]
    pub fn last_report(&self) -> Option<&CensusReport> {
        self.last_report.as_ref()
    }

    /// Counts the lifecycle events contained in the batch.
    pub fn handle(&mut self, events: &[Event]) {
        let counters = &mut self.counters;
        for event in events {
            match event {
                Event::CellSpawned { .. } => counters.births += 1,
                Event::CellDestabilized { .. } => counters.deaths += 1,
                Event::CellGenesis { .. } => counters.genesis += 1,
                Event::BondFormed { .. } => counters.bonds_formed += 1,
                Event::BondBroken { .. } => counters.bonds_broken += 1,
                Event::PacketsMerged { .. } => counters.merges += 1,
                Event::PacketAbsorbed { .. } => counters.absorptions += 1,
                Event::AttackLanded { .. } => counters.attacks += 1,
                Event::TimeAdvanced { .. } | Event::PacketSpawned { .. } => {}
            }
        }
    }

    /// Builds a report from the current views and resets the event counters.
    pub fn report(&mut self, tick: u64, cells: &CellView, packets: &PacketView) -> CensusReport {
        let mut kinds = KindCounts::default();
        let mut endpoints = 0;
        let mut tags = BTreeSet::new();
        for cell in cells.iter() {
            match cell.kind {
                CellKind::Base => kinds.base += 1,
                CellKind::Propulsion => kinds.propulsion += 1,
                CellKind::Weapon => kinds.weapon += 1,
            }
            endpoints += cell.neighbors.len();
            if !cell.neighbors.is_empty() {
                let _ = tags.insert(cell.organism);
            }
        }

        let sizes = structures::bonded_structures(cells, &mut self.frontier);
        let report = CensusReport {
            tick,
            cells: kinds,
            packets: packets.len(),
            bonds: endpoints / 2,
            organisms: tags.len(),
            structures: sizes.len(),
            largest_structure: sizes.iter().copied().max().unwrap_or(0),
            cell_energy: cells.iter().map(|cell| cell.energy).sum(),
            packet_value: packets.iter().map(|packet| packet.value).sum(),
            events: std::mem::take(&mut self.counters),
        };
        self.last_report = Some(report.clone());
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::{BondId, OrganismId, PacketId};

    #[test]
    fn counters_reset_after_each_report() {
        let mut census = Census::new();
        census.handle(&[
            Event::BondFormed {
                bond: BondId::new(0),
                initiator: CellId::new(0),
                peer: CellId::new(1),
                organism: OrganismId::new(4),
            },
            Event::PacketAbsorbed {
                cell: CellId::new(0),
                packet: PacketId::new(2),
                value: 3.0,
            },
        ]);

        let first = census.report(1, &CellView::default(), &PacketView::default());
        let second = census.report(2, &CellView::default(), &PacketView::default());

        assert_eq!(first.events.bonds_formed, 1);
        assert_eq!(first.events.absorptions, 1);
        assert_eq!(second.events, EventCounters::default());
        assert_eq!(census.last_report().map(|report| report.tick), Some(2));
    }
}
