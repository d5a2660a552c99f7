#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that seeds the population and feeds it
//! resource packets.
//!
//! The system never touches the world. It draws positions from the arena
//! rectangle and emits `SpawnCell` and `SpawnPacket` commands that adapters
//! forward to the world.

use std::time::Duration;

use colony_core::{Arena, CellKind, Command, Event, MinMaxI, PacketKind, Settings};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// Periodic packet source for a single packet kind.
#[derive(Clone, Debug)]
struct PacketSchedule {
    kind: PacketKind,
    interval: Duration,
    batch: MinMaxI,
    accumulator: Duration,
}

impl PacketSchedule {
    fn new(kind: PacketKind, settings: &Settings) -> Self {
        let params = settings.packet(kind);
        Self {
            kind,
            interval: Duration::try_from_secs_f32(params.spawn_interval).unwrap_or(Duration::ZERO),
            batch: params.spawn_count,
            accumulator: Duration::ZERO,
        }
    }

    fn resolve_batches(&mut self, elapsed: Duration) -> usize {
        if self.interval.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        let mut batches = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            batches += 1;
        }
        batches
    }
}

/// Pure system that emits cell and packet spawn commands.
#[derive(Debug)]
pub struct Spawning {
    arena: Arena,
    rng: ChaCha8Rng,
    schedules: Vec<PacketSchedule>,
    cell_count: u32,
    spawn_kinds: Vec<CellKind>,
    initial_energy: f32,
}

impl Spawning {
    /// Creates a new spawning system drawing from a generator seeded with
    /// `rng_seed`.
    #[must_use]
    pub fn new(settings: &Settings, rng_seed: u64) -> Self {
        Self {
            arena: Arena::from_boundary(&settings.boundary),
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
            schedules: vec![
                PacketSchedule::new(PacketKind::Energy, settings),
                PacketSchedule::new(PacketKind::Food, settings),
            ],
            cell_count: settings.spawning.cell_count,
            spawn_kinds: settings.cell.spawn_kinds.clone(),
            initial_energy: settings.cell.initial_energy,
        }
    }

    /// Emits the start-up population, cycling through the configured kinds.
    pub fn populate(&mut self, out: &mut Vec<Command>) {
        if self.spawn_kinds.is_empty() {
            return;
        }

        for index in 0..self.cell_count as usize {
            let kind = self.spawn_kinds[index % self.spawn_kinds.len()];
            out.push(Command::SpawnCell {
                kind,
                position: self.arena.random_point(&mut self.rng),
                energy: self.initial_energy,
            });
        }
    }

    /// Consumes events and emits a packet batch for every elapsed interval.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                elapsed = elapsed.saturating_add(*dt);
            }
        }

        if elapsed.is_zero() {
            return;
        }

        for schedule in &mut self.schedules {
            for _ in 0..schedule.resolve_batches(elapsed) {
                let count = schedule.batch.sample(&mut self.rng).max(0);
                trace!(kind = ?schedule.kind, count, "packet batch");
                for _ in 0..count {
                    out.push(Command::SpawnPacket {
                        kind: schedule.kind,
                        position: self.arena.random_point(&mut self.rng),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_no_batches_without_interval() {
        let mut settings = Settings::default();
        settings.energy.spawn_interval = 0.0;
        let mut schedule = PacketSchedule::new(PacketKind::Energy, &settings);
        assert_eq!(schedule.resolve_batches(Duration::from_secs(10)), 0);
    }

    #[test]
    fn carries_partial_intervals_forward() {
        let mut settings = Settings::default();
        settings.food.spawn_interval = 1.0;
        let mut schedule = PacketSchedule::new(PacketKind::Food, &settings);

        assert_eq!(schedule.resolve_batches(Duration::from_millis(600)), 0);
        assert_eq!(schedule.resolve_batches(Duration::from_millis(600)), 1);
        assert_eq!(schedule.accumulator, Duration::from_millis(200));
    }
}
