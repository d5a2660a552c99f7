use std::{collections::VecDeque, time::Duration};

use colony_core::{Command, ConfigError, Event, Settings};
use colony_physics::{Arena2d, Contact, PhysicsConfig};
use colony_rendering::Scene;
use colony_system_census::{Census, CensusReport};
use colony_system_spawning::Spawning;
use colony_world::{self as world, query, World};

/// Multiplier used to derive the spawning seed from the run seed.
const SPAWNING_SEED_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// Headless wiring of physics, world and systems.
///
/// Commands are processed strictly in arrival order. Commands emitted by the
/// systems while a batch is being applied join the back of the same queue.
#[derive(Debug)]
pub(crate) struct Simulation {
    world: World,
    physics: Arena2d,
    spawning: Spawning,
    census: Census,
    dt: Duration,
    queue: VecDeque<Command>,
    contacts: Vec<Contact>,
    events: Vec<Event>,
    emitted: Vec<Command>,
}

impl Simulation {
    /// Builds the simulation and applies the start-up population.
    pub(crate) fn new(settings: Settings, seed: u64, dt: Duration) -> Result<Self, ConfigError> {
        let physics = Arena2d::new(PhysicsConfig::from_settings(&settings));
        let spawning = Spawning::new(&settings, seed.wrapping_mul(SPAWNING_SEED_MIX));
        let world = World::new(settings, seed)?;

        let mut simulation = Self {
            world,
            physics,
            spawning,
            census: Census::new(),
            dt,
            queue: VecDeque::new(),
            contacts: Vec::new(),
            events: Vec::new(),
            emitted: Vec::new(),
        };
        simulation.spawning.populate(&mut simulation.emitted);
        simulation.queue.extend(simulation.emitted.drain(..));
        simulation.pump();
        Ok(simulation)
    }

    /// Advances physics by one timestep, then the world by one tick.
    pub(crate) fn step(&mut self) {
        self.physics.step(self.dt.as_secs_f32(), &mut self.contacts);
        self.queue
            .extend(self.contacts.drain(..).map(Contact::into_command));
        self.queue.push_back(Command::Tick { dt: self.dt });
        self.pump();
    }

    /// Number of ticks applied so far.
    pub(crate) fn tick(&self) -> u64 {
        query::tick_index(&self.world)
    }

    /// Takes a census of the current population.
    pub(crate) fn report(&mut self) -> CensusReport {
        let cells = query::cell_view(&self.world);
        let packets = query::packet_view(&self.world);
        self.census.report(self.tick(), &cells, &packets)
    }

    /// Captures a drawable scene of the current state.
    pub(crate) fn capture(&self) -> Scene {
        Scene::capture(
            self.tick(),
            &query::cell_view(&self.world),
            &query::packet_view(&self.world),
            &query::bond_view(&self.world),
            &self.physics,
            query::settings(&self.world),
        )
    }

    fn pump(&mut self) {
        while let Some(command) = self.queue.pop_front() {
            self.events.clear();
            world::apply(&mut self.world, command, &mut self.physics, &mut self.events);
            self.census.handle(&self.events);
            self.spawning.handle(&self.events, &mut self.emitted);
            self.queue.extend(self.emitted.drain(..));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(seed: u64, ticks: u32) -> Simulation {
        let mut simulation =
            Simulation::new(Settings::default(), seed, Duration::from_millis(20))
                .expect("default settings are valid");
        for _ in 0..ticks {
            simulation.step();
        }
        simulation
    }

    #[test]
    fn start_up_population_is_applied_before_the_first_tick() {
        let mut simulation = run(42, 0);
        let report = simulation.report();

        assert_eq!(report.tick, 0);
        assert_eq!(
            report.cell_count(),
            Settings::default().spawning.cell_count as usize
        );
        assert_eq!(report.events.births as usize, report.cell_count());
    }

    #[test]
    fn spawners_feed_packets_as_time_passes() {
        let mut simulation = run(42, 200);
        let report = simulation.report();

        assert_eq!(report.tick, 200);
        assert!(
            report.packets > 0 || report.events.merges > 0 || report.events.absorptions > 0,
            "four seconds of spawning left no trace: {report:?}"
        );
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let mut first = run(7, 150);
        let mut second = run(7, 150);

        assert_eq!(first.report(), second.report());
        assert_eq!(first.capture(), second.capture());
    }

    #[test]
    fn captured_scene_tracks_live_entities() {
        let mut simulation = run(11, 50);
        let scene = simulation.capture();
        let report = simulation.report();

        assert_eq!(scene.tick, 50);
        assert_eq!(scene.discs.len(), report.cell_count() + report.packets);
        assert_eq!(scene.links.len(), report.bonds);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = Settings::default();
        settings.cell.max_bonds = 0;

        let error = Simulation::new(settings, 1, Duration::from_millis(20))
            .expect_err("zero bond capacity must be refused");
        assert_eq!(error, ConfigError::NoBondCapacity);
    }
}
