use std::{collections::BTreeSet, time::Duration};

use colony_core::{CellId, CellKind, Command, EntityId, Event, Settings};
use colony_physics::{Arena2d, PhysicsConfig};
use colony_world::{self as world, query, World};
use glam::Vec2;
use proptest::prelude::*;

const CELLS: u32 = 8;

#[derive(Clone, Debug)]
enum Step {
    Collide { first: u32, second: u32, speed: f32 },
    Tick,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..CELLS, 0..CELLS, 0.0f32..8.0)
            .prop_map(|(first, second, speed)| Step::Collide { first, second, speed }),
        1 => Just(Step::Tick),
    ]
}

fn kind() -> impl Strategy<Value = CellKind> {
    prop_oneof![
        Just(CellKind::Base),
        Just(CellKind::Propulsion),
        Just(CellKind::Weapon),
    ]
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.cell.max_bonds = 2;
    settings.cell.share_rate = 1.5;
    settings.cell.min_energy = 1.0;
    settings.weapon.attack_radius = 3.0;
    settings.weapon.drain_rate = 0.3;
    settings
}

fn check_structure(world: &World, max_bonds: usize) -> Result<(), TestCaseError> {
    let cells = query::cell_view(world);
    for cell in cells.iter() {
        prop_assert!(cell.neighbors.len() <= max_bonds, "{:?} over capacity", cell.id);
        prop_assert!(cell.energy >= 0.0, "{:?} went negative: {}", cell.id, cell.energy);

        for (neighbor, bond) in query::bonds_of(world, cell.id) {
            prop_assert!(cells.get(neighbor).is_some(), "dangling bond {bond:?}");
            prop_assert_eq!(query::bond_between(world, neighbor, cell.id), Some(bond));
        }
    }

    for bond in query::bond_view(world).iter() {
        prop_assert_eq!(
            query::bond_between(world, bond.initiator, bond.peer),
            Some(bond.id)
        );
        prop_assert_eq!(
            query::bond_between(world, bond.peer, bond.initiator),
            Some(bond.id)
        );
    }
    Ok(())
}

proptest! {
    #[test]
    fn structural_invariants_hold_for_any_contact_sequence(
        kinds in proptest::collection::vec(kind(), CELLS as usize),
        energies in proptest::collection::vec(0.0f32..12.0, CELLS as usize),
        steps in proptest::collection::vec(step(), 1..80),
    ) {
        let settings = settings();
        let max_bonds = settings.cell.max_bonds;
        let mut physics = Arena2d::new(PhysicsConfig::from_settings(&settings));
        let mut world = World::new(settings, 17).expect("valid settings");

        let mut ids = Vec::new();
        for (index, (kind, energy)) in kinds.iter().zip(&energies).enumerate() {
            let mut events = Vec::new();
            world::apply(
                &mut world,
                Command::SpawnCell {
                    kind: *kind,
                    position: Vec2::new(20.0 + index as f32 * 1.5, 20.0),
                    energy: *energy,
                },
                &mut physics,
                &mut events,
            );
            for event in events {
                if let Event::CellSpawned { cell, .. } = event {
                    ids.push(cell);
                }
            }
        }

        let mut dead: BTreeSet<CellId> = BTreeSet::new();
        for step in steps {
            let command = match step {
                Step::Collide { first, second, speed } => Command::Collide {
                    first: EntityId::Cell(ids[first as usize]),
                    second: EntityId::Cell(ids[second as usize]),
                    relative_speed: speed,
                },
                Step::Tick => Command::Tick { dt: Duration::from_millis(20) },
            };
            let before: Vec<_> = ids
                .iter()
                .map(|id| (*id, query::organism(&world, *id)))
                .collect();

            let mut events = Vec::new();
            world::apply(&mut world, command, &mut physics, &mut events);

            for event in &events {
                match event {
                    Event::BondFormed { initiator, peer, .. } => {
                        let tag = |cell: CellId| {
                            before.iter().find(|(id, _)| *id == cell).and_then(|(_, tag)| *tag)
                        };
                        prop_assert_ne!(tag(*initiator), tag(*peer));
                        prop_assert!(!dead.contains(initiator) && !dead.contains(peer));
                    }
                    Event::CellDestabilized { cell, .. } => {
                        prop_assert!(query::bonds_of(&world, *cell).is_empty());
                        let _ = dead.insert(*cell);
                    }
                    _ => {}
                }
            }
            check_structure(&world, max_bonds)?;
        }

        prop_assert_eq!(physics.joint_count(), query::bond_view(&world).len());
    }
}
