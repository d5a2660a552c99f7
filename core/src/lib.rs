#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Colony simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable snapshots, and
//! respond exclusively with new command batches.
//!
//! Rigid-body simulation is not part of the world. The world drives an
//! implementation of the [`Physics`] trait for positions, forces, joints and
//! radius queries, and learns about contacts through [`Command::Collide`].

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

mod config;
mod sampling;

pub use config::{
    BondParams, BoundaryParams, CellParams, ConfigError, GenesisParams, KindWeight, PacketParams,
    PropulsionParams, Settings, SpawningParams, WeaponParams,
};
pub use sampling::{Arena, MinMaxF, MinMaxI, WeightedTable};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Creates a new cell at the provided position.
    SpawnCell {
        /// Behavioural kind assigned to the cell.
        kind: CellKind,
        /// World-space location of the new body.
        position: Vec2,
        /// Energy the cell starts with.
        energy: f32,
    },
    /// Creates a new resource packet with a sampled value and launch impulse.
    SpawnPacket {
        /// Kind of packet to create.
        kind: PacketKind,
        /// World-space location of the new body.
        position: Vec2,
    },
    /// Reports that two bodies started touching.
    ///
    /// The world delivers the contact to `first` and then to `second`, so a
    /// single report behaves like the pair of callbacks a physics engine
    /// raises for both participants.
    Collide {
        /// Entity that receives the contact first.
        first: EntityId,
        /// Entity that receives the contact second.
        second: EntityId,
        /// Magnitude of the relative velocity at the moment of impact.
        relative_speed: f32,
    },
    /// Advances the simulation by one fixed step.
    Tick {
        /// Duration of simulated time covered by the step.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a cell entered the world.
    CellSpawned {
        /// Identifier assigned to the new cell.
        cell: CellId,
        /// Behavioural kind of the new cell.
        kind: CellKind,
        /// Organism tag drawn for the new cell.
        organism: OrganismId,
        /// Energy the cell starts with.
        energy: f32,
    },
    /// Confirms that a resource packet entered the world.
    PacketSpawned {
        /// Identifier assigned to the new packet.
        packet: PacketId,
        /// Kind of the new packet.
        kind: PacketKind,
        /// Resource value carried by the packet.
        value: f32,
    },
    /// Confirms that two cells were joined by a bond.
    BondFormed {
        /// Identifier assigned to the bond.
        bond: BondId,
        /// Cell whose contact callback created the bond.
        initiator: CellId,
        /// Cell that adopted the initiator's organism tag.
        peer: CellId,
        /// Organism tag shared by both cells after formation.
        organism: OrganismId,
    },
    /// Confirms that a bond was torn down.
    BondBroken {
        /// Identifier of the removed bond.
        bond: BondId,
        /// Endpoint that remains in the world.
        survivor: CellId,
        /// Endpoint whose destabilization removed the bond.
        departed: CellId,
    },
    /// Reports that one packet swallowed another of the same kind.
    PacketsMerged {
        /// Packet that remains in the world.
        survivor: PacketId,
        /// Packet that was marked inert and destroyed.
        absorbed: PacketId,
        /// Value of the survivor after the merge.
        value: f32,
    },
    /// Reports that a cell consumed a packet on contact.
    PacketAbsorbed {
        /// Cell that gained the packet's value.
        cell: CellId,
        /// Packet that was destroyed.
        packet: PacketId,
        /// Value transferred into the cell.
        value: f32,
    },
    /// Reports that a cell fell below the minimum energy and was destroyed.
    CellDestabilized {
        /// Identifier of the destroyed cell.
        cell: CellId,
        /// Energy the cell held when it was destroyed.
        residual_energy: f32,
        /// Packet emitted in place of the cell.
        packet: PacketId,
    },
    /// Reports that a packet crossed the genesis threshold and became a cell.
    CellGenesis {
        /// Packet that was converted.
        packet: PacketId,
        /// Cell created from the packet.
        cell: CellId,
        /// Kind chosen by the weighted draw.
        kind: CellKind,
    },
    /// Reports that a weapon cell drained a foreign cell.
    AttackLanded {
        /// Weapon cell that performed the attack.
        attacker: CellId,
        /// Cell that lost energy.
        target: CellId,
        /// Energy moved from the target to the attacker.
        stolen: f32,
    },
}

/// Behavioural specialisation of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellKind {
    /// Plain cell that only shares energy and bonds.
    Base,
    /// Cell that spends energy to thrust itself forward.
    Propulsion,
    /// Cell that drains foreign cells within range.
    Weapon,
}

impl CellKind {
    /// Every cell kind in declaration order.
    pub const ALL: [CellKind; 3] = [CellKind::Base, CellKind::Propulsion, CellKind::Weapon];

    /// Reports whether cells of this kind spend energy on thrust.
    #[must_use]
    pub const fn moves_itself(self) -> bool {
        matches!(self, Self::Propulsion)
    }

    /// Reports whether cells of this kind run an attack pass.
    #[must_use]
    pub const fn attacks(self) -> bool {
        matches!(self, Self::Weapon)
    }
}

/// Flavour of a floating resource packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PacketKind {
    /// Packet spawned by the energy spawner and emitted by dying cells.
    Energy,
    /// Packet spawned by the food spawner.
    Food,
}

/// Unique identifier assigned to a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(u32);

impl CellId {
    /// Creates a new cell identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a resource packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PacketId(u32);

impl PacketId {
    /// Creates a new packet identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a bond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BondId(u32);

impl BondId {
    /// Creates a new bond identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle to a two-body constraint owned by the physics collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointId(u32);

impl JointId {
    /// Creates a new joint handle with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Group tag shared by cells that belong to the same organism.
///
/// The tag is not authoritative. Bonded cells gossip the larger of their tags
/// one hop per tick, so cells joined by a chain may briefly disagree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrganismId(u64);

impl OrganismId {
    /// Creates a new organism tag with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tag.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Identity of any body the physics collaborator tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityId {
    /// Body belonging to a cell.
    Cell(CellId),
    /// Body belonging to a resource packet.
    Packet(PacketId),
}

impl EntityId {
    /// Returns the cell identifier when the entity is a cell.
    #[must_use]
    pub const fn cell(self) -> Option<CellId> {
        match self {
            Self::Cell(cell) => Some(cell),
            Self::Packet(_) => None,
        }
    }
}

/// Parameters used when the world registers a new body with the collaborator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodySpec {
    /// World-space centre of the body.
    pub position: Vec2,
    /// Radius of the body's circular collider.
    pub radius: f32,
    /// Initial orientation in radians.
    pub heading: f32,
}

/// Parameters of the constraint installed between two bonded cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JointSpec {
    /// Gap the joint maintains between the two body surfaces.
    pub rest_distance: f32,
    /// Spring constant pulling the bodies back to the rest distance.
    pub stiffness: f32,
}

/// Rigid-body collaborator driven by the world.
///
/// Implementations own every position and velocity. The world only registers
/// bodies, pushes forces, installs joints and asks spatial questions.
pub trait Physics {
    /// Registers a body for a freshly created entity.
    fn insert_body(&mut self, entity: EntityId, body: BodySpec);

    /// Removes the body of a destroyed entity together with its joints.
    fn remove_body(&mut self, entity: EntityId);

    /// Current centre of the entity's body, if it exists.
    fn position(&self, entity: EntityId) -> Option<Vec2>;

    /// Current linear velocity of the entity's body.
    fn velocity(&self, entity: EntityId) -> Vec2;

    /// Current angular velocity of the entity's body in radians per second.
    fn angular_velocity(&self, entity: EntityId) -> f32;

    /// Applies an instantaneous change of momentum.
    fn apply_impulse(&mut self, entity: EntityId, impulse: Vec2);

    /// Applies a force expressed in the body's local frame for the next step.
    fn apply_relative_force(&mut self, entity: EntityId, force: Vec2);

    /// Applies a torque for the next step.
    fn apply_torque(&mut self, entity: EntityId, torque: f32);

    /// Installs a joint between two cell bodies.
    fn create_joint(&mut self, first: CellId, second: CellId, spec: JointSpec) -> JointId;

    /// Removes a previously installed joint.
    fn destroy_joint(&mut self, joint: JointId);

    /// Lists every entity whose body overlaps the provided circle.
    fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId>;
}

/// Immutable representation of a single cell's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct CellSnapshot {
    /// Unique identifier assigned to the cell.
    pub id: CellId,
    /// Behavioural kind of the cell.
    pub kind: CellKind,
    /// Energy currently held by the cell.
    pub energy: f32,
    /// Organism tag currently carried by the cell.
    pub organism: OrganismId,
    /// Bonded neighbours in bond-table order.
    pub neighbors: Vec<CellId>,
}

/// Read-only snapshot describing all cells in the arena.
#[derive(Clone, Debug, Default)]
pub struct CellView {
    snapshots: Vec<CellSnapshot>,
}

impl CellView {
    /// Creates a new cell view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<CellSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured cell snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &CellSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up a single snapshot by identifier.
    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&CellSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of cells captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single packet's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PacketSnapshot {
    /// Unique identifier assigned to the packet.
    pub id: PacketId,
    /// Kind of the packet.
    pub kind: PacketKind,
    /// Resource value carried by the packet.
    pub value: f32,
}

/// Read-only snapshot describing all active packets in the arena.
#[derive(Clone, Debug, Default)]
pub struct PacketView {
    snapshots: Vec<PacketSnapshot>,
}

impl PacketView {
    /// Creates a new packet view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PacketSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured packet snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &PacketSnapshot> {
        self.snapshots.iter()
    }

    /// Number of packets captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no packets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PacketSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single bond.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BondSnapshot {
    /// Identifier assigned to the bond.
    pub id: BondId,
    /// Cell whose contact created the bond.
    pub initiator: CellId,
    /// Cell the initiator connected to.
    pub peer: CellId,
    /// Joint handle owned by the bond.
    pub joint: JointId,
}

/// Read-only snapshot describing every live bond.
#[derive(Clone, Debug, Default)]
pub struct BondView {
    snapshots: Vec<BondSnapshot>,
}

impl BondView {
    /// Creates a new bond view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BondSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured bond snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BondSnapshot> {
        self.snapshots.iter()
    }

    /// Number of bonds captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no bonds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
