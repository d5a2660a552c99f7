//! Immutable simulation parameters threaded through every constructor.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    sampling::{MinMaxF, MinMaxI},
    CellKind, PacketKind,
};

/// Complete parameter set for a simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Playfield rectangle and spawn margin.
    pub boundary: BoundaryParams,
    /// Parameters shared by every cell kind.
    pub cell: CellParams,
    /// Joint installed by each bond.
    pub bond: BondParams,
    /// Thrust behaviour of propulsion cells.
    pub propulsion: PropulsionParams,
    /// Drain behaviour of weapon cells.
    pub weapon: WeaponParams,
    /// Energy packets.
    pub energy: PacketParams,
    /// Food packets.
    pub food: PacketParams,
    /// Packet to cell conversion.
    pub genesis: GenesisParams,
    /// Start-up population.
    pub spawning: SpawningParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            boundary: BoundaryParams::default(),
            cell: CellParams::default(),
            bond: BondParams::default(),
            propulsion: PropulsionParams::default(),
            weapon: WeaponParams::default(),
            energy: PacketParams::default(),
            food: PacketParams {
                absorbable: true,
                ..PacketParams::default()
            },
            genesis: GenesisParams::default(),
            spawning: SpawningParams::default(),
        }
    }
}

impl Settings {
    /// Parameters of the provided packet kind.
    #[must_use]
    pub fn packet(&self, kind: PacketKind) -> &PacketParams {
        match kind {
            PacketKind::Energy => &self.energy,
            PacketKind::Food => &self.food,
        }
    }

    /// Checks every precondition the simulation relies on.
    ///
    /// Weighted genesis draws use rejection sampling, so a weight table that
    /// cannot accept any entry would never terminate. Such tables are rejected
    /// here instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let boundary = &self.boundary;
        positive("boundary.width", boundary.width)?;
        positive("boundary.height", boundary.height)?;
        non_negative("boundary.margin", boundary.margin)?;
        if boundary.width <= boundary.margin * 2.0 || boundary.height <= boundary.margin * 2.0 {
            return Err(ConfigError::EmptyArena {
                width: boundary.width,
                height: boundary.height,
                margin: boundary.margin,
            });
        }

        let cell = &self.cell;
        positive("cell.radius", cell.radius)?;
        non_negative("cell.share_rate", cell.share_rate)?;
        non_negative("cell.bond_force", cell.bond_force)?;
        non_negative("cell.min_energy", cell.min_energy)?;
        non_negative("cell.initial_energy", cell.initial_energy)?;
        if cell.max_bonds == 0 {
            return Err(ConfigError::NoBondCapacity);
        }
        if cell.spawn_kinds.is_empty() && self.spawning.cell_count > 0 {
            return Err(ConfigError::NoSpawnKinds);
        }

        non_negative("bond.rest_distance", self.bond.rest_distance)?;
        positive("bond.stiffness", self.bond.stiffness)?;

        let propulsion = &self.propulsion;
        non_negative("propulsion.cost", propulsion.cost)?;
        non_negative("propulsion.speed_limit", propulsion.speed_limit)?;
        ordered("propulsion.torque", propulsion.torque)?;

        let weapon = &self.weapon;
        non_negative("weapon.attack_cost", weapon.attack_cost)?;
        non_negative("weapon.attack_radius", weapon.attack_radius)?;
        if !(0.0..=1.0).contains(&weapon.drain_rate) {
            return Err(ConfigError::OutOfRange {
                field: "weapon.drain_rate".to_owned(),
                value: weapon.drain_rate,
            });
        }

        self.energy.validate(PacketKind::Energy)?;
        self.food.validate(PacketKind::Food)?;

        positive("genesis.threshold", self.genesis.threshold)?;
        let _ = crate::sampling::WeightedTable::new(self.genesis.weights.clone())?;

        Ok(())
    }
}

/// Rectangle enclosing the simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryParams {
    /// Horizontal extent of the arena in world units.
    pub width: f32,
    /// Vertical extent of the arena in world units.
    pub height: f32,
    /// Thickness of the enclosing walls.
    pub thickness: f32,
    /// Inset applied to every edge when choosing random spawn points.
    pub margin: f32,
}

impl Default for BoundaryParams {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 120.0,
            thickness: 1.0,
            margin: 5.0,
        }
    }
}

/// Parameters shared by every cell kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellParams {
    /// Collider radius of a cell body.
    pub radius: f32,
    /// Energy moved across a bond per qualifying neighbour per tick.
    pub share_rate: f32,
    /// Relative speed a contact must exceed to form a bond.
    pub bond_force: f32,
    /// Maximum number of bonds a single cell may hold.
    pub max_bonds: usize,
    /// Energy below which a cell destabilizes.
    pub min_energy: f32,
    /// Energy assigned to cells created by the spawner.
    pub initial_energy: f32,
    /// Kinds the start-up spawner cycles through.
    pub spawn_kinds: Vec<CellKind>,
    /// Kind of packet emitted when a cell destabilizes.
    pub remnant_kind: PacketKind,
}

impl Default for CellParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            share_rate: 0.5,
            bond_force: 2.0,
            max_bonds: 3,
            min_energy: 1.0,
            initial_energy: 20.0,
            spawn_kinds: vec![CellKind::Base, CellKind::Propulsion],
            remnant_kind: PacketKind::Energy,
        }
    }
}

/// Joint installed between bonded cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BondParams {
    /// Surface gap the joint maintains.
    pub rest_distance: f32,
    /// Spring constant of the joint.
    pub stiffness: f32,
}

impl Default for BondParams {
    fn default() -> Self {
        Self {
            rest_distance: 0.2,
            stiffness: 40.0,
        }
    }
}

/// Thrust behaviour of propulsion cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropulsionParams {
    /// Forward force applied while thrusting.
    pub force: f32,
    /// Range the per-cell torque is sampled from at creation.
    pub torque: MinMaxF,
    /// Energy consumed per thrusting tick.
    pub cost: f32,
    /// Speed above which the cell coasts and shares instead.
    pub speed_limit: f32,
}

impl Default for PropulsionParams {
    fn default() -> Self {
        Self {
            force: 4.0,
            torque: MinMaxF::new(-1.0, 1.0),
            cost: 0.05,
            speed_limit: 6.0,
        }
    }
}

/// Drain behaviour of weapon cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponParams {
    /// Energy destroyed per target hit.
    pub attack_cost: f32,
    /// Radius of the overlap query around the attacker.
    pub attack_radius: f32,
    /// Fraction of the target's energy stolen per hit.
    pub drain_rate: f32,
}

impl Default for WeaponParams {
    fn default() -> Self {
        Self {
            attack_cost: 2.0,
            attack_radius: 4.0,
            drain_rate: 0.1,
        }
    }
}

/// Lifecycle parameters of one packet kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketParams {
    /// Collider radius of a packet body.
    pub radius: f32,
    /// Range a freshly spawned packet's value is drawn from.
    pub value: MinMaxF,
    /// Range each axis of the launch impulse is drawn from.
    pub velocity: MinMaxF,
    /// Number of packets created per spawn batch.
    pub spawn_count: MinMaxI,
    /// Seconds between spawn batches; zero disables the spawner.
    pub spawn_interval: f32,
    /// Whether cells consume this kind on contact.
    pub absorbable: bool,
}

impl PacketParams {
    fn validate(&self, kind: PacketKind) -> Result<(), ConfigError> {
        let prefix = match kind {
            PacketKind::Energy => "energy",
            PacketKind::Food => "food",
        };
        let field = |name: &str| format!("{prefix}.{name}");

        positive(&field("radius"), self.radius)?;
        ordered(&field("value"), self.value)?;
        non_negative(&field("value"), self.value.min)?;
        ordered(&field("velocity"), self.velocity)?;
        if self.spawn_count.max < self.spawn_count.min || self.spawn_count.min < 0 {
            return Err(ConfigError::InvertedRange {
                field: field("spawn_count"),
                min: self.spawn_count.min as f32,
                max: self.spawn_count.max as f32,
            });
        }
        non_negative(&field("spawn_interval"), self.spawn_interval)
    }
}

impl Default for PacketParams {
    fn default() -> Self {
        Self {
            radius: 0.5,
            value: MinMaxF::new(2.0, 8.0),
            velocity: MinMaxF::new(-3.0, 3.0),
            spawn_count: MinMaxI::new(2, 6),
            spawn_interval: 1.5,
            absorbable: false,
        }
    }
}

/// Packet to cell conversion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisParams {
    /// Value at which a packet turns into a cell.
    pub threshold: f32,
    /// Acceptance weights of the kinds a new cell may take.
    pub weights: Vec<KindWeight>,
}

impl Default for GenesisParams {
    fn default() -> Self {
        Self {
            threshold: 30.0,
            weights: vec![
                KindWeight::new(CellKind::Base, 0.6),
                KindWeight::new(CellKind::Propulsion, 0.3),
                KindWeight::new(CellKind::Weapon, 0.1),
            ],
        }
    }
}

/// Acceptance weight of a single cell kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindWeight {
    /// Kind being weighted.
    pub kind: CellKind,
    /// Probability in `[0, 1]` that a draw landing on this entry is accepted.
    pub weight: f32,
}

impl KindWeight {
    /// Creates a new weight entry.
    #[must_use]
    pub const fn new(kind: CellKind, weight: f32) -> Self {
        Self { kind, weight }
    }
}

/// Start-up population.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawningParams {
    /// Number of cells created before the first tick.
    pub cell_count: u32,
}

impl Default for SpawningParams {
    fn default() -> Self {
        Self { cell_count: 40 }
    }
}

/// Reasons a parameter set is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A field that must be strictly positive was not.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Dotted path of the offending field.
        field: String,
        /// Value that was provided.
        value: f32,
    },
    /// A field that must not be negative was.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Dotted path of the offending field.
        field: String,
        /// Value that was provided.
        value: f32,
    },
    /// A field fell outside its permitted interval.
    #[error("{field} is out of range: {value}")]
    OutOfRange {
        /// Dotted path of the offending field.
        field: String,
        /// Value that was provided.
        value: f32,
    },
    /// A range had its bounds swapped.
    #[error("{field} has min {min} above max {max}")]
    InvertedRange {
        /// Dotted path of the offending field.
        field: String,
        /// Lower bound that was provided.
        min: f32,
        /// Upper bound that was provided.
        max: f32,
    },
    /// The spawn margin leaves no room inside the arena.
    #[error("margin {margin} leaves no interior in a {width}x{height} arena")]
    EmptyArena {
        /// Arena width.
        width: f32,
        /// Arena height.
        height: f32,
        /// Margin applied to every edge.
        margin: f32,
    },
    /// Cells could never bond.
    #[error("cell.max_bonds must be at least one")]
    NoBondCapacity,
    /// The start-up spawner has cells to create but no kinds to create.
    #[error("cell.spawn_kinds is empty but spawning.cell_count is positive")]
    NoSpawnKinds,
    /// The genesis weight table has no entries.
    #[error("genesis.weights is empty")]
    EmptyWeightTable,
    /// A genesis weight lies outside `[0, 1]`.
    #[error("genesis weight for {kind:?} must lie in [0, 1], got {weight}")]
    InvalidWeight {
        /// Kind whose weight is invalid.
        kind: CellKind,
        /// Weight that was provided.
        weight: f32,
    },
    /// No genesis weight is positive, so no draw could ever be accepted.
    #[error("genesis.weights has no positive entry")]
    UnsatisfiableWeights,
}

fn positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field: field.to_owned(),
            value,
        })
    }
}

fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            field: field.to_owned(),
            value,
        })
    }
}

fn ordered(field: &str, range: MinMaxF) -> Result<(), ConfigError> {
    if range.min <= range.max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange {
            field: field.to_owned(),
            min: range.min,
            max: range.max,
        })
    }
}
