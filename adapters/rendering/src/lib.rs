#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Colony adapters.
//!
//! Nothing here draws. Adapters capture a [`Scene`] from the world's query
//! views and the physics collaborator, then hand it to whatever backend they
//! own, or serialise it for offline inspection.

use colony_core::{
    BondView, CellKind, CellView, EntityId, PacketKind, PacketView, Physics, Settings,
};
use glam::Vec2;
use serde::Serialize;

/// Resource value at which a body is drawn half transparent.
pub const HALF_OPACITY_VALUE: f32 = 20.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with its alpha channel replaced.
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Base color used for a cell kind.
    #[must_use]
    pub const fn for_cell(kind: CellKind) -> Self {
        match kind {
            CellKind::Base => Self::from_rgb_u8(112, 200, 120),
            CellKind::Propulsion => Self::from_rgb_u8(86, 140, 230),
            CellKind::Weapon => Self::from_rgb_u8(220, 72, 64),
        }
    }

    /// Base color used for a packet kind.
    #[must_use]
    pub const fn for_packet(kind: PacketKind) -> Self {
        match kind {
            PacketKind::Energy => Self::from_rgb_u8(240, 210, 80),
            PacketKind::Food => Self::from_rgb_u8(200, 140, 220),
        }
    }
}

/// Maps a resource value onto an opacity in `[0, 1)`.
///
/// Zero maps to fully transparent and the curve reaches one half at
/// [`HALF_OPACITY_VALUE`]. Negative input is treated as zero.
#[must_use]
pub fn resource_alpha(value: f32) -> f32 {
    1.0 - 1.0 / (value.max(0.0) / HALF_OPACITY_VALUE + 1.0)
}

/// Filled circle representing a cell or a packet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Disc {
    /// Entity drawn by the disc.
    pub entity: EntityId,
    /// Centre of the disc in world units.
    pub position: Vec2,
    /// Radius of the disc in world units.
    pub radius: f32,
    /// Fill color, alpha derived from the carried energy or value.
    pub color: Color,
}

/// Line segment drawn between two bonded cells.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Link {
    /// Start of the segment, at the initiator's centre.
    pub from: Vec2,
    /// End of the segment, at the peer's centre.
    pub to: Vec2,
}

/// Scene description captured at a single tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Scene {
    /// Tick the scene was captured at.
    pub tick: u64,
    /// Cells followed by packets, each group in identifier order.
    pub discs: Vec<Disc>,
    /// One segment per live bond.
    pub links: Vec<Link>,
}

impl Scene {
    /// Captures every body the physics collaborator can place.
    ///
    /// Entities without a known position are skipped, as are bonds with a
    /// missing endpoint.
    #[must_use]
    pub fn capture(
        tick: u64,
        cells: &CellView,
        packets: &PacketView,
        bonds: &BondView,
        physics: &dyn Physics,
        settings: &Settings,
    ) -> Self {
        let cell_discs = cells.iter().filter_map(|cell| {
            let entity = EntityId::Cell(cell.id);
            physics.position(entity).map(|position| Disc {
                entity,
                position,
                radius: settings.cell.radius,
                color: Color::for_cell(cell.kind).with_alpha(resource_alpha(cell.energy)),
            })
        });
        let packet_discs = packets.iter().filter_map(|packet| {
            let entity = EntityId::Packet(packet.id);
            physics.position(entity).map(|position| Disc {
                entity,
                position,
                radius: settings.packet(packet.kind).radius,
                color: Color::for_packet(packet.kind).with_alpha(resource_alpha(packet.value)),
            })
        });
        let discs = cell_discs.chain(packet_discs).collect();

        let links = bonds
            .iter()
            .filter_map(|bond| {
                let from = physics.position(EntityId::Cell(bond.initiator))?;
                let to = physics.position(EntityId::Cell(bond.peer))?;
                Some(Link { from, to })
            })
            .collect();

        Self { tick, discs, links }
    }

    /// Number of drawable elements in the scene.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.discs.len() + self.links.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_zero_for_empty_and_negative_values() {
        assert_eq!(resource_alpha(0.0), 0.0);
        assert_eq!(resource_alpha(-5.0), 0.0);
    }

    #[test]
    fn alpha_reaches_half_at_reference_value() {
        assert!((resource_alpha(HALF_OPACITY_VALUE) - 0.5).abs() < 1e-6);
        assert!((resource_alpha(60.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn alpha_grows_monotonically_below_one() {
        let samples = [0.5, 1.0, 10.0, 100.0, 10_000.0];
        for pair in samples.windows(2) {
            assert!(resource_alpha(pair[0]) < resource_alpha(pair[1]));
        }
        assert!(resource_alpha(1.0e6) < 1.0);
    }

    #[test]
    fn with_alpha_clamps_and_keeps_channels() {
        let color = Color::from_rgb_u8(255, 0, 51).with_alpha(1.5);

        assert_eq!(color.alpha, 1.0);
        assert_eq!(color.red, 1.0);
        assert!((color.blue - 0.2).abs() < 1e-6);
    }

    #[test]
    fn kinds_have_distinct_colors() {
        let cells: Vec<Color> = CellKind::ALL.iter().map(|kind| Color::for_cell(*kind)).collect();
        assert_ne!(cells[0], cells[1]);
        assert_ne!(cells[1], cells[2]);
        assert_ne!(
            Color::for_packet(PacketKind::Energy),
            Color::for_packet(PacketKind::Food)
        );
    }
}
