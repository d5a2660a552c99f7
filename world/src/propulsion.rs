use colony_core::{CellId, EntityId, Event, Physics};
use glam::Vec2;

use crate::World;

impl World {
    /// Behaviour step of cells that move themselves.
    ///
    /// Below the speed limit the cell pays for thrust and skips the resource
    /// step entirely. At the limit it coasts and shares instead. A cell that
    /// cannot afford thrust does nothing at all that tick.
    pub(crate) fn propulsion_step(
        &mut self,
        id: CellId,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) {
        let Some(cell) = self.cells.get(&id) else {
            return;
        };
        let params = &self.settings.propulsion;
        if cell.energy <= params.cost {
            return;
        }

        let entity = EntityId::Cell(id);
        if physics.velocity(entity).length() >= params.speed_limit {
            self.resource_step(id, physics, out_events);
            return;
        }

        let torque = cell.torque;
        let (cost, force) = (params.cost, params.force);
        self.add_energy(id, -cost);
        physics.apply_relative_force(entity, Vec2::new(force, 0.0));
        if physics.angular_velocity(entity).abs() <= torque.abs() {
            physics.apply_torque(entity, torque);
        }
    }
}
