use colony_core::{CellId, EntityId, Event, Physics};
use tracing::trace;

use crate::World;

impl World {
    /// Drains every foreign cell within reach while energy lasts.
    ///
    /// Each hit moves `target.energy * drain_rate` to the attacker and then
    /// destroys `attack_cost` of the attacker's own energy.
    pub(crate) fn attack(
        &mut self,
        id: CellId,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) {
        let params = self.settings.weapon.clone();
        let Some(attacker) = self.cells.get(&id) else {
            return;
        };
        if attacker.energy < params.attack_cost {
            return;
        }
        let Some(center) = physics.position(EntityId::Cell(id)) else {
            return;
        };

        for entity in physics.query_radius(center, params.attack_radius) {
            let Some(attacker) = self.cells.get(&id) else {
                return;
            };
            if attacker.energy < params.attack_cost {
                break;
            }
            let organism = attacker.organism;

            let Some(target) = entity.cell() else {
                continue;
            };
            let Some(victim) = self.cells.get(&target) else {
                continue;
            };
            if target == id || victim.organism == organism {
                continue;
            }

            let stolen = victim.energy * params.drain_rate;
            self.add_energy(target, -stolen);
            self.add_energy(id, stolen - params.attack_cost);

            trace!(attacker = ?id, ?target, stolen, "attack landed");
            out_events.push(Event::AttackLanded {
                attacker: id,
                target,
                stolen,
            });
        }
    }
}
