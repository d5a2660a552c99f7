use colony_core::{BondId, CellId, JointId, JointSpec, Physics};

use crate::World;

/// Connector registered in the tables of both of its endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Bond {
    pub(crate) initiator: CellId,
    pub(crate) peer: CellId,
    pub(crate) joint: JointId,
}

impl World {
    /// Installs a joint between two cells and registers the bond on both sides.
    pub(crate) fn connect(
        &mut self,
        initiator: CellId,
        peer: CellId,
        physics: &mut dyn Physics,
    ) -> BondId {
        let id = BondId::new(self.next_bond);
        self.next_bond = self.next_bond.saturating_add(1);

        let joint = physics.create_joint(
            initiator,
            peer,
            JointSpec {
                rest_distance: self.settings.bond.rest_distance,
                stiffness: self.settings.bond.stiffness,
            },
        );
        let _ = self.bonds.insert(
            id,
            Bond {
                initiator,
                peer,
                joint,
            },
        );

        for (owner, neighbor) in [(initiator, peer), (peer, initiator)] {
            if let Some(cell) = self.cells.get_mut(&owner) {
                cell.bonds.insert(neighbor, id);
            }
        }
        id
    }

    /// Drops the bond from the registry and destroys its joint.
    ///
    /// The endpoint tables are left to the caller, which already holds the
    /// departing cell and knows which survivor to update.
    pub(crate) fn sever(&mut self, id: BondId, physics: &mut dyn Physics) {
        if let Some(bond) = self.bonds.remove(&id) {
            physics.destroy_joint(bond.joint);
        }
    }
}
