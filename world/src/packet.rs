//! Resource packets: spawning, merging, absorption and genesis.

use colony_core::{BodySpec, CellId, EntityId, Event, PacketId, PacketKind, Physics};
use glam::Vec2;
use tracing::{debug, trace};

use crate::World;

#[derive(Clone, Debug)]
pub(crate) struct Packet {
    pub(crate) id: PacketId,
    pub(crate) kind: PacketKind,
    pub(crate) value: f32,
    /// Cleared once the packet has been consumed. Inert packets ignore every
    /// further contact and are removed when the current command finishes.
    pub(crate) active: bool,
    pub(crate) spawn_position: Vec2,
}

impl World {
    /// Creates a packet carrying `value` and launches it with a random impulse.
    pub(crate) fn spawn_packet(
        &mut self,
        kind: PacketKind,
        position: Vec2,
        value: f32,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) -> PacketId {
        let id = PacketId::new(self.next_packet);
        self.next_packet = self.next_packet.saturating_add(1);

        let params = self.settings.packet(kind);
        let radius = params.radius;
        let velocity = params.velocity;
        let impulse = Vec2::new(velocity.sample(&mut self.rng), velocity.sample(&mut self.rng));

        let entity = EntityId::Packet(id);
        physics.insert_body(
            entity,
            BodySpec {
                position,
                radius,
                heading: 0.0,
            },
        );
        physics.apply_impulse(entity, impulse);

        let _ = self.packets.insert(
            id,
            Packet {
                id,
                kind,
                value,
                active: true,
                spawn_position: position,
            },
        );
        out_events.push(Event::PacketSpawned {
            packet: id,
            kind,
            value,
        });
        id
    }

    /// Contact callback received by `survivor` for a collision with `other`.
    pub(crate) fn merge(
        &mut self,
        survivor: PacketId,
        other: PacketId,
        out_events: &mut Vec<Event>,
    ) {
        let (Some(own), Some(absorbed)) = (self.packets.get(&survivor), self.packets.get(&other))
        else {
            return;
        };
        if !own.active || !absorbed.active || own.kind != absorbed.kind {
            return;
        }

        let gained = absorbed.value;
        self.consume(other);
        let Some(own) = self.packets.get_mut(&survivor) else {
            return;
        };
        own.value += gained;

        trace!(?survivor, absorbed = ?other, value = own.value, "packets merged");
        out_events.push(Event::PacketsMerged {
            survivor,
            absorbed: other,
            value: own.value,
        });
    }

    /// Contact callback received by `cell` for a collision with `packet`.
    pub(crate) fn absorb(&mut self, cell: CellId, packet: PacketId, out_events: &mut Vec<Event>) {
        let Some(target) = self.packets.get(&packet) else {
            return;
        };
        if !target.active || !self.settings.packet(target.kind).absorbable {
            return;
        }
        if !self.cells.contains_key(&cell) {
            return;
        }

        let value = target.value;
        self.consume(packet);
        self.add_energy(cell, value);

        trace!(?cell, ?packet, value, "packet absorbed");
        out_events.push(Event::PacketAbsorbed {
            cell,
            packet,
            value,
        });
    }

    /// Converts a packet into a cell once its value reaches the threshold.
    pub(crate) fn genesis_step(
        &mut self,
        id: PacketId,
        physics: &mut dyn Physics,
        out_events: &mut Vec<Event>,
    ) {
        let Some(packet) = self.packets.get(&id) else {
            return;
        };
        if !packet.active || packet.value < self.settings.genesis.threshold {
            return;
        }

        let value = packet.value;
        let position = physics
            .position(EntityId::Packet(id))
            .unwrap_or(packet.spawn_position);
        let kind = self.genesis_table.sample(&mut self.rng);

        self.consume(id);
        let cell = self.spawn_cell(kind, position, value, physics, out_events);

        debug!(packet = ?id, ?cell, ?kind, value, "packet became a cell");
        out_events.push(Event::CellGenesis {
            packet: id,
            cell,
            kind,
        });
    }

    /// Marks a packet inert and schedules its removal.
    fn consume(&mut self, id: PacketId) {
        if let Some(packet) = self.packets.get_mut(&id) {
            if packet.active {
                packet.active = false;
                self.graveyard.push(id);
            }
        }
    }

    /// Removes every packet consumed while processing the current command.
    pub(crate) fn flush_graveyard(&mut self, physics: &mut dyn Physics) {
        for id in self.graveyard.drain(..) {
            if self.packets.remove(&id).is_some() {
                physics.remove_body(EntityId::Packet(id));
            }
        }
    }
}
