#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reference rigid-body collaborator for the Colony world.
//!
//! [`Arena2d`] integrates circular bodies inside a walled rectangle, keeps
//! bonded cells together with springs, resolves overlaps with elastic
//! impulses and reports every pair that starts touching as a [`Contact`].

use std::collections::{BTreeMap, BTreeSet};

use colony_core::{BodySpec, CellId, Command, EntityId, JointId, JointSpec, Physics, Settings};
use glam::Vec2;
use tracing::trace;

mod grid;

use grid::UniformGrid;

/// Distance beyond touching at which a resting pair still counts as in contact.
const CONTACT_SLOP: f32 = 0.01;

/// Tunables of the integrator that the simulation parameters do not cover.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Arena width; bodies bounce off `x = 0` and `x = width`.
    pub width: f32,
    /// Arena height; bodies bounce off `y = 0` and `y = height`.
    pub height: f32,
    /// Fraction of linear velocity lost per second.
    pub drag: f32,
    /// Fraction of angular velocity lost per second.
    pub angular_drag: f32,
    /// Coefficient of restitution used for body contacts.
    pub restitution: f32,
    /// Mass per unit area.
    pub density: f32,
    /// Edge length of the broad-phase buckets.
    pub bucket_size: f32,
}

impl PhysicsConfig {
    /// Derives the arena and bucket size from simulation parameters.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let largest = settings
            .cell
            .radius
            .max(settings.energy.radius)
            .max(settings.food.radius);
        Self {
            width: settings.boundary.width,
            height: settings.boundary.height,
            drag: 0.5,
            angular_drag: 1.0,
            restitution: 1.0,
            density: 1.0,
            bucket_size: largest * 2.0,
        }
    }
}

/// Pair of bodies that started touching during a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// Body with the smaller identifier.
    pub first: EntityId,
    /// Body with the larger identifier.
    pub second: EntityId,
    /// Magnitude of the relative velocity just before the impulse.
    pub relative_speed: f32,
}

impl Contact {
    /// Converts the contact into the command the world consumes.
    #[must_use]
    pub fn into_command(self) -> Command {
        Command::Collide {
            first: self.first,
            second: self.second,
            relative_speed: self.relative_speed,
        }
    }
}

#[derive(Clone, Debug)]
struct Body {
    position: Vec2,
    velocity: Vec2,
    heading: f32,
    angular_velocity: f32,
    radius: f32,
    inverse_mass: f32,
    inverse_inertia: f32,
    force: Vec2,
    local_force: Vec2,
    torque: f32,
}

#[derive(Clone, Copy, Debug)]
struct Joint {
    first: EntityId,
    second: EntityId,
    spec: JointSpec,
}

/// Walled two-dimensional arena of circular bodies.
#[derive(Debug)]
pub struct Arena2d {
    config: PhysicsConfig,
    bodies: BTreeMap<EntityId, Body>,
    joints: BTreeMap<JointId, Joint>,
    next_joint: u32,
    touching: BTreeSet<(EntityId, EntityId)>,
    grid: UniformGrid,
}

impl Arena2d {
    /// Creates an empty arena.
    #[must_use]
    pub fn new(config: PhysicsConfig) -> Self {
        let grid = UniformGrid::new(config.bucket_size + CONTACT_SLOP);
        Self {
            config,
            bodies: BTreeMap::new(),
            joints: BTreeMap::new(),
            next_joint: 0,
            touching: BTreeSet::new(),
            grid,
        }
    }

    /// Number of bodies currently simulated.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of joints currently installed.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Reports whether a joint connects the two cells.
    #[must_use]
    pub fn is_jointed(&self, first: CellId, second: CellId) -> bool {
        self.jointed(EntityId::Cell(first), EntityId::Cell(second))
    }

    /// Overrides the linear velocity of a body. Returns `false` when the body
    /// does not exist.
    pub fn set_velocity(&mut self, entity: EntityId, velocity: Vec2) -> bool {
        match self.bodies.get_mut(&entity) {
            Some(body) => {
                body.velocity = velocity;
                true
            }
            None => false,
        }
    }

    /// Advances every body by `dt` seconds and appends new contacts.
    pub fn step(&mut self, dt: f32, contacts: &mut Vec<Contact>) {
        self.accumulate_springs();
        self.integrate(dt);
        self.collide(contacts);
    }

    fn jointed(&self, first: EntityId, second: EntityId) -> bool {
        self.joints.values().any(|joint| {
            (joint.first == first && joint.second == second)
                || (joint.first == second && joint.second == first)
        })
    }

    fn accumulate_springs(&mut self) {
        for joint in self.joints.values() {
            let (Some(first), Some(second)) =
                (self.bodies.get(&joint.first), self.bodies.get(&joint.second))
            else {
                continue;
            };
            let delta = second.position - first.position;
            let distance = delta.length();
            if distance <= f32::EPSILON {
                continue;
            }
            let gap = distance - first.radius - second.radius;
            let pull = delta / distance * joint.spec.stiffness * (gap - joint.spec.rest_distance);

            if let Some(body) = self.bodies.get_mut(&joint.first) {
                body.force += pull;
            }
            if let Some(body) = self.bodies.get_mut(&joint.second) {
                body.force -= pull;
            }
        }
    }

    fn integrate(&mut self, dt: f32) {
        let linear_keep = (1.0 - self.config.drag * dt).max(0.0);
        let angular_keep = (1.0 - self.config.angular_drag * dt).max(0.0);
        let (width, height) = (self.config.width, self.config.height);

        for body in self.bodies.values_mut() {
            let thrust = Vec2::from_angle(body.heading).rotate(body.local_force);
            body.velocity += (body.force + thrust) * body.inverse_mass * dt;
            body.velocity *= linear_keep;
            body.angular_velocity += body.torque * body.inverse_inertia * dt;
            body.angular_velocity *= angular_keep;

            body.heading += body.angular_velocity * dt;
            body.position += body.velocity * dt;
            bounce(&mut body.position.x, &mut body.velocity.x, body.radius, width);
            bounce(&mut body.position.y, &mut body.velocity.y, body.radius, height);

            body.force = Vec2::ZERO;
            body.local_force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    fn collide(&mut self, contacts: &mut Vec<Contact>) {
        self.grid
            .rebuild(self.bodies.iter().map(|(entity, body)| (*entity, body.position)));

        let mut touching = BTreeSet::new();
        for (first, second) in self.grid.candidate_pairs() {
            if self.jointed(first, second) {
                continue;
            }
            let Some(relative_speed) = self.resolve(first, second) else {
                continue;
            };
            let _ = touching.insert((first, second));
            if !self.touching.contains(&(first, second)) {
                trace!(?first, ?second, relative_speed, "contact");
                contacts.push(Contact {
                    first,
                    second,
                    relative_speed,
                });
            }
        }
        self.touching = touching;
    }

    /// Pushes an overlapping pair apart and returns the relative speed it had
    /// on impact, or `None` when the pair is not in contact.
    fn resolve(&mut self, first: EntityId, second: EntityId) -> Option<f32> {
        let a = self.bodies.get(&first)?;
        let b = self.bodies.get(&second)?;

        let delta = a.position - b.position;
        let distance = delta.length();
        let reach = a.radius + b.radius;
        if distance >= reach + CONTACT_SLOP {
            return None;
        }

        let normal = if distance > f32::EPSILON {
            delta / distance
        } else {
            Vec2::X
        };
        let relative = a.velocity - b.velocity;
        let relative_speed = relative.length();
        let total_inverse = a.inverse_mass + b.inverse_mass;
        if total_inverse <= 0.0 {
            return Some(relative_speed);
        }

        let approach = relative.dot(normal);
        let impulse = if approach < 0.0 {
            -(1.0 + self.config.restitution) * approach / total_inverse
        } else {
            0.0
        };
        let push = normal * (reach - distance).max(0.0) / total_inverse;
        let (a_inverse, b_inverse) = (a.inverse_mass, b.inverse_mass);

        if let Some(body) = self.bodies.get_mut(&first) {
            body.velocity += normal * impulse * a_inverse;
            body.position += push * a_inverse;
        }
        if let Some(body) = self.bodies.get_mut(&second) {
            body.velocity -= normal * impulse * b_inverse;
            body.position -= push * b_inverse;
        }
        Some(relative_speed)
    }
}

fn bounce(position: &mut f32, velocity: &mut f32, radius: f32, extent: f32) {
    if *position - radius <= 0.0 || *position + radius >= extent {
        *position = position.clamp(radius, (extent - radius).max(radius));
        *velocity = -*velocity;
    }
}

impl Physics for Arena2d {
    fn insert_body(&mut self, entity: EntityId, body: BodySpec) {
        let area = std::f32::consts::PI * body.radius * body.radius;
        let mass = self.config.density * area;
        let inertia = 0.5 * mass * body.radius * body.radius;
        let _ = self.bodies.insert(
            entity,
            Body {
                position: body.position,
                velocity: Vec2::ZERO,
                heading: body.heading,
                angular_velocity: 0.0,
                radius: body.radius,
                inverse_mass: if mass > 0.0 { mass.recip() } else { 0.0 },
                inverse_inertia: if inertia > 0.0 { inertia.recip() } else { 0.0 },
                force: Vec2::ZERO,
                local_force: Vec2::ZERO,
                torque: 0.0,
            },
        );
    }

    fn remove_body(&mut self, entity: EntityId) {
        let _ = self.bodies.remove(&entity);
        self.joints
            .retain(|_, joint| joint.first != entity && joint.second != entity);
        self.touching
            .retain(|(first, second)| *first != entity && *second != entity);
    }

    fn position(&self, entity: EntityId) -> Option<Vec2> {
        self.bodies.get(&entity).map(|body| body.position)
    }

    fn velocity(&self, entity: EntityId) -> Vec2 {
        self.bodies
            .get(&entity)
            .map_or(Vec2::ZERO, |body| body.velocity)
    }

    fn angular_velocity(&self, entity: EntityId) -> f32 {
        self.bodies
            .get(&entity)
            .map_or(0.0, |body| body.angular_velocity)
    }

    fn apply_impulse(&mut self, entity: EntityId, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.velocity += impulse * body.inverse_mass;
        }
    }

    fn apply_relative_force(&mut self, entity: EntityId, force: Vec2) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.local_force += force;
        }
    }

    fn apply_torque(&mut self, entity: EntityId, torque: f32) {
        if let Some(body) = self.bodies.get_mut(&entity) {
            body.torque += torque;
        }
    }

    fn create_joint(&mut self, first: CellId, second: CellId, spec: JointSpec) -> JointId {
        let id = JointId::new(self.next_joint);
        self.next_joint = self.next_joint.saturating_add(1);
        let (first, second) = (EntityId::Cell(first), EntityId::Cell(second));
        let _ = self.joints.insert(id, Joint { first, second, spec });
        let _ = self.touching.remove(&(first.min(second), first.max(second)));
        id
    }

    fn destroy_joint(&mut self, joint: JointId) {
        let _ = self.joints.remove(&joint);
    }

    fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.position.distance(center) <= radius + body.radius)
            .map(|(entity, _)| *entity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colony_core::PacketId;

    fn arena() -> Arena2d {
        Arena2d::new(PhysicsConfig {
            width: 50.0,
            height: 50.0,
            drag: 0.0,
            angular_drag: 0.0,
            restitution: 1.0,
            density: 1.0,
            bucket_size: 2.0,
        })
    }

    fn disc(position: Vec2) -> BodySpec {
        BodySpec {
            position,
            radius: 1.0,
            heading: 0.0,
        }
    }

    #[test]
    fn approaching_bodies_report_a_single_contact() {
        let mut arena = arena();
        let left = EntityId::Cell(CellId::new(0));
        let right = EntityId::Cell(CellId::new(1));
        arena.insert_body(left, disc(Vec2::new(10.0, 10.0)));
        arena.insert_body(right, disc(Vec2::new(12.5, 10.0)));
        assert!(arena.set_velocity(left, Vec2::new(3.0, 0.0)));
        assert!(arena.set_velocity(right, Vec2::new(-3.0, 0.0)));

        let mut contacts = Vec::new();
        arena.step(0.1, &mut contacts);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].first, left);
        assert_eq!(contacts[0].second, right);
        assert!((contacts[0].relative_speed - 6.0).abs() < 1e-4);

        assert!(arena.velocity(left).x < 0.0, "bodies should bounce apart");
        assert!(arena.velocity(right).x > 0.0);
    }

    #[test]
    fn sustained_contact_is_not_reported_twice() {
        let mut arena = arena();
        let first = EntityId::Cell(CellId::new(0));
        let second = EntityId::Packet(PacketId::new(0));
        arena.insert_body(first, disc(Vec2::new(20.0, 20.0)));
        arena.insert_body(second, disc(Vec2::new(21.5, 20.0)));

        let mut contacts = Vec::new();
        for _ in 0..5 {
            arena.step(0.01, &mut contacts);
        }
        assert_eq!(contacts.len(), 1, "{contacts:?}");
        assert_eq!(contacts[0].relative_speed, 0.0);

        let separation = arena
            .position(second)
            .zip(arena.position(first))
            .map(|(b, a)| b.distance(a));
        assert!(separation.is_some_and(|distance| distance >= 1.99));
    }

    #[test]
    fn jointed_cells_do_not_collide_and_spring_together() {
        let mut arena = arena();
        let (a, b) = (CellId::new(0), CellId::new(1));
        arena.insert_body(EntityId::Cell(a), disc(Vec2::new(10.0, 10.0)));
        arena.insert_body(EntityId::Cell(b), disc(Vec2::new(14.0, 10.0)));
        let joint = arena.create_joint(
            a,
            b,
            JointSpec {
                rest_distance: 0.2,
                stiffness: 10.0,
            },
        );
        assert!(arena.is_jointed(a, b));

        let mut contacts = Vec::new();
        for _ in 0..10 {
            arena.step(0.02, &mut contacts);
        }
        assert!(contacts.is_empty());
        assert!(arena.velocity(EntityId::Cell(a)).x > 0.0);
        assert!(arena.velocity(EntityId::Cell(b)).x < 0.0);

        arena.destroy_joint(joint);
        assert_eq!(arena.joint_count(), 0);
    }

    #[test]
    fn removing_a_body_drops_its_joints() {
        let mut arena = arena();
        let (a, b) = (CellId::new(0), CellId::new(1));
        arena.insert_body(EntityId::Cell(a), disc(Vec2::new(10.0, 10.0)));
        arena.insert_body(EntityId::Cell(b), disc(Vec2::new(12.2, 10.0)));
        let _ = arena.create_joint(
            a,
            b,
            JointSpec {
                rest_distance: 0.2,
                stiffness: 10.0,
            },
        );

        arena.remove_body(EntityId::Cell(a));
        assert_eq!(arena.body_count(), 1);
        assert_eq!(arena.joint_count(), 0);
    }

    #[test]
    fn walls_reflect_velocity() {
        let mut arena = arena();
        let body = EntityId::Cell(CellId::new(0));
        arena.insert_body(body, disc(Vec2::new(1.2, 25.0)));
        let _ = arena.set_velocity(body, Vec2::new(-5.0, 0.0));

        arena.step(0.1, &mut Vec::new());
        let position = arena.position(body).expect("body exists");
        assert!(position.x >= 1.0);
        assert!(arena.velocity(body).x > 0.0);
    }

    #[test]
    fn relative_force_follows_heading() {
        let mut arena = arena();
        let body = EntityId::Cell(CellId::new(0));
        arena.insert_body(
            body,
            BodySpec {
                position: Vec2::new(25.0, 25.0),
                radius: 1.0,
                heading: std::f32::consts::FRAC_PI_2,
            },
        );

        arena.apply_relative_force(body, Vec2::new(10.0, 0.0));
        arena.step(0.1, &mut Vec::new());
        let velocity = arena.velocity(body);
        assert!(velocity.x.abs() < 1e-4, "{velocity:?}");
        assert!(velocity.y > 0.0);
    }

    #[test]
    fn radius_query_returns_overlapping_bodies_in_id_order() {
        let mut arena = arena();
        let packet = EntityId::Packet(PacketId::new(0));
        let near = EntityId::Cell(CellId::new(4));
        let nearer = EntityId::Cell(CellId::new(2));
        let far = EntityId::Cell(CellId::new(1));
        arena.insert_body(packet, disc(Vec2::new(12.0, 10.0)));
        arena.insert_body(near, disc(Vec2::new(14.5, 10.0)));
        arena.insert_body(nearer, disc(Vec2::new(10.0, 11.0)));
        arena.insert_body(far, disc(Vec2::new(30.0, 30.0)));

        assert_eq!(
            arena.query_radius(Vec2::new(10.0, 10.0), 4.0),
            vec![nearer, near, packet]
        );
    }
}
