//! Physics integration for the companion body.
//!
//! Semi-implicit Euler (`v += g·h; p += v·h`) in sub-steps of at most
//! [`MAX_SUBSTEP`] seconds. The only colliders are the floor plane and the
//! two side walls of the viewport:
//! - Floor: the crossing point inside the sub-step is located, the vertical
//!   speed is reflected by the restitution and horizontal speed damped. If
//!   the rebound is below the rest speed the body settles and is grounded.
//! - Grounded bodies get no gravity and only ground friction, so a body at
//!   rest stays exactly where it is.
//! - Walls reflect horizontal speed with the same restitution.
//!
//! Bodies holding a [`DragSession`] are driven by the pointer instead and
//! skipped here. Scene items reuse [`integrate`] from their own system.

use bevy_ecs::prelude::*;
use glam::Vec2;
use smallvec::SmallVec;

use crate::components::dragsession::DragSession;
use crate::components::physicsbody::PhysicsBody;
use crate::components::sceneitem::SceneItem;
use crate::components::squash::Squash;
use crate::events::notification::CompanionNotification;
use crate::events::physics::PhysicsMessage;
use crate::resources::companionconfig::CompanionConfig;
use crate::resources::viewport::Viewport;
use crate::resources::worldtime::WorldTime;

/// Longest integration sub-step, seconds.
pub const MAX_SUBSTEP: f32 = 1.0 / 240.0;
/// Grounded sliding below this speed (px/s) stops.
const STOP_SPEED: f32 = 1.0;

/// Integrator constants for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsParams {
    pub gravity: f32,
    pub restitution: f32,
    pub bounce_damping: f32,
    pub rest_speed: f32,
    pub ground_friction: f32,
    pub max_speed: f32,
    pub floor_y: f32,
    pub wall_left: f32,
    pub wall_right: f32,
}

impl PhysicsParams {
    pub fn new(config: &CompanionConfig, viewport: &Viewport) -> Self {
        Self {
            gravity: config.gravity,
            restitution: config.restitution,
            bounce_damping: config.bounce_damping,
            rest_speed: config.rest_speed,
            ground_friction: config.ground_friction,
            max_speed: config.max_speed,
            floor_y: viewport.floor_y,
            wall_left: 0.0,
            wall_right: viewport.width,
        }
    }
}

pub type Contacts = SmallVec<[PhysicsMessage; 4]>;

/// Advance `body` by `dt` seconds and report the contacts that happened.
pub fn integrate(body: &mut PhysicsBody, params: &PhysicsParams, dt: f32) -> Contacts {
    let mut contacts = Contacts::new();
    if dt.is_nan() || dt <= 0.0 {
        return contacts;
    }
    let substeps = (dt / MAX_SUBSTEP).ceil().max(1.0) as u32;
    let h = dt / substeps as f32;
    for _ in 0..substeps {
        if body.grounded {
            slide(body, params, h);
        } else {
            fly(body, params, h, &mut contacts);
        }
        collide_walls(body, params, &mut contacts);
    }
    let speed = body.velocity.length();
    if speed > params.max_speed {
        body.velocity *= params.max_speed / speed;
    }
    contacts
}

fn slide(body: &mut PhysicsBody, params: &PhysicsParams, h: f32) {
    body.position.y = params.floor_y;
    body.velocity.y = 0.0;
    let damping = (1.0 - params.ground_friction * h).max(0.0);
    body.velocity.x *= damping;
    body.velocity.z *= damping;
    if Vec2::new(body.velocity.x, body.velocity.z).length() < STOP_SPEED {
        body.velocity.x = 0.0;
        body.velocity.z = 0.0;
    }
    body.position.x += body.velocity.x * h;
    body.position.z += body.velocity.z * h;
}

fn fly(body: &mut PhysicsBody, params: &PhysicsParams, h: f32, contacts: &mut Contacts) {
    let prev_y = body.position.y;
    body.velocity.y -= params.gravity * h;
    body.position += body.velocity * h;
    if body.position.y >= params.floor_y {
        return;
    }

    let drop = prev_y - body.position.y;
    let before_contact = if drop > 0.0 {
        ((prev_y - params.floor_y) / drop).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let impact_speed = (-body.velocity.y).max(0.0);
    let horizontal_speed = Vec2::new(body.velocity.x, body.velocity.z).length();
    body.peak_impact_speed = body.peak_impact_speed.max(impact_speed);
    body.velocity.x *= params.bounce_damping;
    body.velocity.z *= params.bounce_damping;

    let rebound = impact_speed * params.restitution;
    if rebound < params.rest_speed {
        body.position.y = params.floor_y;
        body.velocity.y = 0.0;
        body.grounded = true;
        contacts.push(PhysicsMessage::Settled {
            impact_speed,
            horizontal_speed,
            peak_impact_speed: body.peak_impact_speed,
        });
        return;
    }

    body.bounce_count += 1;
    let remaining = h * (1.0 - before_contact);
    body.velocity.y = rebound - params.gravity * remaining;
    body.position.y =
        params.floor_y + (rebound * remaining - 0.5 * params.gravity * remaining * remaining).max(0.0);
    contacts.push(PhysicsMessage::Bounced {
        impact_speed,
        bounce: body.bounce_count,
    });
}

fn collide_walls(body: &mut PhysicsBody, params: &PhysicsParams, contacts: &mut Contacts) {
    let speed = body.velocity.x.abs();
    let hit = if body.position.x < params.wall_left {
        body.position.x = params.wall_left;
        body.velocity.x < 0.0
    } else if body.position.x > params.wall_right {
        body.position.x = params.wall_right;
        body.velocity.x > 0.0
    } else {
        false
    };
    if !hit {
        return;
    }
    body.velocity.x = -body.velocity.x * params.restitution;
    if speed >= params.rest_speed {
        contacts.push(PhysicsMessage::WallHit { speed });
    } else {
        body.velocity.x = 0.0;
    }
}

/// Integrate every free body and turn contacts into squash and notifications.
pub fn physics_system(
    time: Res<WorldTime>,
    config: Res<CompanionConfig>,
    viewport: Res<Viewport>,
    mut bodies: Query<(&mut PhysicsBody, &mut Squash), (Without<DragSession>, Without<SceneItem>)>,
    mut contacts: MessageWriter<PhysicsMessage>,
    mut notes: MessageWriter<CompanionNotification>,
) {
    let params = PhysicsParams::new(&config, &viewport);
    for (mut body, mut squash) in bodies.iter_mut() {
        for contact in integrate(&mut body, &params, time.delta) {
            match contact {
                PhysicsMessage::Bounced { impact_speed, bounce } => {
                    squash.floor_impact(impact_speed, config.squash_per_speed, config.max_squash);
                    notes.write(CompanionNotification::Bounced { bounce, impact_speed });
                }
                PhysicsMessage::Settled { impact_speed, .. } => {
                    squash.floor_impact(impact_speed, config.squash_per_speed, config.max_squash);
                    notes.write(CompanionNotification::Landed {
                        bounces: body.bounce_count,
                    });
                }
                PhysicsMessage::WallHit { speed } => {
                    squash.wall_impact(speed, config.squash_per_speed, config.max_squash);
                    notes.write(CompanionNotification::WallHit { speed });
                }
            }
            contacts.write(contact);
        }
    }
}

/// Let squash/stretch relax toward neutral.
pub fn squash_decay_system(config: Res<CompanionConfig>, mut query: Query<&mut Squash>) {
    for mut squash in query.iter_mut() {
        if squash.is_active() {
            squash.decay(config.squash_retain);
        }
    }
}

/// Advance the contact message queue so readers see this tick's contacts.
pub fn update_physics_messages(mut messages: ResMut<Messages<PhysicsMessage>>) {
    messages.update();
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn params() -> PhysicsParams {
        PhysicsParams::new(&CompanionConfig::new(), &Viewport::new(800.0, 600.0, 20.0))
    }

    #[test]
    fn resting_body_does_not_move() {
        let p = params();
        let mut body = PhysicsBody::resting_at(Vec3::new(100.0, p.floor_y, 0.0));
        for _ in 0..120 {
            assert!(integrate(&mut body, &p, DT).is_empty());
        }
        assert_eq!(body.position, Vec3::new(100.0, p.floor_y, 0.0));
        assert!(body.grounded);
    }

    #[test]
    fn body_never_ends_below_floor() {
        let p = params();
        let mut body = PhysicsBody::resting_at(Vec3::new(300.0, 400.0, 0.0));
        body.launch(Vec3::new(250.0, -1500.0, 0.0));
        for _ in 0..600 {
            integrate(&mut body, &p, DT);
            assert!(body.position.y >= p.floor_y);
        }
        assert!(body.grounded);
    }

    #[test]
    fn bounce_reflects_with_restitution_and_damps_horizontal() {
        let p = params();
        let mut body = PhysicsBody::resting_at(Vec3::new(300.0, p.floor_y + 1.0, 0.0));
        body.launch(Vec3::new(100.0, -1000.0, 0.0));
        let contacts = integrate(&mut body, &p, MAX_SUBSTEP);
        match contacts.as_slice() {
            [PhysicsMessage::Bounced { impact_speed, bounce: 1 }] => {
                assert!((impact_speed - 1010.0).abs() < 1.0);
            }
            other => panic!("unexpected contacts {other:?}"),
        }
        assert!((body.velocity.x - 80.0).abs() < 1e-3);
        assert!(body.velocity.y > 0.0);
        assert_eq!(body.bounce_count, 1);
    }

    #[test]
    fn slow_impact_settles() {
        let p = params();
        let mut body = PhysicsBody::resting_at(Vec3::new(300.0, p.floor_y + 0.5, 0.0));
        body.launch(Vec3::new(0.0, -100.0, 0.0));
        let contacts = integrate(&mut body, &p, DT);
        assert!(matches!(contacts.last(), Some(PhysicsMessage::Settled { .. })));
        assert!(body.grounded);
        assert_eq!(body.position.y, p.floor_y);
    }

    #[test]
    fn walls_reflect_horizontal_velocity() {
        let p = params();
        let mut body = PhysicsBody::resting_at(Vec3::new(p.wall_right - 1.0, 300.0, 0.0));
        body.launch(Vec3::new(1000.0, 0.0, 0.0));
        let contacts = integrate(&mut body, &p, DT);
        assert!(contacts.iter().any(|c| matches!(c, PhysicsMessage::WallHit { .. })));
        assert!(body.position.x <= p.wall_right);
        assert!((body.velocity.x + 450.0).abs() < 1.0);
    }

    #[test]
    fn ground_friction_stops_sliding() {
        let p = params();
        let mut body = PhysicsBody::resting_at(Vec3::new(300.0, p.floor_y, 0.0));
        body.velocity.x = 200.0;
        for _ in 0..240 {
            integrate(&mut body, &p, DT);
        }
        assert_eq!(body.velocity.x, 0.0);
        assert!(body.position.x > 300.0);
    }

    #[test]
    fn zero_and_nan_dt_are_noops() {
        let p = params();
        let mut body = PhysicsBody::resting_at(Vec3::new(10.0, 300.0, 0.0));
        body.launch(Vec3::new(10.0, 10.0, 0.0));
        let before = body.clone();
        integrate(&mut body, &p, 0.0);
        integrate(&mut body, &p, f32::NAN);
        assert_eq!(body, before);
    }
}
