use bevy_ecs::message::Message;

/// Contacts reported by the integrator, consumed by the state machine.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum PhysicsMessage {
    /// Floor hit with enough rebound to leave the floor again.
    Bounced { impact_speed: f32, bounce: u32 },
    /// Floor hit that came to rest. `horizontal_speed` is measured at touchdown.
    Settled {
        impact_speed: f32,
        horizontal_speed: f32,
        peak_impact_speed: f32,
    },
    /// Side wall hit.
    WallHit { speed: f32 },
}
