use glam::Vec2;
use serde::Serialize;

use crate::components::bodypart::BodyPart;
use crate::events::notification::ClickReaction;

/// What a pointer-up did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ReleaseOutcome {
    /// The pointer was not captured by the companion.
    NotCaptured,
    /// Short press: a click on `part`. Physics untouched.
    Clicked { part: BodyPart, reaction: ClickReaction },
    /// A drag ended; `velocity` (px/s, world) was handed to physics.
    Thrown {
        #[serde(serialize_with = "serialize_vec2")]
        velocity: Vec2,
    },
}

fn serialize_vec2<S: serde::Serializer>(v: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
    serde::Serialize::serialize(&[v.x, v.y], serializer)
}

impl ReleaseOutcome {
    pub fn is_click(&self) -> bool {
        matches!(self, ReleaseOutcome::Clicked { .. })
    }

    pub fn is_throw(&self) -> bool {
        matches!(self, ReleaseOutcome::Thrown { .. })
    }
}
