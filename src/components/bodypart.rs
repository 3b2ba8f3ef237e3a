//! Fixed body-part hierarchy of the companion rig.
//!
//! The rig is a closed set of rigid parts. Each part has a parent, a pivot
//! offset relative to the parent's pivot, a shape placed relative to its own
//! pivot, and a base colour. The table is static and never mutated; poses are
//! expressed as per-part transforms on top of it (see
//! [`RigPose`](super::pose::RigPose)).
//!
//! Units are world pixels, y up, with the rig root at the feet.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One rigid part of the companion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyPart {
    Body,
    Butt,
    Head,
    EarLeft,
    EarRight,
    ArmLeft,
    ArmRight,
    LegLeft,
    LegRight,
}

impl BodyPart {
    /// Every part, parents before children.
    pub const ALL: [BodyPart; 9] = [
        BodyPart::Body,
        BodyPart::Butt,
        BodyPart::Head,
        BodyPart::EarLeft,
        BodyPart::EarRight,
        BodyPart::ArmLeft,
        BodyPart::ArmRight,
        BodyPart::LegLeft,
        BodyPart::LegRight,
    ];

    /// Order used when resolving overlapping hit regions: small front parts win.
    pub const HIT_ORDER: [BodyPart; 9] = [
        BodyPart::EarLeft,
        BodyPart::EarRight,
        BodyPart::ArmLeft,
        BodyPart::ArmRight,
        BodyPart::LegLeft,
        BodyPart::LegRight,
        BodyPart::Head,
        BodyPart::Butt,
        BodyPart::Body,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            BodyPart::Body => "body",
            BodyPart::Butt => "butt",
            BodyPart::Head => "head",
            BodyPart::EarLeft => "ear_left",
            BodyPart::EarRight => "ear_right",
            BodyPart::ArmLeft => "arm_left",
            BodyPart::ArmRight => "arm_right",
            BodyPart::LegLeft => "leg_left",
            BodyPart::LegRight => "leg_right",
        }
    }

    /// Torso parts translate the whole rig when dragged and steer facing.
    pub fn is_torso(self) -> bool {
        matches!(self, BodyPart::Body | BodyPart::Butt)
    }

    /// Parts whose click reads as petting rather than poking.
    pub fn is_pettable(self) -> bool {
        matches!(self, BodyPart::Head | BodyPart::EarLeft | BodyPart::EarRight)
    }

    pub fn def(self) -> &'static PartDef {
        &HIERARCHY[self.index()]
    }

    pub fn parent(self) -> Option<BodyPart> {
        self.def().parent
    }

    /// Pivot position relative to the rig root in the rest pose.
    pub fn rest_pivot(self) -> Vec3 {
        let mut pivot = Vec3::ZERO;
        let mut current = Some(self);
        while let Some(part) = current {
            let def = part.def();
            pivot += def.offset;
            current = def.parent;
        }
        pivot
    }

    /// Rest pivot projected onto the screen plane.
    pub fn rest_pivot_2d(self) -> Vec2 {
        let p = self.rest_pivot();
        Vec2::new(p.x, p.y)
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BodyPart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        BodyPart::ALL
            .iter()
            .copied()
            .find(|part| part.name() == key || part.name().replace('_', "") == key)
            .ok_or_else(|| format!("unknown body part '{}'", s))
    }
}

/// Geometric primitive of a part, in part-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
}

/// Static description of one part.
#[derive(Debug, Clone, Copy)]
pub struct PartDef {
    pub part: BodyPart,
    pub parent: Option<BodyPart>,
    /// Pivot relative to the parent's pivot (or the rig root).
    pub offset: Vec3,
    /// Shape centre relative to this part's pivot.
    pub center: Vec3,
    pub shape: PartShape,
    /// Default albedo, sRGB. The live colour comes from the
    /// [`RigPalette`](super::palette::RigPalette).
    pub color: [u8; 3],
}

pub const FUR_WHITE: [u8; 3] = [240, 240, 236];
pub const FUR_BLACK: [u8; 3] = [34, 34, 38];

/// Parent-before-child table indexed by [`BodyPart::index`].
pub static HIERARCHY: [PartDef; 9] = [
    PartDef {
        part: BodyPart::Body,
        parent: None,
        offset: Vec3::new(0.0, 28.0, 0.0),
        center: Vec3::new(0.0, 24.0, 0.0),
        shape: PartShape::Box {
            half_extents: Vec3::new(20.0, 24.0, 16.0),
        },
        color: FUR_WHITE,
    },
    PartDef {
        part: BodyPart::Butt,
        parent: Some(BodyPart::Body),
        offset: Vec3::new(0.0, 0.0, -4.0),
        center: Vec3::new(0.0, 6.0, 0.0),
        shape: PartShape::Box {
            half_extents: Vec3::new(18.0, 10.0, 14.0),
        },
        color: FUR_WHITE,
    },
    PartDef {
        part: BodyPart::Head,
        parent: Some(BodyPart::Body),
        offset: Vec3::new(0.0, 48.0, 2.0),
        center: Vec3::new(0.0, 26.0, 0.0),
        shape: PartShape::Sphere { radius: 26.0 },
        color: FUR_WHITE,
    },
    PartDef {
        part: BodyPart::EarLeft,
        parent: Some(BodyPart::Head),
        offset: Vec3::new(-20.0, 44.0, 0.0),
        center: Vec3::ZERO,
        shape: PartShape::Sphere { radius: 9.0 },
        color: FUR_BLACK,
    },
    PartDef {
        part: BodyPart::EarRight,
        parent: Some(BodyPart::Head),
        offset: Vec3::new(20.0, 44.0, 0.0),
        center: Vec3::ZERO,
        shape: PartShape::Sphere { radius: 9.0 },
        color: FUR_BLACK,
    },
    PartDef {
        part: BodyPart::ArmLeft,
        parent: Some(BodyPart::Body),
        offset: Vec3::new(-22.0, 42.0, 4.0),
        center: Vec3::new(0.0, -14.0, 0.0),
        shape: PartShape::Box {
            half_extents: Vec3::new(6.0, 14.0, 6.0),
        },
        color: FUR_BLACK,
    },
    PartDef {
        part: BodyPart::ArmRight,
        parent: Some(BodyPart::Body),
        offset: Vec3::new(22.0, 42.0, 4.0),
        center: Vec3::new(0.0, -14.0, 0.0),
        shape: PartShape::Box {
            half_extents: Vec3::new(6.0, 14.0, 6.0),
        },
        color: FUR_BLACK,
    },
    PartDef {
        part: BodyPart::LegLeft,
        parent: None,
        offset: Vec3::new(-11.0, 28.0, 0.0),
        center: Vec3::new(0.0, -14.0, 0.0),
        shape: PartShape::Box {
            half_extents: Vec3::new(7.0, 14.0, 7.0),
        },
        color: FUR_BLACK,
    },
    PartDef {
        part: BodyPart::LegRight,
        parent: None,
        offset: Vec3::new(11.0, 28.0, 0.0),
        center: Vec3::new(0.0, -14.0, 0.0),
        shape: PartShape::Box {
            half_extents: Vec3::new(7.0, 14.0, 7.0),
        },
        color: FUR_BLACK,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_part() {
        for part in BodyPart::ALL {
            assert_eq!(part.def().part, part);
        }
    }

    #[test]
    fn parents_precede_children() {
        for (i, def) in HIERARCHY.iter().enumerate() {
            if let Some(parent) = def.parent {
                assert!(parent.index() < i, "{} listed before its parent", def.part);
            }
        }
    }

    #[test]
    fn rest_pivots_accumulate_parent_offsets() {
        assert_eq!(BodyPart::Body.rest_pivot(), Vec3::new(0.0, 28.0, 0.0));
        assert_eq!(BodyPart::Head.rest_pivot(), Vec3::new(0.0, 76.0, 2.0));
        assert_eq!(BodyPart::EarLeft.rest_pivot(), Vec3::new(-20.0, 120.0, 2.0));
        assert_eq!(BodyPart::LegLeft.rest_pivot_2d(), Vec2::new(-11.0, 28.0));
    }

    #[test]
    fn torso_and_pettable_sets() {
        assert!(BodyPart::Body.is_torso());
        assert!(BodyPart::Butt.is_torso());
        assert!(!BodyPart::Head.is_torso());
        assert!(BodyPart::EarRight.is_pettable());
        assert!(!BodyPart::ArmLeft.is_pettable());
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!("LegLeft".parse::<BodyPart>(), Ok(BodyPart::LegLeft));
        assert_eq!("leg-left".parse::<BodyPart>(), Ok(BodyPart::LegLeft));
        assert_eq!("EAR_RIGHT".parse::<BodyPart>(), Ok(BodyPart::EarRight));
        assert!("tail".parse::<BodyPart>().is_err());
    }
}
