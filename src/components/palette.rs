//! Runtime colour customisation of the rig.
//!
//! Parts are grouped into colour slots; the [`RigPalette`] component on the
//! companion maps each slot to an sRGB colour. The renderer shades from the
//! palette instead of the static part table, so a change shows on the next
//! frame.

use bevy_ecs::prelude::Component;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::bodypart::{BodyPart, FUR_BLACK, FUR_WHITE};

/// Group of parts sharing one colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorSlot {
    /// Torso and head.
    Body,
    /// Ears and limbs.
    Accent,
}

impl ColorSlot {
    pub fn of(part: BodyPart) -> Self {
        match part {
            BodyPart::Body | BodyPart::Butt | BodyPart::Head => ColorSlot::Body,
            _ => ColorSlot::Accent,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorSlot::Body => "body",
            ColorSlot::Accent => "accent",
        }
    }
}

impl fmt::Display for ColorSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "body" => Ok(ColorSlot::Body),
            "accent" => Ok(ColorSlot::Accent),
            _ => Err(format!("unknown colour slot '{}'", s)),
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RigPalette {
    pub body: [u8; 3],
    pub accent: [u8; 3],
}

impl Default for RigPalette {
    fn default() -> Self {
        Self {
            body: FUR_WHITE,
            accent: FUR_BLACK,
        }
    }
}

impl RigPalette {
    pub fn slot(&self, slot: ColorSlot) -> [u8; 3] {
        match slot {
            ColorSlot::Body => self.body,
            ColorSlot::Accent => self.accent,
        }
    }

    pub fn color_of(&self, part: BodyPart) -> [u8; 3] {
        self.slot(ColorSlot::of(part))
    }

    /// Returns whether the colour changed.
    pub fn set(&mut self, slot: ColorSlot, rgb: [u8; 3]) -> bool {
        let target = match slot {
            ColorSlot::Body => &mut self.body,
            ColorSlot::Accent => &mut self.accent,
        };
        let changed = *target != rgb;
        *target = rgb;
        changed
    }
}

/// Three channels, either all in 0–255 or normalised to 0.0–1.0.
///
/// Normalised input is recognised by a fractional component with every
/// component at most 1; plain integers are always read as 0–255.
pub fn rgb_from_channels(channels: [f32; 3]) -> Result<[u8; 3], String> {
    if channels.iter().any(|c| !c.is_finite() || *c < 0.0) {
        return Err(format!("bad colour {:?}", channels));
    }
    let normalised = channels.iter().all(|c| *c <= 1.0) && channels.iter().any(|c| c.fract() != 0.0);
    let scale = if normalised { 255.0 } else { 1.0 };
    let mut rgb = [0u8; 3];
    for (out, c) in rgb.iter_mut().zip(channels) {
        let value = (c * scale).round();
        if value > 255.0 {
            return Err(format!("colour channel {} out of range", c));
        }
        *out = value as u8;
    }
    Ok(rgb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_reproduces_the_part_table() {
        let palette = RigPalette::default();
        for part in BodyPart::ALL {
            assert_eq!(palette.color_of(part), part.def().color, "{part}");
        }
    }

    #[test]
    fn setting_a_slot_recolours_its_parts_only() {
        let mut palette = RigPalette::default();
        assert!(palette.set(ColorSlot::Accent, [200, 40, 40]));
        assert!(!palette.set(ColorSlot::Accent, [200, 40, 40]));
        assert_eq!(palette.color_of(BodyPart::LegRight), [200, 40, 40]);
        assert_eq!(palette.color_of(BodyPart::EarLeft), [200, 40, 40]);
        assert_eq!(palette.color_of(BodyPart::Head), FUR_WHITE);
    }

    #[test]
    fn channels_accept_both_ranges() {
        assert_eq!(rgb_from_channels([255.0, 128.0, 0.0]), Ok([255, 128, 0]));
        assert_eq!(rgb_from_channels([1.0, 0.5, 0.0]), Ok([255, 128, 0]));
        assert_eq!(rgb_from_channels([1.0, 1.0, 1.0]), Ok([1, 1, 1]));
        assert!(rgb_from_channels([300.0, 0.0, 0.0]).is_err());
        assert!(rgb_from_channels([-1.0, 0.0, 0.0]).is_err());
    }
}
