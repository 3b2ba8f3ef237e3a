//! Props dropped into the companion's scene.
//!
//! An item is its own entity: a [`SceneItem`] tag with a
//! [`PhysicsBody`](super::physicsbody::PhysicsBody) that falls and bounces
//! under the same integrator as the companion. Food is eaten and disappears
//! shortly after; toys get kicked around.
//!
//! Item positions follow the companion's convention: world pixels, y up,
//! `position.y` at the bottom of the item.

use bevy_ecs::prelude::Component;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Radius of the sphere an item is drawn as, pixels.
pub const ITEM_RADIUS: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemCategory {
    Food,
    Toy,
}

/// The closed item catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemKind {
    Pizza,
    Apple,
    Banana,
    Grapes,
    Carrot,
    Burger,
    Cake,
    TennisBall,
    Basketball,
    SoccerBall,
}

impl ItemKind {
    pub const ALL: [ItemKind; 10] = [
        ItemKind::Pizza,
        ItemKind::Apple,
        ItemKind::Banana,
        ItemKind::Grapes,
        ItemKind::Carrot,
        ItemKind::Burger,
        ItemKind::Cake,
        ItemKind::TennisBall,
        ItemKind::Basketball,
        ItemKind::SoccerBall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ItemKind::Pizza => "pizza",
            ItemKind::Apple => "apple",
            ItemKind::Banana => "banana",
            ItemKind::Grapes => "grapes",
            ItemKind::Carrot => "carrot",
            ItemKind::Burger => "burger",
            ItemKind::Cake => "cake",
            ItemKind::TennisBall => "tennis_ball",
            ItemKind::Basketball => "basketball",
            ItemKind::SoccerBall => "soccer_ball",
        }
    }

    pub fn emoji(self) -> char {
        match self {
            ItemKind::Pizza => '🍕',
            ItemKind::Apple => '🍎',
            ItemKind::Banana => '🍌',
            ItemKind::Grapes => '🍇',
            ItemKind::Carrot => '🥕',
            ItemKind::Burger => '🍔',
            ItemKind::Cake => '🍰',
            ItemKind::TennisBall => '🎾',
            ItemKind::Basketball => '🏀',
            ItemKind::SoccerBall => '⚽',
        }
    }

    pub fn from_emoji(emoji: char) -> Option<Self> {
        ItemKind::ALL.into_iter().find(|kind| kind.emoji() == emoji)
    }

    pub fn category(self) -> ItemCategory {
        match self {
            ItemKind::TennisBall | ItemKind::Basketball | ItemKind::SoccerBall => ItemCategory::Toy,
            _ => ItemCategory::Food,
        }
    }

    pub fn is_food(self) -> bool {
        self.category() == ItemCategory::Food
    }

    /// Display colour, sRGB.
    pub fn color(self) -> [u8; 3] {
        match self {
            ItemKind::Pizza | ItemKind::Basketball | ItemKind::Carrot => [255, 128, 0],
            ItemKind::Apple => [255, 0, 0],
            ItemKind::Banana => [255, 255, 0],
            ItemKind::Grapes => [128, 0, 128],
            ItemKind::Burger => [204, 128, 51],
            ItemKind::Cake => [255, 204, 230],
            ItemKind::TennisBall => [204, 255, 0],
            ItemKind::SoccerBall => [255, 255, 255],
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    /// Accepts the catalogue name (`tennis_ball`, `tennis-ball`) or the emoji.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(kind) = ItemKind::from_emoji(c) {
                return Ok(kind);
            }
        }
        let key = trimmed.to_ascii_lowercase().replace(['-', ' '], "_");
        ItemKind::ALL
            .into_iter()
            .find(|kind| kind.name() == key || kind.name().replace('_', "") == key)
            .ok_or_else(|| format!("unknown item '{}'", s))
    }
}

/// Marks an item entity.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct SceneItem {
    pub id: u32,
    pub kind: ItemKind,
}

/// Food being eaten; the item is removed when the timer runs out.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Consumed {
    pub remaining: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_lookup_matches_catalogue() {
        for kind in ItemKind::ALL {
            assert_eq!(ItemKind::from_emoji(kind.emoji()), Some(kind));
        }
        assert_eq!(ItemKind::from_emoji('🚀'), None);
    }

    #[test]
    fn balls_are_toys_and_the_rest_is_food() {
        assert_eq!(ItemKind::SoccerBall.category(), ItemCategory::Toy);
        assert_eq!(ItemKind::TennisBall.category(), ItemCategory::Toy);
        assert!(ItemKind::Pizza.is_food());
        assert!(ItemKind::Cake.is_food());
    }

    #[test]
    fn parse_accepts_names_and_emoji() {
        assert_eq!("🎾".parse::<ItemKind>(), Ok(ItemKind::TennisBall));
        assert_eq!("Tennis-Ball".parse::<ItemKind>(), Ok(ItemKind::TennisBall));
        assert_eq!("soccerball".parse::<ItemKind>(), Ok(ItemKind::SoccerBall));
        assert_eq!(" pizza ".parse::<ItemKind>(), Ok(ItemKind::Pizza));
        assert!("sandwich".parse::<ItemKind>().is_err());
    }
}
