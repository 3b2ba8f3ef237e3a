//! Discrete events pushed into the companion by external collaborators.
//!
//! Events arrive either directly through `Companion::apply_event` or from any
//! thread through an [`EventSender`](crate::resources::eventinbox::EventSender);
//! queued events are drained at the start of each tick. Each event resolves to
//! an animation trigger plus side effects (mood, knockback, walking, scene
//! items, colours).

use glam::Vec3;
use std::str::FromStr;

use crate::components::mood::Mood;
use crate::components::palette::{ColorSlot, rgb_from_channels};
use crate::components::sceneitem::ItemKind;

/// Default drop height of a new item above the floor, pixels.
pub const ITEM_DROP_HEIGHT: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompanionEvent {
    Feed,
    Pet,
    /// `source` is the world position the hit came from; knockback pushes away
    /// from it horizontally.
    Damage { amount: f32, source: Option<Vec3> },
    Heal { amount: f32 },
    SetMood(Mood),
    AchievementUnlocked,
    /// `height_ratio` 0 = feet, 1 = top of the head; `intensity` in [0, 1].
    Collision { height_ratio: f32, intensity: f32 },
    WalkTo { x: f32, z: f32 },
    PlaceAt { position: Vec3 },
    FocusLost,
    FocusGained,
    /// Drop an item at `x`, `height` pixels above the floor.
    AddItem { kind: ItemKind, x: f32, height: f32 },
    /// Walk up to an item; `ItemReached` is reported on arrival.
    WalkToItem { id: u32 },
    /// Eat food, kick toys.
    InteractItem { id: u32 },
    RemoveItem { id: u32 },
    ClearItems,
    SetColor { slot: ColorSlot, rgb: [u8; 3] },
}

impl CompanionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CompanionEvent::Feed => "feed",
            CompanionEvent::Pet => "pet",
            CompanionEvent::Damage { .. } => "damage",
            CompanionEvent::Heal { .. } => "heal",
            CompanionEvent::SetMood(_) => "mood",
            CompanionEvent::AchievementUnlocked => "achievement",
            CompanionEvent::Collision { .. } => "collision",
            CompanionEvent::WalkTo { .. } => "walk",
            CompanionEvent::PlaceAt { .. } => "place",
            CompanionEvent::FocusLost => "focus_lost",
            CompanionEvent::FocusGained => "focus_gained",
            CompanionEvent::AddItem { .. } => "item",
            CompanionEvent::WalkToItem { .. } => "walk_item",
            CompanionEvent::InteractItem { .. } => "interact",
            CompanionEvent::RemoveItem { .. } => "remove_item",
            CompanionEvent::ClearItems => "clear_items",
            CompanionEvent::SetColor { .. } => "color",
        }
    }
}

fn parse_floats(args: &str) -> Result<Vec<f32>, String> {
    args.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<f32>()
                .map_err(|e| format!("bad number '{}': {}", s.trim(), e))
        })
        .collect()
}

fn parse_id(args: &str) -> Result<u32, String> {
    args.trim()
        .parse::<u32>()
        .map_err(|e| format!("bad item id '{}': {}", args.trim(), e))
}

impl FromStr for CompanionEvent {
    type Err = String;

    /// Command-line form: `name` or `name:arg[,arg...]`, e.g. `damage:20,100`,
    /// `walk:300`, `place:120,200`, `mood:sleepy`, `item:pizza,120`,
    /// `interact:0`, `color:accent,200,40,40`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = s.split_once(':').unwrap_or((s, ""));
        let name = name.trim().to_ascii_lowercase();
        let event = match name.as_str() {
            "feed" => CompanionEvent::Feed,
            "pet" => CompanionEvent::Pet,
            "achievement" | "achievement_unlocked" => CompanionEvent::AchievementUnlocked,
            "focus_lost" => CompanionEvent::FocusLost,
            "focus_gained" => CompanionEvent::FocusGained,
            "mood" => CompanionEvent::SetMood(args.parse()?),
            "damage" => match parse_floats(args)?.as_slice() {
                [amount] => CompanionEvent::Damage { amount: *amount, source: None },
                [amount, x] => CompanionEvent::Damage {
                    amount: *amount,
                    source: Some(Vec3::new(*x, 0.0, 0.0)),
                },
                _ => return Err("damage expects 'damage:amount[,source_x]'".to_string()),
            },
            "heal" => match parse_floats(args)?.as_slice() {
                [] => CompanionEvent::Heal { amount: 0.0 },
                [amount] => CompanionEvent::Heal { amount: *amount },
                _ => return Err("heal expects 'heal[:amount]'".to_string()),
            },
            "collision" => match parse_floats(args)?.as_slice() {
                [height_ratio, intensity] => CompanionEvent::Collision {
                    height_ratio: *height_ratio,
                    intensity: *intensity,
                },
                _ => return Err("collision expects 'collision:height_ratio,intensity'".to_string()),
            },
            "walk" | "walk_to" => match parse_floats(args)?.as_slice() {
                [x] => CompanionEvent::WalkTo { x: *x, z: 0.0 },
                [x, z] => CompanionEvent::WalkTo { x: *x, z: *z },
                _ => return Err("walk expects 'walk:x[,z]'".to_string()),
            },
            "place" | "place_at" => match parse_floats(args)?.as_slice() {
                [x, y] => CompanionEvent::PlaceAt {
                    position: Vec3::new(*x, *y, 0.0),
                },
                [x, y, z] => CompanionEvent::PlaceAt {
                    position: Vec3::new(*x, *y, *z),
                },
                _ => return Err("place expects 'place:x,y[,z]'".to_string()),
            },
            "item" | "add_item" => {
                let (kind, rest) = args.split_once(',').unwrap_or((args, ""));
                let kind: ItemKind = kind.parse()?;
                match parse_floats(rest)?.as_slice() {
                    [x] => CompanionEvent::AddItem {
                        kind,
                        x: *x,
                        height: ITEM_DROP_HEIGHT,
                    },
                    [x, height] => CompanionEvent::AddItem {
                        kind,
                        x: *x,
                        height: *height,
                    },
                    _ => return Err("item expects 'item:kind,x[,height]'".to_string()),
                }
            }
            "walk_item" | "walk_to_item" => CompanionEvent::WalkToItem { id: parse_id(args)? },
            "interact" | "interact_item" => CompanionEvent::InteractItem { id: parse_id(args)? },
            "remove_item" => CompanionEvent::RemoveItem { id: parse_id(args)? },
            "clear_items" => CompanionEvent::ClearItems,
            "color" | "colour" => {
                let (slot, rest) = args.split_once(',').unwrap_or((args, ""));
                let slot: ColorSlot = slot.parse()?;
                match parse_floats(rest)?.as_slice() {
                    [r, g, b] => CompanionEvent::SetColor {
                        slot,
                        rgb: rgb_from_channels([*r, *g, *b])?,
                    },
                    _ => return Err("color expects 'color:slot,r,g,b'".to_string()),
                }
            }
            other => return Err(format!("unknown event '{}'", other)),
        };
        Ok(event)
    }
}
