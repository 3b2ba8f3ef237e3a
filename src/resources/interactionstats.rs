use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::components::bodypart::BodyPart;

/// Running interaction counters, exposed through the snapshot.
#[derive(Resource, Debug, Clone, Default, Serialize)]
pub struct InteractionStats {
    pub clicks: u32,
    pub pets: u32,
    pub pokes: u32,
    pub feeds: u32,
    /// Toys kicked.
    pub kicks: u32,
    pub throws: u32,
    pub drags: u32,
    /// Clicks in the current streak; resets after a pause.
    pub click_streak: u32,
    #[serde(skip)]
    pub last_click_time: Option<f32>,
    /// Pointer-downs per grabbed part.
    pub grabs: FxHashMap<BodyPart, u32>,
}

impl InteractionStats {
    /// Count a click at `time`, restarting the streak after `streak_gap` seconds
    /// of silence. Returns the new streak length.
    pub fn record_click(&mut self, time: f32, streak_gap: f32) -> u32 {
        self.clicks += 1;
        let continues = self
            .last_click_time
            .is_some_and(|last| time - last <= streak_gap);
        self.click_streak = if continues { self.click_streak + 1 } else { 1 };
        self.last_click_time = Some(time);
        self.click_streak
    }

    pub fn record_grab(&mut self, part: BodyPart) {
        *self.grabs.entry(part).or_insert(0) += 1;
    }

    pub fn grabs_of(&self, part: BodyPart) -> u32 {
        self.grabs.get(&part).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streak_resets_after_gap() {
        let mut stats = InteractionStats::default();
        assert_eq!(stats.record_click(0.0, 2.0), 1);
        assert_eq!(stats.record_click(1.0, 2.0), 2);
        assert_eq!(stats.record_click(5.0, 2.0), 1);
        assert_eq!(stats.clicks, 3);
    }

    #[test]
    fn grabs_are_counted_per_part() {
        let mut stats = InteractionStats::default();
        stats.record_grab(BodyPart::Head);
        stats.record_grab(BodyPart::Head);
        assert_eq!(stats.grabs_of(BodyPart::Head), 2);
        assert_eq!(stats.grabs_of(BodyPart::LegLeft), 0);
    }
}
