use bevy_ecs::prelude::Resource;
use fastrand::Rng;

/// Random source for mood drift and wandering. Seedable for reproducible runs.
#[derive(Resource, Debug, Clone)]
pub struct CompanionRng(pub Rng);

impl CompanionRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(Rng::with_seed(seed)),
            None => Self(Rng::new()),
        }
    }

    /// Uniform value in `[min, max)`.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.0.f32() * (max - min)
    }
}

impl Default for CompanionRng {
    fn default() -> Self {
        Self::new(None)
    }
}
