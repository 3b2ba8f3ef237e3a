//! Directional key light plus ambient term.

use glam::Vec3;

use super::RenderError;

/// Light setup as configured by the host.
///
/// `direction` points from the light into the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.35, -1.0, -0.55),
            color: [1.0, 0.97, 0.92],
            intensity: 0.8,
            ambient: 0.32,
        }
    }
}

impl DirectionalLight {
    /// Check the setup and normalise it for shading.
    pub fn validated(&self) -> Result<Lighting, RenderError> {
        if !self.direction.is_finite() || self.direction.length_squared() <= 1e-8 {
            return Err(RenderError::DegenerateLight(format!(
                "direction {:?}",
                self.direction
            )));
        }
        let scalars_ok = [self.intensity, self.ambient]
            .into_iter()
            .chain(self.color)
            .all(|v| v.is_finite() && v >= 0.0);
        if !scalars_ok {
            return Err(RenderError::DegenerateLight(
                "negative or non-finite intensity".to_string(),
            ));
        }
        Ok(Lighting {
            to_light: -self.direction.normalize(),
            color: self.color,
            intensity: self.intensity,
            ambient: self.ambient,
        })
    }
}

/// Validated light, ready for shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Unit vector from a surface toward the light.
    pub to_light: Vec3,
    pub color: [f32; 3],
    pub intensity: f32,
    pub ambient: f32,
}

impl Lighting {
    /// Lambert diffuse, scaled by shadow `visibility`, plus ambient.
    pub fn shade(&self, base: [u8; 3], normal: Vec3, visibility: f32) -> [u8; 3] {
        let diffuse = normal.dot(self.to_light).max(0.0) * self.intensity * visibility.clamp(0.0, 1.0);
        let factor = self.ambient + diffuse;
        let mut out = [0u8; 3];
        for (i, channel) in out.iter_mut().enumerate() {
            *channel = (base[i] as f32 * self.color[i] * factor).round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_direction_is_rejected() {
        let light = DirectionalLight {
            direction: Vec3::ZERO,
            ..Default::default()
        };
        assert!(matches!(light.validated(), Err(RenderError::DegenerateLight(_))));
        let light = DirectionalLight {
            intensity: f32::NAN,
            ..Default::default()
        };
        assert!(light.validated().is_err());
    }

    #[test]
    fn faces_toward_light_are_brighter() {
        let lighting = DirectionalLight::default().validated().unwrap();
        let base = [200, 200, 200];
        let lit = lighting.shade(base, lighting.to_light, 1.0);
        let away = lighting.shade(base, -lighting.to_light, 1.0);
        let shadowed = lighting.shade(base, lighting.to_light, 0.0);
        assert!(lit[0] > away[0]);
        assert_eq!(away, shadowed);
    }
}
