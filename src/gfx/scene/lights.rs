//! Dynamic scene lights
//!
//! A flat, bounded list of directional, point and spot lights. Lights are not
//! part of the undo history.

use cgmath::{InnerSpace, Vector3};

pub const MAX_LIGHTS: usize = 10;

/// Point and spot light distance falloff: constant, linear, quadratic
pub const POINT_ATTENUATION: (f32, f32, f32) = (1.0, 0.09, 0.032);

/// Spot cone half-angles in degrees, inner then outer
pub const SPOT_CONE_DEGREES: (f32, f32) = (12.5, 15.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    Directional,
    Point,
    Spot,
}

impl LightType {
    pub const ALL: [LightType; 3] = [LightType::Directional, LightType::Point, LightType::Spot];

    pub fn tag(self) -> &'static str {
        match self {
            LightType::Directional => "directional",
            LightType::Point => "point",
            LightType::Spot => "spot",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tag() == tag)
    }

    pub fn label(self) -> &'static str {
        match self {
            LightType::Directional => "Directional",
            LightType::Point => "Point",
            LightType::Spot => "Spot",
        }
    }

    fn shader_code(self) -> u32 {
        match self {
            LightType::Directional => 0,
            LightType::Point => 1,
            LightType::Spot => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub color: Vector3<f32>,
    pub intensity: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    /// Cosine of the inner cone angle
    pub cut_off: f32,
    /// Cosine of the outer cone angle
    pub outer_cut_off: f32,
}

impl Default for Light {
    fn default() -> Self {
        create_light(
            Vector3::new(0.0, 5.0, 0.0),
            Vector3::new(-0.3, -1.0, -0.4),
            Vector3::new(1.0, 1.0, 1.0),
            1.0,
            LightType::Directional,
        )
    }
}

/// Builds a light with the standard parameters for its type
///
/// The direction is normalized; a zero direction points straight down.
pub fn create_light(
    position: Vector3<f32>,
    direction: Vector3<f32>,
    color: Vector3<f32>,
    intensity: f32,
    light_type: LightType,
) -> Light {
    let length2 = direction.magnitude2();
    let direction = if length2 <= f32::EPSILON {
        -Vector3::unit_y()
    } else if (length2 - 1.0).abs() <= 1e-6 {
        direction
    } else {
        direction.normalize()
    };

    let (constant, linear, quadratic) = match light_type {
        LightType::Directional => (1.0, 0.0, 0.0),
        LightType::Point | LightType::Spot => POINT_ATTENUATION,
    };

    let (cut_off, outer_cut_off) = match light_type {
        LightType::Spot => (
            SPOT_CONE_DEGREES.0.to_radians().cos(),
            SPOT_CONE_DEGREES.1.to_radians().cos(),
        ),
        _ => (0.0, 0.0),
    };

    Light {
        light_type,
        position,
        direction,
        color,
        intensity,
        constant,
        linear,
        quadratic,
        cut_off,
        outer_cut_off,
    }
}

/// GPU layout of one light, 64 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub kind: u32,
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub cut_off: f32,
    pub outer_cut_off: f32,
}

impl From<&Light> for LightUniform {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.into(),
            kind: light.light_type.shader_code(),
            direction: light.direction.into(),
            intensity: light.intensity,
            color: light.color.into(),
            constant: light.constant,
            linear: light.linear,
            quadratic: light.quadratic,
            cut_off: light.cut_off,
            outer_cut_off: light.outer_cut_off,
        }
    }
}

pub struct LightSystem {
    lights: Vec<Light>,
    capacity: usize,
}

impl Default for LightSystem {
    fn default() -> Self {
        Self::new(MAX_LIGHTS)
    }
}

impl LightSystem {
    /// Creates an empty light list; capacity never exceeds [`MAX_LIGHTS`]
    pub fn new(capacity: usize) -> Self {
        Self {
            lights: Vec::new(),
            capacity: capacity.min(MAX_LIGHTS),
        }
    }

    /// The light set of a fresh project: one white directional light
    pub fn with_defaults(capacity: usize) -> Self {
        let mut system = Self::new(capacity);
        system.reset_to_defaults();
        system
    }

    pub fn reset_to_defaults(&mut self) {
        self.lights.clear();
        self.add_light(Light::default());
    }

    /// Appends a light; returns its index, or `None` at capacity
    pub fn add_light(&mut self, light: Light) -> Option<usize> {
        if self.lights.len() >= self.capacity {
            log::warn!(
                "Light limit of {} reached, {} light not added",
                self.capacity,
                light.light_type.label()
            );
            return None;
        }

        self.lights.push(light);
        Some(self.lights.len() - 1)
    }

    pub fn update_light(&mut self, index: usize, light: Light) -> bool {
        match self.lights.get_mut(index) {
            Some(slot) => {
                *slot = light;
                true
            }
            None => {
                log::warn!("No light at index {}", index);
                false
            }
        }
    }

    /// Removes the light at `index`, shifting later lights down
    pub fn remove_light(&mut self, index: usize) -> Option<Light> {
        if index >= self.lights.len() {
            log::warn!("No light at index {}", index);
            return None;
        }
        Some(self.lights.remove(index))
    }

    pub fn clear(&mut self) {
        self.lights.clear();
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fixed-size array for the global uniform plus the live count
    pub fn to_uniforms(&self) -> ([LightUniform; MAX_LIGHTS], u32) {
        let mut uniforms = [LightUniform::default(); MAX_LIGHTS];
        for (slot, light) in uniforms.iter_mut().zip(&self.lights) {
            *slot = light.into();
        }
        (uniforms, self.lights.len() as u32)
    }
}

/// White, unit-intensity light of the given type
pub fn white_light(light_type: LightType, position: Vector3<f32>, direction: Vector3<f32>) -> Light {
    create_light(position, direction, Vector3::new(1.0, 1.0, 1.0), 1.0, light_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Zero;

    #[test]
    fn test_create_light_parameters() {
        let point = create_light(
            Vector3::zero(),
            Vector3::new(0.0, 0.0, -3.0),
            Vector3::new(1.0, 1.0, 1.0),
            2.0,
            LightType::Point,
        );
        assert_relative_eq!(point.direction.magnitude(), 1.0, epsilon = 1e-6);
        assert_eq!(
            (point.constant, point.linear, point.quadratic),
            POINT_ATTENUATION
        );

        let spot = create_light(
            Vector3::zero(),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            1.0,
            LightType::Spot,
        );
        assert_relative_eq!(spot.cut_off, 12.5f32.to_radians().cos(), epsilon = 1e-6);
        assert_relative_eq!(spot.outer_cut_off, 15f32.to_radians().cos(), epsilon = 1e-6);
        assert!(spot.cut_off > spot.outer_cut_off);
    }

    #[test]
    fn test_zero_direction_points_down() {
        let light = create_light(
            Vector3::zero(),
            Vector3::zero(),
            Vector3::new(1.0, 1.0, 1.0),
            1.0,
            LightType::Directional,
        );
        assert_eq!(light.direction, Vector3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_capacity_and_compaction() {
        let mut lights = LightSystem::default();
        for i in 0..MAX_LIGHTS {
            let mut light = Light::default();
            light.intensity = i as f32;
            assert_eq!(lights.add_light(light), Some(i));
        }
        assert!(lights.add_light(Light::default()).is_none());
        assert_eq!(lights.len(), MAX_LIGHTS);

        let removed = lights.remove_light(2).unwrap();
        assert_eq!(removed.intensity, 2.0);
        assert_eq!(lights.get(2).unwrap().intensity, 3.0);
        assert!(lights.remove_light(42).is_none());
    }

    #[test]
    fn test_update_light() {
        let mut lights = LightSystem::with_defaults(MAX_LIGHTS);
        let mut light = *lights.get(0).unwrap();
        light.color = Vector3::new(1.0, 0.0, 0.0);
        assert!(lights.update_light(0, light));
        assert_eq!(lights.get(0).unwrap().color.y, 0.0);
        assert!(!lights.update_light(5, light));
    }

    #[test]
    fn test_uniform_packing() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 64);
        let lights = LightSystem::with_defaults(MAX_LIGHTS);
        let (uniforms, count) = lights.to_uniforms();
        assert_eq!(count, 1);
        assert_eq!(uniforms[0].kind, 0);
        assert_eq!(uniforms[1].intensity, 0.0);
    }
}
