use glam::{EulerRot, Quat, Vec3};

use kinema_core::ParameterRegistry;

use crate::values::ParameterValues;

/// Consumer of final parameter values, called once per render frame.
///
/// Callers guarantee that every value handed over is finite. Missing keys are
/// allowed; the binding falls back to its own defaults.
pub trait RenderBinding {
    fn apply(&mut self, values: &ParameterValues);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Object property driven by a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation(Axis), // Maps to transform.position
    Rotation(Axis),    // Euler angle in degrees
    Scale,             // Uniform scale
    Opacity,           // Material opacity
}

/// Binding relationship: parameter `parameter` drives `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBinding {
    pub parameter: String,
    pub target: TargetPath,
    /// Used when the parameter is missing from a frame.
    pub default: f32,
}

/// Renderable state of a single object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: f32,
    pub opacity: f32,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_degrees: Vec3::ZERO,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

impl ObjectTransform {
    #[must_use]
    pub fn rotation(&self) -> Quat {
        let radians = self.rotation_degrees * (std::f32::consts::PI / 180.0);
        Quat::from_euler(EulerRot::XYZ, radians.x, radians.y, radians.z)
    }

    #[must_use]
    pub fn scale_vector(&self) -> Vec3 {
        Vec3::splat(self.scale)
    }

    /// Whether the material needs alpha blending.
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Writes parameter values onto an [`ObjectTransform`].
#[derive(Debug, Clone, Default)]
pub struct TransformBinding {
    bindings: Vec<PropertyBinding>,
    transform: ObjectTransform,
    frames_applied: u64,
}

impl TransformBinding {
    #[must_use]
    pub fn new(bindings: Vec<PropertyBinding>) -> Self {
        Self {
            bindings,
            transform: ObjectTransform::default(),
            frames_applied: 0,
        }
    }

    /// Binds the cube demo parameters, taking defaults from `registry`.
    #[must_use]
    pub fn cube(registry: &ParameterRegistry) -> Self {
        let table = [
            ("positionX", TargetPath::Translation(Axis::X)),
            ("positionY", TargetPath::Translation(Axis::Y)),
            ("positionZ", TargetPath::Translation(Axis::Z)),
            ("rotationX", TargetPath::Rotation(Axis::X)),
            ("rotationY", TargetPath::Rotation(Axis::Y)),
            ("rotationZ", TargetPath::Rotation(Axis::Z)),
            ("scale", TargetPath::Scale),
            ("opacity", TargetPath::Opacity),
        ];

        let bindings = table
            .into_iter()
            .filter_map(|(name, target)| {
                registry.get(name).map(|param| PropertyBinding {
                    parameter: name.to_string(),
                    target,
                    default: param.default,
                })
            })
            .collect();

        Self::new(bindings)
    }

    #[must_use]
    pub fn transform(&self) -> &ObjectTransform {
        &self.transform
    }

    #[must_use]
    pub fn frames_applied(&self) -> u64 {
        self.frames_applied
    }
}

fn set_axis(v: &mut Vec3, axis: Axis, value: f32) {
    match axis {
        Axis::X => v.x = value,
        Axis::Y => v.y = value,
        Axis::Z => v.z = value,
    }
}

impl RenderBinding for TransformBinding {
    fn apply(&mut self, values: &ParameterValues) {
        for binding in &self.bindings {
            let value = values
                .get(&binding.parameter)
                .copied()
                .filter(|v| v.is_finite())
                .unwrap_or(binding.default);

            match binding.target {
                TargetPath::Translation(axis) => set_axis(&mut self.transform.position, axis, value),
                TargetPath::Rotation(axis) => {
                    set_axis(&mut self.transform.rotation_degrees, axis, value);
                }
                TargetPath::Scale => self.transform.scale = value,
                TargetPath::Opacity => self.transform.opacity = value,
            }
        }
        self.frames_applied += 1;
    }
}
