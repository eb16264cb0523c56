use glam::{Affine2, Mat4, Vec2};

use crate::error::{KelpError, KelpResult};

/// Opaque texture handle handed across the boundary.
///
/// `TextureId::SCREEN` (zero) is never allocated. Used as a render target it
/// selects the swapchain image of the current frame.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    pub const SCREEN: TextureId = TextureId(0);

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_screen(self) -> bool {
        self.0 == 0
    }
}

/// Render position, scale, rotation and pivot of one quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Transform {
    pub render_x: f32,
    pub render_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation: f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        render_x: 0.0,
        render_y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        rotation: 0.0,
        origin_x: 0.0,
        origin_y: 0.0,
    };

    /// `T(render + origin) * R(rotation) * S(scale) * T(-origin)`
    pub fn to_affine(&self) -> Affine2 {
        let (sin, cos) = self.rotation.sin_cos();
        let a = cos * self.scale_x;
        let b = -sin * self.scale_y;
        let c = sin * self.scale_x;
        let d = cos * self.scale_y;
        let x = self.render_x + self.origin_x - a * self.origin_x - b * self.origin_y;
        let y = self.render_y + self.origin_y - c * self.origin_x - d * self.origin_y;
        Affine2::from_cols(Vec2::new(a, c), Vec2::new(b, d), Vec2::new(x, y))
    }
}

/// Per-sprite input as supplied by the host.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceData {
    pub color: [f32; 4],
    pub source: Transform,
    pub world0: Transform,
    pub world1: Transform,
}

impl Default for InstanceData {
    fn default() -> Self {
        Self {
            color: [1.0; 4],
            source: Transform::IDENTITY,
            world0: Transform::IDENTITY,
            world1: Transform::IDENTITY,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Alpha = 0,
    Additive = 1,
}

impl BlendMode {
    pub const ALL: [BlendMode; 2] = [BlendMode::Alpha, BlendMode::Additive];

    pub fn name(self) -> &'static str {
        match self {
            BlendMode::Alpha => "alpha",
            BlendMode::Additive => "additive",
        }
    }

    pub fn blend_state(self) -> wgpu::BlendState {
        match self {
            BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
            BlendMode::Additive => wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        }
    }
}

impl TryFrom<u8> for BlendMode {
    type Error = KelpError;

    fn try_from(value: u8) -> KelpResult<Self> {
        match value {
            0 => Ok(BlendMode::Alpha),
            1 => Ok(BlendMode::Additive),
            other => Err(KelpError::invalid_input(format!("unknown blend mode {other}"))),
        }
    }
}

/// Describes a contiguous run of instances drawn with one texture and state.
///
/// `smooth` and `blend_mode` stay raw bytes so that any value a host writes
/// is a valid Rust value; they are checked when the batch is resolved.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceBatch {
    pub texture: u64,
    pub smooth: u8,
    pub blend_mode: u8,
    pub instance_count: u32,
}

impl InstanceBatch {
    pub fn new(texture: TextureId, smooth: bool, blend_mode: BlendMode, instance_count: u32) -> Self {
        Self {
            texture: texture.raw(),
            smooth: smooth as u8,
            blend_mode: blend_mode as u8,
            instance_count,
        }
    }

    pub fn texture(&self) -> TextureId {
        TextureId::from_raw(self.texture)
    }

    pub fn is_smooth(&self) -> bool {
        self.smooth != 0
    }

    pub fn blend_mode(&self) -> KelpResult<BlendMode> {
        BlendMode::try_from(self.blend_mode)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
    pub scale: f32,
}

impl Camera {
    pub fn new(x: f32, y: f32, width: f32, height: f32, angle: f32, scale: f32) -> Self {
        Self { x, y, width, height, angle, scale }
    }

    pub fn validate(&self) -> KelpResult<()> {
        let fields = [self.x, self.y, self.width, self.height, self.angle, self.scale];
        if fields.iter().any(|f| !f.is_finite()) {
            return Err(KelpError::invalid_input("camera fields must be finite"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(KelpError::invalid_input(format!(
                "camera viewport {}x{} must be positive",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Projection times view. The camera position lands in the centre of the
    /// viewport and y grows downwards.
    pub fn to_mat4(&self) -> Mat4 {
        let (sin, cos) = self.angle.sin_cos();
        let cs = cos * self.scale;
        let ss = sin * self.scale;
        let x = 0.5 * self.width - cs * self.x + ss * self.y;
        let y = 0.5 * self.height - ss * self.x - cs * self.y;
        let view = Mat4::from_cols_array(&[
            cs, ss, 0.0, 0.0, //
            -ss, cs, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            x, y, 0.0, 1.0,
        ]);
        let projection = Mat4::orthographic_rh(0.0, self.width, self.height, 0.0, 0.0, 1.0);
        projection * view
    }

    /// The 2D part of [`Camera::to_mat4`]; exact because both factors are
    /// affine in x/y and leave w untouched.
    pub fn view_projection(&self) -> Affine2 {
        let m = self.to_mat4();
        Affine2::from_cols(
            Vec2::new(m.x_axis.x, m.x_axis.y),
            Vec2::new(m.y_axis.x, m.y_axis.y),
            Vec2::new(m.w_axis.x, m.w_axis.y),
        )
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct KelpColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl KelpColor {
    pub const BLACK: KelpColor = KelpColor { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl From<KelpColor> for wgpu::Color {
    fn from(c: KelpColor) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

/// Instance layout consumed by the sprite shader: tint plus two 2x3 affine
/// matrices mapping the unit quad to texture space and clip space.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuInstance {
    pub color: [f32; 4],
    pub uv_x: [f32; 2],
    pub uv_y: [f32; 2],
    pub uv_origin: [f32; 2],
    pub clip_x: [f32; 2],
    pub clip_y: [f32; 2],
    pub clip_origin: [f32; 2],
}

impl GpuInstance {
    pub fn pack(data: &InstanceData, view_projection: &Affine2) -> Self {
        let uv = data.source.to_affine();
        let world = data.world1.to_affine() * data.world0.to_affine();
        let clip = *view_projection * world;
        Self {
            color: data.color,
            uv_x: uv.matrix2.x_axis.to_array(),
            uv_y: uv.matrix2.y_axis.to_array(),
            uv_origin: uv.translation.to_array(),
            clip_x: clip.matrix2.x_axis.to_array(),
            clip_y: clip.matrix2.y_axis.to_array(),
            clip_origin: clip.translation.to_array(),
        }
    }

    /// Clip-space position of a unit-quad corner.
    pub fn clip_point(&self, corner: Vec2) -> Vec2 {
        Vec2::from(self.clip_x) * corner.x + Vec2::from(self.clip_y) * corner.y + Vec2::from(self.clip_origin)
    }

    pub fn uv_point(&self, corner: Vec2) -> Vec2 {
        Vec2::from(self.uv_x) * corner.x + Vec2::from(self.uv_y) * corner.y + Vec2::from(self.uv_origin)
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
            1 => Float32x4,
            2 => Float32x2,
            3 => Float32x2,
            4 => Float32x2,
            5 => Float32x2,
            6 => Float32x2,
            7 => Float32x2,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Corner of the unit quad, drawn as a four-vertex triangle strip.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub corner: [f32; 2],
}

impl QuadVertex {
    pub const UNIT_QUAD: [QuadVertex; 4] = [
        QuadVertex { corner: [0.0, 0.0] },
        QuadVertex { corner: [1.0, 0.0] },
        QuadVertex { corner: [0.0, 1.0] },
        QuadVertex { corner: [1.0, 1.0] },
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn identity_transform_is_identity_affine() {
        assert_eq!(Transform::IDENTITY.to_affine(), Affine2::IDENTITY);
    }

    #[test]
    fn rotation_pivots_around_origin() {
        let t = Transform {
            rotation: PI,
            origin_x: 1.0,
            origin_y: 1.0,
            ..Transform::IDENTITY
        };
        let m = t.to_affine();
        assert!(approx(m.transform_point2(Vec2::new(1.0, 1.0)), Vec2::new(1.0, 1.0)));
        assert!(approx(m.transform_point2(Vec2::ZERO), Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn scale_then_translate() {
        let t = Transform {
            render_x: 10.0,
            render_y: 20.0,
            scale_x: 32.0,
            scale_y: 16.0,
            ..Transform::IDENTITY
        };
        let m = t.to_affine();
        assert!(approx(m.transform_point2(Vec2::ONE), Vec2::new(42.0, 36.0)));
    }

    #[test]
    fn camera_centres_its_position() {
        let camera = Camera::new(0.0, 0.0, 800.0, 600.0, 0.0, 1.0);
        let vp = camera.view_projection();
        assert!(approx(vp.transform_point2(Vec2::ZERO), Vec2::ZERO));
        // y points down on screen, up in clip space
        assert!(approx(vp.transform_point2(Vec2::new(400.0, 300.0)), Vec2::new(1.0, -1.0)));
        assert!(approx(vp.transform_point2(Vec2::new(-400.0, -300.0)), Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn camera_zoom_and_rotation() {
        let camera = Camera::new(100.0, 50.0, 200.0, 200.0, FRAC_PI_2, 2.0);
        let vp = camera.view_projection();
        assert!(approx(vp.transform_point2(Vec2::new(100.0, 50.0)), Vec2::ZERO));
        // world +x maps to screen +y after a quarter turn
        let p = vp.transform_point2(Vec2::new(150.0, 50.0));
        assert!(approx(p, Vec2::new(0.0, -1.0)), "{p:?}");
    }

    #[test]
    fn affine_camera_matches_full_matrix() {
        let camera = Camera::new(-12.5, 40.0, 1280.0, 720.0, 0.3, 1.5);
        let m = camera.to_mat4();
        let vp = camera.view_projection();
        let p = Vec2::new(33.0, -7.0);
        let full = m.transform_point3(p.extend(0.0));
        assert!(approx(vp.transform_point2(p), Vec2::new(full.x, full.y)));
    }

    #[test]
    fn camera_rejects_degenerate_viewport() {
        assert!(Camera::new(0.0, 0.0, 0.0, 600.0, 0.0, 1.0).validate().is_err());
        assert!(Camera::new(0.0, 0.0, 800.0, 600.0, f32::NAN, 1.0).validate().is_err());
        assert!(Camera::new(0.0, 0.0, 800.0, 600.0, 0.0, 1.0).validate().is_ok());
    }

    #[test]
    fn world1_is_applied_after_world0() {
        let data = InstanceData {
            world0: Transform { scale_x: 2.0, scale_y: 2.0, ..Transform::IDENTITY },
            world1: Transform { render_x: 5.0, ..Transform::IDENTITY },
            ..InstanceData::default()
        };
        let gpu = GpuInstance::pack(&data, &Affine2::IDENTITY);
        assert!(approx(gpu.clip_point(Vec2::ONE), Vec2::new(7.0, 2.0)));
        assert!(approx(gpu.uv_point(Vec2::ONE), Vec2::ONE));
    }

    #[test]
    fn batch_fields_decode() {
        let batch = InstanceBatch::new(TextureId::from_raw(7), true, BlendMode::Additive, 3);
        assert!(batch.is_smooth());
        assert_eq!(batch.blend_mode().unwrap(), BlendMode::Additive);
        let bad = InstanceBatch { blend_mode: 9, ..batch };
        assert!(matches!(bad.blend_mode(), Err(KelpError::InvalidInput(_))));
    }

    #[test]
    fn abi_sizes() {
        assert_eq!(std::mem::size_of::<Transform>(), 28);
        assert_eq!(std::mem::size_of::<InstanceData>(), 100);
        assert_eq!(std::mem::size_of::<InstanceBatch>(), 16);
        assert_eq!(std::mem::size_of::<Camera>(), 24);
        assert_eq!(std::mem::size_of::<GpuInstance>(), 64);
    }
}
