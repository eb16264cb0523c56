use image::{Rgba, RgbaImage};
use kelp_core::{BlendMode, InstanceBatch, InstanceData, TextureId, Transform};

pub const SPRITE_SIZE: f32 = 48.0;

/// Two-colour checkerboard used as the demo sprite.
pub fn checkerboard(size: u32, cell: u32) -> RgbaImage {
    let cell = cell.max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgba([240, 240, 240, 255])
        } else {
            Rgba([40, 110, 200, 255])
        }
    })
}

struct Sprite {
    position: [f32; 2],
    velocity: [f32; 2],
    angle: f32,
    spin: f32,
    color: [f32; 4],
}

/// Sprites bouncing around a world centred on the origin.
pub struct Scene {
    sprites: Vec<Sprite>,
    half_extent: [f32; 2],
}

impl Scene {
    pub fn new(count: usize, width: f32, height: f32) -> Self {
        // small LCG keeps the layout identical from run to run
        let mut seed = 0x2545_f491_u32;
        let mut next = move || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as f32 / (1u32 << 24) as f32
        };
        let half_extent = [width * 0.5, height * 0.5];
        let sprites = (0..count)
            .map(|_| Sprite {
                position: [(next() - 0.5) * width, (next() - 0.5) * height],
                velocity: [(next() - 0.5) * 240.0, (next() - 0.5) * 240.0],
                angle: next() * std::f32::consts::TAU,
                spin: (next() - 0.5) * 4.0,
                color: [0.5 + next() * 0.5, 0.5 + next() * 0.5, 0.5 + next() * 0.5, 1.0],
            })
            .collect();
        Self { sprites, half_extent }
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.half_extent = [width * 0.5, height * 0.5];
    }

    pub fn update(&mut self, dt: f32) {
        for sprite in &mut self.sprites {
            for axis in 0..2 {
                sprite.position[axis] += sprite.velocity[axis] * dt;
                let limit = self.half_extent[axis];
                if sprite.position[axis].abs() > limit {
                    sprite.position[axis] = sprite.position[axis].clamp(-limit, limit);
                    sprite.velocity[axis] = -sprite.velocity[axis];
                }
            }
            sprite.angle = (sprite.angle + sprite.spin * dt) % std::f32::consts::TAU;
        }
    }

    /// Fills `out` with one instance per sprite; the first half is drawn
    /// with alpha blending and the rest additively.
    pub fn build(&self, texture: TextureId, out: &mut Vec<InstanceData>, batches: &mut Vec<InstanceBatch>) {
        out.clear();
        batches.clear();
        let half = SPRITE_SIZE * 0.5;
        out.extend(self.sprites.iter().map(|sprite| InstanceData {
            color: sprite.color,
            source: Transform::IDENTITY,
            world0: Transform {
                render_x: sprite.position[0] - half,
                render_y: sprite.position[1] - half,
                scale_x: SPRITE_SIZE,
                scale_y: SPRITE_SIZE,
                rotation: sprite.angle,
                origin_x: half,
                origin_y: half,
            },
            world1: Transform::IDENTITY,
        }));
        let alpha = (self.sprites.len() / 2) as u32;
        let additive = self.sprites.len() as u32 - alpha;
        batches.push(InstanceBatch::new(texture, false, BlendMode::Alpha, alpha));
        batches.push(InstanceBatch::new(texture, true, BlendMode::Additive, additive));
    }
}
