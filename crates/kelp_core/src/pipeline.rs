use std::collections::HashMap;

use crate::error::{KelpError, KelpResult};
use crate::types::{BlendMode, GpuInstance, QuadVertex};

/// Sprite pipelines, one per blend mode and target format. Built lazily the
/// first time a combination is drawn.
pub struct PipelineCache {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    pipelines: HashMap<(BlendMode, wgpu::TextureFormat), wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device, texture_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sprite_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sprite_pipeline_layout"),
            bind_group_layouts: &[texture_layout],
            push_constant_ranges: &[],
        });
        Self {
            shader,
            layout,
            pipelines: HashMap::new(),
        }
    }

    pub fn prepare(&mut self, device: &wgpu::Device, blend_mode: BlendMode, format: wgpu::TextureFormat) {
        if self.pipelines.contains_key(&(blend_mode, format)) {
            return;
        }
        tracing::debug!("building {} pipeline for {:?}", blend_mode.name(), format);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sprite_pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[QuadVertex::desc(), GpuInstance::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend_mode.blend_state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });
        self.pipelines.insert((blend_mode, format), pipeline);
    }

    pub fn get(&self, blend_mode: BlendMode, format: wgpu::TextureFormat) -> KelpResult<&wgpu::RenderPipeline> {
        self.pipelines
            .get(&(blend_mode, format))
            .ok_or(KelpError::InvalidPipelineId(blend_mode.name()))
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
