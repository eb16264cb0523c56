use std::ops::Range;

use crate::error::{KelpError, KelpResult};
use crate::resources::ResourceTable;
use crate::types::{BlendMode, Camera, GpuInstance, InstanceBatch, InstanceData, KelpColor, TextureId};

/// One instanced draw of the unit quad.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture: TextureId,
    pub smooth: bool,
    pub blend_mode: BlendMode,
    pub instances: Range<u32>,
}

/// Backend-neutral result of one `render_list` call: where to draw, whether
/// to clear first, and the packed instances with the draws that consume them
/// in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderList {
    pub target: TextureId,
    pub clear: Option<KelpColor>,
    pub instances: Vec<GpuInstance>,
    pub draws: Vec<DrawCall>,
}

impl RenderList {
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    /// Number of times a pipeline has to be bound to encode the draws.
    pub fn pipeline_switches(&self) -> u32 {
        let mut switches = 0;
        let mut bound = None;
        for draw in &self.draws {
            if bound != Some(draw.blend_mode) {
                bound = Some(draw.blend_mode);
                switches += 1;
            }
        }
        switches
    }
}

/// Validates a host submission against the resource table and packs it.
///
/// Nothing is returned unless every batch resolves, so a failing call never
/// reaches the GPU. The returned list has no clear color; the frame decides
/// whether this call clears.
pub fn prepare_render_list<T>(
    textures: &ResourceTable<T>,
    target: TextureId,
    camera: &Camera,
    instances: &[InstanceData],
    batches: &[InstanceBatch],
) -> KelpResult<RenderList> {
    if !target.is_screen() {
        textures.get(target)?;
    }

    let total: u64 = batches.iter().map(|b| b.instance_count as u64).sum();
    if total != instances.len() as u64 {
        return Err(KelpError::invalid_input(format!(
            "batches cover {} instances but {} were supplied",
            total,
            instances.len()
        )));
    }
    if total > u32::MAX as u64 {
        return Err(KelpError::invalid_input(format!("{total} instances in one call")));
    }

    camera.validate()?;

    let mut draws = Vec::with_capacity(batches.len());
    let mut cursor = 0u32;
    for batch in batches {
        let texture = batch.texture();
        textures.get(texture)?;
        if !target.is_screen() && texture == target {
            tracing::warn!("texture {:#x} is both sampled and rendered to", texture.raw());
            return Err(KelpError::InvalidTextureId(texture.raw()));
        }
        let blend_mode = batch.blend_mode()?;

        let start = cursor;
        cursor += batch.instance_count;
        if batch.instance_count == 0 {
            continue;
        }
        draws.push(DrawCall {
            texture,
            smooth: batch.is_smooth(),
            blend_mode,
            instances: start..cursor,
        });
    }

    let view_projection = camera.view_projection();
    let instances = instances
        .iter()
        .map(|data| GpuInstance::pack(data, &view_projection))
        .collect();

    Ok(RenderList {
        target,
        clear: None,
        instances,
        draws,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(0.0, 0.0, 800.0, 600.0, 0.0, 1.0)
    }

    fn table_with(n: usize) -> (ResourceTable<()>, Vec<TextureId>) {
        let mut table = ResourceTable::new();
        let ids = (0..n).map(|_| table.insert((), 2, 2)).collect();
        (table, ids)
    }

    #[test]
    fn batches_partition_instances_in_order() {
        let (table, ids) = table_with(2);
        let instances = vec![InstanceData::default(); 6];
        let batches = [
            InstanceBatch::new(ids[0], false, BlendMode::Alpha, 2),
            InstanceBatch::new(ids[1], true, BlendMode::Additive, 3),
            InstanceBatch::new(ids[0], false, BlendMode::Alpha, 1),
        ];
        let list = prepare_render_list(&table, TextureId::SCREEN, &camera(), &instances, &batches).unwrap();
        let ranges: Vec<_> = list.draws.iter().map(|d| d.instances.clone()).collect();
        assert_eq!(ranges, vec![0..2, 2..5, 5..6]);
        assert_eq!(list.draws[1].texture, ids[1]);
        assert!(list.draws[1].smooth);
        assert_eq!(list.instances.len(), 6);
        assert_eq!(list.pipeline_switches(), 3);
        assert_eq!(list.clear, None);
    }

    #[test]
    fn empty_batches_are_checked_but_not_drawn() {
        let (table, ids) = table_with(1);
        let instances = vec![InstanceData::default(); 1];
        let batches = [
            InstanceBatch::new(ids[0], false, BlendMode::Alpha, 0),
            InstanceBatch::new(ids[0], false, BlendMode::Alpha, 1),
        ];
        let list = prepare_render_list(&table, TextureId::SCREEN, &camera(), &instances, &batches).unwrap();
        assert_eq!(list.draws.len(), 1);
        assert_eq!(list.draws[0].instances, 0..1);

        let bogus = [InstanceBatch::new(TextureId::from_raw(42), false, BlendMode::Alpha, 0)];
        let err = prepare_render_list(&table, TextureId::SCREEN, &camera(), &[], &bogus).unwrap_err();
        assert!(matches!(err, KelpError::InvalidTextureId(42)));
    }

    #[test]
    fn count_mismatch_is_invalid_input() {
        let (table, ids) = table_with(1);
        let instances = vec![InstanceData::default(); 3];
        let batches = [InstanceBatch::new(ids[0], false, BlendMode::Alpha, 2)];
        let err = prepare_render_list(&table, TextureId::SCREEN, &camera(), &instances, &batches).unwrap_err();
        assert!(matches!(err, KelpError::InvalidInput(_)));
    }

    #[test]
    fn unknown_target_is_rejected_before_counts() {
        let (table, ids) = table_with(1);
        let batches = [InstanceBatch::new(ids[0], false, BlendMode::Alpha, 5)];
        let err = prepare_render_list(&table, TextureId::from_raw(99), &camera(), &[], &batches).unwrap_err();
        assert!(matches!(err, KelpError::InvalidTextureId(99)));
    }

    #[test]
    fn sampling_the_target_is_rejected() {
        let (table, ids) = table_with(1);
        let instances = vec![InstanceData::default(); 1];
        let batches = [InstanceBatch::new(ids[0], false, BlendMode::Alpha, 1)];
        let err = prepare_render_list(&table, ids[0], &camera(), &instances, &batches).unwrap_err();
        assert!(matches!(err, KelpError::InvalidTextureId(_)));
    }

    #[test]
    fn bad_blend_byte_is_invalid_input() {
        let (table, ids) = table_with(1);
        let instances = vec![InstanceData::default(); 1];
        let mut batch = InstanceBatch::new(ids[0], false, BlendMode::Alpha, 1);
        batch.blend_mode = 7;
        let err = prepare_render_list(&table, TextureId::SCREEN, &camera(), &instances, &[batch]).unwrap_err();
        assert!(matches!(err, KelpError::InvalidInput(_)));
    }

    #[test]
    fn identity_instance_lands_at_camera_centre() {
        let (table, ids) = table_with(1);
        let instances = [InstanceData::default()];
        let batches = [InstanceBatch::new(ids[0], false, BlendMode::Alpha, 1)];
        let list = prepare_render_list(&table, TextureId::SCREEN, &camera(), &instances, &batches).unwrap();
        let gpu = list.instances[0];
        assert_eq!(gpu.color, [1.0; 4]);
        assert!(gpu.clip_point(glam::Vec2::ZERO).length() < 1e-6);
        assert_eq!(gpu.uv_point(glam::Vec2::ONE), glam::Vec2::ONE);
    }

    #[test]
    fn same_blend_mode_binds_once() {
        let (table, ids) = table_with(2);
        let instances = vec![InstanceData::default(); 2];
        let batches = [
            InstanceBatch::new(ids[0], false, BlendMode::Additive, 1),
            InstanceBatch::new(ids[1], true, BlendMode::Additive, 1),
        ];
        let list = prepare_render_list(&table, TextureId::SCREEN, &camera(), &instances, &batches).unwrap();
        assert_eq!(list.pipeline_switches(), 1);
    }
}
