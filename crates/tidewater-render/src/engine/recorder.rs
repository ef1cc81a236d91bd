//! Encodes the frame pipeline's passes into a wgpu command encoder.

use tidewater_core::{MeshSlot, PassKind};

use crate::error::RenderError;
use crate::frame::{PassRecorder, PassSetup};
use crate::render_target::{RenderTargetSet, DEPTH_VALUE_CLEAR};
use crate::scene_render::{MeshRenderData, ScenePipelines, ViewBinding};
use crate::sky_render::SkyRenderer;
use crate::water_render::WaterRenderer;

/// Clear color behind the sky; only visible if the sky pipeline fails to cover a pixel.
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

/// Clear value of the depth copy attachment.
const DEPTH_VALUE_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: DEPTH_VALUE_CLEAR,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

fn color_attachment(view: &wgpu::TextureView, clear: wgpu::Color) -> wgpu::RenderPassColorAttachment<'_> {
    wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(clear),
            store: wgpu::StoreOp::Store,
        },
    }
}

/// Index of a pass's view binding in [`GpuPassRecorder::views`].
#[must_use]
pub fn view_slot(kind: PassKind) -> usize {
    match kind {
        PassKind::BelowWater => 0,
        PassKind::Reflection => 1,
        PassKind::Composite => 2,
    }
}

/// Borrowed GPU state needed to record one frame.
pub struct GpuPassRecorder<'a> {
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    /// Color view of the surface texture (or the capture target).
    pub screen_view: &'a wgpu::TextureView,
    pub targets: &'a RenderTargetSet,
    pub views: &'a [ViewBinding; 3],
    pub scene: &'a ScenePipelines,
    pub sky: &'a SkyRenderer,
    pub water: &'a WaterRenderer,
    pub meshes: &'a [MeshRenderData],
    pub water_mesh: &'a MeshRenderData,
}

impl PassRecorder for GpuPassRecorder<'_> {
    type Error = RenderError;

    fn record_pass(&mut self, setup: &PassSetup<'_>) -> Result<(), RenderError> {
        let target = setup.config.target;
        let binding = &self.views[view_slot(setup.kind)];
        binding.write(self.queue, &setup.view);

        let (color, depth, depth_value) = match self.targets.attachments(target) {
            Some(attachments) => (attachments.color, attachments.depth, attachments.depth_value),
            None => (self.screen_view, self.targets.scratch_depth_view(), None),
        };

        let mut color_attachments = vec![Some(color_attachment(color, CLEAR_COLOR))];
        if let Some(view) = depth_value {
            color_attachments.push(Some(color_attachment(view, DEPTH_VALUE_CLEAR_COLOR)));
        }

        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(setup.kind.label()),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &binding.bind_group, &[]);
        self.sky.draw(&mut pass, target);

        pass.set_pipeline(self.scene.pipeline(target));
        for slot in setup.slots.iter().filter(|slot| **slot != MeshSlot::Water) {
            for mesh in self.meshes.iter().filter(|mesh| mesh.slot == *slot) {
                mesh.draw(&mut pass);
            }
        }

        if setup.slots.contains(&MeshSlot::Water) {
            self.water.draw(&mut pass, self.water_mesh);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_slots_are_distinct() {
        let mut slots: Vec<usize> = PassKind::ORDER.iter().map(|kind| view_slot(*kind)).collect();
        slots.sort_unstable();
        slots.dedup();
        assert_eq!(slots, vec![0, 1, 2]);
    }
}
