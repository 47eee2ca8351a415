//! Vello-based render target.

use crate::renderer::SurfaceConfig;
use inkdesk_core::whiteboard::{RenderTarget, StrokeSegment};
use kurbo::{Affine, Cap, Join, Stroke};
use peniko::Color;
use vello::Scene;

/// Whiteboard surface backed by a Vello scene.
///
/// Each segment is appended to the scene as soon as it arrives. The scene is
/// the drawing's only record: strokes cannot be read back out of it.
pub struct VelloSurface {
    /// The Vello scene being built.
    scene: Scene,
    config: SurfaceConfig,
    /// Segments drawn since the last clear.
    segments: usize,
}

impl Default for VelloSurface {
    fn default() -> Self {
        Self::new(SurfaceConfig::default())
    }
}

impl VelloSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self {
            scene: Scene::new(),
            config,
            segments: 0,
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene, leaving an empty one.
    pub fn take_scene(&mut self) -> Scene {
        self.segments = 0;
        std::mem::take(&mut self.scene)
    }

    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Erase the drawing.
    pub fn clear(&mut self) {
        self.scene.reset();
        self.segments = 0;
    }
}

impl RenderTarget for VelloSurface {
    fn stroke_segment(&mut self, segment: &StrokeSegment) {
        let stroke = Stroke::new(segment.width)
            .with_caps(Cap::Round)
            .with_join(Join::Round);
        let color: Color = segment.color.into();
        self.scene.stroke(&stroke, Affine::IDENTITY, color, None, &segment.line());
        self.segments += 1;
    }
}
