//! Surface configuration shared by render targets.

use kurbo::Size;
use thiserror::Error;

/// Default whiteboard width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;
/// Default whiteboard height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;

/// Renderer errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RendererError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Size of a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl SurfaceConfig {
    /// Create a config of the given size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> Result<Self, RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidSize { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_surface_is_800_by_600() {
        let config = SurfaceConfig::default();
        assert_eq!(config.size(), Size::new(800.0, 600.0));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(
            SurfaceConfig::new(0, 600),
            Err(RendererError::InvalidSize { width: 0, height: 600 })
        );
        assert!(SurfaceConfig::new(1024, 768).is_ok());
    }
}
