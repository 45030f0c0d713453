use crate::render::Color;

use super::backend::{Backend, ContextKind, ProgramId, Surface};
use super::error::{RenderError, RenderResult};

/// Color the frame is cleared to.
pub const CLEAR_COLOR: Color = Color::GREY;

/// Owns the backend and the viewport dimensions recorded at acquisition.
///
/// Initialization mutates global rendering state (depth test on, clear color set).
/// That state is never saved or restored: a context is driven by exactly one
/// renderer, so nothing else can observe it.
pub struct GraphicsContext<B: Backend> {
    viewport_width: u32,
    viewport_height: u32,
    kind: ContextKind,
    active_program: Option<ProgramId>,
    backend: B,
}

impl<B: Backend> GraphicsContext<B> {
    /// Acquires a context from `surface`.
    ///
    /// The primary context kind is requested first, then the compatibility kind.
    /// If both are refused the caller gets `ContextUnavailable` to report to the user.
    pub fn acquire<S>(surface: &S) -> RenderResult<Self>
    where
        S: Surface<Backend = B>,
    {
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSurface { width, height });
        }

        for kind in ContextKind::REQUEST_ORDER {
            match surface.get_context(kind) {
                Some(backend) => {
                    log::info!("acquired {} graphics context ({width}x{height})", kind.name());
                    return Ok(Self::initialise(backend, kind, width, height));
                }
                None => log::warn!("{} graphics context unavailable", kind.name()),
            }
        }

        Err(RenderError::ContextUnavailable)
    }

    fn initialise(mut backend: B, kind: ContextKind, width: u32, height: u32) -> Self {
        backend.set_clear_color(CLEAR_COLOR);
        backend.enable_depth_test();

        Self {
            viewport_width: width,
            viewport_height: height,
            kind,
            active_program: None,
            backend,
        }
    }

    #[inline]
    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    #[inline]
    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    /// Width over height of the recorded viewport.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.viewport_width as f32 / self.viewport_height as f32
    }

    #[inline]
    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    /// Program made active by the last successful pipeline build.
    #[inline]
    pub fn active_program(&self) -> Option<ProgramId> {
        self.active_program
    }

    pub(crate) fn set_active_program(&mut self, program: ProgramId) {
        self.active_program = Some(program);
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{HeadlessSurface, RenderError};

    // ── acquisition ───────────────────────────────────────────────────────

    #[test]
    fn primary_context_preferred() {
        let ctx = GraphicsContext::acquire(&HeadlessSurface::new(800, 600)).unwrap();
        assert_eq!(ctx.kind(), ContextKind::Primary);
        assert_eq!(ctx.viewport_width(), 800);
        assert_eq!(ctx.viewport_height(), 600);
    }

    #[test]
    fn falls_back_to_compatibility() {
        let surface = HeadlessSurface::new(640, 480).without_primary();
        let ctx = GraphicsContext::acquire(&surface).unwrap();
        assert_eq!(ctx.kind(), ContextKind::Compatibility);
        assert_eq!(ctx.backend().kind(), ContextKind::Compatibility);
    }

    #[test]
    fn no_context_is_reported() {
        let surface = HeadlessSurface::new(640, 480).without_primary().without_compatibility();
        let err = GraphicsContext::acquire(&surface).err();
        assert_eq!(err, Some(RenderError::ContextUnavailable));
    }

    #[test]
    fn zero_sized_surface_rejected() {
        let err = GraphicsContext::acquire(&HeadlessSurface::new(0, 480)).err();
        assert_eq!(err, Some(RenderError::InvalidSurface { width: 0, height: 480 }));
    }

    // ── initial state ─────────────────────────────────────────────────────

    #[test]
    fn initialisation_enables_depth_and_sets_clear_color() {
        let ctx = GraphicsContext::acquire(&HeadlessSurface::new(800, 600)).unwrap();
        assert!(ctx.backend().depth_test_enabled());
        assert_eq!(ctx.backend().clear_color(), Some(CLEAR_COLOR));
        assert_eq!(ctx.active_program(), None);
    }

    #[test]
    fn aspect_ratio_follows_viewport() {
        let ctx = GraphicsContext::acquire(&HeadlessSurface::new(800, 400)).unwrap();
        assert_eq!(ctx.aspect_ratio(), 2.0);
    }
}
