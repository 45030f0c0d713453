use winit::dpi::PhysicalSize;

use super::backend::PresentOutcome;

/// Picks the swapchain format: the preferred 8-bit variants first, then any format
/// with the requested encoding, then whatever the surface lists first.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    let preferred = if prefer_srgb {
        [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm]
    };

    preferred
        .into_iter()
        .find(|f| caps.formats.contains(f))
        .or_else(|| caps.formats.iter().copied().find(|f| f.is_srgb() == prefer_srgb))
        .or_else(|| caps.formats.first().copied())
}

pub(crate) fn choose_alpha_mode(caps: &wgpu::SurfaceCapabilities) -> wgpu::CompositeAlphaMode {
    if caps.alpha_modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
        return wgpu::CompositeAlphaMode::Opaque;
    }
    caps.alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> PresentOutcome {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            log::debug!("surface reconfigured after {err}");
            PresentOutcome::Skipped
        }
        wgpu::SurfaceError::OutOfMemory => {
            log::error!("surface out of memory");
            PresentOutcome::Lost
        }
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => {
            log::debug!("frame skipped: {err}");
            PresentOutcome::Skipped
        }
    }
}

/// Maps a buffer item size onto the matching `f32` vertex format.
pub(crate) fn float_vertex_format(item_size: u32) -> wgpu::VertexFormat {
    match item_size {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        4 => wgpu::VertexFormat::Float32x4,
        other => panic!("vertex item size {other} out of range 1..=4"),
    }
}
