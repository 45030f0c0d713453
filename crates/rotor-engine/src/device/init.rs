use super::backend::ContextKind;

/// Initialization parameters for the wgpu backend.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct WgpuInit {
    /// Prefer an sRGB surface format when available.
    ///
    /// Off by default: clear and vertex colors are display values and must reach
    /// the screen unencoded, as on a plain 8-bit canvas.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    ///
    /// FIFO is broadly supported and paces the loop to the display refresh.
    pub present_mode: wgpu::PresentMode,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for WgpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Adapter/device request derived from a [`ContextKind`].
#[derive(Debug, Clone)]
pub(crate) struct AdapterRequest {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub downlevel: bool,
}

impl AdapterRequest {
    pub fn for_kind(kind: ContextKind) -> Self {
        match kind {
            ContextKind::Primary => Self {
                backends: wgpu::Backends::PRIMARY,
                power_preference: wgpu::PowerPreference::HighPerformance,
                downlevel: false,
            },
            ContextKind::Compatibility => Self {
                backends: wgpu::Backends::SECONDARY,
                power_preference: wgpu::PowerPreference::LowPower,
                downlevel: true,
            },
        }
    }

    /// Baseline limits for this request: wgpu defaults, or the WebGL2-class
    /// downlevel set for compatibility.
    pub fn base_limits(&self) -> wgpu::Limits {
        if self.downlevel {
            wgpu::Limits::downlevel_webgl2_defaults()
        } else {
            wgpu::Limits::default()
        }
    }

    /// Limits requested from the device.
    ///
    /// Only the texture-dimension limits are raised to the adapter's resolution
    /// limits; every other limit stays at the baseline. An adapter below the primary
    /// baseline refuses the device, and acquisition falls back to compatibility.
    pub fn limits(&self, adapter: &wgpu::Adapter) -> wgpu::Limits {
        self.base_limits().using_resolution(adapter.limits())
    }
}
