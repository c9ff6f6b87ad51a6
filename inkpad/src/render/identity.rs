//! Fingerprint of the global parameters every baked tile depends on.

use inkpad_core::color::Color;

/// Viewport parameters a render is made under.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Viewport {
    /// Visible size, in document units.
    pub size: [u32; 2],
    /// Device pixels per document unit.
    pub pixel_ratio: f32,
    pub background: Color,
}
impl Viewport {
    /// Size of the viewport in device pixels.
    #[must_use]
    pub fn pixel_size(&self) -> [u32; 2] {
        self.size
            .map(|dim| (dim as f32 * self.pixel_ratio).ceil().max(1.0) as u32)
    }
}

/// Tiles baked under a different identity are stale, regardless of what the document holds.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct RenderIdentity(String);
impl RenderIdentity {
    #[must_use]
    pub fn of(viewport: &Viewport) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&viewport.size[0].to_le_bytes());
        hasher.update(&viewport.size[1].to_le_bytes());
        hasher.update(&viewport.pixel_ratio.to_le_bytes());
        hasher.update(&viewport.background.to_array());
        // Half the digest is plenty to tell a handful of viewports apart.
        let hex = hasher.finalize().to_hex();
        Self(hex.as_str()[..32].to_owned())
    }
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl std::fmt::Display for RenderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
