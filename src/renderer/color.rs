//! RGBA colour with a float alpha, as used by CSS colour strings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0.0 (transparent) - 1.0 (opaque)
    pub a: f32,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    pub fn from_rgb(rgb: [u8; 3], a: f32) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2], a)
    }

    /// Same hue, different alpha
    pub fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// `rgba(r,g,b,a)` for canvas fill/stroke styles
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_string() {
        let c = Rgba::from_rgb([139, 92, 246], 0.35);
        assert_eq!(c.to_css(), "rgba(139,92,246,0.350)");
        assert_eq!(c.with_alpha(0.0).to_css(), "rgba(139,92,246,0.000)");
    }

    #[test]
    fn test_alpha_clamped() {
        assert_eq!(Rgba::new(0, 0, 0, 1.7).a, 1.0);
        assert_eq!(Rgba::new(0, 0, 0, -0.2).a, 0.0);
    }
}
