//! Named colors for label groups and the density color map.

use serde::{Serialize, Serializer};

/// A color with a stable human-readable name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedColor {
    pub name: &'static str,
    pub rgb: (u8, u8, u8),
}

impl NamedColor {
    pub const fn new(name: &'static str, r: u8, g: u8, b: u8) -> Self {
        Self { name, rgb: (r, g, b) }
    }
}

impl Serialize for NamedColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// Color of the unlabeled series
pub const DEFAULT_COLOR: NamedColor = NamedColor::new("blue", 31, 119, 180);

/// Color of the miscellaneous group; never handed out by [`PALETTE`]
pub const MISC_COLOR: NamedColor = NamedColor::new("cyan", 0, 255, 255);

/// Label colors in assignment order (cycled when there are more labels)
pub const PALETTE: &[NamedColor] = &[
    NamedColor::new("blue", 31, 119, 180),
    NamedColor::new("orange", 255, 127, 14),
    NamedColor::new("green", 44, 160, 44),
    NamedColor::new("red", 214, 39, 40),
    NamedColor::new("purple", 148, 103, 189),
    NamedColor::new("brown", 140, 86, 75),
    NamedColor::new("pink", 227, 119, 194),
    NamedColor::new("gray", 127, 127, 127),
    NamedColor::new("olive", 188, 189, 34),
    NamedColor::new("navy", 0, 0, 128),
    NamedColor::new("gold", 255, 215, 0),
    NamedColor::new("teal", 0, 128, 128),
    NamedColor::new("maroon", 128, 0, 0),
    NamedColor::new("lime", 0, 255, 0),
    NamedColor::new("magenta", 255, 0, 255),
    NamedColor::new("black", 0, 0, 0),
];

/// Palette color for the `index`-th distinct label
pub fn label_color(index: usize) -> NamedColor {
    PALETTE[index % PALETTE.len()]
}

/// Viridis anchor points, evenly spaced over [0, 1]
const DENSITY_STOPS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

/// Map a normalized value in [0, 1] onto the density color map
pub fn density_color(t: f64) -> (u8, u8, u8) {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (DENSITY_STOPS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(DENSITY_STOPS.len() - 2);
    let f = scaled - i as f64;
    let (a, b) = (DENSITY_STOPS[i], DENSITY_STOPS[i + 1]);
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Log-normalized position of `count` between 1 and `max`
pub fn log_norm(count: u64, max: u64) -> f64 {
    if count == 0 || max <= 1 {
        return if count == 0 { 0.0 } else { 1.0 };
    }
    (count as f64).ln() / (max as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_excludes_misc_color() {
        assert!(PALETTE.iter().all(|c| c.name != MISC_COLOR.name && c.rgb != MISC_COLOR.rgb));
    }

    #[test]
    fn test_label_color_cycles() {
        assert_eq!(label_color(0), PALETTE[0]);
        assert_eq!(label_color(PALETTE.len() + 2), PALETTE[2]);
    }

    #[test]
    fn test_density_color_endpoints() {
        assert_eq!(density_color(0.0), DENSITY_STOPS[0]);
        assert_eq!(density_color(1.0), DENSITY_STOPS[4]);
        assert_eq!(density_color(f64::NAN), DENSITY_STOPS[0]);
    }

    #[test]
    fn test_log_norm() {
        assert_eq!(log_norm(0, 100), 0.0);
        assert_eq!(log_norm(1, 100), 0.0);
        assert!((log_norm(10, 100) - 0.5).abs() < 1e-12);
        assert_eq!(log_norm(100, 100), 1.0);
        assert_eq!(log_norm(1, 1), 1.0);
    }
}
