//! Named colormaps for waterfall rendering.
//!
//! `gray` keeps the 8-bit image single-channel; every other map turns an
//! intensity into RGBA via a simple gradient formula, matching the
//! matplotlib maps of the same names.

/// A named intensity-to-color mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    /// Identity single-channel map
    Gray,
    /// Green-to-yellow
    Summer,
    /// Cyan-to-magenta
    Cool,
    /// Magenta-to-yellow
    Spring,
    /// Red-to-yellow
    Autumn,
    /// Blue-to-green
    Winter,
    /// Black-red-yellow-white
    Hot,
}

impl Colormap {
    /// Look up a map by its wire name.
    pub fn by_name(name: &str) -> Option<Colormap> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "gray" | "grey" => Some(Colormap::Gray),
            "summer" => Some(Colormap::Summer),
            "cool" => Some(Colormap::Cool),
            "spring" => Some(Colormap::Spring),
            "autumn" => Some(Colormap::Autumn),
            "winter" => Some(Colormap::Winter),
            "hot" => Some(Colormap::Hot),
            _ => None,
        }
    }

    /// True for the single-channel identity map.
    pub fn is_gray(&self) -> bool {
        matches!(self, Colormap::Gray)
    }

    /// Map an 8-bit intensity to RGBA.
    pub fn rgba(&self, value: u8) -> [u8; 4] {
        let t = value as f32 / 255.0;
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        match self {
            Colormap::Gray => [value, value, value, 255],
            Colormap::Summer => [channel(t), channel(0.5 + t / 2.0), channel(0.4), 255],
            Colormap::Cool => [channel(t), channel(1.0 - t), 255, 255],
            Colormap::Spring => [255, channel(t), channel(1.0 - t), 255],
            Colormap::Autumn => [255, channel(t), 0, 255],
            Colormap::Winter => [0, channel(t), channel(1.0 - t / 2.0), 255],
            Colormap::Hot => [
                channel(t * 3.0),
                channel(t * 3.0 - 1.0),
                channel(t * 3.0 - 2.0),
                255,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Colormap::by_name("GRAY"), Some(Colormap::Gray));
        assert_eq!(Colormap::by_name("Summer"), Some(Colormap::Summer));
        assert_eq!(Colormap::by_name("plasma-ish"), None);
    }

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(Colormap::Summer.rgba(0), [0, 128, 102, 255]);
        assert_eq!(Colormap::Summer.rgba(255), [255, 255, 102, 255]);
        assert_eq!(Colormap::Hot.rgba(0), [0, 0, 0, 255]);
        assert_eq!(Colormap::Hot.rgba(255), [255, 255, 255, 255]);
    }
}
