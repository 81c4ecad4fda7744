//! Caption styling from the `titlebar_color` setting.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleBarStyle {
    /// Immersive dark mode
    Dark,
    Light,
    /// Explicit caption color with a readable text color, both as COLORREF (0x00BBGGRR)
    Caption { color: u32, text: u32 },
}

impl TitleBarStyle {
    /// `None` for an empty or unrecognized value
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "" => return None,
            "dark" => return Some(TitleBarStyle::Dark),
            "light" => return Some(TitleBarStyle::Light),
            _ => {}
        }

        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.is_ascii() {
            tracing::warn!("Ignoring titlebar color {:?}", value);
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) else {
            tracing::warn!("Ignoring titlebar color {:?}", value);
            return None;
        };

        let luminance = (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0;
        let text = if luminance < 0.5 { 0x00FF_FFFF } else { 0x0000_0000 };

        Some(TitleBarStyle::Caption {
            color: r as u32 | (g as u32) << 8 | (b as u32) << 16,
            text,
        })
    }
}
