use std::fmt;

/// Straight (non-premultiplied) color: RGB channels in `0..=255`, alpha in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)` or one of a
    /// handful of CSS names.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            return parse_functional(args);
        }
        match lower.as_str() {
            "black" => Ok(Self::new(0.0, 0.0, 0.0, 1.0)),
            "white" => Ok(Self::new(255.0, 255.0, 255.0, 1.0)),
            "red" => Ok(Self::new(255.0, 0.0, 0.0, 1.0)),
            "green" => Ok(Self::new(0.0, 128.0, 0.0, 1.0)),
            "blue" => Ok(Self::new(0.0, 0.0, 255.0, 1.0)),
            "transparent" => Ok(Self::new(0.0, 0.0, 0.0, 0.0)),
            _ => Err(format!("unrecognized color \"{s}\"")),
        }
    }

    /// Linear per-channel interpolation; alpha is interpolated on its own axis.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        fn mix(a: f64, b: f64, t: f64) -> f64 {
            a + (b - a) * t
        }
        Self {
            r: mix(self.r, other.r, t),
            g: mix(self.g, other.g, t),
            b: mix(self.b, other.b, t),
            a: mix(self.a, other.a, t),
        }
    }
}

/// Formats as `rgb(r, g, b)` when opaque, `rgba(r, g, b, a)` otherwise.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn channel(x: f64) -> u8 {
            x.clamp(0.0, 255.0).round() as u8
        }
        let (r, g, b) = (channel(self.r), channel(self.g), channel(self.b));
        let a = self.a.clamp(0.0, 1.0);
        if a >= 1.0 {
            write!(f, "rgb({r}, {g}, {b})")
        } else {
            let a = (a * 1000.0).round() / 1000.0;
            write!(f, "rgba({r}, {g}, {b}, {a})")
        }
    }
}

fn parse_hex(s: &str) -> Result<Rgba, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    if !s.is_ascii() {
        return Err("hex color must be ASCII".to_owned());
    }

    let (r, g, b, a) = match s.len() {
        3 => {
            let r = hex_byte(&s[0..1].repeat(2))?;
            let g = hex_byte(&s[1..2].repeat(2))?;
            let b = hex_byte(&s[2..3].repeat(2))?;
            (r, g, b, 255)
        }
        6 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        ),
        8 => (
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        ),
        _ => {
            return Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA".to_owned());
        }
    };

    Ok(Rgba::new(
        f64::from(r),
        f64::from(g),
        f64::from(b),
        f64::from(a) / 255.0,
    ))
}

fn parse_functional(args: &str) -> Result<Rgba, String> {
    let inner = args
        .strip_suffix(')')
        .ok_or_else(|| "missing closing parenthesis".to_owned())?;
    let parts = inner
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid color component \"{}\"", p.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgba::new(*r, *g, *b, 1.0)),
        [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
        _ => Err("rgb()/rgba() take 3 or 4 components".to_owned()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
