/// A colour, expressed in RGB or CMYK colour spaces
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Colour {
    /// DeviceRGB colour; r, g, b, range from 0.0 to 1.0
    RGB { r: f32, g: f32, b: f32 },
    /// DeviceCMYK colour; c, m, y, and k range from 0.0 to 1.0
    CMYK { c: f32, m: f32, y: f32, k: f32 },
    /// DeviceGray colour; g ranges from 0.0 to 1.0
    Grey { g: f32 },
}

impl Default for Colour {
    fn default() -> Self {
        colours::BLACK
    }
}

impl Colour {
    /// Create a new colour in the RGB space. r, g, and b range from 0.0 to 1.0
    pub fn new_rgb(r: f32, g: f32, b: f32) -> Colour {
        Colour::RGB { r, g, b }
    }

    /// Create a new colour in the RGB space. r, g, and b range from 0 to 255
    pub fn new_rgb_bytes(r: u8, g: u8, b: u8) -> Colour {
        Colour::RGB {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Create a new colour in the Gray space, g ranges from 0.0 to 1.0
    pub fn new_grey(g: f32) -> Colour {
        Colour::Grey { g }
    }

    /// Parse a colour as written in markup: either one of the names in
    /// [colours::named] or a `#rgb` / `#rrggbb` hex triplet
    pub fn parse(value: &str) -> Option<Colour> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        colours::named(&value.to_ascii_lowercase())
    }
}

fn parse_hex(hex: &str) -> Option<Colour> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut channels = hex.chars().map(|c| {
                let v = c.to_digit(16).unwrap_or_default() as u8;
                v * 17
            });
            Some(Colour::new_rgb_bytes(
                channels.next()?,
                channels.next()?,
                channels.next()?,
            ))
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Colour::new_rgb_bytes(channel(0)?, channel(2)?, channel(4)?))
        }
        _ => None,
    }
}

impl<T: Into<f32>> From<(T, T, T)> for Colour {
    fn from(c: (T, T, T)) -> Self {
        Colour::RGB {
            r: c.0.into(),
            g: c.1.into(),
            b: c.2.into(),
        }
    }
}

/// A list of pre-defined colour constants
pub mod colours {
    use super::*;

    pub const BLACK: Colour = Colour::Grey { g: 0.0 };
    pub const WHITE: Colour = Colour::Grey { g: 1.0 };
    pub const GREY: Colour = Colour::Grey { g: 0.5 };
    pub const DARK_GREY: Colour = Colour::Grey { g: 0.25 };
    pub const LIGHT_GREY: Colour = Colour::Grey { g: 0.75 };
    pub const RED: Colour = Colour::RGB {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
    pub const GREEN: Colour = Colour::RGB {
        r: 0.0,
        g: 0.5,
        b: 0.0,
    };
    pub const BLUE: Colour = Colour::RGB {
        r: 0.0,
        g: 0.0,
        b: 1.0,
    };
    pub const CYAN: Colour = Colour::CMYK {
        c: 1.0,
        m: 0.0,
        y: 0.0,
        k: 0.0,
    };
    pub const MAGENTA: Colour = Colour::CMYK {
        c: 0.0,
        m: 1.0,
        y: 0.0,
        k: 0.0,
    };
    pub const YELLOW: Colour = Colour::CMYK {
        c: 0.0,
        m: 0.0,
        y: 1.0,
        k: 0.0,
    };

    /// Look up a lowercase colour name
    pub fn named(name: &str) -> Option<Colour> {
        Some(match name {
            "black" => BLACK,
            "white" => WHITE,
            "gray" | "grey" => GREY,
            "darkgray" | "darkgrey" => DARK_GREY,
            "lightgray" | "lightgrey" => LIGHT_GREY,
            "red" => RED,
            "green" => GREEN,
            "blue" => BLUE,
            "cyan" => CYAN,
            "magenta" => MAGENTA,
            "yellow" => YELLOW,
            _ => return None,
        })
    }
}
