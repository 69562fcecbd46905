use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// A palette entry, 5 bits per channel as stored in CGRAM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Scales each channel by `brightness / 255`.
    #[must_use]
    pub fn modulate(self, brightness: u8) -> Self {
        let scale = |channel: u8| {
            let scaled = u16::from(channel) * u16::from(brightness) / 255;
            u8::try_from(scaled).unwrap_or(u8::MAX)
        };

        Self {
            red: scale(self.red),
            green: scale(self.green),
            blue: scale(self.blue),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.red, self.green, self.blue)
    }
}

impl From<u16> for Color {
    fn from(color: u16) -> Self {
        // Color     Values     Bits
        //-------------------------------
        // red ---> [0 - 31]    0-4
        // green -> [0 - 31]    5-9
        // blue --> [0 - 31]    10-14
        // unused ---------->   15
        #[allow(clippy::cast_possible_truncation)]
        Self {
            red: color.get_bits(0..=4) as u8,
            green: color.get_bits(5..=9) as u8,
            blue: color.get_bits(10..=14) as u8,
        }
    }
}

impl From<Color> for u16 {
    fn from(color: Color) -> Self {
        let red: Self = (color.red & 0x1F).into();
        let green: Self = (color.green & 0x1F).into();
        let blue: Self = (color.blue & 0x1F).into();

        (blue << 10) | (green << 5) | red
    }
}
