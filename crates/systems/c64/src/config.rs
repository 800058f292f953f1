//! Machine configuration.

use serde::{Deserialize, Serialize};

/// TV standard of the machine. Only affects frame budgeting and the reported clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Pal,
    Ntsc,
}

impl Region {
    /// Raster lines per frame.
    pub const fn lines(self) -> u32 {
        match self {
            Region::Pal => 312,
            Region::Ntsc => 263,
        }
    }

    /// CPU cycles per raster line.
    pub const fn cycles_per_line(self) -> u32 {
        match self {
            Region::Pal => 63,
            Region::Ntsc => 65,
        }
    }

    pub const fn cycles_per_frame(self) -> u64 {
        self.lines() as u64 * self.cycles_per_line() as u64
    }

    /// CPU clock in Hz.
    pub fn clock_hz(self) -> f64 {
        match self {
            Region::Pal => 0.985_248_6e6,
            Region::Ntsc => 1.022_727_3e6,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pal" => Some(Region::Pal),
            "ntsc" => Some(Region::Ntsc),
            _ => None,
        }
    }
}

/// Construction-time settings for a [`crate::C64System`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct C64Config {
    pub region: Region,
    /// Seed the zero-page pointers and RAM vectors a booted kernal leaves behind.
    pub power_on_presets: bool,
}

impl Default for C64Config {
    fn default() -> Self {
        Self {
            region: Region::Pal,
            power_on_presets: true,
        }
    }
}

impl C64Config {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
