//! Kernal, BASIC and character ROM images.
//!
//! The images are handed in as byte buffers by whoever reads them from disk; this
//! module only checks their sizes and keeps them immutable afterwards.

use std::fmt;
use thiserror::Error;

pub const KERNAL_SIZE: usize = 0x2000;
pub const BASIC_SIZE: usize = 0x2000;
pub const CHAR_ROM_SIZE: usize = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomKind {
    Kernal,
    Basic,
    CharRom,
}

impl RomKind {
    pub const ALL: [RomKind; 3] = [RomKind::Kernal, RomKind::Basic, RomKind::CharRom];

    /// Required image size in bytes.
    pub const fn size(self) -> usize {
        match self {
            RomKind::Kernal => KERNAL_SIZE,
            RomKind::Basic => BASIC_SIZE,
            RomKind::CharRom => CHAR_ROM_SIZE,
        }
    }

    /// First address of the window the ROM is banked into.
    pub const fn base(self) -> u16 {
        match self {
            RomKind::Kernal => 0xE000,
            RomKind::Basic => 0xA000,
            RomKind::CharRom => 0xD000,
        }
    }

    /// Mount point id used by the system.
    pub const fn mount_id(self) -> &'static str {
        match self {
            RomKind::Kernal => "Kernal",
            RomKind::Basic => "Basic",
            RomKind::CharRom => "CharRom",
        }
    }

    pub fn from_mount_id(id: &str) -> Option<Self> {
        RomKind::ALL.into_iter().find(|k| k.mount_id() == id)
    }
}

impl fmt::Display for RomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RomKind::Kernal => "kernal",
            RomKind::Basic => "BASIC",
            RomKind::CharRom => "character",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("{kind} ROM must be {expected} bytes, got {actual}")]
    WrongSize {
        kind: RomKind,
        expected: usize,
        actual: usize,
    },
}

/// A size-checked ROM image.
#[derive(Clone, PartialEq, Eq)]
pub struct Rom {
    kind: RomKind,
    data: Box<[u8]>,
}

impl Rom {
    pub fn new(kind: RomKind, data: &[u8]) -> Result<Self, RomError> {
        if data.len() != kind.size() {
            return Err(RomError::WrongSize {
                kind,
                expected: kind.size(),
                actual: data.len(),
            });
        }
        Ok(Self {
            kind,
            data: data.into(),
        })
    }

    pub fn kind(&self) -> RomKind {
        self.kind
    }

    /// Byte at a CPU address inside this ROM's window.
    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        self.data[(addr - self.kind.base()) as usize]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Debug for Rom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rom")
            .field("kind", &self.kind)
            .field("len", &self.data.len())
            .finish()
    }
}

/// The three ROM slots. A slot may be empty until its image is mounted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RomSet {
    kernal: Option<Rom>,
    basic: Option<Rom>,
    char_rom: Option<Rom>,
}

impl RomSet {
    /// Validate and hold all three images.
    pub fn new(kernal: &[u8], basic: &[u8], char_rom: &[u8]) -> Result<Self, RomError> {
        Ok(Self {
            kernal: Some(Rom::new(RomKind::Kernal, kernal)?),
            basic: Some(Rom::new(RomKind::Basic, basic)?),
            char_rom: Some(Rom::new(RomKind::CharRom, char_rom)?),
        })
    }

    fn slot_mut(&mut self, kind: RomKind) -> &mut Option<Rom> {
        match kind {
            RomKind::Kernal => &mut self.kernal,
            RomKind::Basic => &mut self.basic,
            RomKind::CharRom => &mut self.char_rom,
        }
    }

    pub fn get(&self, kind: RomKind) -> Option<&Rom> {
        match kind {
            RomKind::Kernal => self.kernal.as_ref(),
            RomKind::Basic => self.basic.as_ref(),
            RomKind::CharRom => self.char_rom.as_ref(),
        }
    }

    pub fn insert(&mut self, rom: Rom) {
        let kind = rom.kind();
        *self.slot_mut(kind) = Some(rom);
    }

    pub fn remove(&mut self, kind: RomKind) -> Option<Rom> {
        self.slot_mut(kind).take()
    }

    pub fn is_complete(&self) -> bool {
        RomKind::ALL.iter().all(|&k| self.get(k).is_some())
    }

    /// Kinds that still have no image.
    pub fn missing(&self) -> Vec<RomKind> {
        RomKind::ALL
            .into_iter()
            .filter(|&k| self.get(k).is_none())
            .collect()
    }
}
