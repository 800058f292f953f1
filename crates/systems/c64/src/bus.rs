//! C64 memory bus implementation
//!
//! The 6510 sees a 64KB RAM array with three overlay windows whose contents are
//! selected by the low three bits of the processor port at $0001:
//!
//! $A000-$BFFF: BASIC ROM when bit 0 or bit 1 is set, else RAM
//! $D000-$DFFF: RAM when bits 0 and 1 are clear; otherwise character ROM when
//!              bit 2 is clear, else the I/O window
//! $E000-$FFFF: kernal ROM when bit 1 is set, else RAM
//!
//! Bank state is derived from RAM on every access and never cached. Writes always
//! land in RAM except inside the active I/O window, where they go to the chip that
//! owns the address.

use std::cell::Cell;
use std::fmt;

use emu_core::cpu_6502::Memory6502;
use emu_core::logging::{log, LogCategory, LogLevel};

use crate::io::{RegisterDevice, SidRegisters, VicRegisters, SOUND_REGISTERS, VIDEO_REGISTERS};
use crate::roms::{Rom, RomKind, RomSet};

/// Processor port data direction register.
pub const PORT_DDR: u16 = 0x0000;
/// Processor port data register; bits 0-2 select the memory configuration.
pub const PORT: u16 = 0x0001;

const PORT_LORAM: u8 = 0x01;
const PORT_HIRAM: u8 = 0x02;
const PORT_CHAREN: u8 = 0x04;

const VIDEO_BASE: u16 = 0xD000;
const SOUND_BASE: u16 = 0xD400;
const OPEN_IO_BASE: u16 = 0xD800;

/// RAM seeds a booted kernal would leave behind, as (address, value) bytes.
const POWER_ON_BYTES: &[(u16, u8)] = &[(0x0016, 0x19), (0x009A, 0x03), (0x0288, 0x04)];

/// Word-sized RAM seeds, stored little-endian.
const POWER_ON_WORDS: &[(u16, u16)] = &[
    (0x0003, 0xB1AA),
    (0x0005, 0xB391),
    (0x002B, 0x0801),
    (0x0037, 0xA000),
    (0x00B2, 0x033C),
    (0x0281, 0x0800),
    (0x0283, 0xA000),
    (0x028F, 0xEB48),
    (0x0300, 0xE38B),
    (0xFFFA, 0xFE43),
    (0xFFFC, 0xFCE2),
    (0xFFFE, 0xFF48),
];

/// What a CPU access at some address currently resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemorySource {
    Ram,
    Basic,
    CharRom,
    Kernal,
    /// Video chip registers, $D000-$D3FF.
    Video,
    /// Sound chip registers, $D400-$D7FF.
    Sound,
    /// $D800-$DFFF: colour RAM and CIAs on hardware, backed by RAM here.
    OpenIo,
}

impl MemorySource {
    /// Resolve `addr` for the given processor port value.
    pub fn resolve(port: u8, addr: u16) -> Self {
        let rom_bits = port & (PORT_LORAM | PORT_HIRAM);
        match addr {
            0xA000..=0xBFFF if rom_bits != 0 => MemorySource::Basic,
            0xD000..=0xDFFF if rom_bits != 0 => {
                if port & PORT_CHAREN == 0 {
                    MemorySource::CharRom
                } else if addr < SOUND_BASE {
                    MemorySource::Video
                } else if addr < OPEN_IO_BASE {
                    MemorySource::Sound
                } else {
                    MemorySource::OpenIo
                }
            }
            0xE000..=0xFFFF if port & PORT_HIRAM != 0 => MemorySource::Kernal,
            _ => MemorySource::Ram,
        }
    }

    /// Log category for accesses forwarded to an I/O collaborator.
    pub fn log_category(self) -> Option<LogCategory> {
        match self {
            MemorySource::Video => Some(LogCategory::Video),
            MemorySource::Sound => Some(LogCategory::Sound),
            MemorySource::OpenIo => Some(LogCategory::Stubs),
            _ => None,
        }
    }
}

/// C64 memory bus
pub struct C64Bus {
    ram: Box<[u8; 0x10000]>,
    roms: RomSet,
    video: Box<dyn RegisterDevice>,
    sound: Box<dyn RegisterDevice>,
    /// Set once a read from the open I/O routing point has been reported.
    open_io_read_reported: Cell<bool>,
    /// Same for writes.
    open_io_write_reported: Cell<bool>,
}

impl C64Bus {
    /// Create a bus with the given ROMs and latch stand-ins for the chips.
    pub fn new(roms: RomSet, power_on_presets: bool) -> Self {
        let mut bus = Self {
            ram: Box::new([0; 0x10000]),
            roms,
            video: Box::new(VicRegisters::new()),
            sound: Box::new(SidRegisters::new()),
            open_io_read_reported: Cell::new(false),
            open_io_write_reported: Cell::new(false),
        };
        bus.power_on(power_on_presets);
        bus
    }

    /// Clear RAM and chip registers and seed the power-on values.
    pub fn power_on(&mut self, presets: bool) {
        self.ram.fill(0);
        self.ram[PORT_DDR as usize] = 0x2F;
        self.ram[PORT as usize] = 0x37;
        if presets {
            for &(addr, val) in POWER_ON_BYTES {
                self.ram[addr as usize] = val;
            }
            for &(addr, val) in POWER_ON_WORDS {
                let [lo, hi] = val.to_le_bytes();
                self.ram[addr as usize] = lo;
                self.ram[addr as usize + 1] = hi;
            }
        }
        self.video.reset();
        self.sound.reset();
        self.open_io_read_reported.set(false);
        self.open_io_write_reported.set(false);
    }

    /// Current processor port value.
    #[inline]
    pub fn port(&self) -> u8 {
        self.ram[PORT as usize]
    }

    /// What an access at `addr` resolves to under the current port bits.
    #[inline]
    pub fn source(&self, addr: u16) -> MemorySource {
        MemorySource::resolve(self.port(), addr)
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram[..]
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram[..]
    }

    pub fn roms(&self) -> &RomSet {
        &self.roms
    }

    pub fn set_rom(&mut self, rom: Rom) {
        self.roms.insert(rom);
    }

    pub fn remove_rom(&mut self, kind: RomKind) -> Option<Rom> {
        self.roms.remove(kind)
    }

    /// Replace the video collaborator, returning the previous one.
    pub fn attach_video(&mut self, device: Box<dyn RegisterDevice>) -> Box<dyn RegisterDevice> {
        std::mem::replace(&mut self.video, device)
    }

    /// Replace the sound collaborator, returning the previous one.
    pub fn attach_sound(&mut self, device: Box<dyn RegisterDevice>) -> Box<dyn RegisterDevice> {
        std::mem::replace(&mut self.sound, device)
    }

    pub fn video(&self) -> &dyn RegisterDevice {
        self.video.as_ref()
    }

    pub fn sound(&self) -> &dyn RegisterDevice {
        self.sound.as_ref()
    }

    #[inline]
    fn video_index(addr: u16) -> u8 {
        ((addr - VIDEO_BASE) as usize % VIDEO_REGISTERS) as u8
    }

    #[inline]
    fn sound_index(addr: u16) -> u8 {
        ((addr - SOUND_BASE) as usize % SOUND_REGISTERS) as u8
    }

    /// ROM byte, or open bus ($FF) while the slot is empty.
    #[inline]
    fn rom_byte(&self, kind: RomKind, addr: u16) -> u8 {
        self.roms.get(kind).map(|rom| rom.read(addr)).unwrap_or(0xFF)
    }

    fn log_forward(source: MemorySource, addr: u16, val: u8, write: bool) {
        let Some(category) = source.log_category() else {
            return;
        };
        log(category, LogLevel::Trace, || {
            if write {
                format!("{:?}: write ${:04X} <- {:02X}", source, addr, val)
            } else {
                format!("{:?}: read ${:04X} -> {:02X}", source, addr, val)
            }
        });
    }

    fn report_open_io(&self, addr: u16, write: bool) {
        let reported = if write {
            &self.open_io_write_reported
        } else {
            &self.open_io_read_reported
        };
        if reported.replace(true) {
            return;
        }
        log(LogCategory::Stubs, LogLevel::Debug, || {
            format!(
                "Bus: {} ${:04X} hit colour RAM/CIA space; not modelled, using RAM",
                if write { "write to" } else { "read from" },
                addr
            )
        });
    }

    /// Read without logging; shared by `read` and `peek`.
    fn resolve_read(&self, addr: u16) -> u8 {
        match self.source(addr) {
            MemorySource::Ram | MemorySource::OpenIo => self.ram[addr as usize],
            MemorySource::Basic => self.rom_byte(RomKind::Basic, addr),
            MemorySource::CharRom => self.rom_byte(RomKind::CharRom, addr),
            MemorySource::Kernal => self.rom_byte(RomKind::Kernal, addr),
            MemorySource::Video => self.video.read_register(Self::video_index(addr)),
            MemorySource::Sound => self.sound.read_register(Self::sound_index(addr)),
        }
    }
}

impl Default for C64Bus {
    fn default() -> Self {
        Self::new(RomSet::default(), true)
    }
}

impl fmt::Debug for C64Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("C64Bus")
            .field("port", &self.port())
            .field("roms", &self.roms)
            .field("video", &self.video)
            .field("sound", &self.sound)
            .finish()
    }
}

impl Memory6502 for C64Bus {
    fn read(&self, addr: u16) -> u8 {
        let val = self.resolve_read(addr);
        match self.source(addr) {
            source @ (MemorySource::Video | MemorySource::Sound) => {
                Self::log_forward(source, addr, val, false)
            }
            MemorySource::OpenIo => self.report_open_io(addr, false),
            _ => {}
        }
        val
    }

    fn write(&mut self, addr: u16, val: u8) {
        match self.source(addr) {
            source @ MemorySource::Video => {
                Self::log_forward(source, addr, val, true);
                self.video.write_register(Self::video_index(addr), val);
            }
            source @ MemorySource::Sound => {
                Self::log_forward(source, addr, val, true);
                self.sound.write_register(Self::sound_index(addr), val);
            }
            MemorySource::OpenIo => {
                self.report_open_io(addr, true);
                self.ram[addr as usize] = val;
            }
            // ROM windows are read-only; the write reaches the RAM underneath
            _ => self.ram[addr as usize] = val,
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        self.resolve_read(addr)
    }

    fn poke(&mut self, addr: u16, val: u8) {
        self.ram[addr as usize] = val;
    }
}
