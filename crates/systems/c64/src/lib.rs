//! Commodore 64 system implementation
//!
//! Wraps the shared 6502 engine around a [`C64Bus`]. The 6510's processor port
//! lives in RAM at $0000/$0001, so the engine itself needs no C64 knowledge.

pub mod bus;
pub mod config;
pub mod io;
pub mod monitor;
pub mod roms;

pub use bus::{C64Bus, MemorySource};
pub use config::{C64Config, Region};
pub use io::{RegisterDevice, SidRegisters, VicRegisters};
pub use roms::{Rom, RomError, RomKind, RomSet};

use emu_core::cpu_6502::{trace_line, Cpu6502, CpuError, Memory6502, StatusFlags};
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::{MountPointInfo, System};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const STATE_SYSTEM: &str = "c64";
const STATE_VERSION: u32 = 1;
const PROGRAM_MOUNT: &str = "Program";

#[derive(Debug, Error)]
pub enum C64Error {
    #[error("ROM error: {0}")]
    Rom(#[from] RomError),
    #[error("CPU error: {0}")]
    Cpu(#[from] CpuError),
    #[error("Invalid mount point: {0}")]
    InvalidMountPoint(String),
    #[error("ROMs not loaded: {0}")]
    RomsNotLoaded(String),
    #[error("Invalid save state: {0}")]
    InvalidState(String),
    #[error("Save state decode error: {0}")]
    StateDecode(#[from] serde_json::Error),
}

/// Register snapshot stored in save states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub status: u8,
    pub cycles: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SaveState {
    system: String,
    version: u32,
    region: Region,
    cpu: CpuState,
    ram: Vec<u8>,
}

/// Commodore 64 system
#[derive(Debug)]
pub struct C64System {
    cpu: Cpu6502<C64Bus>,
    config: C64Config,
    /// Load address of the mounted program image, if any.
    program: Option<u16>,
}

impl Default for C64System {
    fn default() -> Self {
        Self::new(C64Config::default())
    }
}

impl C64System {
    /// Create a machine with empty ROM slots.
    pub fn new(config: C64Config) -> Self {
        Self::with_rom_set(config, RomSet::default())
    }

    /// Create a machine from the three ROM images; PC comes from the kernal's reset vector.
    pub fn with_roms(
        config: C64Config,
        kernal: &[u8],
        basic: &[u8],
        char_rom: &[u8],
    ) -> Result<Self, C64Error> {
        let roms = RomSet::new(kernal, basic, char_rom)?;
        Ok(Self::with_rom_set(config, roms))
    }

    fn with_rom_set(config: C64Config, roms: RomSet) -> Self {
        let bus = C64Bus::new(roms, config.power_on_presets);
        Self {
            cpu: Cpu6502::new(bus),
            config,
            program: None,
        }
    }

    pub fn config(&self) -> &C64Config {
        &self.config
    }

    pub fn cpu(&self) -> &Cpu6502<C64Bus> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu6502<C64Bus> {
        &mut self.cpu
    }

    pub fn bus(&self) -> &C64Bus {
        &self.cpu.memory
    }

    pub fn bus_mut(&mut self) -> &mut C64Bus {
        &mut self.cpu.memory
    }

    pub fn cpu_state(&self) -> CpuState {
        let r = &self.cpu.regs;
        CpuState {
            pc: r.pc,
            a: r.a,
            x: r.x,
            y: r.y,
            sp: r.sp,
            status: r.status.bits(),
            cycles: self.cpu.cycles,
        }
    }

    /// Load address of the mounted program, if one was mounted.
    pub fn program_start(&self) -> Option<u16> {
        self.program
    }

    fn require_roms(&self) -> Result<(), C64Error> {
        let missing = self.bus().roms().missing();
        if missing.is_empty() {
            return Ok(());
        }
        let names: Vec<String> = missing.iter().map(|k| k.to_string()).collect();
        Err(C64Error::RomsNotLoaded(names.join(", ")))
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> Result<u32, C64Error> {
        Ok(self.cpu.step()?)
    }

    /// Run up to `max_steps` instructions from `start`.
    pub fn run(&mut self, start: u16, max_steps: u64) -> Result<u64, C64Error> {
        Ok(self.cpu.run(start, max_steps)?)
    }

    /// Run from `start` until `stop` says so.
    pub fn run_until<F>(&mut self, start: u16, stop: F) -> Result<u64, C64Error>
    where
        F: FnMut(&Cpu6502<C64Bus>) -> bool,
    {
        Ok(self.cpu.run_until(start, stop)?)
    }

    /// Copy a `[lo, hi, payload...]` image into RAM and return its load address.
    pub fn load_program(&mut self, image: &[u8]) -> Result<u16, C64Error> {
        let start = self.cpu.load_program(image)?;
        log(LogCategory::CPU, LogLevel::Info, || {
            format!(
                "C64: loaded {} byte(s) at ${:04X}",
                image.len() - 2,
                start
            )
        });
        Ok(start)
    }

    pub fn peek(&self, addr: u16) -> u8 {
        self.cpu.peek(addr)
    }

    pub fn poke(&mut self, addr: u16, val: u8) {
        self.cpu.poke(addr, val);
    }

    pub fn poke_bytes(&mut self, addr: u16, bytes: &[u8]) {
        self.cpu.poke_bytes(addr, bytes);
    }

    /// Trace-format disassembly of the instruction at `addr`.
    pub fn disassemble(&self, addr: u16) -> String {
        trace_line(self.bus(), addr)
    }

    /// Little-endian word as the CPU currently sees it.
    pub fn read_word(&self, addr: u16) -> u16 {
        self.bus().read_word(addr)
    }
}

impl System for C64System {
    type Error = C64Error;

    fn reset(&mut self) {
        self.cpu.memory.power_on(self.config.power_on_presets);
        self.cpu.reset();
        self.program = None;
    }

    fn run_frame(&mut self) -> Result<u64, Self::Error> {
        self.require_roms()?;
        let budget = self.config.region.cycles_per_frame();
        let mut executed = 0u64;
        while executed < budget {
            executed += self.cpu.step()? as u64;
        }
        Ok(executed)
    }

    fn save_state(&self) -> Value {
        serde_json::json!({
            "system": STATE_SYSTEM,
            "version": STATE_VERSION,
            "region": self.config.region,
            "cpu": self.cpu_state(),
            "ram": self.bus().ram(),
        })
    }

    fn load_state(&mut self, v: &Value) -> Result<(), Self::Error> {
        let state: SaveState = serde_json::from_value(v.clone())?;
        if state.system != STATE_SYSTEM {
            return Err(C64Error::InvalidState(format!(
                "state is for '{}', not '{}'",
                state.system, STATE_SYSTEM
            )));
        }
        if state.version != STATE_VERSION {
            return Err(C64Error::InvalidState(format!(
                "unsupported version {}",
                state.version
            )));
        }
        if state.ram.len() != 0x10000 {
            return Err(C64Error::InvalidState(format!(
                "RAM image is {} bytes, expected 65536",
                state.ram.len()
            )));
        }

        self.config.region = state.region;
        self.bus_mut().ram_mut().copy_from_slice(&state.ram);
        let regs = &mut self.cpu.regs;
        regs.pc = state.cpu.pc;
        regs.a = state.cpu.a;
        regs.x = state.cpu.x;
        regs.y = state.cpu.y;
        regs.sp = state.cpu.sp;
        regs.status = StatusFlags::from_bits(state.cpu.status);
        self.cpu.cycles = state.cpu.cycles;
        Ok(())
    }

    fn supports_save_states(&self) -> bool {
        true
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        let rom_slot = |kind: RomKind, name: &str| MountPointInfo {
            id: kind.mount_id().to_string(),
            name: name.to_string(),
            extensions: vec!["rom".to_string(), "bin".to_string()],
            required: true,
        };
        vec![
            rom_slot(RomKind::Kernal, "Kernal ROM"),
            rom_slot(RomKind::Basic, "BASIC ROM"),
            rom_slot(RomKind::CharRom, "Character ROM"),
            MountPointInfo {
                id: PROGRAM_MOUNT.to_string(),
                name: "Program".to_string(),
                extensions: vec!["prg".to_string()],
                required: false,
            },
        ]
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        if mount_point_id == PROGRAM_MOUNT {
            self.program = Some(self.load_program(data)?);
            return Ok(());
        }
        let kind = RomKind::from_mount_id(mount_point_id)
            .ok_or_else(|| C64Error::InvalidMountPoint(mount_point_id.to_string()))?;
        let rom = Rom::new(kind, data)?;
        self.bus_mut().set_rom(rom);
        if kind == RomKind::Kernal {
            // the reset vector just changed
            self.cpu.reset();
        }
        Ok(())
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        if mount_point_id == PROGRAM_MOUNT {
            self.program = None;
            return Ok(());
        }
        let kind = RomKind::from_mount_id(mount_point_id)
            .ok_or_else(|| C64Error::InvalidMountPoint(mount_point_id.to_string()))?;
        self.bus_mut().remove_rom(kind);
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        if mount_point_id == PROGRAM_MOUNT {
            return self.program.is_some();
        }
        RomKind::from_mount_id(mount_point_id)
            .map(|kind| self.bus().roms().get(kind).is_some())
            .unwrap_or(false)
    }
}
