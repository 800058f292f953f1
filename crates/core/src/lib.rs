//! Core emulator primitives and traits.

pub mod cpu_6502;
pub mod logging;

use serde_json::Value;

/// A CPU-like component that can be stepped; returns cycles consumed.
pub trait Cpu {
    type Error: std::error::Error + Send + Sync + 'static;

    fn reset(&mut self);
    fn step(&mut self) -> Result<u32, Self::Error>;
}

impl<M: cpu_6502::Memory6502> Cpu for cpu_6502::Cpu6502<M> {
    type Error = cpu_6502::CpuError;

    fn reset(&mut self) {
        cpu_6502::Cpu6502::reset(self);
    }

    fn step(&mut self) -> Result<u32, Self::Error> {
        cpu_6502::Cpu6502::step(self)
    }
}

/// Description of a mount point (media slot) that a system supports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPointInfo {
    /// Unique identifier for this mount point (e.g., "Kernal", "Program")
    pub id: String,
    /// User-friendly name for display (e.g., "Kernal ROM")
    pub name: String,
    /// File extensions accepted by this mount point (e.g., ["prg"])
    pub extensions: Vec<String>,
    /// Whether this mount point is required for the system to function
    pub required: bool,
}

/// A high-level System trait tying components together.
pub trait System {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reset to initial power-on state
    fn reset(&mut self);

    /// Run one display refresh worth of CPU time and return the cycles executed.
    fn run_frame(&mut self) -> Result<u64, Self::Error>;

    /// Return a JSON-serializable save state.
    /// Save states never include ROM data, only emulator state (CPU, RAM, ...).
    fn save_state(&self) -> Value;

    /// Load a JSON save state.
    fn load_state(&mut self, v: &Value) -> Result<(), Self::Error>;

    /// Check if this system supports save/load state functionality
    fn supports_save_states(&self) -> bool {
        false
    }

    /// Get the list of mount points this system supports
    fn mount_points(&self) -> Vec<MountPointInfo>;

    /// Load media into a specific mount point
    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Unload media from a specific mount point
    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error>;

    /// Check if a mount point has media loaded
    fn is_mounted(&self, mount_point_id: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpu_6502::{ArrayMemory, Cpu6502};

    struct MockSystem {
        mounted: bool,
    }

    impl System for MockSystem {
        type Error = std::convert::Infallible;

        fn reset(&mut self) {}

        fn run_frame(&mut self) -> Result<u64, Self::Error> {
            Ok(100)
        }

        fn save_state(&self) -> serde_json::Value {
            serde_json::json!({"mock": true, "version": 1})
        }

        fn load_state(&mut self, _v: &serde_json::Value) -> Result<(), Self::Error> {
            Ok(())
        }

        fn mount_points(&self) -> Vec<MountPointInfo> {
            vec![MountPointInfo {
                id: "test".to_string(),
                name: "Test Slot".to_string(),
                extensions: vec!["bin".to_string()],
                required: false,
            }]
        }

        fn mount(&mut self, _mount_point_id: &str, _data: &[u8]) -> Result<(), Self::Error> {
            self.mounted = true;
            Ok(())
        }

        fn unmount(&mut self, _mount_point_id: &str) -> Result<(), Self::Error> {
            self.mounted = false;
            Ok(())
        }

        fn is_mounted(&self, _mount_point_id: &str) -> bool {
            self.mounted
        }
    }

    #[test]
    fn mock_system_save_load_roundtrip() {
        let sys = MockSystem { mounted: false };
        let v = sys.save_state();
        let s = serde_json::to_string(&v).expect("serialize");
        let v2: serde_json::Value = serde_json::from_str(&s).expect("deserialize");
        let mut sys2 = MockSystem { mounted: false };
        assert!(sys2.load_state(&v2).is_ok());
        assert!(!sys2.supports_save_states());
    }

    #[test]
    fn test_system_mount_operations() {
        let mut sys = MockSystem { mounted: false };
        assert_eq!(sys.mount_points()[0].id, "test");
        assert!(!sys.is_mounted("test"));
        assert!(sys.mount("test", &[1, 2, 3]).is_ok());
        assert!(sys.is_mounted("test"));
        assert!(sys.unmount("test").is_ok());
        assert!(!sys.is_mounted("test"));
        assert_eq!(sys.run_frame(), Ok(100));
    }

    fn run_generic<C: Cpu>(cpu: &mut C, steps: usize) -> Result<u32, C::Error> {
        let mut total = 0;
        for _ in 0..steps {
            total += cpu.step()?;
        }
        Ok(total)
    }

    #[test]
    fn cpu_trait_drives_the_6502() {
        let mut mem = ArrayMemory::new();
        mem.load_at(0x0800, &[0xEA, 0xEA, 0x02]);
        let mut cpu = Cpu6502::new(mem);
        assert_eq!(run_generic(&mut cpu, 2), Ok(4));
        assert!(run_generic(&mut cpu, 1).is_err());
        Cpu::reset(&mut cpu);
        assert_eq!(cpu.pc(), 0x0800);
    }
}
