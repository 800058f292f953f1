use anyhow::{bail, Context, Result};
use clap::Parser;
use emu_c64::{monitor, C64Config, C64Error, C64System, Region};
use emu_core::cpu_6502::Registers;
use emu_core::logging::{LogCategory, LogConfig, LogLevel, UNLIMITED};
use emu_core::System;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Steps executed when neither --steps nor --frames is given.
const DEFAULT_STEPS: u64 = 100_000;

#[derive(Parser)]
#[command(name = "emu_cli", about = "Headless Commodore 64 CPU runner")]
struct Args {
    /// Kernal ROM image (8 KiB)
    #[arg(long)]
    kernal: PathBuf,

    /// BASIC ROM image (8 KiB)
    #[arg(long)]
    basic: PathBuf,

    /// Character ROM image (4 KiB)
    #[arg(long)]
    chargen: PathBuf,

    /// Program image: 2-byte little-endian load address followed by data
    #[arg(long)]
    prg: Option<PathBuf>,

    /// Video region: "pal" or "ntsc" (overrides --config)
    #[arg(long, value_parser = parse_region)]
    region: Option<Region>,

    /// Machine configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of instructions to execute
    #[arg(long, conflicts_with = "frames")]
    steps: Option<u64>,

    /// Number of frames to run
    #[arg(long)]
    frames: Option<u32>,

    /// Start address, decimal or $-prefixed hex (default: reset vector)
    #[arg(long, value_parser = parse_start)]
    start: Option<u16>,

    /// Log every executed instruction
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Dump save-state to this file as JSON
    #[arg(long)]
    save: Option<PathBuf>,

    /// Enter the memory monitor on stdin after the run
    #[arg(long, default_value_t = false)]
    monitor: bool,

    /// Level for all categories
    #[arg(long, value_parser = parse_level)]
    log_level: Option<LogLevel>,

    /// Level for CPU messages
    #[arg(long, value_parser = parse_level)]
    log_cpu: Option<LogLevel>,

    /// Level for bus messages
    #[arg(long, value_parser = parse_level)]
    log_bus: Option<LogLevel>,

    /// Write emulator logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn parse_region(s: &str) -> Result<Region, String> {
    Region::parse(s).ok_or_else(|| format!("unknown region '{}' (expected pal or ntsc)", s))
}

fn parse_start(s: &str) -> Result<u16, String> {
    monitor::parse_address(s).map_err(|e| e.to_string())
}

fn parse_level(s: &str) -> Result<LogLevel, String> {
    s.parse()
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    if let Some(level) = args.log_level {
        config.set_global_level(level);
    }
    if let Some(level) = args.log_cpu {
        config.set_level(LogCategory::CPU, level);
    }
    if let Some(level) = args.log_bus {
        config.set_level(LogCategory::Bus, level);
    }
    if args.trace {
        config.set_level(LogCategory::CPU, LogLevel::Trace);
        config.set_rate_limit(UNLIMITED);
    }
    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }
    Ok(())
}

fn machine_config(args: &Args) -> Result<C64Config> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            C64Config::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => C64Config::default(),
    };
    if let Some(region) = args.region {
        config.region = region;
    }
    Ok(config)
}

fn read_image(path: &Path, what: &str) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {} image {}", what, path.display()))
}

/// `NV-BDIZC` with cleared flags shown as `.`.
fn flags_string(status: u8) -> String {
    "NV-BDIZC"
        .chars()
        .enumerate()
        .map(|(i, c)| if status & (0x80 >> i) != 0 { c } else { '.' })
        .collect()
}

fn summary(regs: &Registers, cycles: u64) -> String {
    let p = regs.status.bits();
    format!(
        "PC={:04X} A={:02X} X={:02X} Y={:02X} SP={:02X} P={:02X} [{}] cycles={}",
        regs.pc,
        regs.a,
        regs.x,
        regs.y,
        regs.sp,
        p,
        flags_string(p),
        cycles
    )
}

/// Run the machine; an illegal opcode ends the run but still leaves a usable state.
fn run(sys: &mut C64System, args: &Args, start: u16) -> Result<()> {
    let outcome = match args.frames {
        Some(frames) => {
            sys.cpu_mut().set_pc(start);
            (0..frames).try_for_each(|_| sys.run_frame().map(|_| ()))
        }
        None => sys
            .run(start, args.steps.unwrap_or(DEFAULT_STEPS))
            .map(|_| ()),
    };
    match outcome {
        Ok(()) => Ok(()),
        Err(C64Error::Cpu(err)) => {
            log::warn!("execution stopped: {}", err);
            println!("stopped: {}", err);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.frames == Some(0) || args.steps == Some(0) {
        bail!("--steps and --frames must be greater than zero");
    }

    configure_logging(&args)?;
    let config = machine_config(&args)?;

    let kernal = read_image(&args.kernal, "kernal")?;
    let basic = read_image(&args.basic, "BASIC")?;
    let chargen = read_image(&args.chargen, "character")?;
    let mut sys = C64System::with_roms(config, &kernal, &basic, &chargen)?;
    log::info!("C64 ready, region {:?}", config.region);

    if let Some(path) = &args.prg {
        let image = read_image(path, "program")?;
        sys.mount("Program", &image)?;
    }

    let start = args.start.unwrap_or_else(|| sys.cpu().pc());
    log::info!("Starting at ${:04X}", start);

    run(&mut sys, &args, start)?;
    println!("{}", summary(&sys.cpu().regs, sys.cpu().cycles));

    if let Some(path) = &args.save {
        let state = sys.save_state();
        let mut file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write!(file, "{}", serde_json::to_string_pretty(&state)?)?;
        log::info!("Saved state to {}", path.display());
    }

    if args.monitor {
        let stdin = io::stdin();
        monitor::run_session(sys.bus(), stdin.lock(), io::stdout().lock())?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_render_in_register_order() {
        assert_eq!(flags_string(0x24), "..-..I..");
        assert_eq!(flags_string(0xFF), "NV-BDIZC");
        assert_eq!(flags_string(0xA3), "N.-...ZC");
    }

    #[test]
    fn start_address_accepts_monitor_syntax() {
        assert_eq!(parse_start("$C000"), Ok(0xC000));
        assert_eq!(parse_start("2049"), Ok(0x0801));
        assert!(parse_start("$10000").is_err());
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "emu_cli", "--kernal", "k.bin", "--basic", "b.bin", "--chargen", "c.bin",
            "--region", "ntsc", "--steps", "10", "--start", "$c000", "--log-cpu", "debug",
        ])
        .unwrap();
        assert_eq!(args.region, Some(Region::Ntsc));
        assert_eq!(args.steps, Some(10));
        assert_eq!(args.start, Some(0xC000));
        assert_eq!(args.log_cpu, Some(LogLevel::Debug));
        assert!(!args.trace);
    }

    #[test]
    fn steps_and_frames_conflict() {
        let res = Args::try_parse_from([
            "emu_cli", "--kernal", "k", "--basic", "b", "--chargen", "c", "--steps", "1",
            "--frames", "1",
        ]);
        assert!(res.is_err());
    }
}
