//! Line-oriented memory monitor.
//!
//! ```text
//! m <addr>   byte at addr
//! M <addr>   little-endian word at addr
//! x          leave the monitor
//! ```
//!
//! Addresses are decimal or `$`-prefixed hex. Output lines read
//! `m(<decimal addr>) = <decimal value> $<hex value>`.

use std::io::{self, BufRead, Write};

use emu_core::cpu_6502::Memory6502;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    Byte(u16),
    Word(u16),
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing address")]
    MissingAddress,
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
}

/// Parse `$c000` or `49152`.
pub fn parse_address(s: &str) -> Result<u16, MonitorError> {
    let parsed = match s.strip_prefix('$') {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|_| MonitorError::InvalidAddress(s.to_string()))
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<MonitorCommand>, MonitorError> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(None);
    };
    let mut address = || -> Result<u16, MonitorError> {
        words
            .next()
            .ok_or(MonitorError::MissingAddress)
            .and_then(parse_address)
    };
    let command = match cmd {
        "x" => MonitorCommand::Exit,
        "m" => MonitorCommand::Byte(address()?),
        "M" => MonitorCommand::Word(address()?),
        other => return Err(MonitorError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

/// Render the answer to a query command; `Exit` has none.
pub fn execute<M: Memory6502 + ?Sized>(command: MonitorCommand, bus: &M) -> Option<String> {
    let (addr, value) = match command {
        MonitorCommand::Byte(addr) => (addr, bus.peek(addr) as u16),
        MonitorCommand::Word(addr) => {
            let lo = bus.peek(addr) as u16;
            let hi = bus.peek(addr.wrapping_add(1)) as u16;
            (addr, (hi << 8) | lo)
        }
        MonitorCommand::Exit => return None,
    };
    Some(format!("m({}) = {} ${:x}", addr, value, value))
}

/// Serve monitor commands from `input` until `x` or end of input.
///
/// Malformed lines are answered with `? <reason>` and the session continues.
pub fn run_session<M, R, W>(bus: &M, input: R, mut output: W) -> io::Result<()>
where
    M: Memory6502 + ?Sized,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(command)) => match execute(command, bus) {
                Some(answer) => writeln!(output, "{}", answer)?,
                None => break,
            },
            Err(err) => writeln!(output, "? {}", err)?,
        }
    }
    output.flush()
}
