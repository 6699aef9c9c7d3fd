//! serial-check — standalone serial connectivity diagnostic.
//!
//! Opens the configured (or default) serial path at the fixed 9600 baud,
//! reports success or failure, closes it again, and prints every serial port
//! visible to the host.  No network interface, no long-running state: this
//! is a startup check an operator (or a wrapper script) runs before starting
//! the relay.
//!
//! # Exit codes
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Port opened and closed cleanly                      |
//! | 1    | The port could not be opened                        |
//! | 2    | Port enumeration (`available_ports`) itself failed  |
//!
//! Output is plain `println!` lines so a wrapper script can parse it.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serialport::SerialPortType;

use pace_relay::domain::BAUD_RATE;

/// Default probe target when neither `--device` nor `ARDUINO_PORT` is set.
///
/// `COM7` matches the original deployment machine; elsewhere the usual
/// Arduino CDC-ACM device node is probed.
#[cfg(windows)]
const DEFAULT_DEVICE: &str = "COM7";
#[cfg(not(windows))]
const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Standalone serial connectivity check for the track hardware.
#[derive(Debug, Parser)]
#[command(
    name = "serial-check",
    about = "Open the Arduino serial port, report the result, and list host ports",
    version
)]
struct Cli {
    /// Serial device path to probe.
    #[arg(long, env = "ARDUINO_PORT", default_value = DEFAULT_DEVICE)]
    device: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    println!("Trying to open port: {}", cli.device);

    let open_ok = match serialport::new(&cli.device, BAUD_RATE)
        .timeout(Duration::from_secs(1))
        .open()
    {
        Ok(port) => {
            println!("Port opened OK");
            // Closing is just dropping the handle; the OS releases the
            // device synchronously.
            drop(port);
            println!("Port closed OK");
            true
        }
        Err(e) => {
            eprintln!("OPEN ERROR: {e}");
            false
        }
    };

    // Enumeration runs regardless of the open outcome: a port that fails to
    // open may still (or may not) show up in the host list, and both facts
    // are useful when chasing cabling or driver problems.
    let list_ok = match serialport::available_ports() {
        Ok(ports) => {
            println!("=== available ports ===");
            if ports.is_empty() {
                println!("(none)");
            }
            for info in ports {
                println!("{}", describe_port(&info.port_name, &info.port_type));
            }
            true
        }
        Err(e) => {
            eprintln!("LIST ERROR: {e}");
            false
        }
    };

    ExitCode::from(resolve_exit(open_ok, list_ok))
}

/// Maps the two probe outcomes onto the diagnostic's exit-code contract:
/// 0 all good, 1 open failure, 2 enumeration failure.
///
/// An open failure takes precedence when both probes fail.
fn resolve_exit(open_ok: bool, list_ok: bool) -> u8 {
    match (open_ok, list_ok) {
        (true, true) => 0,
        (false, _) => 1,
        (true, false) => 2,
    }
}

/// One human-readable line for a discovered port.
fn describe_port(name: &str, port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("unknown device");
            format!(
                "{name}  [USB vid=0x{:04x} pid=0x{:04x}]  {product}",
                usb.vid, usb.pid
            )
        }
        SerialPortType::PciPort => format!("{name}  [PCI]"),
        SerialPortType::BluetoothPort => format!("{name}  [Bluetooth]"),
        SerialPortType::Unknown => format!("{name}  [unknown]"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
