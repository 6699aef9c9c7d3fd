//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments (with environment-variable
//! fallbacks) and then shared read-only across the connection tasks.
//!
//! Keeping configuration as a plain struct — no global state, no environment
//! variable reads inside the domain — means the infrastructure layer owns
//! all the messy env/CLI plumbing and the rest of the relay just reads
//! fields.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Serial baud rate for the Arduino link.
///
/// Fixed, not configurable: the track firmware is flashed with
/// `Serial.begin(9600)` and both the relay and the `serial-check` diagnostic
/// must match it.
pub const BAUD_RATE: u32 = 9600;

/// All runtime configuration for the relay server.
///
/// Built once at startup and never mutated afterwards; the channel selection
/// in particular happens exactly once, at construction time.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The address and port the combined HTTP/WebSocket listener binds to.
    ///
    /// The control page and the real-time command channel share this one
    /// port, so a browser only ever needs `http://host:3000`.
    pub bind_addr: SocketAddr,

    /// The configured serial device path, exactly as supplied
    /// (`--device` / `ARDUINO_PORT`), or `None` when unset.
    ///
    /// Prefer [`RelayConfig::device`] when deciding the operating mode — it
    /// applies the present-and-non-empty rule.
    pub device_path: Option<String>,

    /// Path of the control page served to every HTTP request.
    ///
    /// The file is read into memory once at startup; editing it while the
    /// relay runs has no effect.
    pub page_path: PathBuf,
}

impl RelayConfig {
    /// The normalized device path, or `None` in simulation mode.
    ///
    /// The selection rule is "present and non-empty": `ARDUINO_PORT=""`
    /// selects simulation exactly like an unset variable, so an operator can
    /// blank the variable instead of unsetting it.
    pub fn device(&self) -> Option<&str> {
        self.device_path.as_deref().filter(|p| !p.is_empty())
    }
}

impl Default for RelayConfig {
    /// Returns a `RelayConfig` suitable for local development: listen on
    /// port 3000, simulation mode, `index.html` from the working directory.
    fn default() -> Self {
        Self {
            // Safe: a compile-time-known valid socket address string.
            bind_addr: "0.0.0.0:3000".parse().unwrap(),
            device_path: None,
            page_path: PathBuf::from("index.html"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_3000() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.bind_addr.port(), 3000);
    }

    #[test]
    fn test_default_is_simulation_mode() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.device(), None);
    }

    #[test]
    fn test_default_page_path() {
        let cfg = RelayConfig::default();
        assert_eq!(cfg.page_path, PathBuf::from("index.html"));
    }

    #[test]
    fn test_device_absent_selects_simulation() {
        let cfg = RelayConfig {
            device_path: None,
            ..RelayConfig::default()
        };
        assert_eq!(cfg.device(), None);
    }

    #[test]
    fn test_device_empty_string_selects_simulation() {
        // ARDUINO_PORT="" must behave exactly like an unset variable.
        let cfg = RelayConfig {
            device_path: Some(String::new()),
            ..RelayConfig::default()
        };
        assert_eq!(cfg.device(), None);
    }

    #[test]
    fn test_device_present_selects_real_mode() {
        let cfg = RelayConfig {
            device_path: Some("/dev/ttyACM0".to_string()),
            ..RelayConfig::default()
        };
        assert_eq!(cfg.device(), Some("/dev/ttyACM0"));
    }

    #[test]
    fn test_baud_rate_is_fixed_at_9600() {
        // The firmware side is flashed at 9600; this constant must not drift.
        assert_eq!(BAUD_RATE, 9600);
    }

    #[test]
    fn test_config_can_be_cloned() {
        // Cloneability is required so the config can be shared across
        // connection tasks.
        let cfg = RelayConfig::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.bind_addr, cloned.bind_addr);
        assert_eq!(cfg.page_path, cloned.page_path);
    }
}
