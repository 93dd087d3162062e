use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::controller::device_discovery::parse_hex_id;

fn hex_id(value: &str) -> Result<u16, String> {
    parse_hex_id(value).map_err(|e| e.to_string())
}

/// Read a PS2 gamepad through a USB adapter and show thrust/steering values.
#[derive(Parser, Debug, Default)]
#[command(name = "padpilot", version, about)]
pub struct Cli {
    /// Config file (defaults to <config dir>/padpilot/config.toml)
    #[arg(short, long, env = "PADPILOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Read this device node instead of searching for one
    #[arg(short, long)]
    pub device: Option<PathBuf>,

    /// USB vendor id to search for, hex
    #[arg(long, value_parser = hex_id)]
    pub vendor_id: Option<u16>,

    /// USB product id to search for, hex
    #[arg(long, value_parser = hex_id)]
    pub product_id: Option<u16>,

    /// Pause between samples
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Show the raw frame bytes
    #[arg(long)]
    pub raw: bool,

    /// Hide the raw frame bytes
    #[arg(long, conflicts_with = "raw")]
    pub no_raw: bool,

    /// Scroll output instead of redrawing
    #[arg(long)]
    pub no_clear: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Flags win over the config file.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.device.path = Some(device.clone());
        }
        if let Some(vendor_id) = self.vendor_id {
            config.device.vendor_id = vendor_id;
        }
        if let Some(product_id) = self.product_id {
            config.device.product_id = product_id;
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            config.sampling.poll_interval_ms = poll_interval_ms;
        }
        if self.raw {
            config.display.show_raw = true;
        }
        if self.no_raw {
            config.display.show_raw = false;
        }
        if self.no_clear {
            config.display.clear_screen = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "padpilot",
            "--vendor-id",
            "0x054c",
            "--product-id",
            "0268",
            "--poll-interval-ms",
            "10",
            "--no-raw",
            "--no-clear",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_to(&mut config);
        assert_eq!(config.device.vendor_id, 0x054c);
        assert_eq!(config.device.product_id, 0x0268);
        assert_eq!(config.sampling.poll_interval_ms, 10);
        assert!(!config.display.show_raw);
        assert!(!config.display.clear_screen);
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["padpilot"]).unwrap();
        let mut config = Config::default();
        config.device.path = Some(PathBuf::from("/dev/hidraw2"));
        cli.apply_to(&mut config);
        assert_eq!(config.device.path, Some(PathBuf::from("/dev/hidraw2")));
        assert!(config.display.show_raw);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(Cli::try_parse_from(["padpilot", "--vendor-id", "zz"]).is_err());
    }
}
