use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SYSFS_HIDRAW_ROOT: &str = "/sys/class/hidraw";
pub const DEV_ROOT: &str = "/dev";

/// USB ids of the PS2 to USB adapter the layout was taken from.
pub const DEFAULT_VENDOR_ID: u16 = 0x0810;
pub const DEFAULT_PRODUCT_ID: u16 = 0x0003;

// Discovery errors
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("No hidraw device found for {id}")]
    NotFound { id: DeviceId },

    #[error("Failed to scan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid device id: {0}")]
    InvalidId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for DeviceId {
    fn default() -> Self {
        Self {
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

/// Parse a 16-bit id written as `0810`, `0x0810` or `0X0810`.
pub fn parse_hex_id(value: &str) -> Result<u16, DiscoveryError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u16::from_str_radix(digits, 16).map_err(|_| DiscoveryError::InvalidId(value.to_string()))
}

/// Pull vendor and product id out of a `HID_ID=bus:vendor:product` uevent line.
fn parse_hid_id(uevent: &str) -> Option<DeviceId> {
    let line = uevent.lines().find_map(|l| l.strip_prefix("HID_ID="))?;
    let mut parts = line.trim().split(':');
    let _bus = parts.next()?;
    let vendor = u32::from_str_radix(parts.next()?, 16).ok()?;
    let product = u32::from_str_radix(parts.next()?, 16).ok()?;
    Some(DeviceId {
        vendor_id: u16::try_from(vendor).ok()?,
        product_id: u16::try_from(product).ok()?,
    })
}

/// Find the device node of the first hidraw interface matching `id`.
///
/// `sysfs_root` is normally [`SYSFS_HIDRAW_ROOT`] and `dev_root` [`DEV_ROOT`].
/// Nodes are visited in name order so the result is stable across calls.
pub fn find_hidraw(
    sysfs_root: &Path,
    dev_root: &Path,
    id: DeviceId,
) -> Result<PathBuf, DiscoveryError> {
    debug!("Scanning {} for {}", sysfs_root.display(), id);

    let entries = fs::read_dir(sysfs_root).map_err(|source| DiscoveryError::Io {
        path: sysfs_root.to_path_buf(),
        source,
    })?;

    let mut nodes: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("hidraw"))
        .collect();
    nodes.sort();

    for node in nodes {
        let uevent_path = sysfs_root.join(&node).join("device").join("uevent");
        let uevent = match fs::read_to_string(&uevent_path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {}", uevent_path.display(), e);
                continue;
            }
        };

        match parse_hid_id(&uevent) {
            Some(found) if found == id => {
                let path = dev_root.join(&node);
                info!("Found {} at {}", id, path.display());
                return Ok(path);
            }
            Some(found) => debug!("{} is {}, not a match", node, found),
            None => debug!("{} has no usable HID_ID", node),
        }
    }

    Err(DiscoveryError::NotFound { id })
}
