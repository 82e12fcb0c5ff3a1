use serde::Deserialize;
use crate::error::{MemoryError, Result};

pub const DEFAULT_ADDRESS_MASK: u32 = 0x7f00_0000;
/// Bits of an address that carry the object id.
pub const ID_BITS: u32 = 24;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// High byte shared by every virtual address.
    pub address_mask: u32,
    pub label_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address_mask: DEFAULT_ADDRESS_MASK,
            label_width: 25,
        }
    }
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| MemoryError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<()> {
        if self.address_mask == 0 {
            return Err(MemoryError::InvalidConfig("address_mask must be non-zero".to_string()));
        }
        if self.address_mask & ((1 << ID_BITS) - 1) != 0 {
            return Err(MemoryError::InvalidConfig(
                format!("address_mask {:#x} overlaps the low {} id bits", self.address_mask, ID_BITS)));
        }
        Ok(())
    }
}
