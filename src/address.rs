use std::collections::HashMap;
use crate::config::ID_BITS;
use crate::error::{MemoryError, Result};
use crate::graph::VarId;

/// Hands out virtual addresses for objects. An address is the configured
/// mask with the object id in the low bits, so allocation is a pure
/// function of the id; the reverse table only remembers which addresses
/// were actually handed out.
#[derive(Clone, Debug)]
pub struct AddressAllocator {
    mask: u32,
    reverse: HashMap<u32, VarId>,
}

const FLAG_MASK: u32 = !((1 << ID_BITS) - 1);

impl AddressAllocator {
    pub fn new(mask: u32) -> Self {
        AddressAllocator { mask, reverse: HashMap::new() }
    }
    pub fn mask(&self) -> u32 {
        self.mask
    }
    /// The address `id` would get, without recording an allocation.
    pub fn peek(&self, id: VarId) -> Result<u32> {
        if id.0 & FLAG_MASK != 0 {
            return Err(MemoryError::AddressSpaceExhausted(id));
        }
        Ok(self.mask | id.0)
    }
    pub fn address_of(&mut self, id: VarId) -> Result<u32> {
        let address = self.peek(id)?;
        self.reverse.entry(address).or_insert(id);
        Ok(address)
    }
    pub fn object_of(&self, address: i64) -> Result<VarId> {
        if !self.is_address(address) {
            return Err(MemoryError::UnmappedAddress(address));
        }
        self.reverse
            .get(&(address as u32))
            .copied()
            .ok_or(MemoryError::UnmappedAddress(address))
    }
    pub fn is_address(&self, value: i64) -> bool {
        value >= 0 && value <= u32::MAX as i64 && (value as u32) & FLAG_MASK == self.mask
    }
    pub fn allocated(&self) -> usize {
        self.reverse.len()
    }
}
