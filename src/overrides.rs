//! Operator overrides: pin and exclude sets layered over the allocator's
//! threshold decision.
//!
//! The override set persists across re-allocation runs within a session and
//! is cleared only by a session reset. Precedence rule: a pin established
//! before an exclusion survives it (the device stays in the working matrix),
//! but a new pin on an already-excluded device is rejected.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::device::{AllocatedDevice, DeviceKey};
use crate::errors::MatrixError;

/// Pinned and excluded device keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideSet {
    pinned: BTreeSet<DeviceKey>,
    excluded: BTreeSet<DeviceKey>,
}

impl OverrideSet {
    /// Force `key` into the working matrix. Rejected while `key` is
    /// excluded; the set is left untouched in that case.
    pub fn pin(&mut self, key: DeviceKey) -> Result<(), MatrixError> {
        if self.excluded.contains(&key) {
            return Err(MatrixError::PinRejected { key });
        }
        self.pinned.insert(key);
        Ok(())
    }

    pub fn unpin(&mut self, key: &DeviceKey) {
        self.pinned.remove(key);
    }

    /// Remove `key` from the working matrix. Always succeeds, even for a
    /// pinned device; the pin is kept and takes precedence at assembly.
    pub fn exclude(&mut self, key: DeviceKey) {
        if self.pinned.contains(&key) {
            debug!(%key, "excluding a pinned device; pin takes precedence");
        }
        self.excluded.insert(key);
    }

    pub fn unexclude(&mut self, key: &DeviceKey) {
        self.excluded.remove(key);
    }

    pub fn is_pinned(&self, key: &DeviceKey) -> bool {
        self.pinned.contains(key)
    }

    pub fn is_excluded(&self, key: &DeviceKey) -> bool {
        self.excluded.contains(key)
    }

    pub fn pinned(&self) -> impl Iterator<Item = &DeviceKey> {
        self.pinned.iter()
    }

    pub fn excluded(&self) -> impl Iterator<Item = &DeviceKey> {
        self.excluded.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty() && self.excluded.is_empty()
    }

    pub fn clear(&mut self) {
        self.pinned.clear();
        self.excluded.clear();
    }
}

/// Assemble the working matrix from an allocated sequence and the override
/// set.
///
/// Pinned devices come first, in allocator rank order, regardless of their
/// threshold decision or exclusion. The remainder is every device the
/// threshold admitted that is neither excluded nor already placed, still in
/// rank order. Keys are never repeated.
pub fn reconcile(allocated: &[AllocatedDevice], overrides: &OverrideSet) -> Vec<AllocatedDevice> {
    let mut working = Vec::with_capacity(allocated.len());
    let mut placed: BTreeSet<DeviceKey> = BTreeSet::new();

    for device in allocated {
        let key = device.key();
        if overrides.is_pinned(&key) && placed.insert(key) {
            working.push(device.clone());
        }
    }
    for device in allocated {
        let key = device.key();
        if device.include_in_matrix && !overrides.is_excluded(&key) && placed.insert(key) {
            working.push(device.clone());
        }
    }

    working
}
