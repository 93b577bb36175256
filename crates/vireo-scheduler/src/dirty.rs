// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lock-free accumulation of scene dirty state.

use std::sync::atomic::{AtomicU64, Ordering};
use vireo_core::DirtyFlags;

/// Bits marked since the last snapshot live in the upper half.
const MARKED_SHIFT: u32 = 32;
const DIRTY_MASK: u64 = u32::MAX as u64;

/// Accumulates [`DirtyFlags`] between consumed frames.
///
/// Producers call [`mark_dirty`](Self::mark_dirty) from any thread through a
/// shared `Arc`; the scheduler takes a [`snapshot`](Self::snapshot) per built
/// frame and clears it with [`clear_consumed`](Self::clear_consumed) once the
/// frame has run. The accumulated set and the set marked since the last
/// snapshot share one atomic word, so every update is a single
/// read-modify-write and a mark racing a clear is never lost.
#[derive(Debug, Default)]
pub struct DirtyStateTracker {
    state: AtomicU64,
}

fn both_halves(flags: DirtyFlags) -> u64 {
    let bits = u64::from(flags.bits());
    bits | (bits << MARKED_SHIFT)
}

impl DirtyStateTracker {
    /// Creates a tracker with no flags set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker with `flags` already set.
    pub fn with_flags(flags: DirtyFlags) -> Self {
        Self {
            state: AtomicU64::new(both_halves(flags)),
        }
    }

    /// ORs `flags` into the accumulated set. Idempotent.
    pub fn mark_dirty(&self, flags: DirtyFlags) {
        let previous = self.state.fetch_or(both_halves(flags), Ordering::AcqRel);
        log::trace!(
            "mark_dirty {:?} (was {:?})",
            flags,
            DirtyFlags::from_bits_retain((previous & DIRTY_MASK) as u32)
        );
    }

    /// The accumulated set. Does not clear anything.
    pub fn dirty_flags(&self) -> DirtyFlags {
        DirtyFlags::from_bits_retain((self.state.load(Ordering::Acquire) & DIRTY_MASK) as u32)
    }

    /// Flags marked since the last [`snapshot`](Self::snapshot).
    pub fn marked_since_snapshot(&self) -> DirtyFlags {
        DirtyFlags::from_bits_retain((self.state.load(Ordering::Acquire) >> MARKED_SHIFT) as u32)
    }

    /// Reads the accumulated set for a frame about to be built and starts
    /// tracking marks made from now on.
    ///
    /// The accumulated set itself is left untouched.
    pub fn snapshot(&self) -> DirtyFlags {
        let previous = self.state.fetch_and(DIRTY_MASK, Ordering::AcqRel);
        DirtyFlags::from_bits_retain((previous & DIRTY_MASK) as u32)
    }

    /// Clears exactly the bits in `mask`.
    ///
    /// A mask containing [`DirtyFlags::ALL`] clears every bit.
    pub fn clear_dirty_bits(&self, mask: DirtyFlags) {
        if mask.contains(DirtyFlags::ALL) {
            self.state.store(0, Ordering::Release);
        } else {
            self.state.fetch_and(!both_halves(mask), Ordering::AcqRel);
        }
    }

    /// Clears the bits of a consumed snapshot, except those marked again
    /// since the snapshot was taken.
    ///
    /// Unlike [`clear_dirty_bits`](Self::clear_dirty_bits), `ALL` in the
    /// snapshot only clears the `ALL` bit itself. Assumes one frame in flight:
    /// a newer snapshot restarts the tracking of re-marked bits.
    pub fn clear_consumed(&self, snapshot: DirtyFlags) {
        let consumed = u64::from(snapshot.bits());
        // The closure always returns Some, so the update cannot fail.
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let remarked = state >> MARKED_SHIFT;
                Some(state & !(consumed & !remarked))
            });
    }
}
