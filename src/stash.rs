// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The client-side overflow buffer of plaintext blocks that could not (yet)
//! be placed back onto a path.

use crate::block::Block;
use crate::ProtocolError;

/// An unordered set of real (never dummy) plaintext blocks read off some
/// path but not yet re-evicted into a bucket.
#[derive(Debug, Default)]
pub struct Stash {
    blocks: Vec<Block>,
    capacity: Option<usize>,
}

impl Stash {
    /// A stash with no bound on size. The Path ORAM analysis guarantees the
    /// expected size stays `O(log N)` with exponentially decaying overflow
    /// probability; this is the mode spec.md describes as the default.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            capacity: None,
        }
    }

    /// A stash that raises [`ProtocolError::StashOverflow`] rather than
    /// growing past `capacity` blocks.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            blocks: Vec::new(),
            capacity: Some(capacity),
        }
    }

    /// Inserts a block read off a path. Never called with a dummy block;
    /// `read_path` filters those out before they reach the stash.
    pub fn insert(&mut self, block: Block) -> Result<(), ProtocolError> {
        debug_assert!(!block.is_dummy());
        if let Some(capacity) = self.capacity {
            if self.blocks.len() >= capacity {
                return Err(ProtocolError::StashOverflow(capacity));
            }
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Finds the block with the given id, optionally removing it.
    pub fn find(&mut self, id: i64, remove: bool) -> Option<Block> {
        let index = self.blocks.iter().position(|b| b.id == id)?;
        if remove {
            Some(self.blocks.remove(index))
        } else {
            Some(self.blocks[index])
        }
    }

    /// Replaces the data of an existing block with `id`, or inserts a new
    /// one if absent.
    pub fn upsert(&mut self, id: i64, data: [u8; crate::BLOCK_SIZE]) -> Result<(), ProtocolError> {
        if let Some(existing) = self.blocks.iter_mut().find(|b| b.id == id) {
            existing.data = data;
            return Ok(());
        }
        self.insert(Block::new(id, data))
    }

    /// Removes every block eligible for bucket `node`'s slots, up to `Z`
    /// of them, deciding eligibility via `is_eligible(block) -> bool`.
    /// Returns the removed blocks; the rest remain in the stash.
    pub fn take_eligible<F>(&mut self, z: usize, is_eligible: F) -> Vec<Block>
    where
        F: Fn(&Block) -> bool,
    {
        let mut taken = Vec::with_capacity(z);
        let mut remaining = Vec::with_capacity(self.blocks.len());

        for block in self.blocks.drain(..) {
            if taken.len() < z && is_eligible(&block) {
                taken.push(block);
            } else {
                remaining.push(block);
            }
        }

        self.blocks = remaining;
        log::trace!(
            "stash: scanned for eligible blocks, took {} of {} cap, {} remain",
            taken.len(),
            z,
            self.blocks.len()
        );
        taken
    }

    /// The number of blocks currently held (for tests and diagnostics).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if the stash holds no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
