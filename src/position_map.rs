// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The client-side mapping from block id to the leaf it currently resides
//! under.

use rand::{CryptoRng, RngCore};

use crate::tree::{Leaf, Tree};
use crate::ProtocolError;

/// Maps each block id in `0..num_blocks` to a leaf. Initialized to
/// independent uniform random leaves at construction; every access remaps
/// the touched id to a fresh leaf before any bucket I/O happens.
#[derive(Debug)]
pub struct PositionMap {
    leaves: Vec<Leaf>,
}

impl PositionMap {
    /// Builds a position map with one independently random leaf per id in
    /// `0..num_blocks`.
    pub fn new<R: RngCore + CryptoRng>(num_blocks: usize, tree: &Tree, rng: &mut R) -> Self {
        let leaves = (0..num_blocks).map(|_| tree.random_leaf(rng)).collect();
        Self { leaves }
    }

    /// The leaf currently assigned to `id`.
    pub fn get(&self, id: i64) -> Result<Leaf, ProtocolError> {
        self.leaves
            .get(id as usize)
            .copied()
            .ok_or(ProtocolError::InvalidId(id))
    }

    /// Reassigns `id` to `leaf`, returning the previous assignment.
    pub fn set(&mut self, id: i64, leaf: Leaf) -> Result<Leaf, ProtocolError> {
        let slot = self
            .leaves
            .get_mut(id as usize)
            .ok_or(ProtocolError::InvalidId(id))?;
        let previous = *slot;
        *slot = leaf;
        log::trace!("position_map: remap id {id}: leaf {previous} -> {leaf}");
        Ok(previous)
    }

    /// The number of ids this map covers.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// True if this map covers no ids (never true for a validly constructed
    /// [`crate::client::Client`], whose `num_blocks >= 1`).
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}
