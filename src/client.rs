// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The trusted client: owns the key, the position map, and the stash, and
//! implements the Path ORAM access algorithm.

use rand::{rngs::ThreadRng, CryptoRng, RngCore};

use crate::block::Block;
use crate::crypto::{self, Key};
use crate::position_map::PositionMap;
use crate::server::Server;
use crate::stash::Stash;
use crate::tree::Tree;
use crate::{ProtocolError, BLOCK_SIZE, Z};

/// Which of the three public operations an [`access`](Client::access) call
/// is performing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Read,
    Write,
    Delete,
}

/// The trusted Path ORAM client. Owns the only copy of the secret key, the
/// position map, and the stash; `Server` holds only ciphertexts.
#[derive(Debug)]
pub struct Client<R: RngCore + CryptoRng = ThreadRng> {
    num_blocks: usize,
    tree: Tree,
    key: Key,
    position_map: PositionMap,
    stash: Stash,
    rng: R,
}

impl Client<ThreadRng> {
    /// Builds a client for `num_blocks` logical blocks, using the thread's
    /// default cryptographically secure RNG for leaf sampling and
    /// encryption randomness. The stash is unbounded.
    pub fn new(num_blocks: usize) -> Result<Self, ProtocolError> {
        Self::with_rng(num_blocks, rand::thread_rng())
    }

    /// Builds a client whose stash raises [`ProtocolError::StashOverflow`]
    /// rather than growing past `stash_capacity` blocks, using the thread's
    /// default cryptographically secure RNG.
    pub fn with_stash_capacity(
        num_blocks: usize,
        stash_capacity: usize,
    ) -> Result<Self, ProtocolError> {
        Self::with_rng_and_stash_capacity(num_blocks, rand::thread_rng(), stash_capacity)
    }
}

impl<R: RngCore + CryptoRng> Client<R> {
    /// Builds a client with an explicit randomness source, e.g. a seeded
    /// `StdRng` in tests. The stash is unbounded.
    pub fn with_rng(num_blocks: usize, rng: R) -> Result<Self, ProtocolError> {
        Self::new_internal(num_blocks, rng, Stash::new())
    }

    /// Builds a client with an explicit randomness source and a bounded
    /// stash that raises [`ProtocolError::StashOverflow`] rather than
    /// growing past `stash_capacity` blocks.
    pub fn with_rng_and_stash_capacity(
        num_blocks: usize,
        rng: R,
        stash_capacity: usize,
    ) -> Result<Self, ProtocolError> {
        Self::new_internal(num_blocks, rng, Stash::with_capacity(stash_capacity))
    }

    fn new_internal(num_blocks: usize, mut rng: R, stash: Stash) -> Result<Self, ProtocolError> {
        if num_blocks < 1 {
            return Err(ProtocolError::Config("num_blocks must be at least 1"));
        }
        if num_blocks as i64 >= crate::block::SERIALIZED_DUMMY_ID {
            return Err(ProtocolError::Config(
                "num_blocks must leave room for the reserved dummy id",
            ));
        }

        let tree = Tree::for_capacity(num_blocks);
        let position_map = PositionMap::new(num_blocks, &tree, &mut rng);
        let key = Key::generate(&mut rng);

        Ok(Self {
            num_blocks,
            tree,
            key,
            position_map,
            stash,
            rng,
        })
    }

    /// The number of logical blocks this client addresses.
    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Retrieves the data stored at `id`. Fails with
    /// [`ProtocolError::NotFound`] if `id` has never been stored (or was
    /// deleted).
    pub fn retrieve_data(
        &mut self,
        server: &mut Server,
        id: i64,
    ) -> Result<[u8; BLOCK_SIZE], ProtocolError> {
        self.check_id(id)?;
        self.access(server, id, Op::Read, None)?
            .ok_or(ProtocolError::NotFound(id))
    }

    /// Creates or overwrites the block at `id`.
    pub fn store_data(
        &mut self,
        server: &mut Server,
        id: i64,
        data: [u8; BLOCK_SIZE],
    ) -> Result<(), ProtocolError> {
        self.check_id(id)?;
        self.access(server, id, Op::Write, Some(data))?;
        Ok(())
    }

    /// Deletes the block at `id`. Fails with [`ProtocolError::NotFound`] if
    /// `id` is not currently stored.
    pub fn delete_data(&mut self, server: &mut Server, id: i64) -> Result<(), ProtocolError> {
        self.check_id(id)?;
        self.access(server, id, Op::Delete, None)?
            .ok_or(ProtocolError::NotFound(id))?;
        Ok(())
    }

    fn check_id(&self, id: i64) -> Result<(), ProtocolError> {
        if id < 0 || id as usize >= self.num_blocks {
            return Err(ProtocolError::InvalidId(id));
        }
        Ok(())
    }

    /// The single internal routine every public operation routes through.
    /// Returns `Some(data)` when a matching block existed going into step 4
    /// (for `Read`, its prior data; for `Delete`, the data that was
    /// removed); `None` when absent.
    fn access(
        &mut self,
        server: &mut Server,
        id: i64,
        op: Op,
        new_data: Option<[u8; BLOCK_SIZE]>,
    ) -> Result<Option<[u8; BLOCK_SIZE]>, ProtocolError> {
        if !server.is_initialized() {
            self.initialize_server(server)?;
        }

        // Step 1-2: look up the current leaf, then remap *before* any
        // bucket I/O so the leaf the server observes is already stale.
        let old_leaf = self.position_map.get(id)?;
        let new_leaf = self.tree.random_leaf(&mut self.rng);
        self.position_map.set(id, new_leaf)?;

        let path = self.tree.path(old_leaf);

        // Step 3: read the whole path into the stash.
        self.read_path(server, &path)?;

        // Step 4: locate and mutate the target block in the stash.
        let result = match op {
            Op::Read => self.stash.find(id, false).map(|b| b.data),
            Op::Write => {
                let data = new_data.expect("Op::Write always carries new_data");
                let existing = self.stash.find(id, false).map(|b| b.data);
                self.stash.upsert(id, data)?;
                existing
            }
            Op::Delete => self.stash.find(id, true).map(|b| b.data),
        };

        // Step 5: write the path back, deepest-legal placement, dummy-padded.
        self.write_path(server, &path)?;

        Ok(result)
    }

    fn read_path(&mut self, server: &mut Server, path: &[usize]) -> Result<(), ProtocolError> {
        for &node in path {
            let bucket = server.get_bucket(node)?;
            log::debug!("client: read_path node {node}");
            for ciphertext in bucket.blocks() {
                match crypto::decrypt(&self.key, ciphertext) {
                    Ok(plaintext) => match Block::deserialize(&plaintext) {
                        Ok(block) if !block.is_dummy() => self.stash.insert(block)?,
                        Ok(_) => {}
                        Err(_) => {
                            // Successfully authenticated but malformed: a
                            // sign of key reuse across deployments, not a
                            // dummy. Not swallowed, unlike AuthFailure.
                            return Err(ProtocolError::Internal);
                        }
                    },
                    Err(ProtocolError::AuthFailure) => continue,
                    Err(e) => return Err(e),
                }
            }
            server.get_bucket(node)?.clear();
        }
        Ok(())
    }

    fn write_path(&mut self, server: &mut Server, path: &[usize]) -> Result<(), ProtocolError> {
        for &node in path.iter().rev() {
            let position_map = &self.position_map;
            let tree = &self.tree;
            let taken = self.stash.take_eligible(Z, |block| {
                let leaf = position_map
                    .get(block.id)
                    .expect("blocks in the stash always have valid ids");
                tree.path(leaf).contains(&node)
            });

            let mut ciphertexts = Vec::with_capacity(Z);
            for block in taken {
                ciphertexts.push(crypto::encrypt(&self.key, &block.serialize()?, &mut self.rng)?);
            }
            while ciphertexts.len() < Z {
                let dummy = Block::dummy();
                ciphertexts.push(crypto::encrypt(&self.key, &dummy.serialize()?, &mut self.rng)?);
            }

            server.get_bucket(node)?.set_blocks(ciphertexts);
        }
        Ok(())
    }

    fn initialize_server(&mut self, server: &mut Server) -> Result<(), ProtocolError> {
        server.is_initialized = true;
        for node in 0..server.num_nodes() {
            let mut ciphertexts = Vec::with_capacity(Z);
            for _ in 0..Z {
                let dummy = Block::dummy();
                ciphertexts.push(crypto::encrypt(&self.key, &dummy.serialize()?, &mut self.rng)?);
            }
            server.get_bucket(node)?.set_blocks(ciphertexts);
        }
        Ok(())
    }
}
