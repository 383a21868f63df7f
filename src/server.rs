// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The untrusted, passive storage half of the protocol: a full binary tree
//! of fixed-capacity buckets with a single operation, `get_bucket`.

use crate::bucket::Bucket;
use crate::tree::Tree;
use crate::ProtocolError;

/// A passive byte array modeled as a tree of buckets. Holds no keys and
/// performs no decryption; every ciphertext it stores is opaque to it.
#[derive(Debug)]
pub struct Server {
    tree: Tree,
    buckets: Vec<Bucket>,
    /// Set by the client on first access, per spec.md's server state
    /// machine: `Uninitialized -> (first access) -> Initialized`, with no
    /// transition back.
    pub(crate) is_initialized: bool,
}

impl Server {
    /// Builds a server sized for `num_blocks` logical blocks. Buckets start
    /// uninitialized (empty); the client fills them with encrypted dummies
    /// on its first access.
    pub fn new(num_blocks: usize) -> Result<Self, ProtocolError> {
        if num_blocks < 1 {
            return Err(ProtocolError::Config("num_blocks must be at least 1"));
        }
        let tree = Tree::for_capacity(num_blocks);
        let buckets = (0..tree.num_nodes).map(|_| Bucket::new()).collect();
        Ok(Self {
            tree,
            buckets,
            is_initialized: false,
        })
    }

    /// The tree shape backing this server.
    pub fn tree(&self) -> Tree {
        self.tree
    }

    /// True once the client has filled every bucket with dummies.
    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    /// Mutable access to the bucket at node index `index`. The server
    /// performs no validation beyond bounds checking.
    pub fn get_bucket(&mut self, index: usize) -> Result<&mut Bucket, ProtocolError> {
        log::trace!("server: get_bucket({index})");
        self.buckets.get_mut(index).ok_or(ProtocolError::Internal)
    }

    /// The number of nodes (`2 * num_leaves - 1`) in the bucket tree.
    pub fn num_nodes(&self) -> usize {
        self.tree.num_nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized_with_empty_buckets() {
        let mut server = Server::new(16).unwrap();
        assert!(!server.is_initialized());
        for i in 0..server.num_nodes() {
            assert!(server.get_bucket(i).unwrap().blocks().is_empty());
        }
    }

    #[test]
    fn out_of_bounds_bucket_is_rejected() {
        let mut server = Server::new(16).unwrap();
        let n = server.num_nodes();
        assert_eq!(server.get_bucket(n), Err(ProtocolError::Internal));
    }

    #[test]
    fn rejects_zero_capacity() {
        assert!(Server::new(0).is_err());
    }

    #[test]
    fn single_block_server_has_a_single_root_bucket() {
        let server = Server::new(1).unwrap();
        assert_eq!(server.num_nodes(), 1);
    }
}
