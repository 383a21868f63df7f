// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! A client library and in-memory server model for Path ORAM.
//!
//! [`Server`] is the untrusted, passive half: a binary tree of fixed-capacity
//! buckets holding nothing but opaque ciphertext. [`Client`] is the trusted
//! half: it holds the only key, remaps each accessed block to a fresh random
//! leaf before any bucket I/O, and evicts its stash back onto the path using
//! greedy deepest-legal placement padded with encrypted dummies, so that the
//! sequence of bucket indices the server observes is independent of the
//! sequence of logical ids the caller accessed.

#![warn(clippy::cargo, clippy::doc_markdown, missing_docs, rustdoc::all)]

mod block;
mod bucket;
mod client;
mod crypto;
mod error;
mod position_map;
mod server;
mod stash;
mod tree;

#[cfg(test)]
mod test_utils;

pub use block::Block;
pub use bucket::Bucket;
pub use client::Client;
pub use error::ProtocolError;
pub use server::Server;

/// Blocks per bucket. Fixed at compile time, as in the source protocol.
pub const Z: usize = 4;

/// Payload size, in bytes, of every logical block.
pub const BLOCK_SIZE: usize = 4;

/// Size, in bytes, of the client's symmetric AEAD/HMAC key.
pub const KEY_SIZE: usize = 16;
