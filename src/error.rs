// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The error type shared by every fallible operation in this crate.

use thiserror::Error;

/// Errors produced by the client and server halves of the protocol.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// A construction parameter was out of range, e.g. `num_blocks == 0`.
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    /// A block id fell outside `0..num_blocks`.
    #[error("block id {0} is out of range")]
    InvalidId(i64),

    /// A `retrieve_data` or `delete_data` targeted an id with no stored block.
    #[error("block {0} is not stored")]
    NotFound(i64),

    /// An AEAD tag or inner MAC failed to verify.
    ///
    /// Callers inside `read_path` must treat this as "this slot held a dummy
    /// or foreign blob" and recover silently; it is never meant to propagate
    /// out of [`crate::client::Client`]'s public API.
    #[error("authentication failed while decrypting a bucket slot")]
    AuthFailure,

    /// A write-path eviction needed more than the configured stash capacity.
    #[error("stash overflowed its capacity of {0} blocks")]
    StashOverflow(usize),

    /// A ciphertext decrypted and authenticated correctly but held a
    /// plaintext of the wrong shape. Indicates key reuse across incompatible
    /// deployments; never caused by a valid key and a valid peer.
    #[error("internal error: malformed plaintext after successful decryption")]
    Internal,
}
