// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is dual-licensed under either the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree or the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree. You may select, at your option, one of the above-listed licenses.

//! The plaintext unit of storage: a block id plus a fixed-size payload.

use crate::{ProtocolError, BLOCK_SIZE};

/// Width, in ASCII decimal digits, of a serialized block id.
const ID_WIDTH: usize = 8;

/// The on-wire id written for a dummy block.
///
/// `spec.md` flags the naive approach of serializing the in-memory sentinel
/// `-1` with an `{:08}`-style decimal format as producing `"-0000001"`,
/// which wastes a digit on the sign and is easy to get wrong across
/// languages. We instead reserve the largest value representable in an
/// `ID_WIDTH`-digit unsigned field and require real ids to stay below it;
/// `Client` enforces `num_blocks <= SERIALIZED_DUMMY_ID` at construction.
pub(crate) const SERIALIZED_DUMMY_ID: i64 = 99_999_999;

/// The in-memory sentinel id identifying a dummy block. Never a valid real
/// block id, and never present in the stash (spec.md section 3: "The stash
/// must never contain a block with the dummy sentinel id").
pub const DUMMY_ID: i64 = -1;

/// A plaintext record: a block id and its fixed-length payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Non-negative for real blocks; [`DUMMY_ID`] for dummies.
    pub id: i64,
    /// The payload, exactly `BLOCK_SIZE` bytes.
    pub data: [u8; BLOCK_SIZE],
}

impl Block {
    /// Builds a real block with the given id and payload.
    pub fn new(id: i64, data: [u8; BLOCK_SIZE]) -> Self {
        Self { id, data }
    }

    /// Builds the canonical dummy block: sentinel id, payload of ASCII `'0'`.
    pub fn dummy() -> Self {
        Self {
            id: DUMMY_ID,
            data: [b'0'; BLOCK_SIZE],
        }
    }

    /// True if this block is the dummy sentinel (identity *and* payload, as
    /// spec.md's `_is_dummy_block` checks both).
    pub fn is_dummy(&self) -> bool {
        self.id == DUMMY_ID && self.data == [b'0'; BLOCK_SIZE]
    }

    /// Serializes this block to its fixed-width plaintext byte layout:
    /// an `ID_WIDTH`-digit zero-padded decimal id, followed by the payload.
    pub fn serialize(&self) -> Result<Vec<u8>, ProtocolError> {
        let wire_id = if self.id == DUMMY_ID {
            SERIALIZED_DUMMY_ID
        } else {
            self.id
        };
        if !(0..=SERIALIZED_DUMMY_ID).contains(&wire_id) {
            return Err(ProtocolError::InvalidId(self.id));
        }

        let mut out = Vec::with_capacity(ID_WIDTH + BLOCK_SIZE);
        out.extend_from_slice(format!("{wire_id:0width$}", width = ID_WIDTH).as_bytes());
        out.extend_from_slice(&self.data);
        Ok(out)
    }

    /// The inverse of [`Block::serialize`]. Fails if the width is wrong or
    /// the id field is not ASCII decimal.
    pub fn deserialize(raw: &[u8]) -> Result<Self, ProtocolError> {
        if raw.len() != ID_WIDTH + BLOCK_SIZE {
            return Err(ProtocolError::Internal);
        }

        let id_str = std::str::from_utf8(&raw[..ID_WIDTH]).map_err(|_| ProtocolError::Internal)?;
        let wire_id: i64 = id_str.parse().map_err(|_| ProtocolError::Internal)?;
        let id = if wire_id == SERIALIZED_DUMMY_ID {
            DUMMY_ID
        } else {
            wire_id
        };

        let mut data = [0u8; BLOCK_SIZE];
        data.copy_from_slice(&raw[ID_WIDTH..]);
        Ok(Self { id, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_real_block() {
        let block = Block::new(5, *b"abcd");
        let raw = block.serialize().unwrap();
        assert_eq!(raw.len(), ID_WIDTH + BLOCK_SIZE);
        assert_eq!(Block::deserialize(&raw).unwrap(), block);
    }

    #[test]
    fn round_trips_the_dummy_block() {
        let dummy = Block::dummy();
        let raw = dummy.serialize().unwrap();
        let back = Block::deserialize(&raw).unwrap();
        assert_eq!(back, dummy);
        assert!(back.is_dummy());
    }

    #[test]
    fn zero_pads_small_ids() {
        let block = Block::new(0, *b"0000");
        let raw = block.serialize().unwrap();
        assert_eq!(&raw[..8], b"00000000");
    }

    #[test]
    fn deserialize_rejects_wrong_width() {
        assert_eq!(Block::deserialize(&[0u8; 3]), Err(ProtocolError::Internal));
    }

    #[test]
    fn deserialize_rejects_non_decimal_id() {
        let mut raw = vec![b'x'; ID_WIDTH];
        raw.extend_from_slice(&[0u8; BLOCK_SIZE]);
        assert_eq!(Block::deserialize(&raw), Err(ProtocolError::Internal));
    }
}
