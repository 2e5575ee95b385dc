/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Integer encoding primitives.
//!
//! Two byte-oriented codecs are provided: [variable-length
//! integers](varlong) for delta streams, and [bit-packed 64-value
//! blocks](packing) at a per-block minimal width. Both operate on plain byte
//! slices; page addressing and compression strategy layering live in
//! [`crate::compress`].

pub mod packing;
pub mod varlong;

pub use packing::{bits_needed, bytes_needed, pack, unpack, BLOCK_SIZE};
pub use varlong::{
    decode, decode_delta_chunk, encode_into, encode_slice, encoded_len, unzigzag, zigzag,
};
