/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod allocator;
pub mod compress;
pub mod cursor;
pub mod encoding;
pub mod list;
pub mod stats;

pub mod prelude {
    pub use crate::allocator::*;
    pub use crate::compress::*;
    pub use crate::cursor::*;
    pub use crate::encoding::*;
    pub use crate::list::*;
    pub use crate::stats::*;
}
