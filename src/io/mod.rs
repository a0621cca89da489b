// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - STL codec and script files

mod source;
mod stl;

pub use source::{read_source, write_source};
pub use stl::{decode_stl, encode_stl, ParseError};
