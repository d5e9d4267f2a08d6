// SPDX-License-Identifier: MPL-2.0

//! Media utilities for encoded stills and their display handles
//!
//! # Modules
//!
//! - [`encoding`]: JPEG/PNG encoding, decoding and `data:` URIs
//! - [`object_url`]: `blob:` URLs whose lifetime is tied to an owning handle

pub mod encoding;
pub mod object_url;

pub use object_url::{ObjectUrl, ObjectUrlStore};
