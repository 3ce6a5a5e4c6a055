//! # docrepo Bench
//!
//! Shared setup for the docrepo benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
