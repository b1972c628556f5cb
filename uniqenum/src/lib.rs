//! Identifier allocation and configuration shared by the `uniqenum` macro generators.
//!
//! The generated macros declare enums and statically assert that all enumerator values are
//! distinct: `uniqenumN` declares the enum, `areuniqN` checks pairwise differences.

pub mod backends;
pub mod errors;
pub mod format;
pub mod ident;
pub mod options;
pub mod ranges;
