//! Domain and wire types shared by the assistant client crates.

pub mod domain;
pub mod error;
pub mod protocol;
