//! High level builder APIs for hiding and unveiling payload chains.

pub mod hide;
pub mod unveil;
