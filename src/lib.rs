//! Block-based volume storage on top of plain host files.
//!
//! A [`Volume`](fs::Volume) is a fixed 10 KB simulated disk of 40 blocks,
//! stored as a raw data file plus a `.meta` file holding its directory.
//! A [`VolumeSet`](fs::VolumeSet) chains volumes that share a base name and
//! spills into a new volume when none of the existing ones has room.

pub mod disk;
pub mod fs;
pub mod utils;
