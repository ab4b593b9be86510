pub mod block_bitmap;
pub mod config;
pub mod control_block;
pub mod directory;
pub mod error;
pub mod snapshot;
pub mod volume;
pub mod volume_set;

pub use block_bitmap::{count_needed, BlockBitmap};
pub use control_block::ControlBlock;
pub use directory::{DirEntry, Directory};
pub use error::{Result, VolumeError};
pub use snapshot::DirectorySnapshot;
pub use volume::Volume;
pub use volume_set::{FileListing, NewVolumeCreated, VolumeSet, VolumeUsage};
