pub mod block_array;
pub mod types;
pub mod volume_files;

pub use block_array::BlockArray;
pub use types::{Block, BLOCK_SIZE, TOTAL_BLOCKS, VOLUME_CAPACITY};
pub use volume_files::VolumeFiles;
