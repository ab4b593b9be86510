/// 每个逻辑块（Block）的大小：256 字节
/// 卷以“块”为最小分配单位。
pub const BLOCK_SIZE: usize = 256;

/// 单个卷的容量（字节）：10KB
pub const VOLUME_CAPACITY: usize = 10 * 1024;

/// 卷中包含的块总数：10KB / 256B = 40 块
pub const TOTAL_BLOCKS: usize = VOLUME_CAPACITY / BLOCK_SIZE;

/// 一个逻辑块（256 字节的数组）
pub type Block = [u8; BLOCK_SIZE];
