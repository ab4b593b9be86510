use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::{
    disk::{BLOCK_SIZE, TOTAL_BLOCKS},
    fs::{
        config::{META_MAGIC, META_VERSION},
        directory::DirEntry,
        error::{Result, VolumeError},
    },
};

// 读取元数据时的上限，防止损坏的长度字段触发超大分配
const SNAPSHOT_SIZE_LIMIT: u64 = 1024 * 1024;

/// 目录的持久化形式，即 `<volume>.meta` 文件的内容。
///
/// 只包含纯数据：文件名到控制块的映射（保持插入顺序）与空闲块位图。
/// 头部记录魔数、格式版本和卷几何参数，加载时逐项校验。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub magic: u32,
    pub version: u16,
    pub block_size: u32,
    pub total_blocks: u32,
    pub bitmap: Vec<u8>,
    pub entries: Vec<DirEntry>,
}

impl DirectorySnapshot {
    pub fn new(bitmap: Vec<u8>, entries: Vec<DirEntry>) -> Self {
        Self {
            magic: META_MAGIC,
            version: META_VERSION,
            block_size: BLOCK_SIZE as u32,
            total_blocks: TOTAL_BLOCKS as u32,
            bitmap,
            entries,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        codec()
            .serialize(self)
            .map_err(|e| VolumeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let snapshot: DirectorySnapshot = codec()
            .with_limit(SNAPSHOT_SIZE_LIMIT)
            .deserialize(bytes)
            .map_err(|e| VolumeError::CorruptVolume(format!("unreadable metadata: {}", e)))?;

        if snapshot.magic != META_MAGIC {
            return Err(VolumeError::CorruptVolume(format!(
                "bad metadata magic {:#010x}",
                snapshot.magic
            )));
        }
        if snapshot.version != META_VERSION {
            return Err(VolumeError::CorruptVolume(format!(
                "unsupported metadata version {}",
                snapshot.version
            )));
        }
        if snapshot.block_size as usize != BLOCK_SIZE
            || snapshot.total_blocks as usize != TOTAL_BLOCKS
        {
            return Err(VolumeError::CorruptVolume(format!(
                "volume geometry {}x{} does not match {}x{}",
                snapshot.total_blocks, snapshot.block_size, TOTAL_BLOCKS, BLOCK_SIZE
            )));
        }

        Ok(snapshot)
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}
