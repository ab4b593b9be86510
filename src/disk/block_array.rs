use std::io::{Error, ErrorKind, Result};

use crate::disk::types::{Block, BLOCK_SIZE, TOTAL_BLOCKS, VOLUME_CAPACITY};

/// 卷的全部数据块，常驻内存，持久化时整体写回数据文件
#[derive(Debug, Clone)]
pub struct BlockArray {
    blocks: Vec<Block>,
}

impl BlockArray {
    pub fn new() -> Self {
        Self {
            blocks: vec![[0u8; BLOCK_SIZE]; TOTAL_BLOCKS],
        }
    }

    /// 从数据文件的扁平字节流恢复，长度必须恰好等于卷容量
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != VOLUME_CAPACITY {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "expected {} bytes of block data, found {}",
                    VOLUME_CAPACITY,
                    bytes.len()
                ),
            ));
        }

        let blocks = bytes
            .chunks_exact(BLOCK_SIZE)
            .map(|chunk| {
                let mut block = [0u8; BLOCK_SIZE];
                block.copy_from_slice(chunk);
                block
            })
            .collect();

        Ok(Self { blocks })
    }

    /// 写入一个块的前 buf.len() 字节，块尾部保持原有内容
    pub fn write_block(&mut self, index: u32, buf: &[u8]) -> Result<()> {
        if buf.len() > BLOCK_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "Data too large"));
        }
        let block = self
            .blocks
            .get_mut(index as usize)
            .ok_or_else(|| Error::new(ErrorKind::InvalidInput, "Block index out of range"))?;
        block[..buf.len()].copy_from_slice(buf);
        Ok(())
    }

    pub fn read_block(&self, index: u32) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    /// 按块号顺序拼接成扁平字节流
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(VOLUME_CAPACITY);
        for block in &self.blocks {
            bytes.extend_from_slice(block);
        }
        bytes
    }
}

impl Default for BlockArray {
    fn default() -> Self {
        Self::new()
    }
}
