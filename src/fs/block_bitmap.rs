use log::debug;

use crate::fs::error::{Result, VolumeError};

/// 存放 byte_size 字节需要的块数：ceil(byte_size / block_size)
pub fn count_needed(byte_size: u32, block_size: u32) -> u32 {
    debug_assert!(byte_size > 0, "zero-byte files never reach the allocator");
    byte_size.div_ceil(block_size)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockBitmap {
    bits: Vec<u8>,     // 位图数据，每个 bit 表示一个数据块是否被使用
    total_blocks: u32, // 数据块总数
    free_blocks: u32,  // 当前空闲块数
}

impl BlockBitmap {
    pub fn new(total_blocks: u32) -> Self {
        let byte_len = total_blocks.div_ceil(8) as usize;

        Self {
            bits: vec![0; byte_len],
            total_blocks,
            free_blocks: total_blocks,
        }
    }

    /// 从元数据快照中的位图字节恢复
    pub fn from_bytes(total_blocks: u32, bits: Vec<u8>) -> Result<Self> {
        let byte_len = total_blocks.div_ceil(8) as usize;
        if bits.len() != byte_len {
            return Err(VolumeError::CorruptVolume(format!(
                "bitmap has {} bytes, expected {}",
                bits.len(),
                byte_len
            )));
        }

        let mut bitmap = Self {
            bits,
            total_blocks,
            free_blocks: 0,
        };

        // 超出块总数的填充位必须为 0
        if (total_blocks..(byte_len as u32) * 8).any(|i| bitmap.bit(i)) {
            return Err(VolumeError::CorruptVolume(
                "bitmap marks blocks past the end of the volume".to_string(),
            ));
        }

        bitmap.free_blocks = total_blocks - bitmap.used_blocks();
        Ok(bitmap)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    pub fn free_blocks(&self) -> u32 {
        self.free_blocks
    }

    pub fn used_blocks(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    pub fn is_used(&self, block_index: u32) -> bool {
        block_index < self.total_blocks && self.bit(block_index)
    }

    /// 首次适配：从 0 开始依次以每个空闲块为起点，
    /// 找到第一段长度为 count 的连续空闲块并全部标记为已用，返回起始块号
    pub fn reserve(&mut self, count: u32) -> Result<u32> {
        if count == 0 || count > self.total_blocks {
            return Err(VolumeError::NoSpace { needed: count });
        }

        let mut start = 0;
        while start + count <= self.total_blocks {
            if self.bit(start) {
                start += 1;
                continue;
            }

            match (start..start + count).find(|&i| self.bit(i)) {
                // 区间内有已用块，下一个候选起点在它之后
                Some(used) => start = used + 1,
                None => {
                    for i in start..start + count {
                        self.set(i);
                    }
                    self.free_blocks -= count;
                    debug!("reserved blocks [{}, {})", start, start + count);
                    return Ok(start);
                }
            }
        }

        debug!(
            "no run of {} free blocks ({} free in total)",
            count, self.free_blocks
        );
        Err(VolumeError::NoSpace { needed: count })
    }

    /// 释放 [start, start + count)
    pub fn release(&mut self, start: u32, count: u32) {
        debug_assert!(
            start.saturating_add(count) <= self.total_blocks,
            "release of [{}, +{}) outside a volume of {} blocks",
            start,
            count,
            self.total_blocks
        );

        let end = start.saturating_add(count).min(self.total_blocks);
        for i in start..end {
            if self.bit(i) {
                self.clear(i);
                self.free_blocks += 1;
            }
        }
        debug!("released blocks [{}, {})", start, end);
    }

    fn bit(&self, block_index: u32) -> bool {
        let byte_index = (block_index / 8) as usize;
        let bit_index = block_index % 8;
        self.bits[byte_index] & (1 << bit_index) != 0
    }

    fn set(&mut self, block_index: u32) {
        let byte_index = (block_index / 8) as usize;
        let bit_index = block_index % 8;
        self.bits[byte_index] |= 1 << bit_index;
    }

    fn clear(&mut self, block_index: u32) {
        let byte_index = (block_index / 8) as usize;
        let bit_index = block_index % 8;
        self.bits[byte_index] &= !(1 << bit_index);
    }
}
