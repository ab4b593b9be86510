use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::utils::current_timestamp;

/// 文件控制块：记录一个文件的大小、创建时间、备注和占用的连续块区间
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ControlBlock {
    pub size: u32,        // 文件大小（字节）
    pub created_at: u64,  // 创建时间（Unix 毫秒）
    pub start_block: u32, // 起始块号
    pub block_count: u32, // 占用块数
    pub remarks: String,  // 用户备注
}

impl ControlBlock {
    pub fn new(size: u32, start_block: u32, block_count: u32) -> Self {
        Self {
            size,
            created_at: current_timestamp(),
            start_block,
            block_count,
            remarks: String::new(),
        }
    }

    pub fn blocks(&self) -> Range<u32> {
        self.start_block..self.start_block + self.block_count
    }

    pub fn overlaps(&self, other: &ControlBlock) -> bool {
        let (a, b) = (self.blocks(), other.blocks());
        a.start < b.end && b.start < a.end
    }
}
