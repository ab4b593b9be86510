use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    disk::{BLOCK_SIZE, TOTAL_BLOCKS},
    fs::{
        block_bitmap::{count_needed, BlockBitmap},
        config::{MAX_NAME_LEN, MAX_REMARKS_LEN},
        control_block::ControlBlock,
        error::{Result, VolumeError},
        snapshot::DirectorySnapshot,
    },
};

// 一个目录项
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub control_block: ControlBlock,
}

// 卷目录：文件名 -> 控制块，外加该卷的空闲块位图
#[derive(Debug, Clone)]
pub struct Directory {
    entries: Vec<DirEntry>,
    index_map: HashMap<String, usize>, // name -> entries 索引
    bitmap: BlockBitmap,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index_map: HashMap::new(),
            bitmap: BlockBitmap::new(TOTAL_BLOCKS as u32),
        }
    }

    fn rebuild_index_map(&mut self) {
        self.index_map.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.index_map.insert(entry.name.clone(), i);
        }
    }

    /// 为新文件分配一段连续块并登记控制块，返回按升序排列的块号
    pub fn create(&mut self, name: &str, size: u32) -> Result<Vec<u32>> {
        if name.is_empty() {
            return Err(VolumeError::InvalidInput("empty file name".to_string()));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(VolumeError::InvalidInput(format!(
                "file name is {} bytes, the limit is {}",
                name.len(),
                MAX_NAME_LEN
            )));
        }
        if self.index_map.contains_key(name) {
            return Err(VolumeError::AlreadyExists(name.to_string()));
        }
        if size == 0 {
            return Err(VolumeError::InvalidInput(format!("'{}' is empty", name)));
        }

        let count = count_needed(size, BLOCK_SIZE as u32);
        debug!("'{}' ({} bytes) needs {} blocks", name, size, count);
        let start = self.bitmap.reserve(count)?;

        let control_block = ControlBlock::new(size, start, count);
        let blocks = control_block.blocks().collect();
        self.entries.push(DirEntry {
            name: name.to_string(),
            control_block,
        });
        self.index_map
            .insert(name.to_string(), self.entries.len() - 1);
        Ok(blocks)
    }

    /// 删除目录项并释放其块区间，数据块内容保持不变
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let idx = *self
            .index_map
            .get(name)
            .ok_or_else(|| VolumeError::NotFound(name.to_string()))?;

        let entry = self.entries.remove(idx);
        self.bitmap
            .release(entry.control_block.start_block, entry.control_block.block_count);
        self.rebuild_index_map();
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&ControlBlock> {
        self.index_map
            .get(name)
            .map(|&idx| &self.entries[idx].control_block)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_map.contains_key(name)
    }

    pub fn set_remarks(&mut self, name: &str, remarks: &str) -> Result<()> {
        let idx = *self
            .index_map
            .get(name)
            .ok_or_else(|| VolumeError::NotFound(name.to_string()))?;
        if remarks.len() > MAX_REMARKS_LEN {
            return Err(VolumeError::InvalidInput(format!(
                "remarks are {} bytes, the limit is {}",
                remarks.len(),
                MAX_REMARKS_LEN
            )));
        }
        self.entries[idx].control_block.remarks = remarks.to_string();
        Ok(())
    }

    // 按插入顺序遍历
    pub fn list(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn bitmap(&self) -> &BlockBitmap {
        &self.bitmap
    }

    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot::new(self.bitmap.as_bytes().to_vec(), self.entries.clone())
    }

    /// 从快照重建目录，并校验控制块区间与位图完全一致
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Result<Self> {
        let bitmap = BlockBitmap::from_bytes(snapshot.total_blocks, snapshot.bitmap)?;
        let mut dir = Self {
            entries: snapshot.entries,
            index_map: HashMap::new(),
            bitmap,
        };
        dir.rebuild_index_map();

        if dir.index_map.len() != dir.entries.len() {
            return Err(VolumeError::CorruptVolume(
                "duplicate file names in directory".to_string(),
            ));
        }

        let total = dir.bitmap.total_blocks();
        let mut covered = 0u32;
        for (i, entry) in dir.entries.iter().enumerate() {
            let cb = &entry.control_block;
            let in_bounds = cb
                .start_block
                .checked_add(cb.block_count)
                .map_or(false, |end| end <= total);
            let shape_ok = in_bounds
                && cb.size > 0
                && cb.block_count == count_needed(cb.size, BLOCK_SIZE as u32);
            if !shape_ok {
                return Err(VolumeError::CorruptVolume(format!(
                    "bad control block for '{}': {:?}",
                    entry.name, cb
                )));
            }
            if let Some(other) = dir.entries[..i]
                .iter()
                .find(|other| other.control_block.overlaps(cb))
            {
                return Err(VolumeError::CorruptVolume(format!(
                    "'{}' overlaps '{}'",
                    entry.name, other.name
                )));
            }
            if cb.blocks().any(|b| !dir.bitmap.is_used(b)) {
                return Err(VolumeError::CorruptVolume(format!(
                    "blocks of '{}' are marked free",
                    entry.name
                )));
            }
            covered += cb.block_count;
        }

        if covered != dir.bitmap.used_blocks() {
            return Err(VolumeError::CorruptVolume(format!(
                "bitmap marks {} blocks used but files cover {}",
                dir.bitmap.used_blocks(),
                covered
            )));
        }

        Ok(dir)
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_blocks(dir: &Directory) -> u32 {
        dir.list().map(|e| e.control_block.block_count).sum()
    }

    #[test]
    fn create_returns_ascending_block_range() {
        let mut dir = Directory::new();
        assert_eq!(dir.create("a", 600).unwrap(), vec![0, 1, 2]);
        assert_eq!(dir.create("b", 1).unwrap(), vec![3]);

        let cb = dir.lookup("a").unwrap();
        assert_eq!((cb.size, cb.start_block, cb.block_count), (600, 0, 3));
        assert_eq!(cb.remarks, "");
        assert_eq!(dir.bitmap().used_blocks(), live_blocks(&dir));
    }

    #[test]
    fn duplicate_name_is_rejected_without_allocating() {
        let mut dir = Directory::new();
        dir.create("a", 10).unwrap();
        assert!(matches!(dir.create("a", 10), Err(VolumeError::AlreadyExists(_))));
        assert_eq!(dir.bitmap().used_blocks(), 1);
    }

    #[test]
    fn empty_file_is_rejected() {
        let mut dir = Directory::new();
        assert!(matches!(dir.create("a", 0), Err(VolumeError::InvalidInput(_))));
        assert!(matches!(dir.create("", 5), Err(VolumeError::InvalidInput(_))));
        assert!(dir.is_empty());
    }

    #[test]
    fn no_space_leaves_directory_untouched() {
        let mut dir = Directory::new();
        dir.create("big", 39 * 256).unwrap();
        assert!(matches!(
            dir.create("two", 300),
            Err(VolumeError::NoSpace { needed: 2 })
        ));
        assert!(dir.lookup("two").is_none());
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn delete_then_reuse_takes_the_freed_range() {
        let mut dir = Directory::new();
        dir.create("a", 512).unwrap();
        dir.create("b", 3 * 256).unwrap();
        dir.create("c", 256).unwrap();

        dir.delete("b").unwrap();
        assert!(!dir.bitmap().is_used(2));
        assert!(!dir.bitmap().is_used(4));
        assert!(dir.bitmap().is_used(5));

        assert_eq!(dir.create("d", 2 * 256 + 1).unwrap(), vec![2, 3, 4]);
        assert_eq!(dir.bitmap().used_blocks(), live_blocks(&dir));
    }

    #[test]
    fn unknown_names_are_not_found() {
        let mut dir = Directory::new();
        assert!(matches!(dir.delete("x"), Err(VolumeError::NotFound(_))));
        assert!(matches!(dir.set_remarks("x", "hi"), Err(VolumeError::NotFound(_))));
        assert!(dir.lookup("x").is_none());
    }

    #[test]
    fn remarks_are_updated_in_place() {
        let mut dir = Directory::new();
        dir.create("a", 10).unwrap();
        let before = dir.lookup("a").unwrap().clone();

        dir.set_remarks("a", "quarterly report").unwrap();
        let after = dir.lookup("a").unwrap();
        assert_eq!(after.remarks, "quarterly report");
        assert_eq!(after.blocks(), before.blocks());
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn index_survives_deletes_in_the_middle() {
        let mut dir = Directory::new();
        for name in ["a", "b", "c", "d"] {
            dir.create(name, 100).unwrap();
        }
        dir.delete("b").unwrap();
        assert_eq!(dir.lookup("c").unwrap().start_block, 2);
        assert_eq!(dir.lookup("d").unwrap().start_block, 3);

        let names: Vec<&str> = dir.list().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "d"]);
    }

    #[test]
    fn oversized_name_and_remarks_are_rejected_before_mutation() {
        let mut dir = Directory::new();
        let long_name = "n".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(dir.create(&long_name, 10), Err(VolumeError::InvalidInput(_))));
        assert_eq!(dir.bitmap().used_blocks(), 0);
        assert!(dir.create(&"n".repeat(MAX_NAME_LEN), 10).is_ok());

        dir.create("a", 10).unwrap();
        dir.set_remarks("a", "short").unwrap();
        let long_remarks = "x".repeat(MAX_REMARKS_LEN + 1);
        assert!(matches!(
            dir.set_remarks("a", &long_remarks),
            Err(VolumeError::InvalidInput(_))
        ));
        assert_eq!(dir.lookup("a").unwrap().remarks, "short");
        assert!(dir.set_remarks("a", &"x".repeat(MAX_REMARKS_LEN)).is_ok());
    }

    #[test]
    fn snapshot_restores_entries_and_bitmap() {
        let mut dir = Directory::new();
        dir.create("a", 700).unwrap();
        dir.create("b", 20).unwrap();
        dir.set_remarks("b", "keep").unwrap();
        dir.delete("a").unwrap();
        dir.create("c", 300).unwrap();

        let restored = Directory::from_snapshot(dir.snapshot()).unwrap();
        assert_eq!(restored.bitmap(), dir.bitmap());
        assert_eq!(restored.lookup("b"), dir.lookup("b"));
        assert_eq!(restored.lookup("c"), dir.lookup("c"));
        assert!(restored.lookup("a").is_none());
    }

    #[test]
    fn snapshot_with_overlapping_ranges_is_corrupt() {
        let mut dir = Directory::new();
        dir.create("a", 512).unwrap();
        let mut snapshot = dir.snapshot();
        let mut clash = snapshot.entries[0].clone();
        clash.name = "b".to_string();
        clash.control_block.size = 256;
        clash.control_block.block_count = 1;
        clash.control_block.start_block = 1;
        snapshot.entries.push(clash);

        assert!(matches!(
            Directory::from_snapshot(snapshot),
            Err(VolumeError::CorruptVolume(_))
        ));
    }

    #[test]
    fn snapshot_with_stray_bits_is_corrupt() {
        let mut dir = Directory::new();
        dir.create("a", 512).unwrap();
        let mut snapshot = dir.snapshot();
        snapshot.bitmap[1] |= 0x01;

        assert!(matches!(
            Directory::from_snapshot(snapshot),
            Err(VolumeError::CorruptVolume(_))
        ));
    }
}
