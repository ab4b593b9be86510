use log::{debug, info};
use std::path::PathBuf;

use crate::{
    disk::{BlockArray, VolumeFiles, BLOCK_SIZE},
    fs::{
        directory::{DirEntry, Directory},
        error::{Result, VolumeError},
        snapshot::DirectorySnapshot,
    },
};

/// 一个固定容量的模拟磁盘：40 个 256 字节的块加一个目录，
/// 落盘为数据文件 `<name>` 和元数据文件 `<name>.meta`。
///
/// 每次修改后都会完整重写两个文件，先写元数据再写数据。
/// 两次写之间崩溃可能导致两者不一致；写失败时内存中的目录也不会回滚。
#[derive(Debug)]
pub struct Volume {
    name: String,
    files: VolumeFiles,
    directory: Directory,
    blocks: BlockArray,
}

impl Volume {
    pub fn new(path: impl Into<PathBuf>, name: &str) -> Self {
        let path = path.into();
        Self {
            files: VolumeFiles::new(&path, name),
            name: name.to_string(),
            directory: Directory::new(),
            blocks: BlockArray::new(),
        }
    }

    /// 两个后备文件都存在则加载；都不存在则新建并立即落盘
    pub fn open_or_create(path: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let path = path.into();
        let files = VolumeFiles::new(&path, name);

        match (files.meta_exists(), files.data_exists()) {
            (false, false) => {
                info!("creating volume '{}' in {}", name, path.display());
                let volume = Self::new(path, name);
                volume.persist()?;
                Ok(volume)
            }
            _ => Self::open(path, name),
        }
    }

    /// 只加载已有的卷，任一后备文件缺失都视为损坏
    pub fn open(path: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let path = path.into();
        let files = VolumeFiles::new(&path, name);

        if !files.meta_exists() {
            return Err(VolumeError::CorruptVolume(format!(
                "'{}' has no metadata file {}",
                name,
                files.meta_path().display()
            )));
        }
        if !files.data_exists() {
            return Err(VolumeError::CorruptVolume(format!(
                "'{}' has no data file {}",
                name,
                files.data_path().display()
            )));
        }

        let snapshot = DirectorySnapshot::decode(&files.read_meta()?)?;
        let directory = Directory::from_snapshot(snapshot)?;
        let blocks = files.read_data().map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => {
                VolumeError::CorruptVolume(format!("data file of '{}': {}", name, e))
            }
            _ => VolumeError::Io(e),
        })?;

        debug!(
            "loaded volume '{}': {} files, {} blocks used",
            name,
            directory.len(),
            directory.bitmap().used_blocks()
        );

        Ok(Self {
            name: name.to_string(),
            files,
            directory,
            blocks,
        })
    }

    /// 覆盖写入元数据文件和数据文件
    pub fn persist(&self) -> Result<()> {
        let meta = self.directory.snapshot().encode()?;
        self.files.write_meta(&meta)?;
        self.files.write_data(&self.blocks)?;
        debug!("persisted volume '{}'", self.name);
        Ok(())
    }

    pub fn create_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let size = u32::try_from(bytes.len()).map_err(|_| {
            VolumeError::InvalidInput(format!("'{}' is too large ({} bytes)", name, bytes.len()))
        })?;

        let block_ids = self.directory.create(name, size)?;
        for (&block_id, chunk) in block_ids.iter().zip(bytes.chunks(BLOCK_SIZE)) {
            self.blocks.write_block(block_id, chunk)?;
        }

        debug!(
            "stored '{}' ({} bytes) in '{}' blocks {:?}",
            name, size, self.name, block_ids
        );
        self.persist()
    }

    /// 拼接控制块覆盖的所有块，截断到文件实际大小
    pub fn read_file(&self, name: &str) -> Option<Vec<u8>> {
        let cb = self.directory.lookup(name)?;
        let mut bytes = Vec::with_capacity(cb.block_count as usize * BLOCK_SIZE);
        for block_id in cb.blocks() {
            bytes.extend_from_slice(self.blocks.read_block(block_id)?);
        }
        bytes.truncate(cb.size as usize);
        Some(bytes)
    }

    pub fn delete_file(&mut self, name: &str) -> Result<()> {
        self.directory.delete(name)?;
        debug!("deleted '{}' from '{}'", name, self.name);
        self.persist()
    }

    pub fn set_remarks(&mut self, name: &str, remarks: &str) -> Result<()> {
        self.directory.set_remarks(name, remarks)?;
        self.persist()
    }

    pub fn list_files(&self) -> impl Iterator<Item = &DirEntry> {
        self.directory.list()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.directory.contains(name)
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn used_blocks(&self) -> u32 {
        self.directory.bitmap().used_blocks()
    }

    pub fn free_blocks(&self) -> u32 {
        self.directory.bitmap().free_blocks()
    }

    /// 删除两个后备文件，文件已不存在不算错误
    pub fn destroy(&self) -> Result<()> {
        self.files.remove()?;
        info!("removed volume '{}'", self.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::{TOTAL_BLOCKS, VOLUME_CAPACITY};
    use std::fs;
    use tempfile::TempDir;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn round_trips_boundary_sizes() {
        let scratch = TempDir::new().unwrap();
        let sizes = [1, BLOCK_SIZE - 1, BLOCK_SIZE, BLOCK_SIZE + 1];
        let mut volume = Volume::open_or_create(scratch.path(), "vol").unwrap();

        for (i, &len) in sizes.iter().enumerate() {
            let name = format!("f{}", i);
            volume.create_file(&name, &payload(len)).unwrap();
            assert_eq!(volume.read_file(&name).unwrap(), payload(len));
        }
    }

    #[test]
    fn full_capacity_file_fits_an_empty_volume() {
        let scratch = TempDir::new().unwrap();
        let mut volume = Volume::open_or_create(scratch.path(), "vol").unwrap();

        volume.create_file("whole", &payload(VOLUME_CAPACITY)).unwrap();
        assert_eq!(volume.free_blocks(), 0);
        assert_eq!(volume.read_file("whole").unwrap(), payload(VOLUME_CAPACITY));
        assert!(matches!(
            volume.create_file("more", b"x"),
            Err(VolumeError::NoSpace { needed: 1 })
        ));
    }

    #[test]
    fn open_or_create_writes_empty_backing_files() {
        let scratch = TempDir::new().unwrap();
        let volume = Volume::open_or_create(scratch.path(), "vol").unwrap();

        let data = fs::read(scratch.path().join("vol")).unwrap();
        assert_eq!(data, vec![0u8; VOLUME_CAPACITY]);
        assert!(scratch.path().join("vol.meta").is_file());
        assert_eq!(volume.free_blocks(), TOTAL_BLOCKS as u32);
    }

    #[test]
    fn reopen_restores_files_and_remarks() {
        let scratch = TempDir::new().unwrap();
        {
            let mut volume = Volume::open_or_create(scratch.path(), "vol").unwrap();
            volume.create_file("a", &payload(700)).unwrap();
            volume.create_file("b", &payload(30)).unwrap();
            volume.set_remarks("b", "draft").unwrap();
            volume.delete_file("a").unwrap();
        }

        let volume = Volume::open_or_create(scratch.path(), "vol").unwrap();
        assert!(volume.read_file("a").is_none());
        assert_eq!(volume.read_file("b").unwrap(), payload(30));
        assert_eq!(volume.directory().lookup("b").unwrap().remarks, "draft");
        assert_eq!(volume.used_blocks(), 1);
    }

    #[test]
    fn deleted_blocks_keep_stale_bytes() {
        let scratch = TempDir::new().unwrap();
        let mut volume = Volume::open_or_create(scratch.path(), "vol").unwrap();
        volume.create_file("old", &[0xAA; 300]).unwrap();
        volume.delete_file("old").unwrap();
        volume.create_file("new", &[0x55; 10]).unwrap();

        let data = fs::read(scratch.path().join("vol")).unwrap();
        assert_eq!(&data[..10], &[0x55; 10]);
        assert!(data[10..300].iter().all(|&b| b == 0xAA));
        assert_eq!(volume.read_file("new").unwrap(), vec![0x55; 10]);
    }

    #[test]
    fn short_data_file_is_corrupt() {
        let scratch = TempDir::new().unwrap();
        Volume::open_or_create(scratch.path(), "vol").unwrap();
        fs::write(scratch.path().join("vol"), vec![0u8; VOLUME_CAPACITY - 1]).unwrap();

        assert!(matches!(
            Volume::open_or_create(scratch.path(), "vol"),
            Err(VolumeError::CorruptVolume(_))
        ));
    }

    #[test]
    fn long_data_file_is_corrupt() {
        let scratch = TempDir::new().unwrap();
        Volume::open_or_create(scratch.path(), "vol").unwrap();
        fs::write(scratch.path().join("vol"), vec![0u8; VOLUME_CAPACITY + 1]).unwrap();

        assert!(matches!(
            Volume::open(scratch.path(), "vol"),
            Err(VolumeError::CorruptVolume(_))
        ));
    }

    #[test]
    fn missing_metadata_is_corrupt() {
        let scratch = TempDir::new().unwrap();
        Volume::open_or_create(scratch.path(), "vol").unwrap();
        fs::remove_file(scratch.path().join("vol.meta")).unwrap();

        assert!(matches!(
            Volume::open_or_create(scratch.path(), "vol"),
            Err(VolumeError::CorruptVolume(_))
        ));
    }

    #[test]
    fn garbage_metadata_is_corrupt() {
        let scratch = TempDir::new().unwrap();
        Volume::open_or_create(scratch.path(), "vol").unwrap();
        fs::write(scratch.path().join("vol.meta"), b"not a directory").unwrap();

        assert!(matches!(
            Volume::open(scratch.path(), "vol"),
            Err(VolumeError::CorruptVolume(_))
        ));
    }

    #[test]
    fn empty_payload_is_rejected() {
        let scratch = TempDir::new().unwrap();
        let mut volume = Volume::open_or_create(scratch.path(), "vol").unwrap();
        assert!(matches!(
            volume.create_file("empty", &[]),
            Err(VolumeError::InvalidInput(_))
        ));
    }

    #[test]
    fn destroy_removes_both_files_and_tolerates_missing_ones() {
        let scratch = TempDir::new().unwrap();
        let volume = Volume::open_or_create(scratch.path(), "vol").unwrap();
        fs::remove_file(scratch.path().join("vol")).unwrap();

        volume.destroy().unwrap();
        assert!(!scratch.path().join("vol.meta").exists());
        volume.destroy().unwrap();
    }

    #[test]
    fn persist_failure_is_reported() {
        let scratch = TempDir::new().unwrap();
        let mut volume = Volume::new(scratch.path().join("missing-dir"), "vol");
        assert!(matches!(
            volume.create_file("a", b"data"),
            Err(VolumeError::Io(_))
        ));
    }
}
