use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Read, Result, Write},
    path::{Path, PathBuf},
};

use crate::{disk::block_array::BlockArray, fs::config::META_SUFFIX};

/// 一个卷在宿主文件系统上的两个后备文件：
/// 数据文件 `<name>` 与元数据文件 `<name>.meta`
#[derive(Debug, Clone)]
pub struct VolumeFiles {
    data_path: PathBuf,
    meta_path: PathBuf,
}

impl VolumeFiles {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            data_path: dir.join(name),
            meta_path: dir.join(format!("{}{}", name, META_SUFFIX)),
        }
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta_path
    }

    pub fn data_exists(&self) -> bool {
        self.data_path.is_file()
    }

    pub fn meta_exists(&self) -> bool {
        self.meta_path.is_file()
    }

    pub fn read_meta(&self) -> Result<Vec<u8>> {
        fs::read(&self.meta_path)
    }

    pub fn write_meta(&self, bytes: &[u8]) -> Result<()> {
        let mut file = Self::open_for_overwrite(&self.meta_path)?;
        file.write_all(bytes)?;
        file.flush()
    }

    /// 读取整个数据文件，长度校验交给 BlockArray
    pub fn read_data(&self) -> Result<BlockArray> {
        let mut file = File::open(&self.data_path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        BlockArray::from_bytes(&bytes)
    }

    pub fn write_data(&self, blocks: &BlockArray) -> Result<()> {
        let mut file = Self::open_for_overwrite(&self.data_path)?;
        file.write_all(&blocks.to_bytes())?;
        file.flush()
    }

    /// 删除两个文件，文件不存在不算错误
    pub fn remove(&self) -> Result<()> {
        let meta = remove_if_exists(&self.meta_path);
        let data = remove_if_exists(&self.data_path);
        meta.and(data)
    }

    fn open_for_overwrite(path: &Path) -> Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
