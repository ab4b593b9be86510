use log::{debug, info, warn};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::fs::{
    config::{MAX_FILE_SIZE, META_SUFFIX, VOLUME_SUFFIX_SEPARATOR},
    control_block::ControlBlock,
    error::{Result, VolumeError},
    volume::Volume,
};

/// put 在所有已有卷都放不下时新建了一个卷
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVolumeCreated {
    pub name: String,
}

/// list_all 的一行：文件名、控制块、所在卷
#[derive(Debug, Clone, Copy)]
pub struct FileListing<'a> {
    pub name: &'a str,
    pub control_block: &'a ControlBlock,
    pub volume: &'a str,
}

/// 一个卷的使用情况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeUsage {
    pub name: String,
    pub used_blocks: u32,
    pub total_blocks: u32,
}

/// 共享同一基础名的一组卷，构成一个文件名空间。
/// 卷的顺序既是查找顺序，也是分配的优先顺序。
#[derive(Debug)]
pub struct VolumeSet {
    path: PathBuf,
    base_name: String,
    volumes: Vec<Volume>,
}

impl VolumeSet {
    /// 打开 path 下名为 `base_name` 或 `base_name.<n>` 的所有卷；
    /// 一个都没有时新建一个名为 `base_name` 的空卷
    pub fn open_or_create_set(path: impl Into<PathBuf>, base_name: &str) -> Result<Self> {
        validate_base_name(base_name)?;
        let path = path.into();
        fs::create_dir_all(&path)?;

        let mut discovered: Vec<(u32, String)> = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(suffix) = volume_suffix(base_name, file_name) {
                discovered.push((suffix, file_name.to_string()));
            }
        }
        discovered.sort();

        let volumes = if discovered.is_empty() {
            vec![Volume::open_or_create(&path, base_name)?]
        } else {
            discovered
                .iter()
                .map(|(_, name)| Volume::open(&path, name))
                .collect::<Result<Vec<_>>>()?
        };

        info!(
            "opened volume set '{}' with {} volume(s)",
            base_name,
            volumes.len()
        );

        Ok(Self {
            path,
            base_name: base_name.to_string(),
            volumes,
        })
    }

    /// 把宿主文件 `source_dir/file_name` 存入卷集合
    pub fn put(&mut self, source_dir: &Path, file_name: &str) -> Result<Option<NewVolumeCreated>> {
        let source = source_dir.join(file_name);
        let metadata = fs::metadata(&source).map_err(|e| {
            VolumeError::InvalidInput(format!("cannot access {}: {}", source.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(VolumeError::InvalidInput(format!(
                "{} is not a regular file",
                source.display()
            )));
        }
        check_size(file_name, metadata.len())?;

        let bytes = fs::read(&source)?;
        self.put_bytes(file_name, &bytes)
    }

    pub fn put_bytes(&mut self, file_name: &str, bytes: &[u8]) -> Result<Option<NewVolumeCreated>> {
        check_size(file_name, bytes.len() as u64)?;

        if let Some(owner) = self.volumes.iter().find(|v| v.contains(file_name)) {
            return Err(VolumeError::AlreadyExists(format!(
                "{} (in volume {})",
                file_name,
                owner.name()
            )));
        }

        for volume in self.volumes.iter_mut() {
            debug!("checking volume '{}' for '{}'", volume.name(), file_name);
            match volume.create_file(file_name, bytes) {
                Ok(()) => return Ok(None),
                Err(VolumeError::NoSpace { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        let name = self.next_volume_name()?;
        info!("creating new volume '{}' for '{}'", name, file_name);
        let mut volume = Volume::new(&self.path, &name);
        volume.create_file(file_name, bytes)?;
        self.volumes.push(volume);
        Ok(Some(NewVolumeCreated { name }))
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.volumes.iter().find_map(|v| v.read_file(file_name))
    }

    pub fn remove(&mut self, file_name: &str) -> Result<()> {
        self.owner_mut(file_name)?.delete_file(file_name)
    }

    pub fn set_remarks(&mut self, file_name: &str, remarks: &str) -> Result<()> {
        self.owner_mut(file_name)?.set_remarks(file_name, remarks)
    }

    pub fn list_all(&self) -> impl Iterator<Item = FileListing<'_>> {
        self.volumes.iter().flat_map(|volume| {
            volume.list_files().map(move |entry| FileListing {
                name: &entry.name,
                control_block: &entry.control_block,
                volume: volume.name(),
            })
        })
    }

    pub fn usage(&self) -> Vec<VolumeUsage> {
        self.volumes
            .iter()
            .map(|v| VolumeUsage {
                name: v.name().to_string(),
                used_blocks: v.used_blocks(),
                total_blocks: v.directory().bitmap().total_blocks(),
            })
            .collect()
    }

    /// 删除所有卷的后备文件。逐个尽力删除，返回遇到的第一个错误
    pub fn destroy(self) -> Result<()> {
        let mut first_err = None;
        for volume in &self.volumes {
            if let Err(e) = volume.destroy() {
                warn!("failed to remove volume '{}': {}", volume.name(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    fn owner_mut(&mut self, file_name: &str) -> Result<&mut Volume> {
        self.volumes
            .iter_mut()
            .find(|v| v.contains(file_name))
            .ok_or_else(|| VolumeError::NotFound(file_name.to_string()))
    }

    // 已有最大后缀加一，后缀用尽时报错
    fn next_volume_name(&self) -> Result<String> {
        let max = self
            .volumes
            .iter()
            .filter_map(|v| volume_suffix(&self.base_name, v.name()))
            .max()
            .unwrap_or(0);
        let next = max.checked_add(1).ok_or_else(|| {
            VolumeError::InvalidInput(format!(
                "volume set '{}' has no volume suffix left after {}",
                self.base_name, max
            ))
        })?;
        Ok(format!("{}{}{}", self.base_name, VOLUME_SUFFIX_SEPARATOR, next))
    }
}

fn validate_base_name(base_name: &str) -> Result<()> {
    if base_name.is_empty()
        || base_name.contains(std::path::is_separator)
        || base_name.ends_with(META_SUFFIX)
        || base_name == "."
        || base_name == ".."
        || has_volume_suffix(base_name)
    {
        return Err(VolumeError::InvalidInput(format!(
            "invalid volume name '{}'",
            base_name
        )));
    }
    Ok(())
}

// `abc.1` 本身就是集合 `abc` 的成员，不能再作为基础名
fn has_volume_suffix(base_name: &str) -> bool {
    match base_name.rsplit_once(VOLUME_SUFFIX_SEPARATOR) {
        Some((_, digits)) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

fn check_size(file_name: &str, len: u64) -> Result<()> {
    if len == 0 {
        return Err(VolumeError::InvalidInput(format!("{} is empty", file_name)));
    }
    if len > MAX_FILE_SIZE as u64 {
        return Err(VolumeError::InvalidInput(format!(
            "{} is {} bytes, the limit is {}",
            file_name, len, MAX_FILE_SIZE
        )));
    }
    Ok(())
}

/// `base` -> 0，`base.<n>` -> n，其它名字（包括 .meta 文件）-> None
fn volume_suffix(base_name: &str, name: &str) -> Option<u32> {
    let rest = name.strip_prefix(base_name)?;
    if rest.is_empty() {
        return Some(0);
    }
    let digits = rest.strip_prefix(VOLUME_SUFFIX_SEPARATOR)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes_are_parsed_strictly() {
        assert_eq!(volume_suffix("abc", "abc"), Some(0));
        assert_eq!(volume_suffix("abc", "abc.1"), Some(1));
        assert_eq!(volume_suffix("abc", "abc.12"), Some(12));
        assert_eq!(volume_suffix("abc", "abc.meta"), None);
        assert_eq!(volume_suffix("abc", "abc.1.meta"), None);
        assert_eq!(volume_suffix("abc", "abcdef"), None);
        assert_eq!(volume_suffix("abc", "abc."), None);
        assert_eq!(volume_suffix("abc", "abc.0"), None);
        assert_eq!(volume_suffix("abc", "abc.+1"), None);
        assert_eq!(volume_suffix("abc", "xabc"), None);
    }

    #[test]
    fn base_names_are_validated() {
        assert!(validate_base_name("abc").is_ok());
        assert!(validate_base_name("disk.img").is_ok());
        assert!(validate_base_name("").is_err());
        assert!(validate_base_name("a/b").is_err());
        assert!(validate_base_name("abc.meta").is_err());
        assert!(validate_base_name("..").is_err());
        assert!(validate_base_name("abc.1").is_err());
        assert!(validate_base_name("abc.007").is_err());
        assert!(validate_base_name("v1.2a").is_ok());
    }

    #[test]
    fn size_limits() {
        assert!(check_size("f", 1).is_ok());
        assert!(check_size("f", MAX_FILE_SIZE as u64).is_ok());
        assert!(matches!(check_size("f", 0), Err(VolumeError::InvalidInput(_))));
        assert!(matches!(
            check_size("f", MAX_FILE_SIZE as u64 + 1),
            Err(VolumeError::InvalidInput(_))
        ));
    }
}
