use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// 在临时目录下的 `sources/` 中写入一个宿主文件，返回该目录
pub fn write_source(scratch: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let dir = scratch.path().join("sources");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), bytes).unwrap();
    dir
}

pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
}
