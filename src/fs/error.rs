use std::fmt;

/// 卷存储错误类型
#[derive(Debug)]
pub enum VolumeError {
    Io(std::io::Error),       // 底层 I/O 错误
    InvalidInput(String),     // 源文件不存在、不是普通文件、为空或超过卷容量
    AlreadyExists(String),    // 同名文件已存在（卷内或卷集合内）
    NotFound(String),         // 文件不存在
    NoSpace { needed: u32 },  // 当前卷没有足够长的连续空闲块
    CorruptVolume(String),    // 元数据与数据文件不一致或读取不完整
}

impl From<std::io::Error> for VolumeError {
    fn from(e: std::io::Error) -> Self {
        VolumeError::Io(e)
    }
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Volume I/O error: {}", e),
            Self::InvalidInput(desc) => write!(f, "Invalid input: {}", desc),
            Self::AlreadyExists(name) => write!(f, "File already exists: {}", name),
            Self::NotFound(name) => write!(f, "File not found: {}", name),
            Self::NoSpace { needed } => {
                write!(f, "No run of {} contiguous free blocks available", needed)
            }
            Self::CorruptVolume(desc) => write!(f, "Volume corrupted: {}", desc),
        }
    }
}

impl std::error::Error for VolumeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 卷存储统一结果类型
pub type Result<T> = std::result::Result<T, VolumeError>;
