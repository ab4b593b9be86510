use crate::disk::VOLUME_CAPACITY;

// 元数据文件后缀：<volume_name>.meta
pub const META_SUFFIX: &str = ".meta";

// 溢出卷命名：<base_name>.<n>
pub const VOLUME_SUFFIX_SEPARATOR: char = '.';

// 元数据快照魔数 "PFS1"
pub const META_MAGIC: u32 = 0x5046_5331;

// 元数据快照格式版本
pub const META_VERSION: u16 = 1;

// 单个文件的最大字节数：一个卷装得下的上限
pub const MAX_FILE_SIZE: usize = VOLUME_CAPACITY;

// 文件名与备注的长度上限（字节），保证元数据文件始终能被读回
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_REMARKS_LEN: usize = 1024;
