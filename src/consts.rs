//! vsfs 常量定义
//!
//! 这个模块包含了 vsfs 镜像的所有常量定义，包括：
//! - 默认磁盘布局（块号以 4096 字节的块为单位）
//! - journal 磁盘格式
//! - inode 和目录项格式

//=============================================================================
// 基础常量
//=============================================================================

/// 逻辑块大小（4096 字节）
pub const VSFS_BLOCK_SIZE: u32 = 4096;

/// 默认镜像文件名
pub const VSFS_DEFAULT_IMAGE: &str = "vsfs.img";

//=============================================================================
// 默认磁盘布局
//=============================================================================

/// Journal 区域起始块
pub const VSFS_JOURNAL_BLOCK_IDX: u32 = 1;

/// Journal 区域块数
pub const VSFS_JOURNAL_BLOCKS: u32 = 16;

/// Inode 位图块
pub const VSFS_INODE_BMAP_IDX: u32 = VSFS_JOURNAL_BLOCK_IDX + VSFS_JOURNAL_BLOCKS;

/// 数据块位图块
pub const VSFS_DATA_BMAP_IDX: u32 = VSFS_INODE_BMAP_IDX + 1;

/// Inode 表起始块
pub const VSFS_INODE_START_IDX: u32 = VSFS_DATA_BMAP_IDX + 1;

/// Inode 表块数
pub const VSFS_INODE_BLOCKS: u32 = 2;

/// 数据区起始块（根目录就是第一个数据块）
pub const VSFS_DATA_START_IDX: u32 = VSFS_INODE_START_IDX + VSFS_INODE_BLOCKS;

/// 数据区块数
pub const VSFS_DATA_BLOCKS: u32 = 64;

/// 镜像总块数
pub const VSFS_TOTAL_BLOCKS: u32 = VSFS_DATA_START_IDX + VSFS_DATA_BLOCKS;

/// 可分配的 inode 数（inode 位图中有效的位数）
pub const VSFS_INODE_COUNT: u32 = 16;

//=============================================================================
// Journal 格式
//=============================================================================

/// Journal 魔数 ("JRNL")
pub const JOURNAL_MAGIC: u32 = 0x4A52_4E4C;

/// Journal 头大小：magic(u32) + bytes_used(u32)
pub const JOURNAL_HEADER_SIZE: u32 = 8;

/// 记录头大小：type(u16) + size(u16)
pub const RECORD_HEADER_SIZE: u32 = 4;

/// 数据记录类型
pub const REC_DATA: u16 = 1;

/// 提交记录类型
pub const REC_COMMIT: u16 = 2;

//=============================================================================
// Inode 和目录项
//=============================================================================

/// Inode 记录大小（字节）
pub const VSFS_INODE_SIZE: usize = 128;

/// 直接块指针数
pub const VSFS_DIRECT_POINTERS: usize = 8;

/// 未使用的 inode
pub const VSFS_INODE_TYPE_FREE: u16 = 0;

/// 普通文件
pub const VSFS_INODE_TYPE_FILE: u16 = 1;

/// 目录
pub const VSFS_INODE_TYPE_DIR: u16 = 2;

/// 目录项大小：inode(u32) + name[28]
pub const VSFS_DIRENT_SIZE: usize = 32;

/// 目录项名字字段长度（含结尾 NUL）
pub const VSFS_NAME_LEN: usize = 28;

/// 名字最大字节数
pub const VSFS_NAME_MAX: usize = VSFS_NAME_LEN - 1;
