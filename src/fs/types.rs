//! 文件系统配置与统计类型
//!
//! 磁盘布局（[`Layout`]）作为配置传给 journal 和检查点引擎，
//! 不在核心代码中硬编码块号。

use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};
use core::time::Duration;

/// 镜像磁盘布局
///
/// 所有字段都以块为单位。默认值即标准 vsfs 布局：
///
/// | 区域 | 块号 | 大小 |
/// |---|---|---|
/// | 保留 | 0 | 1 |
/// | Journal | 1 | 16 |
/// | Inode 位图 | 17 | 1 |
/// | 数据位图 | 18 | 1 |
/// | Inode 表 | 19–20 | 2 |
/// | 数据区 | 21–84 | 64 |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// 块大小（字节）
    pub block_size: u32,
    /// Journal 起始块
    pub journal_start: u32,
    /// Journal 块数
    pub journal_blocks: u32,
    /// Inode 位图块
    pub inode_bitmap: u32,
    /// 数据位图块
    pub data_bitmap: u32,
    /// Inode 表起始块
    pub inode_table: u32,
    /// Inode 表块数
    pub inode_table_blocks: u32,
    /// 数据区起始块（根目录块）
    pub data_start: u32,
    /// 数据区块数
    pub data_blocks: u32,
    /// 可分配的 inode 数
    pub inode_count: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            block_size: VSFS_BLOCK_SIZE,
            journal_start: VSFS_JOURNAL_BLOCK_IDX,
            journal_blocks: VSFS_JOURNAL_BLOCKS,
            inode_bitmap: VSFS_INODE_BMAP_IDX,
            data_bitmap: VSFS_DATA_BMAP_IDX,
            inode_table: VSFS_INODE_START_IDX,
            inode_table_blocks: VSFS_INODE_BLOCKS,
            data_start: VSFS_DATA_START_IDX,
            data_blocks: VSFS_DATA_BLOCKS,
            inode_count: VSFS_INODE_COUNT,
        }
    }
}

impl Layout {
    /// 镜像总块数
    pub fn total_blocks(&self) -> u32 {
        self.data_start + self.data_blocks
    }

    /// Journal 区域容量（字节）
    pub fn journal_capacity(&self) -> u32 {
        self.journal_blocks * self.block_size
    }

    /// 根目录所在块
    pub fn root_dir_block(&self) -> u32 {
        self.data_start
    }

    /// 每块 inode 数
    pub fn inodes_per_block(&self) -> u32 {
        self.block_size / VSFS_INODE_SIZE as u32
    }

    /// 每块目录项数
    pub fn dirents_per_block(&self) -> u32 {
        self.block_size / VSFS_DIRENT_SIZE as u32
    }

    /// 块号是否落在 journal 区域内
    pub fn in_journal(&self, block_no: u32) -> bool {
        block_no >= self.journal_start && block_no < self.journal_start + self.journal_blocks
    }

    /// 检查点时最先写回的位图块，按写回顺序排列
    pub fn bitmap_blocks(&self) -> [u32; 2] {
        [self.inode_bitmap, self.data_bitmap]
    }

    /// 校验布局
    ///
    /// 各区域必须按 保留块 < journal < inode 位图 < 数据位图 < inode 表 < 数据区 排列、互不重叠，
    /// 一条数据记录的大小必须能放进记录头的 u16 `size` 字段。
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg| Err(Error::new(ErrorKind::InvalidInput, msg));

        if self.block_size < VSFS_INODE_SIZE as u32 || self.block_size % VSFS_INODE_SIZE as u32 != 0 {
            return invalid("Block size must be a multiple of the inode size");
        }
        if self.block_size + 2 * RECORD_HEADER_SIZE > u16::MAX as u32 {
            return invalid("Block size too large for journal data records");
        }
        if self.journal_start == 0 || self.journal_blocks == 0 {
            return invalid("Journal region must follow the reserved block");
        }
        if self.inode_bitmap != self.journal_start + self.journal_blocks
            || self.data_bitmap != self.inode_bitmap + 1
            || self.inode_table != self.data_bitmap + 1
            || self.data_start != self.inode_table + self.inode_table_blocks
        {
            return invalid("Layout regions must be contiguous and ordered");
        }
        if self.data_blocks == 0 {
            return invalid("Data region must contain the root directory block");
        }
        if self.inode_count == 0
            || self.inode_count > self.inode_table_blocks * self.inodes_per_block()
            || self.inode_count > self.block_size * 8
        {
            return invalid("Inode count exceeds inode table or bitmap");
        }
        Ok(())
    }
}

/// 检查点策略
///
/// 决定 `create` 在把事务追加到 journal 之后是否立即检查点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointPolicy {
    /// 事务保持"已持久但未应用"，直到下一次显式 install 或下一次修改
    #[default]
    Deferred,
    /// 追加后立即检查点
    Immediate,
}

/// 不提供时间的时钟
pub fn no_clock() -> Option<Duration> {
    None
}

/// 文件系统配置
#[derive(Debug, Clone, Copy)]
pub struct FsConfig {
    /// 磁盘布局
    pub layout: Layout,
    /// 检查点策略
    pub checkpoint_policy: CheckpointPolicy,
    /// 时间戳来源（从 UNIX 纪元开始）；返回 None 时 ctime/mtime 写 0
    pub clock: fn() -> Option<Duration>,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            checkpoint_policy: CheckpointPolicy::Deferred,
            clock: no_clock,
        }
    }
}

impl FsConfig {
    /// 当前时间（秒），截断到 u32
    pub(crate) fn now_secs(&self) -> u32 {
        (self.clock)().map(|d| d.as_secs() as u32).unwrap_or(0)
    }
}

/// 文件系统统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatFs {
    /// 总 inode 数
    pub inodes_count: u32,
    /// 空闲 inode 数
    pub free_inodes_count: u32,
    /// 根目录已用目录项数
    pub dir_entries: u32,
    /// 根目录空闲目录项数
    pub free_dir_entries: u32,
    /// Journal 容量（字节）
    pub journal_capacity: u32,
    /// Journal 已用字节（含头）
    pub journal_used: u32,
    /// 块大小（字节）
    pub block_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_matches_image_map() {
        let layout = Layout::default();
        layout.validate().unwrap();

        assert_eq!(layout.journal_start, 1);
        assert_eq!(layout.inode_bitmap, 17);
        assert_eq!(layout.data_bitmap, 18);
        assert_eq!(layout.inode_table, 19);
        assert_eq!(layout.root_dir_block(), 21);
        assert_eq!(layout.total_blocks(), VSFS_TOTAL_BLOCKS);
        assert_eq!(VSFS_TOTAL_BLOCKS, 85);
        assert_eq!(layout.journal_capacity(), 16 * 4096);
        assert_eq!(layout.inodes_per_block(), 32);
        assert_eq!(layout.dirents_per_block(), 128);
    }

    #[test]
    fn test_in_journal() {
        let layout = Layout::default();
        assert!(!layout.in_journal(0));
        assert!(layout.in_journal(1));
        assert!(layout.in_journal(16));
        assert!(!layout.in_journal(17));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let mut layout = Layout::default();
        layout.inode_bitmap = 10;
        assert_eq!(layout.validate().unwrap_err().kind(), ErrorKind::InvalidInput);

        let mut layout = Layout::default();
        layout.inode_count = 65;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_fs_config_default() {
        let config = FsConfig::default();
        assert_eq!(config.checkpoint_policy, CheckpointPolicy::Deferred);
        assert_eq!(config.now_secs(), 0);
    }
}
