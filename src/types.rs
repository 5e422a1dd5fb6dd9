//! vsfs 磁盘数据结构定义
//!
//! 这个模块定义了镜像中所有定长结构的磁盘格式：
//!
//! 1. **字节序** - 所有字段都是小端序（little-endian）
//! 2. **编解码** - 通过 `byteorder` 逐字段读写，不依赖内存布局，也不需要 unsafe
//!
//! journal 记录的帧格式在 [`crate::journal::types`] 中定义。

use crate::consts::*;
use byteorder::{ByteOrder, LittleEndian};

// =============================================================================
// Journal Header
// =============================================================================

/// Journal 头
///
/// 位于 journal 区域第一个块的前 8 个字节。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    /// Journal 魔数，不匹配表示 journal 尚未初始化
    pub magic: u32,
    /// 有效记录数据的结束偏移（相对 journal 区域起点，包含头本身）
    pub bytes_used: u32,
}

impl JournalHeader {
    /// 新初始化的空 journal 头
    pub const fn empty() -> Self {
        Self {
            magic: JOURNAL_MAGIC,
            bytes_used: JOURNAL_HEADER_SIZE,
        }
    }

    /// 从字节解析（`buf` 至少 8 字节）
    pub fn decode(buf: &[u8]) -> Self {
        Self {
            magic: LittleEndian::read_u32(&buf[0..4]),
            bytes_used: LittleEndian::read_u32(&buf[4..8]),
        }
    }

    /// 编码为 8 字节
    pub fn encode(&self) -> [u8; JOURNAL_HEADER_SIZE as usize] {
        let mut out = [0u8; JOURNAL_HEADER_SIZE as usize];
        LittleEndian::write_u32(&mut out[0..4], self.magic);
        LittleEndian::write_u32(&mut out[4..8], self.bytes_used);
        out
    }

    /// 魔数是否匹配
    pub fn is_valid(&self) -> bool {
        self.magic == JOURNAL_MAGIC
    }

    /// journal 中是否没有任何记录
    pub fn is_empty(&self) -> bool {
        self.bytes_used <= JOURNAL_HEADER_SIZE
    }
}

// =============================================================================
// Inode
// =============================================================================

/// Inode
///
/// 磁盘布局：`type:u16, links:u16, size:u32, direct[8]:u32, ctime:u32, mtime:u32`，
/// 其余字节填零到 128 字节。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inode {
    /// 类型（0 = 未使用，1 = 普通文件，2 = 目录）
    pub kind: u16,
    /// 硬链接数
    pub links: u16,
    /// 文件大小（字节）
    pub size: u32,
    /// 直接块指针
    pub direct: [u32; VSFS_DIRECT_POINTERS],
    /// 创建时间（秒）
    pub ctime: u32,
    /// 修改时间（秒）
    pub mtime: u32,
}

impl Inode {
    /// 新建的空普通文件
    pub fn new_file(now: u32) -> Self {
        Self {
            kind: VSFS_INODE_TYPE_FILE,
            links: 1,
            size: 0,
            direct: [0; VSFS_DIRECT_POINTERS],
            ctime: now,
            mtime: now,
        }
    }

    /// 从 128 字节的记录解析
    pub fn decode(buf: &[u8]) -> Self {
        let mut direct = [0u32; VSFS_DIRECT_POINTERS];
        LittleEndian::read_u32_into(&buf[8..8 + 4 * VSFS_DIRECT_POINTERS], &mut direct);
        let tail = 8 + 4 * VSFS_DIRECT_POINTERS;
        Self {
            kind: LittleEndian::read_u16(&buf[0..2]),
            links: LittleEndian::read_u16(&buf[2..4]),
            size: LittleEndian::read_u32(&buf[4..8]),
            direct,
            ctime: LittleEndian::read_u32(&buf[tail..tail + 4]),
            mtime: LittleEndian::read_u32(&buf[tail + 4..tail + 8]),
        }
    }

    /// 编码到 128 字节的记录（整条记录先清零）
    pub fn encode_into(&self, buf: &mut [u8]) {
        let buf = &mut buf[..VSFS_INODE_SIZE];
        buf.fill(0);
        LittleEndian::write_u16(&mut buf[0..2], self.kind);
        LittleEndian::write_u16(&mut buf[2..4], self.links);
        LittleEndian::write_u32(&mut buf[4..8], self.size);
        LittleEndian::write_u32_into(&self.direct, &mut buf[8..8 + 4 * VSFS_DIRECT_POINTERS]);
        let tail = 8 + 4 * VSFS_DIRECT_POINTERS;
        LittleEndian::write_u32(&mut buf[tail..tail + 4], self.ctime);
        LittleEndian::write_u32(&mut buf[tail + 4..tail + 8], self.mtime);
    }

    /// 是否为普通文件
    pub fn is_file(&self) -> bool {
        self.kind == VSFS_INODE_TYPE_FILE
    }

    /// 是否为目录
    pub fn is_dir(&self) -> bool {
        self.kind == VSFS_INODE_TYPE_DIR
    }
}

// =============================================================================
// Directory Entry
// =============================================================================

/// 目录项
///
/// 磁盘布局：`inode:u32, name:[u8; 28]`，名字以 NUL 结尾/填充。
/// 名字第一个字节为 NUL 表示空闲槽位（inode 0 是合法的已分配 inode）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDirEntry {
    /// Inode 编号
    pub inode: u32,
    /// 名字字段
    pub name: [u8; VSFS_NAME_LEN],
}

impl RawDirEntry {
    /// 构造目录项；调用者负责保证名字不超过 [`VSFS_NAME_MAX`] 字节
    pub fn new(inode: u32, name: &[u8]) -> Self {
        let mut field = [0u8; VSFS_NAME_LEN];
        let len = name.len().min(VSFS_NAME_MAX);
        field[..len].copy_from_slice(&name[..len]);
        Self { inode, name: field }
    }

    /// 从 32 字节解析
    pub fn decode(buf: &[u8]) -> Self {
        let mut name = [0u8; VSFS_NAME_LEN];
        name.copy_from_slice(&buf[4..4 + VSFS_NAME_LEN]);
        Self {
            inode: LittleEndian::read_u32(&buf[0..4]),
            name,
        }
    }

    /// 编码到 32 字节
    pub fn encode_into(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.inode);
        buf[4..4 + VSFS_NAME_LEN].copy_from_slice(&self.name);
    }

    /// 是否为空闲槽位
    pub fn is_free(&self) -> bool {
        self.name[0] == 0
    }

    /// 名字字节（不含结尾 NUL）
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(VSFS_NAME_LEN);
        &self.name[..end]
    }
}
