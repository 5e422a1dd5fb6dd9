//! vsfs_journal: 带 write-ahead journal 的极简文件系统镜像
//!
//! 这是一个纯 Rust 实现的 vsfs 镜像库，旨在提供：
//! - **崩溃一致性**：所有元数据修改先以整块镜像写入 journal，提交记录落盘后才可见
//! - **幂等回放**：检查点按"位图优先"的顺序写回，中途崩溃后重新执行即可收敛
//! - **Rust 惯用风格**的 API
//! - **no_std 支持**（关闭默认的 `std` feature）
//!
//! # 示例
//!
//! ```rust,ignore
//! use vsfs_journal::{FsConfig, MemDevice, Vsfs, Result};
//!
//! fn main() -> Result<()> {
//!     let device = MemDevice::new(85, 4096);
//!     let mut fs = Vsfs::format(device, FsConfig::default())?;
//!
//!     fs.create("a.txt")?;
//!     fs.install()?;
//!
//!     assert_eq!(fs.read_dir()?[0].name, "a.txt");
//!     Ok(())
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 块设备抽象和 I/O 操作
//! - [`consts`] - 常量定义
//! - [`types`] - 磁盘数据结构
//! - [`journal`] - Journal 记录格式、追加、扫描和检查点
//! - [`transaction`] - 事务构造
//! - [`fs`] - 文件系统高级 API

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 块设备抽象
pub mod block;

/// 常量定义
pub mod consts;

/// 数据结构定义
pub mod types;

/// 位图操作
pub mod bitmap;

/// Journal 系统
pub mod journal;

/// Transaction 系统
pub mod transaction;

/// Inode 分配
pub mod ialloc;

/// 目录操作
pub mod dir;

/// 文件系统高级 API
pub mod fs;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 块设备
pub use block::{BlockDevice, BlockDev, MemDevice};
#[cfg(feature = "std")]
pub use block::FileDevice;

// 数据结构
pub use types::{Inode, JournalHeader, RawDirEntry};

// Dir
pub use dir::DirEntry;

// FileSystem
pub use fs::{
    CheckpointPolicy, CleanView, CreateOutcome, FsConfig, Layout, StatFs, Vsfs,
};

// Transaction
pub use transaction::JournalTransaction;

// Journal
pub use journal::{
    do_checkpoint, scan_journal, CheckpointReport, Journal, JournalError, ScanResult, Transaction,
};
