//! vsfs Journal 实现
//!
//! 这个模块提供 journal 的全部功能：事务帧格式、追加、扫描和检查点。
//!
//! # 架构概述
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │               Filesystem (Vsfs::create)                   │
//! └───────────────────────┬──────────────────────────────────┘
//!                         │ stage whole blocks
//!                         ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │        JournalTransaction (transaction module)            │
//! └───────────────────────┬──────────────────────────────────┘
//!                         │ Transaction (DATA... + COMMIT)
//!                         ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   Journal Core                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐   │
//! │  │   Journal    │  │ scan_journal │  │ do_checkpoint│   │
//! │  │  (append)    │  │  (recovery)  │  │   (replay)   │   │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘   │
//! └─────────┼─────────────────┼─────────────────┼────────────┘
//!           ▼                 ▼                 ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Block Layer                           │
//! │                 BlockDev / BlockDevice                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # 核心组件
//!
//! - [`types`] - 记录格式与 [`Transaction`]
//! - [`Journal`] - journal 区域和头部管理，`append`
//! - [`scan_journal`] - 记录流解析，丢弃未提交的记录
//! - [`do_checkpoint`] - 按位图优先的顺序写回已提交事务，然后截断 journal
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use vsfs_journal::journal::{do_checkpoint, Journal, Transaction};
//!
//! let mut journal = Journal::open_or_init(&mut bdev, layout)?;
//!
//! let mut txn = Transaction::new();
//! txn.push(layout.inode_bitmap, bitmap_block);
//! journal.append(&mut bdev, &txn)?;   // 已持久，未应用
//!
//! do_checkpoint(&mut journal, &mut bdev)?;   // 应用并截断
//! ```

pub mod types;

mod wal;
mod recovery;
mod checkpoint;

// Re-exports
pub use types::{DataRecord, RecordHeader, RecordKind, Transaction};
pub use wal::Journal;
pub use recovery::{scan_journal, CommittedTransaction, ScanResult, ScanStop};
pub use checkpoint::{apply_order, do_checkpoint, CheckpointReport};

/// Journal 错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalError {
    /// 剩余空间不足
    Full {
        /// 事务编码后需要的字节数
        needed: u32,
        /// 当前剩余字节数
        remaining: u32,
    },
    /// 记录长度超出记录头 u16 的表示范围
    RecordTooLarge,
    /// 数据记录的内容不是一个完整块
    BadPayload,
    /// 数据记录的目标块非法（保留块、journal 区域或越界）
    ForbiddenTarget(u32),
}

impl core::fmt::Display for JournalError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            JournalError::Full { needed, remaining } => {
                write!(f, "Journal full: need {} bytes, {} remaining", needed, remaining)
            }
            JournalError::RecordTooLarge => write!(f, "Journal record too large"),
            JournalError::BadPayload => write!(f, "Data record payload is not one block"),
            JournalError::ForbiddenTarget(block) => {
                write!(f, "Data record targets forbidden block {}", block)
            }
        }
    }
}
