//! Transaction 系统
//!
//! 把一次元数据修改涉及的整块镜像收集起来，作为一个事务追加到 journal。
//!
//! ## 使用说明
//!
//! ```rust,ignore
//! use vsfs_journal::transaction::JournalTransaction;
//!
//! let mut trans = JournalTransaction::begin(&mut bdev, &mut journal)?;
//!
//! // 读取块（优先返回本事务已暂存的内容）
//! let mut bitmap = trans.read_block(layout.inode_bitmap)?;
//! bitmap[0] |= 1;
//! trans.stage(layout.inode_bitmap, bitmap)?;
//!
//! // 提交：所有数据记录 + 一条提交记录，journal 头只写一次
//! trans.commit()?;
//! ```
//!
//! 事务在提交前被丢弃（`abort` 或 drop）时不会写任何东西。
//! 提交后的内容只是"已持久、未应用"，写回真实块由检查点负责。

mod journal;

pub use journal::JournalTransaction;
