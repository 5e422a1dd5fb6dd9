//! Inode 分配模块
//!
//! 这个模块提供 inode 的分配和 inode 表读写功能。
//!
//! 分配是纯内存操作：调用者提供 inode 位图块的副本，分配结果只有在
//! 所属事务提交并检查点之后才会出现在磁盘上。

mod allocator;
mod helpers;

pub use allocator::*;
pub use helpers::*;
