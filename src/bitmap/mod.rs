//! 位图操作
//!
//! inode 位图和数据块位图都是一个块大小的位向量：第 i 位置 1 表示资源 i 已分配，
//! 第 i 位位于第 `i / 8` 字节的第 `i % 8` 位（低位在前）。
//!
//! 这里只有纯内存操作，不做任何 I/O。

mod ops;

pub use ops::*;
