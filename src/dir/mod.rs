//! 目录操作模块
//!
//! vsfs 只有一个目录：根目录，占据数据区第一个块，由定长 32 字节的槽位组成。
//!
//! ## 模块结构
//!
//! - `entry` - 目录项类型与名字校验
//! - `lookup` - 槽位遍历与按名查找
//! - `write` - 插入目录项（作用于根目录块的内存副本）

mod entry;
mod lookup;
mod write;

pub use entry::{validate_name, DirEntry};
pub use lookup::{entries, lookup, read_dir, used_entries};
pub use write::insert_entry;
