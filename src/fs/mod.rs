//! 文件系统高级 API
//!
//! 这个模块提供 vsfs 镜像的挂载、格式化、创建文件和检查点接口。

mod filesystem;
mod types;

pub use filesystem::{CleanView, CreateOutcome, Vsfs};
pub use types::{no_clock, CheckpointPolicy, FsConfig, Layout, StatFs};
