//! 块设备抽象
//!
//! 提供块设备接口和块级 I/O 操作。
//! block/device.rs 定义 `BlockDevice` trait 和 `BlockDev` 包装器（地址转换、统计）
//!
//! block/io.rs 提供整块读写以及按字节偏移读写；字节读写通过"读-改-写"整块完成，
//! 底层设备永远只看到整块 I/O
//!
//! block/mem.rs 和 block/file.rs 是两个具体设备：内存盘（支持写故障注入，用于模拟崩溃）和镜像文件

mod device;
mod io;
mod mem;
#[cfg(feature = "std")]
mod file;

pub use device::{BlockDevice, BlockDev};
pub use mem::MemDevice;
#[cfg(feature = "std")]
pub use file::FileDevice;
