//! 块设备核心类型

use crate::error::{Error, ErrorKind, Result};

/// 块设备接口
///
/// 实现此 trait 以提供底层块设备访问。
///
/// # 示例
///
/// ```rust,ignore
/// use vsfs_journal::{BlockDevice, Result};
///
/// struct MyDevice {
///     // ...
/// }
///
/// impl BlockDevice for MyDevice {
///     fn block_size(&self) -> u32 {
///         4096
///     }
///
///     fn sector_size(&self) -> u32 {
///         4096
///     }
///
///     fn total_blocks(&self) -> u64 {
///         85
///     }
///
///     fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
///         // 实现扇区读取
///         Ok(count as usize * self.sector_size() as usize)
///     }
///
///     fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
///         // 实现扇区写入
///         Ok(count as usize * self.sector_size() as usize)
///     }
/// }
/// ```
pub trait BlockDevice {
    /// 逻辑块大小（vsfs 固定为 4096）
    fn block_size(&self) -> u32;

    /// 物理扇区大小
    fn sector_size(&self) -> u32;

    /// 总块数
    fn total_blocks(&self) -> u64;

    /// 读取扇区
    ///
    /// # 参数
    ///
    /// * `lba` - 起始地址（以扇区为单位）
    /// * `count` - 要读取的扇区数
    /// * `buf` - 目标缓冲区（大小至少为 count * sector_size）
    ///
    /// # 返回
    ///
    /// 成功返回实际读取的字节数
    fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize>;

    /// 写入扇区
    ///
    /// 一次调用要么完整落盘，要么返回错误；崩溃只会打断多次调用之间的序列。
    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize>;

    /// 刷新缓存
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 块设备包装器
///
/// 为 vsfs 提供按逻辑块号的访问，包含读写统计。
///
/// BlockDev 不包含内部锁：vsfs 假设同一时刻只有一个进程操作镜像，
/// 所有修改都通过 `&mut self` 进行。
pub struct BlockDev<D> {
    /// 底层设备
    device: D,
    /// 逻辑读取次数
    read_count: u64,
    /// 逻辑写入次数
    write_count: u64,
}

impl<D: BlockDevice> BlockDev<D> {
    /// 创建新的块设备包装器
    pub fn new(device: D) -> Result<Self> {
        let block_size = device.block_size();
        let sector_size = device.sector_size();

        if sector_size == 0 || block_size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block and sector size must be non-zero",
            ));
        }

        // 验证块大小是扇区大小的整数倍
        if block_size % sector_size != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block size must be a multiple of sector size",
            ));
        }

        Ok(Self {
            device,
            read_count: 0,
            write_count: 0,
        })
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.device
    }

    /// 获取底层设备的可变引用
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// 取回底层设备
    pub fn into_inner(self) -> D {
        self.device
    }

    /// 获取逻辑块大小
    pub fn block_size(&self) -> u32 {
        self.device.block_size()
    }

    /// 获取总块数
    pub fn total_blocks(&self) -> u64 {
        self.device.total_blocks()
    }

    /// 获取逻辑读取次数
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 获取逻辑写入次数
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    // 内部辅助方法

    /// 将逻辑块地址转换为物理扇区地址
    pub(super) fn logical_to_physical(&self, lba: u64) -> u64 {
        let block_size = self.device.block_size() as u64;
        let sector_size = self.device.sector_size() as u64;
        lba * block_size / sector_size
    }

    /// 每个逻辑块包含的物理扇区数
    pub(super) fn sectors_per_block(&self) -> u32 {
        self.device.block_size() / self.device.sector_size()
    }

    /// 检查块号是否在设备范围内
    pub(super) fn check_lba(&self, lba: u64) -> Result<()> {
        if lba >= self.device.total_blocks() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block number beyond end of device",
            ));
        }
        Ok(())
    }

    /// 增加读计数
    pub(super) fn inc_read_count(&mut self) {
        self.read_count += 1;
    }

    /// 增加写计数
    pub(super) fn inc_write_count(&mut self) {
        self.write_count += 1;
    }
}
