//! 内存块设备
//!
//! 用于测试和崩溃模拟：可以设置"成功写入 N 次后所有写入失败"，
//! 之前落盘的写入保持不变，相当于进程在第 N+1 次块写入前崩溃。

use super::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use alloc::vec::Vec;

/// 内存块设备
#[derive(Debug, Clone)]
pub struct MemDevice {
    block_size: u32,
    total_blocks: u64,
    storage: Vec<u8>,
    /// 已成功完成的写调用次数
    writes: u64,
    /// 允许成功的写调用次数上限
    fail_after: Option<u64>,
}

impl MemDevice {
    /// 创建全零的内存设备
    pub fn new(total_blocks: u64, block_size: u32) -> Self {
        let storage = alloc::vec![0u8; (total_blocks * block_size as u64) as usize];
        Self {
            block_size,
            total_blocks,
            storage,
            writes: 0,
            fail_after: None,
        }
    }

    /// 从已有镜像内容创建（长度向下取整到块大小）
    pub fn from_image(image: Vec<u8>, block_size: u32) -> Self {
        let total_blocks = (image.len() / block_size as usize) as u64;
        let mut storage = image;
        storage.truncate((total_blocks * block_size as u64) as usize);
        Self {
            block_size,
            total_blocks,
            storage,
            writes: 0,
            fail_after: None,
        }
    }

    /// 从现在起再允许 `n` 次写入成功，之后的写入全部返回 I/O 错误
    pub fn fail_writes_after(&mut self, n: u64) {
        self.fail_after = Some(self.writes + n);
    }

    /// 清除故障注入
    pub fn heal(&mut self) {
        self.fail_after = None;
    }

    /// 已成功的写调用次数
    pub fn write_calls(&self) -> u64 {
        self.writes
    }

    /// 整个镜像的原始字节
    pub fn image(&self) -> &[u8] {
        &self.storage
    }

    /// 某个块的原始字节
    pub fn block(&self, lba: u64) -> &[u8] {
        let bs = self.block_size as usize;
        let start = lba as usize * bs;
        &self.storage[start..start + bs]
    }
}

impl BlockDevice for MemDevice {
    fn block_size(&self) -> u32 {
        self.block_size
    }

    fn sector_size(&self) -> u32 {
        self.block_size
    }

    fn total_blocks(&self) -> u64 {
        self.total_blocks
    }

    fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
        let start = (lba * self.block_size as u64) as usize;
        let len = (count * self.block_size) as usize;
        if start + len > self.storage.len() || buf.len() < len {
            return Err(Error::new(ErrorKind::Io, "read past end of memory device"));
        }
        buf[..len].copy_from_slice(&self.storage[start..start + len]);
        Ok(len)
    }

    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
        if let Some(limit) = self.fail_after {
            if self.writes >= limit {
                return Err(Error::new(ErrorKind::Io, "injected write fault"));
            }
        }

        let start = (lba * self.block_size as u64) as usize;
        let len = (count * self.block_size) as usize;
        if start + len > self.storage.len() || buf.len() < len {
            return Err(Error::new(ErrorKind::Io, "write past end of memory device"));
        }
        self.storage[start..start + len].copy_from_slice(&buf[..len]);
        self.writes += 1;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_injection() {
        let mut dev = MemDevice::new(4, 512);
        let data = [1u8; 512];

        dev.fail_writes_after(1);
        assert!(dev.write_blocks(0, 1, &data).is_ok());
        assert!(dev.write_blocks(1, 1, &data).is_err());
        assert_eq!(dev.block(1), &[0u8; 512][..]);

        dev.heal();
        assert!(dev.write_blocks(1, 1, &data).is_ok());
        assert_eq!(dev.write_calls(), 2);
    }

    #[test]
    fn test_from_image_truncates() {
        let dev = MemDevice::from_image(alloc::vec![0u8; 1100], 512);
        assert_eq!(dev.total_blocks(), 2);
        assert_eq!(dev.image().len(), 1024);
    }
}
