//! 块 I/O 操作实现

use super::{BlockDev, BlockDevice};
use crate::error::{Error, ErrorKind, Result};
use alloc::vec;

impl<D: BlockDevice> BlockDev<D> {
    /// 读取单个逻辑块
    ///
    /// # 参数
    ///
    /// * `lba` - 逻辑块地址
    /// * `buf` - 目标缓冲区（大小至少为 block_size）
    ///
    /// # 返回
    ///
    /// 成功返回读取的字节数
    pub fn read_block(&mut self, lba: u64, buf: &mut [u8]) -> Result<usize> {
        let block_size = self.block_size() as usize;

        if buf.len() < block_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer too small for block",
            ));
        }
        self.check_lba(lba)?;

        self.inc_read_count();
        let pba = self.logical_to_physical(lba);
        let count = self.sectors_per_block();
        self.device_mut().read_blocks(pba, count, &mut buf[..block_size])
    }

    /// 写入单个逻辑块
    ///
    /// 整块覆盖写；块是 I/O 的原子单位。
    pub fn write_block(&mut self, lba: u64, buf: &[u8]) -> Result<usize> {
        let block_size = self.block_size() as usize;

        if buf.len() < block_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer too small for block",
            ));
        }
        self.check_lba(lba)?;

        self.inc_write_count();
        let pba = self.logical_to_physical(lba);
        let count = self.sectors_per_block();
        self.device_mut().write_blocks(pba, count, &buf[..block_size])
    }

    /// 连续读取多个逻辑块
    pub fn read_blocks(&mut self, lba: u64, count: u32, buf: &mut [u8]) -> Result<usize> {
        let block_size = self.block_size() as usize;
        if buf.len() < count as usize * block_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Buffer too small for requested blocks",
            ));
        }

        for (i, chunk) in buf.chunks_mut(block_size).take(count as usize).enumerate() {
            self.read_block(lba + i as u64, chunk)?;
        }
        Ok(count as usize * block_size)
    }

    /// 读取字节
    ///
    /// 从任意字节偏移读取，自动处理跨块情况。
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// let mut header = [0u8; 8];
    /// block_dev.read_bytes(4096, &mut header)?;
    /// ```
    pub fn read_bytes(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        if len == 0 {
            return Ok(0);
        }
        let block_size = self.block_size() as u64;

        // 计算起始块和块内偏移
        let start_block = offset / block_size;
        let block_offset = (offset % block_size) as usize;

        // 计算需要读取的块数
        let total_size = block_offset + len;
        let block_count = (total_size as u64).div_ceil(block_size) as usize;

        let mut temp = vec![0u8; block_count * block_size as usize];
        self.read_blocks(start_block, block_count as u32, &mut temp)?;

        buf.copy_from_slice(&temp[block_offset..block_offset + len]);
        Ok(len)
    }

    /// 写入字节
    ///
    /// 向任意字节偏移写入。首尾两个不完整的块先读出再合并，
    /// 然后按块号升序整块写回。读失败直接返回错误，不会用零覆盖原有数据。
    pub fn write_bytes(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        let len = buf.len();
        if len == 0 {
            return Ok(0);
        }
        let block_size = self.block_size() as u64;
        let bs = block_size as usize;

        let start_block = offset / block_size;
        let block_offset = (offset % block_size) as usize;

        let total_size = block_offset + len;
        let block_count = (total_size as u64).div_ceil(block_size) as usize;

        let mut temp = vec![0u8; block_count * bs];

        // 首块不对齐
        if block_offset != 0 {
            self.read_block(start_block, &mut temp[..bs])?;
        }
        // 尾块不对齐
        let tail_used = total_size % bs;
        if tail_used != 0 && (block_count > 1 || block_offset == 0) {
            let last = block_count - 1;
            self.read_block(start_block + last as u64, &mut temp[last * bs..])?;
        }

        temp[block_offset..block_offset + len].copy_from_slice(buf);

        for (i, chunk) in temp.chunks(bs).enumerate() {
            self.write_block(start_block + i as u64, chunk)?;
        }

        Ok(len)
    }

    /// 刷新设备
    pub fn flush(&mut self) -> Result<()> {
        self.device_mut().flush()
    }
}

#[cfg(test)]
mod tests {
    use crate::block::{BlockDev, MemDevice};

    #[test]
    fn test_block_roundtrip() {
        let mut bdev = BlockDev::new(MemDevice::new(8, 4096)).unwrap();
        let data = alloc::vec![0xABu8; 4096];
        bdev.write_block(3, &data).unwrap();

        let mut out = alloc::vec![0u8; 4096];
        bdev.read_block(3, &mut out).unwrap();
        assert_eq!(out, data);
        assert_eq!(bdev.write_count(), 1);
        assert_eq!(bdev.read_count(), 1);
    }

    #[test]
    fn test_block_out_of_range() {
        let mut bdev = BlockDev::new(MemDevice::new(4, 4096)).unwrap();
        let mut out = alloc::vec![0u8; 4096];
        assert!(bdev.read_block(4, &mut out).is_err());
        assert!(bdev.write_block(10, &out).is_err());
    }

    #[test]
    fn test_write_bytes_preserves_neighbours() {
        let mut bdev = BlockDev::new(MemDevice::new(4, 4096)).unwrap();
        bdev.write_block(0, &alloc::vec![0x11u8; 4096]).unwrap();
        bdev.write_block(1, &alloc::vec![0x22u8; 4096]).unwrap();

        // 跨越块 0 和块 1 的写入
        bdev.write_bytes(4090, &[0xFF; 12]).unwrap();

        let mut b0 = alloc::vec![0u8; 4096];
        let mut b1 = alloc::vec![0u8; 4096];
        bdev.read_block(0, &mut b0).unwrap();
        bdev.read_block(1, &mut b1).unwrap();

        assert_eq!(b0[4089], 0x11);
        assert!(b0[4090..].iter().all(|&b| b == 0xFF));
        assert!(b1[..6].iter().all(|&b| b == 0xFF));
        assert_eq!(b1[6], 0x22);
    }

    #[test]
    fn test_read_bytes_unaligned() {
        let mut bdev = BlockDev::new(MemDevice::new(4, 4096)).unwrap();
        bdev.write_bytes(4100, b"journal").unwrap();

        let mut out = [0u8; 7];
        bdev.read_bytes(4100, &mut out).unwrap();
        assert_eq!(&out, b"journal");
    }

    #[test]
    fn test_write_bytes_aligned_full_block_skips_read() {
        let mut bdev = BlockDev::new(MemDevice::new(4, 4096)).unwrap();
        bdev.write_bytes(4096, &alloc::vec![7u8; 4096]).unwrap();
        assert_eq!(bdev.read_count(), 0);
        assert_eq!(bdev.write_count(), 1);
    }
}
