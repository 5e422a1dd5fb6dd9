//! 镜像文件块设备（需要 `std` 特性）

use super::BlockDevice;
use crate::error::{Error, ErrorKind, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// 以普通文件作为存储的块设备
#[derive(Debug)]
pub struct FileDevice {
    file: File,
    block_size: u32,
    total_blocks: u64,
}

impl FileDevice {
    /// 打开已有镜像，块数由文件长度决定
    pub fn open<P: AsRef<Path>>(path: P, block_size: u32) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        let len = file.metadata()?.len();

        if len % block_size as u64 != 0 {
            log::warn!(
                "[BLOCK] image length {} is not a multiple of block size {}, tail ignored",
                len,
                block_size
            );
        }

        Ok(Self {
            file,
            block_size,
            total_blocks: len / block_size as u64,
        })
    }

    /// 创建（或截断）镜像文件，长度为 `total_blocks` 个块，内容全零
    pub fn create<P: AsRef<Path>>(path: P, total_blocks: u64, block_size: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        file.set_len(total_blocks * block_size as u64)?;

        Ok(Self {
            file,
            block_size,
            total_blocks,
        })
    }

    fn check_range(&self, lba: u64, count: u32, buf_len: usize) -> Result<(u64, usize)> {
        let len = count as usize * self.block_size as usize;
        if lba + count as u64 > self.total_blocks || buf_len < len {
            return Err(Error::new(ErrorKind::Io, "request past end of image"));
        }
        Ok((lba * self.block_size as u64, len))
    }
}

impl BlockDevice for FileDevice {
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
        let (offset, len) = self.check_range(lba, count, buf.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf[..len])?;
        Ok(len)
    }

    fn write_blocks(&mut self, lba: u64, count: u32, buf: &[u8]) -> Result<usize> {
        let (offset, len) = self.check_range(lba, count, buf.len())?;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf[..len])?;
        Ok(len)
    }

    fn flush(&mut self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
