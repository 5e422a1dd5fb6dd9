//! 目录写操作
//!
//! 所有写操作都作用在目录块的内存副本上，由调用者把结果放进事务。

use super::{entry::validate_name, lookup::{lookup, raw_slots}};
use crate::{
    consts::VSFS_DIRENT_SIZE,
    error::{Error, ErrorKind, Result},
    types::RawDirEntry,
};

/// 在第一个空闲槽位插入目录项
///
/// # 返回
///
/// 成功返回使用的槽位
///
/// # 错误
///
/// - `ErrorKind::InvalidInput` - 名字不合法
/// - `ErrorKind::AlreadyExists` - 同名目录项已存在
/// - `ErrorKind::DirectoryFull` - 没有空闲槽位
pub fn insert_entry(block: &mut [u8], inode: u32, name: &str) -> Result<u32> {
    validate_name(name)?;

    if lookup(block, name).is_some() {
        return Err(Error::new(ErrorKind::AlreadyExists, "Directory entry already exists"));
    }

    let slot = raw_slots(block)
        .find(|(_, raw)| raw.is_free())
        .map(|(slot, _)| slot)
        .ok_or(Error::new(ErrorKind::DirectoryFull, "Root directory is full"))?;

    let off = slot as usize * VSFS_DIRENT_SIZE;
    RawDirEntry::new(inode, name.as_bytes()).encode_into(&mut block[off..off + VSFS_DIRENT_SIZE]);

    log::debug!("[CREATE] dir entry '{}' -> inode {} at slot {}", name, inode, slot);
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dir::entries;

    #[test]
    fn test_insert_first_free_slot() {
        let mut block = alloc::vec![0u8; 4096];
        assert_eq!(insert_entry(&mut block, 0, "a.txt").unwrap(), 0);
        assert_eq!(insert_entry(&mut block, 1, "b.txt").unwrap(), 1);

        let list = entries(&block);
        assert_eq!(list[0].name, "a.txt");
        assert_eq!(list[1].inode, 1);
    }

    #[test]
    fn test_insert_reuses_hole() {
        let mut block = alloc::vec![0u8; 4096];
        insert_entry(&mut block, 0, "a").unwrap();
        insert_entry(&mut block, 1, "b").unwrap();
        // 清空槽位 0
        block[..VSFS_DIRENT_SIZE].fill(0);

        assert_eq!(insert_entry(&mut block, 2, "c").unwrap(), 0);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut block = alloc::vec![0u8; 4096];
        insert_entry(&mut block, 0, "a.txt").unwrap();
        let before = block.clone();

        let err = insert_entry(&mut block, 1, "a.txt").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(block, before);
    }

    #[test]
    fn test_insert_directory_full() {
        let mut block = alloc::vec![0u8; 4096];
        for i in 0..128u32 {
            let name = alloc::format!("f{}", i);
            insert_entry(&mut block, i, &name).unwrap();
        }
        let err = insert_entry(&mut block, 0, "extra").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryFull);
    }
}
