//! Inode 分配功能

use crate::{
    bitmap::*,
    error::{Error, ErrorKind, Result},
    fs::Layout,
};

/// 分配一个 inode
///
/// 在 `0..inode_count` 中选取编号最小的空闲 inode，并在位图副本中置位。
///
/// # 参数
///
/// * `bitmap` - inode 位图块的内存副本
/// * `layout` - 磁盘布局
///
/// # 返回
///
/// 成功返回分配的 inode 编号
///
/// # 错误
///
/// - `ErrorKind::NoFreeInode` - 所有 inode 都已分配，位图保持不变
pub fn alloc_inode(bitmap: &mut [u8], layout: &Layout) -> Result<u32> {
    let ino = find_first_zero(bitmap, 0, layout.inode_count)
        .ok_or(Error::new(ErrorKind::NoFreeInode, "No free inodes"))?;

    set_bit(bitmap, ino)?;

    log::debug!("[CREATE] allocated inode {}", ino);
    Ok(ino)
}

/// 空闲 inode 数
pub fn free_inodes_count(bitmap: &[u8], layout: &Layout) -> u32 {
    count_zeros(bitmap, 0, layout.inode_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_lowest_free() {
        let layout = Layout::default();
        let mut bitmap = alloc::vec![0u8; 4096];
        bitmap[0] = 0b0000_0011;

        assert_eq!(alloc_inode(&mut bitmap, &layout).unwrap(), 2);
        assert_eq!(bitmap[0], 0b0000_0111);
    }

    #[test]
    fn test_alloc_fills_hole_first() {
        let layout = Layout::default();
        let mut bitmap = alloc::vec![0u8; 4096];
        bitmap[0] = 0b1111_1011;

        assert_eq!(alloc_inode(&mut bitmap, &layout).unwrap(), 2);
    }

    #[test]
    fn test_alloc_exhausted() {
        let layout = Layout::default();
        let mut bitmap = alloc::vec![0u8; 4096];
        bitmap[0] = 0xFF;
        bitmap[1] = 0xFF;
        let before = bitmap.clone();

        let err = alloc_inode(&mut bitmap, &layout).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoFreeInode);
        assert_eq!(bitmap, before);
        assert_eq!(free_inodes_count(&bitmap, &layout), 0);
    }

    #[test]
    fn test_bits_beyond_inode_count_ignored() {
        let layout = Layout::default();
        let mut bitmap = alloc::vec![0u8; 4096];
        bitmap[0] = 0xFF;
        bitmap[1] = 0xFF;
        // 第 16 位之后的位不属于任何 inode
        bitmap[2] = 0x00;

        assert!(alloc_inode(&mut bitmap, &layout).is_err());
        assert_eq!(bitmap[2], 0);
    }
}
