//! Inode 表读写辅助函数

use crate::{
    block::{BlockDev, BlockDevice},
    consts::VSFS_INODE_SIZE,
    error::{Error, ErrorKind, Result},
    fs::Layout,
    types::Inode,
};

/// inode 在 inode 表中的位置
///
/// # 返回
///
/// `(块号, 块内字节偏移)`
pub fn inode_location(layout: &Layout, ino: u32) -> Result<(u32, usize)> {
    if ino >= layout.inode_count {
        return Err(Error::new(ErrorKind::InvalidInput, "Inode number out of range"));
    }
    let per_block = layout.inodes_per_block();
    let block = layout.inode_table + ino / per_block;
    let offset = (ino % per_block) as usize * VSFS_INODE_SIZE;
    Ok((block, offset))
}

/// 从磁盘读取 inode
pub fn read_inode<D: BlockDevice>(
    bdev: &mut BlockDev<D>,
    layout: &Layout,
    ino: u32,
) -> Result<Inode> {
    let (block, offset) = inode_location(layout, ino)?;
    let mut buf = [0u8; VSFS_INODE_SIZE];
    bdev.read_bytes(
        block as u64 * layout.block_size as u64 + offset as u64,
        &mut buf,
    )?;
    Ok(Inode::decode(&buf))
}

/// 把 inode 写进 inode 表块的内存副本
///
/// `table_block` 必须是 `ino` 所在的那个 inode 表块。
pub fn write_inode_into(table_block: &mut [u8], layout: &Layout, ino: u32, inode: &Inode) -> Result<()> {
    let (_, offset) = inode_location(layout, ino)?;
    let slot = table_block
        .get_mut(offset..offset + VSFS_INODE_SIZE)
        .ok_or(Error::new(ErrorKind::InvalidInput, "Inode table block too small"))?;
    inode.encode_into(slot);
    Ok(())
}
