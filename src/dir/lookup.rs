//! 目录遍历与查找

use super::entry::DirEntry;
use crate::{
    block::{BlockDev, BlockDevice},
    consts::VSFS_DIRENT_SIZE,
    error::Result,
    fs::Layout,
    types::RawDirEntry,
};
use alloc::vec::Vec;

/// 遍历目录块中的所有槽位（含空闲槽位）
pub(crate) fn raw_slots(block: &[u8]) -> impl Iterator<Item = (u32, RawDirEntry)> + '_ {
    block
        .chunks_exact(VSFS_DIRENT_SIZE)
        .enumerate()
        .map(|(slot, buf)| (slot as u32, RawDirEntry::decode(buf)))
}

/// 目录块中的已用目录项，按槽位顺序
pub fn entries(block: &[u8]) -> Vec<DirEntry> {
    raw_slots(block)
        .filter(|(_, raw)| !raw.is_free())
        .map(|(slot, raw)| DirEntry::from_raw(&raw, slot))
        .collect()
}

/// 已用目录项数
pub fn used_entries(block: &[u8]) -> u32 {
    raw_slots(block).filter(|(_, raw)| !raw.is_free()).count() as u32
}

/// 按名字查找目录项
pub fn lookup(block: &[u8], name: &str) -> Option<DirEntry> {
    raw_slots(block)
        .find(|(_, raw)| !raw.is_free() && raw.name_bytes() == name.as_bytes())
        .map(|(slot, raw)| DirEntry::from_raw(&raw, slot))
}

/// 从磁盘读取根目录
///
/// 只反映已经检查点的内容；journal 中尚未应用的事务不可见。
pub fn read_dir<D: BlockDevice>(bdev: &mut BlockDev<D>, layout: &Layout) -> Result<Vec<DirEntry>> {
    let mut block = alloc::vec![0u8; layout.block_size as usize];
    bdev.read_block(layout.root_dir_block() as u64, &mut block)?;
    Ok(entries(&block))
}
