//! Journal 检查点
//!
//! 检查点是 journal 中已提交内容的唯一消费者，也是 journal 之外
//! 唯一会写真实元数据块（位图、inode 表、目录块）的代码路径。

use super::{recovery::scan_journal, types::DataRecord, Journal};
use crate::{
    block::{BlockDev, BlockDevice},
    error::Result,
    fs::Layout,
};
use alloc::vec::Vec;

/// 检查点结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckpointReport {
    /// 应用的事务数
    pub transactions: usize,
    /// 写回的块数
    pub blocks_written: usize,
    /// 因缺少提交记录而丢弃的数据记录数
    pub discarded_records: usize,
}

/// 执行检查点
///
/// # 检查点流程
///
/// 1. 从磁盘加载 journal 头，读出整个 journal 区域
/// 2. 扫描记录流，得到已提交事务
/// 3. 逐个事务按"inode 位图 → 数据位图 → 其余块（原顺序）"写回
/// 4. 刷新设备，然后把 `bytes_used` 重置为头部大小并持久化
///
/// 写回过程中任何 I/O 错误都直接返回，不回滚：journal 头只在全部写回后才重置，
/// 而每条记录都是整块镜像，重新执行检查点即可收敛到同一结果。
pub fn do_checkpoint<D: BlockDevice>(
    journal: &mut Journal,
    bdev: &mut BlockDev<D>,
) -> Result<CheckpointReport> {
    let header = journal.reload(bdev)?;
    let layout = *journal.layout();

    let mut report = CheckpointReport::default();

    if !header.is_empty() {
        let region = journal.read_region(bdev)?;
        let scan = scan_journal(&region, header.bytes_used, &layout);

        for txn in &scan.transactions {
            report.blocks_written += apply_transaction(&txn.records, &layout, bdev)?;
            report.transactions += 1;
        }
        report.discarded_records = scan.discarded_records;

        bdev.flush()?;
    }

    journal.reset(bdev)?;

    log::info!(
        "[CHECKPOINT] applied {} transactions ({} blocks), discarded {} records",
        report.transactions,
        report.blocks_written,
        report.discarded_records
    );
    Ok(report)
}

/// 事务内记录的写回顺序
///
/// 位图是分配信息的权威来源，先写位图：inode 位图最先，数据位图其次，
/// 其余记录保持在事务中的原始顺序。
pub fn apply_order<'a>(records: &'a [DataRecord], layout: &Layout) -> Vec<&'a DataRecord> {
    let bitmaps = layout.bitmap_blocks();

    let mut ordered: Vec<&DataRecord> = Vec::with_capacity(records.len());
    for bitmap in bitmaps {
        ordered.extend(records.iter().filter(|r| r.block_no == bitmap));
    }
    ordered.extend(records.iter().filter(|r| !bitmaps.contains(&r.block_no)));
    ordered
}

/// 把一个已提交事务写回文件系统，返回写入的块数
fn apply_transaction<D: BlockDevice>(
    records: &[DataRecord],
    layout: &Layout,
    bdev: &mut BlockDev<D>,
) -> Result<usize> {
    let ordered = apply_order(records, layout);
    for rec in &ordered {
        log::trace!("[CHECKPOINT] write block {}", rec.block_no);
        bdev.write_block(rec.block_no as u64, &rec.payload)?;
    }
    Ok(ordered.len())
}
