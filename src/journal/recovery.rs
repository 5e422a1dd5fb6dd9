//! Journal 扫描逻辑
//!
//! 把 journal 字节流解析成已提交事务的列表。扫描是纯函数，不做 I/O：
//! 检查点引擎和只读检查（`vsfs-journal journal`）共用它。
//!
//! 日志完整性异常（零长度记录、截断的记录、非法的数据记录）都视为
//! "有效日志到此为止"，不作为错误上报。

use super::types::{data_record_size, DataRecord, RecordHeader, RecordKind};
use crate::{consts::*, fs::Layout};
use alloc::vec::Vec;

/// 扫描结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// 已提交的事务，按日志顺序
    pub transactions: Vec<CommittedTransaction>,
    /// 扫描结束时尚未提交而被丢弃的数据记录数
    pub discarded_records: usize,
    /// 扫描停止的偏移
    pub end_offset: u32,
    /// 扫描停止的原因
    pub stop: ScanStop,
}

/// 扫描停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStop {
    /// 正好读到 `bytes_used`
    #[default]
    End,
    /// 记录头声明的长度为零或小于记录头
    ZeroSize,
    /// 剩余字节放不下整条记录（撕裂的尾部）
    Truncated,
    /// 数据记录长度与块大小不符
    BadDataRecord,
    /// 数据记录的目标块越界、是保留块或位于 journal 内
    ForbiddenTarget(u32),
}

/// 一个已提交的事务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTransaction {
    /// 第一条记录在 journal 中的偏移
    pub start_offset: u32,
    /// 数据记录；同一目标块后写覆盖先写，位置取第一次出现的位置
    pub records: Vec<DataRecord>,
}

/// 事务内的待提交记录集合
#[derive(Debug, Default)]
struct PendingSet {
    start_offset: Option<u32>,
    records: Vec<DataRecord>,
}

impl PendingSet {
    fn insert(&mut self, offset: u32, rec: DataRecord) {
        self.start_offset.get_or_insert(offset);
        match self.records.iter_mut().find(|r| r.block_no == rec.block_no) {
            Some(existing) => existing.payload = rec.payload,
            None => self.records.push(rec),
        }
    }

    fn take(&mut self, commit_offset: u32) -> CommittedTransaction {
        let start_offset = self.start_offset.take().unwrap_or(commit_offset);
        CommittedTransaction {
            start_offset,
            records: core::mem::take(&mut self.records),
        }
    }
}

/// 扫描 journal 区域
///
/// # 参数
///
/// * `region` - 整个 journal 区域的内容
/// * `bytes_used` - journal 头记录的有效长度（已修正到容量以内）
/// * `layout` - 磁盘布局，用于校验数据记录
///
/// # 扫描流程
///
/// 1. 从偏移 = 头部大小开始，逐条读取记录头
/// 2. DATA 记录加入待提交集合
/// 3. COMMIT 记录把待提交集合变成一个已提交事务
/// 4. 按记录声明的长度前进，直到 `bytes_used`
/// 5. 结束时仍未提交的记录被丢弃
pub fn scan_journal(region: &[u8], bytes_used: u32, layout: &Layout) -> ScanResult {
    let end = (bytes_used as usize).min(region.len()) as u32;
    let data_size = data_record_size(layout.block_size);
    let total_blocks = layout.total_blocks();

    let mut result = ScanResult::default();
    let mut pending = PendingSet::default();
    let mut pos = JOURNAL_HEADER_SIZE;

    while pos < end {
        if pos + RECORD_HEADER_SIZE > end {
            result.stop = ScanStop::Truncated;
            break;
        }

        let hdr = RecordHeader::decode(&region[pos as usize..]);
        let size = hdr.size as u32;

        if size < RECORD_HEADER_SIZE {
            result.stop = ScanStop::ZeroSize;
            break;
        }
        if pos + size > end {
            result.stop = ScanStop::Truncated;
            break;
        }

        let record = &region[pos as usize..(pos + size) as usize];
        match hdr.record_kind() {
            RecordKind::Data => {
                if size != data_size {
                    result.stop = ScanStop::BadDataRecord;
                    break;
                }
                let rec = DataRecord::decode(record);
                if rec.block_no == 0
                    || rec.block_no >= total_blocks
                    || layout.in_journal(rec.block_no)
                {
                    result.stop = ScanStop::ForbiddenTarget(rec.block_no);
                    break;
                }
                pending.insert(pos, rec);
            }
            RecordKind::Commit => {
                let txn = pending.take(pos);
                log::trace!(
                    "[SCAN] commit at offset {}: {} records",
                    pos,
                    txn.records.len()
                );
                result.transactions.push(txn);
            }
            RecordKind::Unknown(kind) => {
                log::warn!("[SCAN] skipping unknown record type {} at offset {}", kind, pos);
            }
        }

        pos += size;
    }

    if result.stop != ScanStop::End {
        log::warn!("[SCAN] journal ends early at offset {}: {:?}", pos, result.stop);
    }

    result.discarded_records = pending.records.len();
    if result.discarded_records > 0 {
        log::warn!(
            "[SCAN] discarding {} data records without a commit record",
            result.discarded_records
        );
    }
    result.end_offset = pos;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::types::{encode_commit_record, Transaction};

    /// 按 append 的格式手工拼出 journal 区域
    fn region_with(records: &[Vec<u8>]) -> (Vec<u8>, u32) {
        let layout = Layout::default();
        let mut region = alloc::vec![0u8; layout.journal_capacity() as usize];
        let mut pos = JOURNAL_HEADER_SIZE as usize;
        for rec in records {
            region[pos..pos + rec.len()].copy_from_slice(rec);
            pos += rec.len();
        }
        (region, pos as u32)
    }

    fn data(block_no: u32, fill: u8) -> Vec<u8> {
        DataRecord { block_no, payload: alloc::vec![fill; 4096] }.encode()
    }

    fn commit() -> Vec<u8> {
        encode_commit_record().to_vec()
    }

    #[test]
    fn test_empty_journal() {
        let layout = Layout::default();
        let (region, _) = region_with(&[]);
        let result = scan_journal(&region, JOURNAL_HEADER_SIZE, &layout);
        assert!(result.transactions.is_empty());
        assert_eq!(result.stop, ScanStop::End);
        assert_eq!(result.end_offset, JOURNAL_HEADER_SIZE);
    }

    #[test]
    fn test_groups_records_by_commit() {
        let layout = Layout::default();
        let (region, used) = region_with(&[
            data(17, 1),
            data(21, 2),
            commit(),
            data(19, 3),
            commit(),
        ]);

        let result = scan_journal(&region, used, &layout);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.transactions[0].records.len(), 2);
        assert_eq!(result.transactions[0].start_offset, 8);
        assert_eq!(result.transactions[1].records[0].block_no, 19);
        assert_eq!(result.discarded_records, 0);
        assert_eq!(result.end_offset, used);
    }

    #[test]
    fn test_uncommitted_tail_discarded() {
        let layout = Layout::default();
        let (region, used) = region_with(&[data(17, 1), commit(), data(18, 2), data(21, 3)]);

        let result = scan_journal(&region, used, &layout);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.discarded_records, 2);
    }

    #[test]
    fn test_torn_commit_discards_whole_transaction() {
        let layout = Layout::default();
        let (mut region, used) = region_with(&[data(17, 1), data(21, 2), commit()]);
        // 提交记录被撕裂：只剩全零
        let commit_at = (used - 4) as usize;
        region[commit_at..commit_at + 4].fill(0);

        let result = scan_journal(&region, used, &layout);
        assert!(result.transactions.is_empty());
        assert_eq!(result.discarded_records, 2);
        assert_eq!(result.stop, ScanStop::ZeroSize);
    }

    #[test]
    fn test_truncated_payload_stops_scan() {
        let layout = Layout::default();
        let (region, used) = region_with(&[data(17, 1), commit(), data(21, 2)]);

        // bytes_used 落在第二条数据记录中间
        let result = scan_journal(&region, used - 100, &layout);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.stop, ScanStop::Truncated);
        assert_eq!(result.discarded_records, 0);
    }

    #[test]
    fn test_last_write_wins_within_transaction() {
        let layout = Layout::default();
        let (region, used) = region_with(&[data(21, 1), data(17, 2), data(21, 3), commit()]);

        let result = scan_journal(&region, used, &layout);
        let txn = &result.transactions[0];
        assert_eq!(txn.records.len(), 2);
        assert_eq!(txn.records[0].block_no, 21);
        assert!(txn.records[0].payload.iter().all(|&b| b == 3));
    }

    #[test]
    fn test_unknown_record_skipped() {
        let layout = Layout::default();
        let unknown = RecordHeader { kind: 7, size: 12 }.encode();
        let mut unknown_rec = unknown.to_vec();
        unknown_rec.extend_from_slice(&[0xAB; 8]);
        let (region, used) = region_with(&[data(17, 1), unknown_rec, commit()]);

        let result = scan_journal(&region, used, &layout);
        assert_eq!(result.transactions.len(), 1);
        assert_eq!(result.stop, ScanStop::End);
    }

    #[test]
    fn test_journal_target_rejected() {
        let layout = Layout::default();
        let (region, used) = region_with(&[data(3, 1), commit()]);

        let result = scan_journal(&region, used, &layout);
        assert!(result.transactions.is_empty());
        assert_eq!(result.stop, ScanStop::ForbiddenTarget(3));
    }

    #[test]
    fn test_transaction_encoding_scans_back() {
        let layout = Layout::default();
        let mut txn = Transaction::new();
        txn.push(17, alloc::vec![5; 4096]);
        let mut records: Vec<Vec<u8>> = txn.records().iter().map(|r| r.encode()).collect();
        records.push(commit());
        let (region, used) = region_with(&records);

        assert_eq!(used, JOURNAL_HEADER_SIZE + txn.encoded_len());
        let result = scan_journal(&region, used, &layout);
        assert_eq!(result.transactions[0].records, txn.records());
    }
}
