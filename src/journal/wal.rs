//! Journal 区域管理（write-ahead log）
//!
//! `Journal` 独占 journal 区域和 journal 头。追加事务时：
//!
//! 1. 先检查剩余容量，放不下直接返回 `JournalFull`，一个字节都不写
//! 2. 依次把记录写到 `journal_start + bytes_used` 处
//! 3. 刷新设备，然后**只写一次** journal 头
//!
//! 事务是否可见只取决于第 3 步那一次头部写入：如果在它之前崩溃，
//! 磁盘上的 `bytes_used` 仍是旧值，已写入的记录位于有效长度之外，下次扫描不会读到。

use super::types::{
    data_record_size, encode_commit_record, RecordHeader, Transaction, COMMIT_RECORD_SIZE,
};
use super::JournalError;
use crate::{
    block::{BlockDev, BlockDevice},
    consts::*,
    error::Result,
    fs::Layout,
    types::JournalHeader,
};
use alloc::vec::Vec;

/// Journal 管理器
#[derive(Debug, Clone)]
pub struct Journal {
    layout: Layout,
    header: JournalHeader,
}

impl Journal {
    /// 打开 journal，魔数不匹配时初始化
    ///
    /// 每次挂载都可以调用：已初始化的 journal 原样保留（包括未检查点的事务）。
    pub fn open_or_init<D: BlockDevice>(bdev: &mut BlockDev<D>, layout: Layout) -> Result<Self> {
        let mut journal = Self {
            layout,
            header: JournalHeader::empty(),
        };

        let on_disk = journal.load_header(bdev)?;
        if on_disk.is_valid() {
            journal.header = journal.sanitize(on_disk);
            log::debug!(
                "[JOURNAL] opened, bytes_used={} capacity={}",
                journal.header.bytes_used,
                journal.capacity()
            );
        } else {
            log::info!(
                "[JOURNAL] magic {:#010x} does not match, initializing empty journal",
                on_disk.magic
            );
            journal.persist_header(bdev, JournalHeader::empty())?;
        }

        Ok(journal)
    }

    /// 读取磁盘上的 journal 头（不做任何修正）
    pub fn load_header<D: BlockDevice>(&self, bdev: &mut BlockDev<D>) -> Result<JournalHeader> {
        let mut raw = [0u8; JOURNAL_HEADER_SIZE as usize];
        bdev.read_bytes(self.region_offset(), &mut raw)?;
        Ok(JournalHeader::decode(&raw))
    }

    /// 重新从磁盘加载 journal 头
    pub fn reload<D: BlockDevice>(&mut self, bdev: &mut BlockDev<D>) -> Result<JournalHeader> {
        let on_disk = self.load_header(bdev)?;
        self.header = if on_disk.is_valid() {
            self.sanitize(on_disk)
        } else {
            log::warn!("[JOURNAL] header magic lost, treating journal as empty");
            JournalHeader::empty()
        };
        Ok(self.header)
    }

    /// 修正越界的 `bytes_used`（日志异常，吸收而不报错）
    fn sanitize(&self, mut header: JournalHeader) -> JournalHeader {
        if header.bytes_used < JOURNAL_HEADER_SIZE {
            log::warn!(
                "[JOURNAL] bytes_used {} below header size, treating as empty",
                header.bytes_used
            );
            header.bytes_used = JOURNAL_HEADER_SIZE;
        } else if header.bytes_used > self.capacity() {
            log::warn!(
                "[JOURNAL] bytes_used {} exceeds capacity {}, clamping",
                header.bytes_used,
                self.capacity()
            );
            header.bytes_used = self.capacity();
        }
        header
    }

    /// 当前（内存中的）journal 头
    pub fn header(&self) -> JournalHeader {
        self.header
    }

    /// 磁盘布局
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// 已用字节（含 journal 头）
    pub fn bytes_used(&self) -> u32 {
        self.header.bytes_used
    }

    /// 区域容量（字节）
    pub fn capacity(&self) -> u32 {
        self.layout.journal_capacity()
    }

    /// 剩余可追加字节
    pub fn remaining(&self) -> u32 {
        self.capacity().saturating_sub(self.header.bytes_used)
    }

    /// 是否没有任何记录
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// journal 区域在设备上的字节偏移
    fn region_offset(&self) -> u64 {
        self.layout.journal_start as u64 * self.layout.block_size as u64
    }

    /// 读出整个 journal 区域
    pub fn read_region<D: BlockDevice>(&self, bdev: &mut BlockDev<D>) -> Result<Vec<u8>> {
        let mut region = alloc::vec![0u8; self.capacity() as usize];
        bdev.read_blocks(
            self.layout.journal_start as u64,
            self.layout.journal_blocks,
            &mut region,
        )?;
        Ok(region)
    }

    /// 持久化 journal 头
    ///
    /// 只改写 journal 第一个块的前 8 个字节（读-改-写整块），
    /// 和头部共用这个块的记录字节保持不变。成功后才更新内存中的副本。
    pub(crate) fn persist_header<D: BlockDevice>(
        &mut self,
        bdev: &mut BlockDev<D>,
        header: JournalHeader,
    ) -> Result<()> {
        bdev.write_bytes(self.region_offset(), &header.encode())?;
        bdev.flush()?;
        self.header = header;
        Ok(())
    }

    /// 截断 journal：`bytes_used` 回到头部大小
    pub(crate) fn reset<D: BlockDevice>(&mut self, bdev: &mut BlockDev<D>) -> Result<()> {
        self.persist_header(bdev, JournalHeader::empty())
    }

    /// 校验事务中每条数据记录
    fn check_transaction(&self, txn: &Transaction) -> core::result::Result<(), JournalError> {
        let total_blocks = self.layout.total_blocks();
        for rec in txn.records() {
            if rec.payload.len() != self.layout.block_size as usize {
                return Err(JournalError::BadPayload);
            }
            if data_record_size(rec.payload.len() as u32) > u16::MAX as u32 {
                return Err(JournalError::RecordTooLarge);
            }
            if rec.block_no >= total_blocks
                || rec.block_no == 0
                || self.layout.in_journal(rec.block_no)
            {
                return Err(JournalError::ForbiddenTarget(rec.block_no));
            }
        }

        let needed = txn.encoded_len();
        if needed > self.remaining() {
            return Err(JournalError::Full {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// 追加一个完整事务（所有数据记录 + 一条提交记录）
    ///
    /// # 错误
    ///
    /// - `JournalFull` - 剩余容量不足，未写入任何字节
    /// - `InvalidInput` - 数据记录不是整块或目标块非法
    /// - `Io` - 任意块写失败；此时磁盘上的 journal 头未改变，事务不可见
    pub fn append<D: BlockDevice>(
        &mut self,
        bdev: &mut BlockDev<D>,
        txn: &Transaction,
    ) -> Result<u32> {
        self.check_transaction(txn)?;

        let start = self.header.bytes_used;
        let mut bytes_used = start;

        for rec in txn.records() {
            let bytes = rec.encode();
            bdev.write_bytes(self.region_offset() + bytes_used as u64, &bytes)?;
            log::trace!(
                "[JOURNAL] DATA block={} at offset {} ({} bytes)",
                rec.block_no,
                bytes_used,
                bytes.len()
            );
            bytes_used += bytes.len() as u32;
        }

        bdev.write_bytes(self.region_offset() + bytes_used as u64, &encode_commit_record())?;
        bytes_used += COMMIT_RECORD_SIZE;

        // 记录必须先于头部落盘
        bdev.flush()?;
        self.persist_header(
            bdev,
            JournalHeader {
                magic: JOURNAL_MAGIC,
                bytes_used,
            },
        )?;

        log::debug!(
            "[JOURNAL] appended transaction: {} data records, offset {}..{}",
            txn.len(),
            start,
            bytes_used
        );
        Ok(bytes_used - start)
    }

    /// 解析某偏移处的记录头（调试/检查用）
    pub fn record_header_at(region: &[u8], offset: u32) -> Option<RecordHeader> {
        let off = offset as usize;
        region
            .get(off..off + RECORD_HEADER_SIZE as usize)
            .map(RecordHeader::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::error::ErrorKind;

    fn setup() -> (BlockDev<MemDevice>, Layout) {
        let layout = Layout::default();
        let dev = MemDevice::new(layout.total_blocks() as u64, layout.block_size);
        (BlockDev::new(dev).unwrap(), layout)
    }

    fn block(fill: u8) -> Vec<u8> {
        alloc::vec![fill; 4096]
    }

    #[test]
    fn test_open_initializes_fresh_region() {
        let (mut bdev, layout) = setup();
        let journal = Journal::open_or_init(&mut bdev, layout).unwrap();

        assert!(journal.is_empty());
        assert_eq!(journal.bytes_used(), JOURNAL_HEADER_SIZE);
        let on_disk = journal.load_header(&mut bdev).unwrap();
        assert_eq!(on_disk, JournalHeader::empty());
    }

    #[test]
    fn test_open_is_idempotent() {
        let (mut bdev, layout) = setup();
        let mut journal = Journal::open_or_init(&mut bdev, layout).unwrap();
        let mut txn = Transaction::new();
        txn.push(layout.inode_bitmap, block(1));
        journal.append(&mut bdev, &txn).unwrap();

        // 重新打开不会清掉未检查点的事务
        let reopened = Journal::open_or_init(&mut bdev, layout).unwrap();
        assert_eq!(reopened.bytes_used(), journal.bytes_used());
    }

    #[test]
    fn test_append_advances_bytes_used() {
        let (mut bdev, layout) = setup();
        let mut journal = Journal::open_or_init(&mut bdev, layout).unwrap();

        let mut txn = Transaction::new();
        txn.push(layout.inode_bitmap, block(0xAA));
        txn.push(layout.root_dir_block(), block(0xBB));
        let written = journal.append(&mut bdev, &txn).unwrap();

        assert_eq!(written, 2 * 4104 + 4);
        assert_eq!(journal.bytes_used(), 8 + 2 * 4104 + 4);
        assert_eq!(journal.load_header(&mut bdev).unwrap().bytes_used, journal.bytes_used());

        // 第一条记录紧跟在头部之后，且头部写入没有破坏它
        let region = journal.read_region(&mut bdev).unwrap();
        let hdr = Journal::record_header_at(&region, 8).unwrap();
        assert_eq!(hdr.kind, REC_DATA);
        assert_eq!(hdr.size, 4104);
        assert!(region[16..16 + 4096].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_append_rejects_when_full() {
        let (mut bdev, layout) = setup();
        let mut journal = Journal::open_or_init(&mut bdev, layout).unwrap();

        let mut txn = Transaction::new();
        txn.push(layout.inode_bitmap, block(1));
        txn.push(layout.data_bitmap, block(2));
        txn.push(layout.inode_table, block(3));
        txn.push(layout.inode_table + 1, block(4));
        txn.push(layout.root_dir_block(), block(5));
        // 5 条记录 + commit = 20524 字节，65536 字节的区域可放下 3 个
        for _ in 0..3 {
            journal.append(&mut bdev, &txn).unwrap();
        }

        let before = bdev.device().image().to_vec();
        let used = journal.bytes_used();
        let mut big = Transaction::new();
        for i in 0..8 {
            big.push(layout.data_start + i, block(9));
        }
        let err = journal.append(&mut bdev, &big).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::JournalFull);
        assert_eq!(journal.bytes_used(), used);
        assert_eq!(bdev.device().image(), &before[..]);
    }

    #[test]
    fn test_append_rejects_journal_target() {
        let (mut bdev, layout) = setup();
        let mut journal = Journal::open_or_init(&mut bdev, layout).unwrap();

        let mut txn = Transaction::new();
        txn.push(layout.journal_start + 2, block(1));
        let err = journal.append(&mut bdev, &txn).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let mut txn = Transaction::new();
        txn.push(layout.inode_bitmap, alloc::vec![0u8; 100]);
        assert!(journal.append(&mut bdev, &txn).is_err());
        assert!(journal.is_empty());
    }

    #[test]
    fn test_crash_before_header_write_keeps_old_length() {
        let (mut bdev, layout) = setup();
        let mut journal = Journal::open_or_init(&mut bdev, layout).unwrap();

        let mut txn = Transaction::new();
        txn.push(layout.inode_bitmap, block(7));

        // 记录写入会触发若干次块写；头部写是最后一次
        let mut probe = BlockDev::new(bdev.device().clone()).unwrap();
        let mut probe_journal = journal.clone();
        let before = probe.device().write_calls();
        probe_journal.append(&mut probe, &txn).unwrap();
        let writes = probe.device().write_calls() - before;

        bdev.device_mut().fail_writes_after(writes - 1);
        assert!(journal.append(&mut bdev, &txn).is_err());
        bdev.device_mut().heal();

        assert_eq!(journal.bytes_used(), JOURNAL_HEADER_SIZE);
        assert_eq!(journal.load_header(&mut bdev).unwrap().bytes_used, JOURNAL_HEADER_SIZE);
    }

    #[test]
    fn test_reload_clamps_oversized_length() {
        let (mut bdev, layout) = setup();
        let mut journal = Journal::open_or_init(&mut bdev, layout).unwrap();

        let bogus = JournalHeader { magic: JOURNAL_MAGIC, bytes_used: u32::MAX };
        bdev.write_bytes(layout.journal_start as u64 * 4096, &bogus.encode()).unwrap();

        let header = journal.reload(&mut bdev).unwrap();
        assert_eq!(header.bytes_used, journal.capacity());
    }
}
