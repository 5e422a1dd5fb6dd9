//! Journal Transaction 实现
//!
//! ## 工作原理
//!
//! 1. **读取**: `read_block` 优先返回本事务已暂存的块，否则从磁盘读
//! 2. **暂存**: `stage` 保存整块镜像，同一块后写覆盖先写
//! 3. **提交**: 把暂存集合编码成一个事务追加到 journal
//! 4. **回滚**: 直接丢弃暂存集合，磁盘不受影响
//!
//! 暂存期间不会写磁盘，所以任何失败路径都不需要清理。

use crate::{
    block::{BlockDev, BlockDevice},
    error::{Error, ErrorKind, Result},
    journal::{Journal, Transaction},
};
use alloc::vec::Vec;

/// Journal 事务
///
/// 借用块设备和 journal，直到提交或回滚。
pub struct JournalTransaction<'a, D: BlockDevice> {
    bdev: &'a mut BlockDev<D>,
    journal: &'a mut Journal,
    txn: Transaction,
    state: TransactionState,
}

/// 事务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    /// 事务活跃，可以暂存修改
    Active,
    /// 事务已提交
    Committed,
    /// 事务已回滚
    Aborted,
}

impl<'a, D: BlockDevice> JournalTransaction<'a, D> {
    /// 开始新事务
    pub fn begin(bdev: &'a mut BlockDev<D>, journal: &'a mut Journal) -> Result<Self> {
        Ok(Self {
            bdev,
            journal,
            txn: Transaction::new(),
            state: TransactionState::Active,
        })
    }

    fn check_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::new(ErrorKind::InvalidState, "Transaction is not active"));
        }
        Ok(())
    }

    /// 读取块内容
    ///
    /// 本事务暂存过的块返回暂存内容，否则返回磁盘上的当前内容。
    pub fn read_block(&mut self, block_no: u32) -> Result<Vec<u8>> {
        self.check_active()?;

        if let Some(staged) = self.txn.get(block_no) {
            return Ok(staged.to_vec());
        }

        let mut buf = alloc::vec![0u8; self.bdev.block_size() as usize];
        self.bdev.read_block(block_no as u64, &mut buf)?;
        Ok(buf)
    }

    /// 暂存一个完整块
    ///
    /// # 错误
    ///
    /// - `InvalidInput` - 内容不是一个完整块，或目标是保留块/journal 区域
    pub fn stage(&mut self, block_no: u32, data: Vec<u8>) -> Result<()> {
        self.check_active()?;

        let layout = *self.journal.layout();
        if data.len() != layout.block_size as usize {
            return Err(Error::new(ErrorKind::InvalidInput, "Staged data must be one block"));
        }
        if block_no == 0 || block_no >= layout.total_blocks() || layout.in_journal(block_no) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Cannot stage the reserved block or a journal block",
            ));
        }

        self.txn.push(block_no, data);
        Ok(())
    }

    /// 已暂存的块数
    pub fn staged_count(&self) -> usize {
        self.txn.len()
    }

    /// 提交事务
    ///
    /// 返回追加到 journal 的字节数。
    ///
    /// # 错误
    ///
    /// - `JournalFull` - 剩余空间不足，journal 和磁盘都没有改变
    /// - `Io` - 写入失败，journal 头未更新，事务不可见
    pub fn commit(mut self) -> Result<u32> {
        self.check_active()?;

        let txn = core::mem::take(&mut self.txn);
        // 失败时事务同样结束：暂存内容已交出，不能再重试
        self.state = TransactionState::Committed;
        self.journal.append(self.bdev, &txn)
    }

    /// 回滚事务
    pub fn abort(mut self) {
        self.state = TransactionState::Aborted;
        self.txn = Transaction::new();
    }
}

impl<'a, D: BlockDevice> Drop for JournalTransaction<'a, D> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active && !self.txn.is_empty() {
            log::debug!(
                "[JOURNAL] dropping uncommitted transaction with {} staged blocks",
                self.txn.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemDevice;
    use crate::fs::Layout;

    fn setup() -> (BlockDev<MemDevice>, Journal, Layout) {
        let layout = Layout::default();
        let dev = MemDevice::new(layout.total_blocks() as u64, layout.block_size);
        let mut bdev = BlockDev::new(dev).unwrap();
        let journal = Journal::open_or_init(&mut bdev, layout).unwrap();
        (bdev, journal, layout)
    }

    #[test]
    fn test_read_block_sees_staged_copy() {
        let (mut bdev, mut journal, layout) = setup();
        let mut trans = JournalTransaction::begin(&mut bdev, &mut journal).unwrap();

        let mut bitmap = trans.read_block(layout.inode_bitmap).unwrap();
        assert!(bitmap.iter().all(|&b| b == 0));

        bitmap[0] = 0x01;
        trans.stage(layout.inode_bitmap, bitmap).unwrap();
        assert_eq!(trans.read_block(layout.inode_bitmap).unwrap()[0], 0x01);
        assert_eq!(trans.staged_count(), 1);
        trans.abort();

        // 磁盘没有变化
        assert_eq!(bdev.device().block(layout.inode_bitmap as u64)[0], 0);
    }

    #[test]
    fn test_commit_appends_to_journal() {
        let (mut bdev, mut journal, layout) = setup();
        {
            let mut trans = JournalTransaction::begin(&mut bdev, &mut journal).unwrap();
            trans.stage(layout.inode_bitmap, alloc::vec![1; 4096]).unwrap();
            trans.stage(layout.root_dir_block(), alloc::vec![2; 4096]).unwrap();
            assert_eq!(trans.commit().unwrap(), 2 * 4104 + 4);
        }

        assert_eq!(journal.bytes_used(), 8 + 2 * 4104 + 4);
        // 提交只写 journal，真实块不变
        assert_eq!(bdev.device().block(layout.inode_bitmap as u64)[0], 0);
    }

    #[test]
    fn test_stage_rejects_invalid_blocks() {
        let (mut bdev, mut journal, layout) = setup();
        let mut trans = JournalTransaction::begin(&mut bdev, &mut journal).unwrap();

        assert!(trans.stage(0, alloc::vec![0; 4096]).is_err());
        assert!(trans.stage(layout.journal_start, alloc::vec![0; 4096]).is_err());
        assert!(trans.stage(layout.inode_bitmap, alloc::vec![0; 10]).is_err());
        assert_eq!(trans.staged_count(), 0);
    }

    #[test]
    fn test_dropped_transaction_writes_nothing() {
        let (mut bdev, mut journal, layout) = setup();
        let before = bdev.device().image().to_vec();
        {
            let mut trans = JournalTransaction::begin(&mut bdev, &mut journal).unwrap();
            trans.stage(layout.data_bitmap, alloc::vec![0xFF; 4096]).unwrap();
        }
        assert_eq!(bdev.device().image(), &before[..]);
        assert!(journal.is_empty());
    }
}
