//! vsfs 文件系统核心结构

use crate::{
    bitmap::count_zeros,
    block::{BlockDev, BlockDevice},
    dir::{insert_entry, read_dir, used_entries, validate_name, DirEntry},
    error::{Error, ErrorKind, Result},
    ialloc::{alloc_inode, free_inodes_count, inode_location, read_inode, write_inode_into},
    journal::{do_checkpoint, scan_journal, CheckpointReport, Journal, ScanResult},
    transaction::JournalTransaction,
    types::{Inode, JournalHeader},
};
use alloc::vec::Vec;

use super::types::{CheckpointPolicy, FsConfig, Layout, StatFs};

/// `create` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOutcome {
    /// 分配的 inode 编号
    pub ino: u32,
    /// 事务是否已经被检查点（`CheckpointPolicy::Immediate`）
    pub checkpointed: bool,
}

/// vsfs 文件系统
///
/// 独占块设备和 journal。所有修改都先进入 journal，由检查点写回真实块。
///
/// # 示例
///
/// ```rust,ignore
/// use vsfs_journal::{FsConfig, MemDevice, Vsfs};
///
/// let device = MemDevice::new(85, 4096);
/// let mut fs = Vsfs::format(device, FsConfig::default())?;
///
/// fs.create("a.txt")?;      // 已进入 journal，尚未应用
/// fs.install()?;            // 检查点
///
/// for entry in fs.read_dir()? {
///     println!("{} {}", entry.inode, entry.name);
/// }
/// ```
pub struct Vsfs<D: BlockDevice> {
    bdev: BlockDev<D>,
    journal: Journal,
    config: FsConfig,
}

impl<D: BlockDevice> Vsfs<D> {
    /// 挂载文件系统
    ///
    /// 只初始化 journal 头（魔数不匹配时），不回放 journal：
    /// 已提交但未应用的事务保留到下一次检查点。
    ///
    /// # 错误
    ///
    /// - `ErrorKind::InvalidInput` - 布局非法，或设备块大小/容量与布局不符
    /// - `ErrorKind::Io` - 设备读写失败
    pub fn mount(device: D, config: FsConfig) -> Result<Self> {
        let layout = config.layout;
        layout.validate()?;

        let mut bdev = BlockDev::new(device)?;
        check_device(&bdev, &layout)?;

        let journal = Journal::open_or_init(&mut bdev, layout)?;
        log::info!(
            "[JOURNAL] mounted: {} blocks, journal {}/{} bytes",
            layout.total_blocks(),
            journal.bytes_used(),
            journal.capacity()
        );

        Ok(Self { bdev, journal, config })
    }

    /// 格式化（mkfs）
    ///
    /// 把整个设备清零，然后写入空的 journal 头。位图、inode 表和根目录保持全零，
    /// 即一个空的根目录。
    pub fn format(device: D, config: FsConfig) -> Result<Self> {
        let layout = config.layout;
        layout.validate()?;

        let mut bdev = BlockDev::new(device)?;
        check_device(&bdev, &layout)?;

        let zero = alloc::vec![0u8; layout.block_size as usize];
        for lba in 0..bdev.total_blocks() {
            bdev.write_block(lba, &zero)?;
        }
        bdev.flush()?;

        let journal = Journal::open_or_init(&mut bdev, layout)?;
        log::info!("[JOURNAL] formatted image with {} blocks", bdev.total_blocks());

        Ok(Self { bdev, journal, config })
    }

    /// 卸载文件系统，返回底层设备
    pub fn unmount(mut self) -> Result<D> {
        self.bdev.flush()?;
        Ok(self.bdev.into_inner())
    }

    /// 取回底层设备（不刷新）
    pub fn into_device(self) -> D {
        self.bdev.into_inner()
    }

    /// 配置
    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// 磁盘布局
    pub fn layout(&self) -> &Layout {
        &self.config.layout
    }

    /// Journal 引用
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// 获取块设备引用
    pub fn block_device(&self) -> &BlockDev<D> {
        &self.bdev
    }

    /// 获取可变块设备引用
    pub fn block_device_mut(&mut self) -> &mut BlockDev<D> {
        &mut self.bdev
    }

    /// 获取干净视图
    ///
    /// 先执行一次检查点，保证真实块反映所有已提交事务，然后返回一个借用。
    /// 创建文件等修改只能通过这个借用进行。
    pub fn clean_view(&mut self) -> Result<CleanView<'_, D>> {
        let report = do_checkpoint(&mut self.journal, &mut self.bdev)?;
        Ok(CleanView { fs: self, report })
    }

    /// 在根目录创建空文件
    ///
    /// 先检查点，再把"分配 inode + 初始化 inode + 插入目录项"作为一个事务追加到 journal。
    /// 是否立即应用由 [`CheckpointPolicy`] 决定。
    ///
    /// # 错误
    ///
    /// - `InvalidInput` - 名字不合法
    /// - `AlreadyExists` - 同名文件已存在
    /// - `NoFreeInode` / `DirectoryFull` / `JournalFull` - 资源耗尽，事务不会被追加
    pub fn create(&mut self, name: &str) -> Result<CreateOutcome> {
        validate_name(name)?;

        let ino = self.clean_view()?.create(name)?;

        let checkpointed = match self.config.checkpoint_policy {
            CheckpointPolicy::Immediate => {
                do_checkpoint(&mut self.journal, &mut self.bdev)?;
                true
            }
            CheckpointPolicy::Deferred => false,
        };

        log::info!("[CREATE] '{}' committed to journal as inode {}", name, ino);
        Ok(CreateOutcome { ino, checkpointed })
    }

    /// 检查点：应用 journal 中所有已提交事务并截断 journal
    pub fn install(&mut self) -> Result<CheckpointReport> {
        do_checkpoint(&mut self.journal, &mut self.bdev)
    }

    /// 读取根目录
    ///
    /// 只包含已检查点的目录项。
    pub fn read_dir(&mut self) -> Result<Vec<DirEntry>> {
        read_dir(&mut self.bdev, &self.config.layout)
    }

    /// 读取 inode
    pub fn read_inode(&mut self, ino: u32) -> Result<Inode> {
        read_inode(&mut self.bdev, &self.config.layout, ino)
    }

    /// 磁盘上的 journal 头
    pub fn journal_header(&mut self) -> Result<JournalHeader> {
        self.journal.reload(&mut self.bdev)
    }

    /// 只读扫描 journal，不应用任何事务
    pub fn journal_scan(&mut self) -> Result<ScanResult> {
        let header = self.journal.reload(&mut self.bdev)?;
        let region = self.journal.read_region(&mut self.bdev)?;
        Ok(scan_journal(&region, header.bytes_used, &self.config.layout))
    }

    /// 文件系统统计信息（基于已检查点的内容）
    pub fn stat(&mut self) -> Result<StatFs> {
        let layout = self.config.layout;
        let mut block = alloc::vec![0u8; layout.block_size as usize];

        self.bdev.read_block(layout.inode_bitmap as u64, &mut block)?;
        let free_inodes = free_inodes_count(&block, &layout);

        self.bdev.read_block(layout.root_dir_block() as u64, &mut block)?;
        let dir_entries = used_entries(&block);

        Ok(StatFs {
            inodes_count: layout.inode_count,
            free_inodes_count: free_inodes,
            dir_entries,
            free_dir_entries: layout.dirents_per_block() - dir_entries,
            journal_capacity: self.journal.capacity(),
            journal_used: self.journal.bytes_used(),
            block_size: layout.block_size,
        })
    }

    /// 数据位图中的空闲块数
    pub fn free_data_blocks(&mut self) -> Result<u32> {
        let layout = self.config.layout;
        let mut block = alloc::vec![0u8; layout.block_size as usize];
        self.bdev.read_block(layout.data_bitmap as u64, &mut block)?;
        Ok(count_zeros(&block, 0, layout.data_blocks))
    }
}

/// 检查设备与布局是否匹配
fn check_device<D: BlockDevice>(bdev: &BlockDev<D>, layout: &Layout) -> Result<()> {
    if bdev.block_size() != layout.block_size {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Device block size does not match layout",
        ));
    }
    if bdev.total_blocks() < layout.total_blocks() as u64 {
        return Err(Error::new(ErrorKind::InvalidInput, "Device smaller than layout"));
    }
    Ok(())
}

/// 干净视图
///
/// 只能通过 [`Vsfs::clean_view`] 获得，此时 journal 为空，真实块即最新状态。
pub struct CleanView<'a, D: BlockDevice> {
    fs: &'a mut Vsfs<D>,
    report: CheckpointReport,
}

impl<'a, D: BlockDevice> CleanView<'a, D> {
    /// 获取视图前那次检查点的结果
    pub fn report(&self) -> CheckpointReport {
        self.report
    }

    /// 读取根目录
    pub fn read_dir(&mut self) -> Result<Vec<DirEntry>> {
        self.fs.read_dir()
    }

    /// 构造并提交创建文件的事务，返回分配的 inode
    ///
    /// 事务内容（按暂存顺序）：inode 位图、数据位图（原样）、全部 inode 表块、根目录块。
    /// 任一步失败都在提交前返回，journal 和磁盘不变。
    pub fn create(self, name: &str) -> Result<u32> {
        let fs = self.fs;
        let layout = fs.config.layout;
        let now = fs.config.now_secs();

        let mut trans = JournalTransaction::begin(&mut fs.bdev, &mut fs.journal)?;

        let mut inode_bitmap = trans.read_block(layout.inode_bitmap)?;
        let data_bitmap = trans.read_block(layout.data_bitmap)?;
        let mut root = trans.read_block(layout.root_dir_block())?;

        let ino = alloc_inode(&mut inode_bitmap, &layout)?;
        insert_entry(&mut root, ino, name)?;

        let (ino_block, _) = inode_location(&layout, ino)?;
        let mut tables = Vec::with_capacity(layout.inode_table_blocks as usize);
        for i in 0..layout.inode_table_blocks {
            let block_no = layout.inode_table + i;
            let mut table = trans.read_block(block_no)?;
            if block_no == ino_block {
                write_inode_into(&mut table, &layout, ino, &Inode::new_file(now))?;
            }
            tables.push((block_no, table));
        }

        trans.stage(layout.inode_bitmap, inode_bitmap)?;
        trans.stage(layout.data_bitmap, data_bitmap)?;
        for (block_no, table) in tables {
            trans.stage(block_no, table)?;
        }
        trans.stage(layout.root_dir_block(), root)?;

        log::debug!("[CREATE] staged {} blocks for '{}'", trans.staged_count(), name);
        trans.commit()?;
        Ok(ino)
    }
}
