//! Journal 记录格式定义
//!
//! journal 区域是一条字节流：
//!
//! ```text
//! 偏移 0        8                      8+4104
//! ┌────────────┬──────────────────────┬─────────────┬─────┬────────┐
//! │ header     │ DATA(block_no, 4096B)│ DATA(...)   │ ... │ COMMIT │ ...
//! │ magic,used │ type=1 size=4104     │             │     │ type=2 │
//! └────────────┴──────────────────────┴─────────────┴─────┴────────┘
//! ```
//!
//! # 重要说明
//!
//! - **所有字段都是小端序（little-endian）**
//! - 记录头 `size` 是整条记录在磁盘上的长度（含记录头），读者可以据此跳过未知记录
//! - 事务 = 零或多条 DATA 记录 + 紧随其后的一条 COMMIT 记录

use crate::consts::*;
use alloc::vec::Vec;
use byteorder::{ByteOrder, LittleEndian};

/// 记录头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// 记录类型（1 = DATA，2 = COMMIT）
    pub kind: u16,
    /// 整条记录的长度（含记录头）
    pub size: u16,
}

impl RecordHeader {
    /// 从 4 字节解析
    pub fn decode(buf: &[u8]) -> Self {
        Self {
            kind: LittleEndian::read_u16(&buf[0..2]),
            size: LittleEndian::read_u16(&buf[2..4]),
        }
    }

    /// 编码为 4 字节
    pub fn encode(&self) -> [u8; RECORD_HEADER_SIZE as usize] {
        let mut out = [0u8; RECORD_HEADER_SIZE as usize];
        LittleEndian::write_u16(&mut out[0..2], self.kind);
        LittleEndian::write_u16(&mut out[2..4], self.size);
        out
    }

    /// 记录类型
    pub fn record_kind(&self) -> RecordKind {
        match self.kind {
            REC_DATA => RecordKind::Data,
            REC_COMMIT => RecordKind::Commit,
            other => RecordKind::Unknown(other),
        }
    }
}

/// 记录类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// 数据记录：目标块号 + 整块内容
    Data,
    /// 提交记录：事务边界
    Commit,
    /// 未知类型，扫描时按 size 跳过
    Unknown(u16),
}

/// DATA 记录在磁盘上的长度：记录头 + block_no + 一个块
pub const fn data_record_size(block_size: u32) -> u32 {
    RECORD_HEADER_SIZE + 4 + block_size
}

/// COMMIT 记录在磁盘上的长度
pub const COMMIT_RECORD_SIZE: u32 = RECORD_HEADER_SIZE;

/// 一条数据记录：目标块号和要写入的完整块镜像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    /// 文件系统中的目标块号
    pub block_no: u32,
    /// 整块内容
    pub payload: Vec<u8>,
}

impl DataRecord {
    /// 序列化为磁盘字节
    pub fn encode(&self) -> Vec<u8> {
        let size = data_record_size(self.payload.len() as u32);
        let mut out = Vec::with_capacity(size as usize);
        out.extend_from_slice(
            &RecordHeader { kind: REC_DATA, size: size as u16 }.encode(),
        );
        let mut block_no = [0u8; 4];
        LittleEndian::write_u32(&mut block_no, self.block_no);
        out.extend_from_slice(&block_no);
        out.extend_from_slice(&self.payload);
        out
    }

    /// 从完整记录字节解析（调用者已确认类型和长度）
    pub fn decode(record: &[u8]) -> Self {
        let hdr = RECORD_HEADER_SIZE as usize;
        Self {
            block_no: LittleEndian::read_u32(&record[hdr..hdr + 4]),
            payload: record[hdr + 4..].to_vec(),
        }
    }
}

/// 编码 COMMIT 记录
pub fn encode_commit_record() -> [u8; COMMIT_RECORD_SIZE as usize] {
    RecordHeader { kind: REC_COMMIT, size: COMMIT_RECORD_SIZE as u16 }.encode()
}

/// 一个完整的待追加事务
///
/// 只保存数据记录；编码时总是在末尾补上唯一的一条 COMMIT 记录，
/// 所以不存在"缺少提交记录"的事务值。同一目标块多次写入时后写覆盖先写，
/// 位置保持第一次出现的位置。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    records: Vec<DataRecord>,
}

impl Transaction {
    /// 创建空事务
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入一条数据记录
    pub fn push(&mut self, block_no: u32, payload: Vec<u8>) {
        if let Some(rec) = self.records.iter_mut().find(|r| r.block_no == block_no) {
            rec.payload = payload;
        } else {
            self.records.push(DataRecord { block_no, payload });
        }
    }

    /// 目标块的暂存内容
    pub fn get(&self, block_no: u32) -> Option<&[u8]> {
        self.records
            .iter()
            .find(|r| r.block_no == block_no)
            .map(|r| r.payload.as_slice())
    }

    /// 数据记录
    pub fn records(&self) -> &[DataRecord] {
        &self.records
    }

    /// 数据记录条数
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 是否没有数据记录（仍会产生一条 COMMIT 记录）
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 编码后的总长度（所有 DATA 记录 + COMMIT 记录）
    pub fn encoded_len(&self) -> u32 {
        self.records
            .iter()
            .map(|r| data_record_size(r.payload.len() as u32))
            .sum::<u32>()
            + COMMIT_RECORD_SIZE
    }
}
