//! 错误类型定义
//!
//! 提供 vsfs 镜像操作的错误类型。
//!
//! 错误分三类：
//! - 致命 I/O 错误（`Io`）：立即终止当前操作，不产生部分提交
//! - 资源耗尽（`NoFreeInode` / `DirectoryFull` / `JournalFull`）：
//!   报告给调用者，磁盘状态保持不变
//! - 日志完整性异常：由 journal 扫描器内部吸收，不会出现在这里

use core::fmt;

/// vsfs 操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O 错误
    Io,
    /// 无效参数
    InvalidInput,
    /// 镜像损坏
    Corrupted,
    /// 目标不存在
    NotFound,
    /// 已存在
    AlreadyExists,
    /// 没有空闲 inode
    NoFreeInode,
    /// 根目录没有空闲目录项
    DirectoryFull,
    /// Journal 区域容量不足
    JournalFull,
    /// 无效状态
    InvalidState,
    /// 不支持的操作
    Unsupported,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 创建带原因的错误
    ///
    /// 注意：在 no_std 环境下无法保存 cause，这里只把它记录到日志里
    pub fn with_cause(kind: ErrorKind, message: &'static str, cause: impl fmt::Debug) -> Self {
        log::debug!("{}: {:?}", message, cause);
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// 是否为资源耗尽类错误（可恢复，无副作用）
    pub fn is_resource_exhausted(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NoFreeInode | ErrorKind::DirectoryFull | ErrorKind::JournalFull
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_cause(ErrorKind::Io, "device I/O failed", err)
    }
}

// Journal error conversion
impl From<crate::journal::JournalError> for Error {
    fn from(err: crate::journal::JournalError) -> Self {
        use crate::journal::JournalError;
        match err {
            JournalError::Full { .. } => Error::new(ErrorKind::JournalFull, "Journal is full"),
            JournalError::RecordTooLarge => {
                Error::new(ErrorKind::InvalidInput, "Record does not fit the record header")
            }
            JournalError::BadPayload => {
                Error::new(ErrorKind::InvalidInput, "Data record payload is not one block")
            }
            JournalError::ForbiddenTarget(_) => {
                Error::new(ErrorKind::InvalidInput, "Data record targets a forbidden block")
            }
        }
    }
}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
