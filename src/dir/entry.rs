//! 目录项类型

use crate::{
    consts::VSFS_NAME_MAX,
    error::{Error, ErrorKind, Result},
    types::RawDirEntry,
};
use alloc::string::String;

/// 目录项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode 编号
    pub inode: u32,
    /// 文件名
    pub name: String,
    /// 在目录块中的槽位
    pub slot: u32,
}

impl DirEntry {
    pub(crate) fn from_raw(raw: &RawDirEntry, slot: u32) -> Self {
        Self {
            inode: raw.inode,
            name: String::from_utf8_lossy(raw.name_bytes()).into_owned(),
            slot,
        }
    }
}

/// 校验文件名
///
/// # 错误
///
/// - `ErrorKind::InvalidInput` - 名字为空、超过 27 字节，或包含 `/` 或 NUL
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput, "File name is empty"));
    }
    if name.len() > VSFS_NAME_MAX {
        return Err(Error::new(ErrorKind::InvalidInput, "File name longer than 27 bytes"));
    }
    if name.bytes().any(|b| b == b'/' || b == 0) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "File name contains '/' or NUL",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("a.txt").is_ok());
        assert!(validate_name(&"x".repeat(27)).is_ok());

        for bad in ["", "a/b", "nul\0"] {
            assert_eq!(validate_name(bad).unwrap_err().kind(), ErrorKind::InvalidInput);
        }
        assert!(validate_name(&"x".repeat(28)).is_err());
    }

    #[test]
    fn test_from_raw() {
        let raw = RawDirEntry::new(0, b"a.txt");
        let entry = DirEntry::from_raw(&raw, 3);
        assert_eq!(entry.inode, 0);
        assert_eq!(entry.name, "a.txt");
        assert_eq!(entry.slot, 3);
    }
}
