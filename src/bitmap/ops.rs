//! Bitmap 操作实现

use crate::error::{Error, ErrorKind, Result};

/// 测试位图中某一位是否被设置
///
/// 越界的索引视为未设置。
pub fn test_bit(bitmap: &[u8], index: u32) -> bool {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return false;
    }

    (bitmap[byte_index] & (1 << bit_offset)) != 0
}

/// 设置位图中的某一位
///
/// # 返回
///
/// 成功返回 ()，如果索引超出范围返回错误
pub fn set_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Bitmap index out of range",
        ));
    }

    bitmap[byte_index] |= 1 << bit_offset;
    Ok(())
}

/// 清除位图中的某一位
pub fn clear_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    if byte_index >= bitmap.len() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Bitmap index out of range",
        ));
    }

    bitmap[byte_index] &= !(1 << bit_offset);
    Ok(())
}

/// 在 `[start, end)` 中查找第一个空闲位（值为 0 的位）
///
/// 线性扫描，最小索引优先；`end` 会被限制到位图长度。
pub fn find_first_zero(bitmap: &[u8], start: u32, end: u32) -> Option<u32> {
    let max_bits = (bitmap.len() * 8) as u32;
    let end = end.min(max_bits);

    (start..end).find(|&i| !test_bit(bitmap, i))
}

/// 统计 `[start, end)` 范围内被设置的位数
pub fn count_ones(bitmap: &[u8], start: u32, end: u32) -> u32 {
    let max_bits = (bitmap.len() * 8) as u32;
    let end = end.min(max_bits);

    (start..end).filter(|&i| test_bit(bitmap, i)).count() as u32
}

/// 统计 `[start, end)` 范围内空闲的位数
pub fn count_zeros(bitmap: &[u8], start: u32, end: u32) -> u32 {
    let max_bits = (bitmap.len() * 8) as u32;
    let end = end.min(max_bits);
    if start >= end {
        return 0;
    }
    (end - start) - count_ones(bitmap, start, end)
}
