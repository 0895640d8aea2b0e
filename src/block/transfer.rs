//! 传输引擎
//!
//! 把 `(起始扇区, 扇区数, 方向, 调用方缓冲区)` 转换成一次带边界检查的字节拷贝。
//! 边界检查总是在取切片之前完成，失败时两个方向都不拷贝任何字节。

use super::StorageBuffer;
use crate::error::{Error, ErrorKind, Result};
use core::ops::Range;

/// 传输方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 存储 → 调用方缓冲区
    Read,
    /// 调用方缓冲区 → 存储
    Write,
}

impl Direction {
    /// 是否为写操作
    pub const fn is_write(self) -> bool {
        matches!(self, Direction::Write)
    }
}

/// 计算扇区范围对应的字节区间
///
/// 返回 `(offset, length)`；乘法或加法溢出时返回 `None`。
pub fn byte_span(sector_size: u32, start_sector: u64, sector_count: u64) -> Option<(u64, u64)> {
    let sector_size = sector_size as u64;
    let offset = start_sector.checked_mul(sector_size)?;
    let length = sector_count.checked_mul(sector_size)?;
    offset.checked_add(length)?;
    Some((offset, length))
}

/// 校验请求并返回存储内的字节区间
fn checked_region(
    capacity: u64,
    sector_size: u32,
    start_sector: u64,
    sector_count: u64,
    buf_len: usize,
    direction: Direction,
) -> Result<Range<usize>> {
    let (offset, length) = match byte_span(sector_size, start_sector, sector_count) {
        Some((offset, length)) if offset + length <= capacity => (offset, length),
        _ => {
            log::error!(
                "[TRANSFER] beyond-end {:?} (sector={} count={} capacity={})",
                direction,
                start_sector,
                sector_count,
                capacity
            );
            return Err(Error::new(ErrorKind::OutOfRange, "beyond-end transfer"));
        }
    };

    if buf_len as u64 != length {
        log::error!(
            "[TRANSFER] buffer length {} does not match request length {}",
            buf_len,
            length
        );
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "buffer length does not match sector count",
        ));
    }

    log::trace!("[TRANSFER] {:?} offset={:#x} len={}", direction, offset, length);

    // offset + length <= capacity，而 capacity 本身来自一个 Vec 的长度
    let start = offset as usize;
    Ok(start..start + length as usize)
}

/// 从存储读取扇区到 `buf`
pub fn read_sectors(
    storage: &StorageBuffer,
    sector_size: u32,
    start_sector: u64,
    sector_count: u64,
    buf: &mut [u8],
) -> Result<()> {
    let region = checked_region(
        storage.capacity(),
        sector_size,
        start_sector,
        sector_count,
        buf.len(),
        Direction::Read,
    )?;
    buf.copy_from_slice(&storage.as_slice()[region]);
    Ok(())
}

/// 把 `buf` 写入存储
pub fn write_sectors(
    storage: &mut StorageBuffer,
    sector_size: u32,
    start_sector: u64,
    sector_count: u64,
    buf: &[u8],
) -> Result<()> {
    let region = checked_region(
        storage.capacity(),
        sector_size,
        start_sector,
        sector_count,
        buf.len(),
        Direction::Write,
    )?;
    storage.as_mut_slice()[region].copy_from_slice(buf);
    Ok(())
}

/// 执行一次扇区传输
///
/// # 参数
///
/// * `storage` - 单元存储（调用方必须持有单元锁）
/// * `sector_size` - 扇区大小
/// * `start_sector` - 起始扇区
/// * `sector_count` - 扇区数
/// * `buf` - 调用方缓冲区，长度必须正好为 `sector_count * sector_size`
/// * `direction` - 传输方向
///
/// # 错误
///
/// - `OutOfRange`：`offset + length` 超出容量（或溢出），不拷贝任何字节
/// - `InvalidInput`：缓冲区长度与请求长度不符，不拷贝任何字节
pub fn transfer(
    storage: &mut StorageBuffer,
    sector_size: u32,
    start_sector: u64,
    sector_count: u64,
    buf: &mut [u8],
    direction: Direction,
) -> Result<()> {
    match direction {
        Direction::Read => read_sectors(storage, sector_size, start_sector, sector_count, buf),
        Direction::Write => write_sectors(storage, sector_size, start_sector, sector_count, buf),
    }
}
