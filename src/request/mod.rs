//! 请求与请求分发
//!
//! request/mod.rs 定义宿主投递的请求形态，以及每个单元的请求队列接口
//! request/dispatch.rs 实现分发器：取出请求、分类、调用传输引擎、回报完成

mod dispatch;

pub use dispatch::{drain, DrainStats};

use crate::block::Direction;
use crate::error::Result;
use alloc::vec::Vec;

/// 请求类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// 普通的按扇区寻址的文件系统 I/O
    FilesystemIo,
    /// 引擎不认识的其他请求（附带宿主的原始命令码）
    Other(u32),
}

/// I/O 请求
///
/// 读请求完成后，读出的数据位于 `data`；请求通过完成通道原样交还宿主。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// 宿主分配的标签
    pub tag: u64,
    /// 请求类别
    pub kind: RequestKind,
    /// 起始扇区
    pub start_sector: u64,
    /// 扇区数
    pub sector_count: u64,
    /// 传输方向
    pub direction: Direction,
    /// 数据缓冲区（长度为 `sector_count * sector_size`）
    pub data: Vec<u8>,
}

impl Request {
    /// 构造读请求，缓冲区按扇区大小清零分配
    ///
    /// 长度无法表示或无法分配时缓冲区留空，请求仍可投递：
    /// 越界的范围由传输引擎以 `OutOfRange` 结束，范围合法时以 `InvalidInput` 结束。
    pub fn read(tag: u64, start_sector: u64, sector_count: u64, sector_size: u32) -> Self {
        let data = zeroed_buffer(sector_count, sector_size).unwrap_or_default();
        Self::read_into(tag, start_sector, sector_count, data)
    }

    /// 构造读请求，使用调用方提供的缓冲区
    pub fn read_into(tag: u64, start_sector: u64, sector_count: u64, data: Vec<u8>) -> Self {
        Self {
            tag,
            kind: RequestKind::FilesystemIo,
            start_sector,
            sector_count,
            direction: Direction::Read,
            data,
        }
    }

    /// 构造写请求
    pub fn write(tag: u64, start_sector: u64, sector_count: u64, data: Vec<u8>) -> Self {
        Self {
            tag,
            kind: RequestKind::FilesystemIo,
            start_sector,
            sector_count,
            direction: Direction::Write,
            data,
        }
    }

    /// 构造非文件系统请求
    pub fn other(tag: u64, command: u32) -> Self {
        Self {
            tag,
            kind: RequestKind::Other(command),
            start_sector: 0,
            sector_count: 0,
            direction: Direction::Read,
            data: Vec::new(),
        }
    }

    /// 是否为文件系统 I/O
    pub fn is_filesystem_io(&self) -> bool {
        self.kind == RequestKind::FilesystemIo
    }
}

/// 分配 `sector_count * sector_size` 字节的清零缓冲区
fn zeroed_buffer(sector_count: u64, sector_size: u32) -> Option<Vec<u8>> {
    let len = sector_count.checked_mul(sector_size as u64)?;
    let len = usize::try_from(len).ok()?;
    let mut data = Vec::new();
    data.try_reserve_exact(len).ok()?;
    data.resize(len, 0);
    Some(data)
}

/// 完成记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// 被完成的请求
    pub request: Request,
    /// 结果
    pub result: Result<()>,
}

/// 单元请求队列
///
/// 由宿主持有并实现；分发器只通过这个接口取请求和回报结果。
/// 实现需要自带同步，宿主线程可能在分发进行时继续投递。
pub trait RequestQueue: Send {
    /// 取出下一个待处理请求（FIFO），没有时返回 `None`
    fn fetch(&self) -> Option<Request>;

    /// 回报请求的最终结果
    fn complete(&self, request: Request, result: Result<()>);

    /// 待处理请求数
    fn len(&self) -> usize;

    /// 是否没有待处理请求
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_request_constructors() {
        let r = Request::read(1, 10, 4, 512);
        assert_eq!(r.data.len(), 2048);
        assert_eq!(r.direction, Direction::Read);
        assert!(r.is_filesystem_io());

        let w = Request::write(2, 0, 1, vec![1u8; 512]);
        assert!(w.direction.is_write());

        let o = Request::other(3, 0x5331);
        assert_eq!(o.kind, RequestKind::Other(0x5331));
        assert!(!o.is_filesystem_io());

        let r = Request::read_into(4, 0, 1, vec![0xCC; 512]);
        assert_eq!(r.direction, Direction::Read);
        assert_eq!(r.data.len(), 512);
    }

    #[test]
    fn test_unrepresentable_read_leaves_buffer_empty() {
        let r = Request::read(1, 0, u64::MAX / 512, 512);
        assert!(r.data.is_empty());
        assert_eq!(r.sector_count, u64::MAX / 512);

        let r = Request::read(2, 0, u64::MAX, 512);
        assert!(r.data.is_empty());
    }
}
