//! 存储单元
//!
//! 一个单元 = 身份 + 固定容量 + 独占的存储缓冲区 + 宿主请求队列的关联。
//! 存储与队列关联都放在同一把单元锁之后，所有缓冲区访问都在持锁期间发生。

mod identity;

pub use identity::{disk_name, DeviceNumber, UnitIdentity};

use crate::block::{self, Direction, StorageBuffer};
use crate::error::{Error, ErrorKind, Result};
use crate::geometry::Geometry;
use alloc::sync::Arc;
use bitflags::bitflags;
use spin::{Mutex, MutexGuard};

bitflags! {
    /// 单元生命周期标志
    ///
    /// 记录创建过程中哪些步骤已经完成，拆除时只撤销这些步骤。
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UnitFlags: u8 {
        /// 存储缓冲区已分配
        const ALLOCATED      = 0x01;
        /// 请求队列已关联
        const QUEUE_ATTACHED = 0x02;
        /// 已向宿主发布
        const PUBLISHED      = 0x04;
    }
}

/// 共享的单元句柄
pub type UnitHandle<Q> = Arc<Unit<Q>>;

/// 发布给宿主的磁盘描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskInfo {
    /// 单元身份
    pub identity: UnitIdentity,
    /// 容量（扇区）
    pub capacity_sectors: u64,
    /// 扇区大小
    pub sector_size: u32,
}

/// 锁内状态
pub(crate) struct UnitState<Q> {
    pub(crate) storage: Option<StorageBuffer>,
    pub(crate) queue: Option<Q>,
    pub(crate) flags: UnitFlags,
}

/// 存储单元
pub struct Unit<Q> {
    identity: UnitIdentity,
    capacity_bytes: u64,
    sector_size: u32,
    state: Mutex<UnitState<Q>>,
}

impl<Q> core::fmt::Debug for Unit<Q> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Unit")
            .field("identity", &self.identity)
            .field("capacity_bytes", &self.capacity_bytes)
            .field("sector_size", &self.sector_size)
            .finish()
    }
}

impl<Q> Unit<Q> {
    /// 由已分配的存储和已关联的队列组装单元
    pub(crate) fn new(
        identity: UnitIdentity,
        sector_size: u32,
        storage: StorageBuffer,
        queue: Q,
    ) -> Self {
        Self {
            identity,
            capacity_bytes: storage.capacity(),
            sector_size,
            state: Mutex::new(UnitState {
                storage: Some(storage),
                queue: Some(queue),
                flags: UnitFlags::ALLOCATED | UnitFlags::QUEUE_ATTACHED,
            }),
        }
    }

    /// 单元身份
    pub fn identity(&self) -> &UnitIdentity {
        &self.identity
    }

    /// 创建序号
    pub fn index(&self) -> usize {
        self.identity.index()
    }

    /// 设备名
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// 容量（字节）
    pub fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    /// 扇区大小
    pub fn sector_size(&self) -> u32 {
        self.sector_size
    }

    /// 容量（扇区）
    pub fn capacity_sectors(&self) -> u64 {
        self.capacity_bytes / self.sector_size as u64
    }

    /// 合成几何参数
    pub fn geometry(&self) -> Geometry {
        Geometry::advise(self.capacity_bytes, self.sector_size)
    }

    /// 发布给宿主的磁盘描述
    pub fn disk_info(&self) -> DiskInfo {
        DiskInfo {
            identity: self.identity.clone(),
            capacity_sectors: self.capacity_sectors(),
            sector_size: self.sector_size,
        }
    }

    /// 当前生命周期标志
    pub fn flags(&self) -> UnitFlags {
        self.state.lock().flags
    }

    /// 是否已向宿主发布
    pub fn is_published(&self) -> bool {
        self.flags().contains(UnitFlags::PUBLISHED)
    }

    /// 在单元锁下执行一次传输
    ///
    /// 单元已拆除时返回 `NoDevice`。
    pub fn transfer(
        &self,
        start_sector: u64,
        sector_count: u64,
        buf: &mut [u8],
        direction: Direction,
    ) -> Result<()> {
        let mut state = self.lock();
        let storage = state.storage_mut()?;
        block::transfer(storage, self.sector_size, start_sector, sector_count, buf, direction)
    }

    /// 读取扇区，扇区数由 `buf` 长度决定
    pub fn read_sectors(&self, start_sector: u64, buf: &mut [u8]) -> Result<()> {
        let count = self.sectors_in(buf.len())?;
        let state = self.lock();
        let storage = state
            .storage
            .as_ref()
            .ok_or(Error::new(ErrorKind::NoDevice, "unit has been torn down"))?;
        block::read_sectors(storage, self.sector_size, start_sector, count, buf)
    }

    /// 写入扇区，扇区数由 `buf` 长度决定
    pub fn write_sectors(&self, start_sector: u64, buf: &[u8]) -> Result<()> {
        let count = self.sectors_in(buf.len())?;
        let mut state = self.lock();
        let storage = state.storage_mut()?;
        block::write_sectors(storage, self.sector_size, start_sector, count, buf)
    }

    fn sectors_in(&self, len: usize) -> Result<u64> {
        let sector_size = self.sector_size as usize;
        if len % sector_size != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "buffer length is not a multiple of sector size",
            ));
        }
        Ok((len / sector_size) as u64)
    }

    /// 获取单元锁
    pub(crate) fn lock(&self) -> MutexGuard<'_, UnitState<Q>> {
        self.state.lock()
    }

    pub(crate) fn set_flags(&self, flags: UnitFlags) {
        self.lock().flags.insert(flags);
    }

    /// 解除队列关联，返回队列供宿主回收
    pub(crate) fn detach_queue(&self) -> Option<Q> {
        let mut state = self.lock();
        state.flags.remove(UnitFlags::QUEUE_ATTACHED);
        state.queue.take()
    }

    /// 释放存储缓冲区
    pub(crate) fn release_storage(&self) {
        let mut state = self.lock();
        state.flags.remove(UnitFlags::ALLOCATED);
        state.storage = None;
    }

    pub(crate) fn clear_published(&self) -> bool {
        let mut state = self.lock();
        let was = state.flags.contains(UnitFlags::PUBLISHED);
        state.flags.remove(UnitFlags::PUBLISHED);
        was
    }
}

impl<Q> UnitState<Q> {
    pub(crate) fn storage_mut(&mut self) -> Result<&mut StorageBuffer> {
        self.storage
            .as_mut()
            .ok_or(Error::new(ErrorKind::NoDevice, "unit has been torn down"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn unit(sectors: u64) -> Unit<()> {
        let identity = UnitIdentity::new("vbdev", 0, 240);
        let storage = StorageBuffer::allocate(sectors * 512).unwrap();
        Unit::new(identity, 512, storage, ())
    }

    #[test]
    fn test_unit_properties() {
        let u = unit(64);
        assert_eq!(u.name(), "vbdeva");
        assert_eq!(u.index(), 0);
        assert_eq!(u.capacity_bytes(), 64 * 512);
        assert_eq!(u.capacity_sectors(), 64);
        assert_eq!(u.flags(), UnitFlags::ALLOCATED | UnitFlags::QUEUE_ATTACHED);
        assert!(!u.is_published());

        let info = u.disk_info();
        assert_eq!(info.capacity_sectors, 64);
        assert_eq!(info.identity.name(), "vbdeva");
    }

    #[test]
    fn test_read_write_sectors() {
        let u = unit(8);
        u.write_sectors(2, &[0x5A; 1024]).unwrap();

        let mut out = vec![0u8; 1536];
        u.read_sectors(1, &mut out).unwrap();
        assert!(out[..512].iter().all(|&b| b == 0));
        assert!(out[512..].iter().all(|&b| b == 0x5A));

        let err = u.write_sectors(0, &[0u8; 100]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_transfer_after_release() {
        let u = unit(8);
        assert_eq!(u.detach_queue(), Some(()));
        u.release_storage();
        assert!(u.flags().is_empty());

        let mut buf = vec![0u8; 512];
        let err = u.transfer(0, 1, &mut buf, Direction::Read).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoDevice);
        assert_eq!(u.read_sectors(0, &mut buf).unwrap_err().kind(), ErrorKind::NoDevice);
    }
}
