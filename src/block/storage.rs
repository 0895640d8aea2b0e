//! 单元存储缓冲区

use crate::error::{Error, ErrorKind, Result};
use alloc::vec::Vec;

/// 存储缓冲区
///
/// 单元的全部内容：一段长度固定、创建时清零的连续字节。
/// 缓冲区只属于一个单元，容量在生命周期内不变。
pub struct StorageBuffer {
    data: Vec<u8>,
}

impl core::fmt::Debug for StorageBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StorageBuffer")
            .field("capacity", &self.data.len())
            .finish()
    }
}

impl StorageBuffer {
    /// 分配容量为 `capacity_bytes` 的缓冲区
    ///
    /// 分配失败时返回 `Init` 错误，而不是中止进程。
    pub fn allocate(capacity_bytes: u64) -> Result<Self> {
        let len = usize::try_from(capacity_bytes).map_err(|_| {
            Error::new(ErrorKind::Init, "capacity exceeds addressable memory")
        })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| Error::new(ErrorKind::Init, "storage allocation failure"))?;
        data.resize(len, 0);

        log::trace!("[STORAGE] allocated {} bytes", len);
        Ok(Self { data })
    }

    /// 容量（字节）
    pub fn capacity(&self) -> u64 {
        self.data.len() as u64
    }

    /// 只读视图
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let storage = StorageBuffer::allocate(4096).unwrap();
        assert_eq!(storage.capacity(), 4096);
        assert!(storage.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_allocate_failure_is_init_error() {
        let err = StorageBuffer::allocate(u64::MAX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Init);
    }
}
