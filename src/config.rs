//! 启动配置
//!
//! 单元数量、容量与扇区大小在启动时一次性给出，之后不可变。

use crate::consts::{
    DEFAULT_CAPACITY_BYTES, DEFAULT_SECTOR_SIZE, DEFAULT_UNIT_COUNT, DEVICE_NAME, DISK_NAME_LEN,
    DYNAMIC_MAJOR, MINORS_PER_UNIT,
};
use crate::error::{Error, ErrorKind, Result};

/// 注册表配置
///
/// 作为显式值传给 [`UnitRegistry::new`](crate::UnitRegistry::new)，
/// 因此同一进程内可以存在多个互相独立的注册表。
///
/// # 示例
///
/// ```rust,ignore
/// let config = RegistryConfig::default()
///     .with_unit_count(4)
///     .with_capacity_bytes(8 * 1024 * 1024);
/// config.validate()?;
/// ```
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// 单元数量（至少 1）
    pub unit_count: usize,
    /// 每个单元的容量（字节）
    pub capacity_bytes: u64,
    /// 扇区大小（字节）
    pub sector_size: u32,
    /// 请求的主设备号（0 表示动态分配）
    pub major: u32,
    /// 设备名前缀
    pub name_prefix: &'static str,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            unit_count: DEFAULT_UNIT_COUNT,
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            sector_size: DEFAULT_SECTOR_SIZE,
            major: DYNAMIC_MAJOR,
            name_prefix: DEVICE_NAME,
        }
    }
}

impl RegistryConfig {
    /// 设置单元数量
    pub fn with_unit_count(mut self, unit_count: usize) -> Self {
        self.unit_count = unit_count;
        self
    }

    /// 设置单元容量（字节）
    pub fn with_capacity_bytes(mut self, capacity_bytes: u64) -> Self {
        self.capacity_bytes = capacity_bytes;
        self
    }

    /// 以 MiB 为单位设置单元容量
    pub fn with_capacity_mb(self, mb: u64) -> Self {
        self.with_capacity_bytes(mb.saturating_mul(1024 * 1024))
    }

    /// 设置扇区大小
    pub fn with_sector_size(mut self, sector_size: u32) -> Self {
        self.sector_size = sector_size;
        self
    }

    /// 设置主设备号
    pub fn with_major(mut self, major: u32) -> Self {
        self.major = major;
        self
    }

    /// 设置设备名前缀
    pub fn with_name_prefix(mut self, name_prefix: &'static str) -> Self {
        self.name_prefix = name_prefix;
        self
    }

    /// 每个单元的扇区数
    pub fn capacity_sectors(&self) -> u64 {
        if self.sector_size == 0 {
            return 0;
        }
        self.capacity_bytes / self.sector_size as u64
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.unit_count == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "unit count must be at least 1"));
        }
        // 每个单元占 MINORS_PER_UNIT 个次设备号，全部单元必须落在 u32 范围内
        let minors = (self.unit_count as u128) * MINORS_PER_UNIT as u128;
        if minors > u32::MAX as u128 + 1 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "unit count exceeds minor number space",
            ));
        }
        if self.sector_size == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "sector size must be positive"));
        }
        if self.capacity_bytes == 0 {
            return Err(Error::new(ErrorKind::InvalidInput, "capacity must be positive"));
        }
        if self.capacity_bytes % self.sector_size as u64 != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "capacity must be a multiple of sector size",
            ));
        }
        if usize::try_from(self.capacity_bytes).is_err() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "capacity exceeds addressable memory",
            ));
        }
        if self.name_prefix.is_empty() || self.name_prefix.len() >= DISK_NAME_LEN / 2 {
            return Err(Error::new(ErrorKind::InvalidInput, "invalid device name prefix"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.unit_count, 1);
        assert_eq!(config.capacity_bytes, 100 * 1024 * 1024);
        assert_eq!(config.sector_size, 512);
        assert_eq!(config.capacity_sectors(), 204800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::default()
            .with_unit_count(3)
            .with_capacity_mb(2)
            .with_sector_size(4096)
            .with_major(240)
            .with_name_prefix("ram");
        assert_eq!(config.unit_count, 3);
        assert_eq!(config.capacity_bytes, 2 * 1024 * 1024);
        assert_eq!(config.capacity_sectors(), 512);
        assert_eq!(config.major, 240);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_units = RegistryConfig::default().with_unit_count(0);
        assert_eq!(zero_units.validate().unwrap_err().kind(), ErrorKind::InvalidInput);

        let zero_sector = RegistryConfig::default().with_sector_size(0);
        assert_eq!(zero_sector.capacity_sectors(), 0);
        assert!(zero_sector.validate().is_err());

        let unaligned = RegistryConfig::default().with_capacity_bytes(1000);
        assert!(unaligned.validate().is_err());

        let empty = RegistryConfig::default().with_capacity_bytes(0);
        assert!(empty.validate().is_err());

        let no_prefix = RegistryConfig::default().with_name_prefix("");
        assert!(no_prefix.validate().is_err());
    }

    #[test]
    fn test_validate_minor_number_space() {
        let max_units = (u32::MAX as usize / MINORS_PER_UNIT as usize) + 1;
        assert!(RegistryConfig::default().with_unit_count(max_units).validate().is_ok());

        let too_many = RegistryConfig::default().with_unit_count(max_units + 1);
        assert_eq!(too_many.validate().unwrap_err().kind(), ErrorKind::InvalidInput);
    }
}
