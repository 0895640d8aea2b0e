//! 单元身份

use crate::consts::MINORS_PER_UNIT;
use alloc::string::String;
use alloc::vec::Vec;

/// 设备号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceNumber {
    /// 主设备号
    pub major: u32,
    /// 次设备号
    pub minor: u32,
}

/// 单元身份
///
/// 创建时确定，之后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitIdentity {
    index: usize,
    name: String,
    devno: DeviceNumber,
}

impl UnitIdentity {
    /// 为第 `index` 个单元生成身份
    ///
    /// 经过 [`RegistryConfig::validate`](crate::RegistryConfig::validate) 的单元数
    /// 保证次设备号不溢出；越界的 `index` 次设备号饱和为 `u32::MAX`。
    pub fn new(prefix: &str, index: usize, major: u32) -> Self {
        let minor = u32::try_from(index)
            .ok()
            .and_then(|i| i.checked_mul(MINORS_PER_UNIT))
            .unwrap_or(u32::MAX);

        Self {
            index,
            name: disk_name(prefix, index),
            devno: DeviceNumber { major, minor },
        }
    }

    /// 创建序号
    pub fn index(&self) -> usize {
        self.index
    }

    /// 设备名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 设备号（首个次设备号）
    pub fn devno(&self) -> DeviceNumber {
        self.devno
    }

    /// 次设备号数量
    pub fn minors(&self) -> u32 {
        MINORS_PER_UNIT
    }
}

/// 由创建序号推导设备名
///
/// 后缀使用双射 26 进制：`a`..`z`, `aa`, `ab`, ...，任意数量的单元都不会重名。
pub fn disk_name(prefix: &str, index: usize) -> String {
    let mut suffix = Vec::new();
    let mut n = index as u128 + 1;
    while n > 0 {
        n -= 1;
        suffix.push(b'a' + (n % 26) as u8);
        n /= 26;
    }

    let mut name = String::with_capacity(prefix.len() + suffix.len());
    name.push_str(prefix);
    name.extend(suffix.iter().rev().map(|&b| b as char));
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeSet;

    #[test]
    fn test_disk_name_suffixes() {
        assert_eq!(disk_name("vbdev", 0), "vbdeva");
        assert_eq!(disk_name("vbdev", 1), "vbdevb");
        assert_eq!(disk_name("vbdev", 25), "vbdevz");
        assert_eq!(disk_name("vbdev", 26), "vbdevaa");
        assert_eq!(disk_name("vbdev", 27), "vbdevab");
        assert_eq!(disk_name("vbdev", 26 + 26 * 26), "vbdevaaa");
    }

    #[test]
    fn test_disk_names_unique() {
        let names: BTreeSet<_> = (0..2000).map(|i| disk_name("d", i)).collect();
        assert_eq!(names.len(), 2000);
    }

    #[test]
    fn test_identity_minors() {
        let id = UnitIdentity::new("vbdev", 2, 240);
        assert_eq!(id.index(), 2);
        assert_eq!(id.name(), "vbdevc");
        assert_eq!(id.devno(), DeviceNumber { major: 240, minor: 32 });
        assert_eq!(id.minors(), 16);
    }
}
