//! 块设备引擎常量定义
//!
//! 这个模块包含了引擎使用的所有常量定义，包括：
//! - 扇区与容量默认值
//! - 设备命名与设备号
//! - 兼容几何参数
//! - 控制通道命令码

//=============================================================================
// 基础常量
//=============================================================================

/// 内核扇区大小（512 字节）
pub const KERNEL_SECTOR_SIZE: u32 = 512;

/// 默认扇区大小
pub const DEFAULT_SECTOR_SIZE: u32 = KERNEL_SECTOR_SIZE;

/// 默认单元容量（MiB）
pub const DEFAULT_CAPACITY_MB: u64 = 100;

/// 默认单元容量（字节）
pub const DEFAULT_CAPACITY_BYTES: u64 = DEFAULT_CAPACITY_MB * 1024 * 1024;

/// 默认单元数量
pub const DEFAULT_UNIT_COUNT: usize = 1;

//=============================================================================
// 设备命名
//=============================================================================

/// 默认设备名前缀
pub const DEVICE_NAME: &str = "vbdev";

/// 设备名最大长度（含结尾 NUL）
pub const DISK_NAME_LEN: usize = 32;

/// 每个单元占用的次设备号数量
pub const MINORS_PER_UNIT: u32 = 16;

/// 请求动态分配主设备号
pub const DYNAMIC_MAJOR: u32 = 0;

//=============================================================================
// 兼容几何参数
//=============================================================================

/// 磁头数（策略常量）
pub const GEOMETRY_HEADS: u8 = 4;

/// 每磁道扇区数（策略常量）
pub const GEOMETRY_SECTORS_PER_TRACK: u8 = 16;

/// `hd_geometry` 记录的编码长度
pub const GEOMETRY_RECORD_SIZE: usize = 16;

//=============================================================================
// 控制通道
//=============================================================================

/// 查询几何参数的控制命令码
pub const HDIO_GETGEO: u32 = 0x0301;
