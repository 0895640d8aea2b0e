//! vbdev_core: 内存块设备引擎
//!
//! 提供一个或多个固定容量、按扇区寻址、以内存缓冲区为后端的存储单元，
//! 并处理宿主投递的读写请求：
//! - **带边界检查**的扇区拷贝，越界请求在任何拷贝之前失败
//! - **每单元一把锁**，同一单元的读写完全串行
//! - **显式配置**，同一进程内可以有多个互相独立的注册表
//! - 启动中途失败后可安全拆除
//!
//! # 示例
//!
//! ```rust,ignore
//! use vbdev_core::{drain, MemorySource, RegistryConfig, Request, UnitRegistry};
//!
//! let config = RegistryConfig::default().with_unit_count(2);
//! let mut registry = UnitRegistry::new(config, MemorySource::new());
//! let units = registry.create_all()?;
//!
//! // 宿主投递请求，然后驱动分发
//! let queue = registry.source().queue("vbdeva").unwrap();
//! queue.submit(Request::write(1, 0, 1, vec![0xAB; 512]))?;
//! drain(&units[0]);
//!
//! registry.teardown_all();
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`block`] - 存储缓冲区与传输引擎
//! - [`unit`] - 存储单元
//! - [`request`] - 请求与分发器
//! - [`registry`] - 单元注册表
//! - [`geometry`] - 兼容几何参数
//! - [`control`] - 控制通道
//! - [`host`] - 宿主接口与内存实现

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 常量定义
pub mod consts;

/// 启动配置
pub mod config;

/// 存储缓冲区与传输引擎
pub mod block;

/// 存储单元
pub mod unit;

/// 请求与分发
pub mod request;

/// 单元注册表
pub mod registry;

/// 兼容几何参数
pub mod geometry;

/// 控制通道
pub mod control;

/// 宿主接口
pub mod host;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 配置
pub use config::RegistryConfig;

// 存储
pub use block::{Direction, StorageBuffer};

// 单元
pub use unit::{DeviceNumber, DiskInfo, Unit, UnitFlags, UnitHandle, UnitIdentity};

// 请求
pub use request::{drain, Completion, DrainStats, Request, RequestKind, RequestQueue};

// 注册表
pub use registry::UnitRegistry;

// 几何与控制
pub use control::{control, ioctl, ControlCommand, ControlReply};
pub use geometry::Geometry;

// 宿主
pub use host::{MemoryQueue, MemorySource, RequestSource};
