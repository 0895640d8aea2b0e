//! 宿主接口
//!
//! 宿主（请求源）负责发现设备、为其命名并投递请求。引擎只在这里定义的边界上与它交互：
//!
//! - [`RequestSource`]：主设备号注册、队列关联/回收、发布/撤销发布
//! - [`RequestQueue`](crate::request::RequestQueue)：每个单元的请求队列
//!
//! host/memory.rs 提供一个纯内存的参考实现，测试与没有真实宿主的嵌入场景都使用它。

mod memory;

pub use memory::{MemoryQueue, MemorySource};

use crate::error::Result;
use crate::request::RequestQueue;
use crate::unit::{DiskInfo, UnitIdentity};

/// 请求源接口
///
/// 由 [`UnitRegistry`](crate::UnitRegistry) 在创建与拆除单元时调用。
///
/// # 调用顺序
///
/// ```text
/// register_major
///   for each unit: attach_queue -> publish
///   ...
///   for each unit: unpublish -> release_queue
/// unregister_major
/// ```
pub trait RequestSource {
    /// 单元请求队列类型
    type Queue: RequestQueue;

    /// 注册主设备号
    ///
    /// `major` 为 0 时由宿主动态分配；返回实际使用的主设备号。
    fn register_major(&mut self, major: u32, name: &str) -> Result<u32>;

    /// 注销主设备号
    fn unregister_major(&mut self, major: u32, name: &str);

    /// 为单元创建并关联请求队列
    fn attach_queue(&mut self, identity: &UnitIdentity) -> Result<Self::Queue>;

    /// 回收单元的请求队列
    ///
    /// 调用时队列中已没有待处理请求。
    fn release_queue(&mut self, identity: &UnitIdentity, queue: Self::Queue);

    /// 发布单元，此后宿主可以向其投递请求
    fn publish(&mut self, disk: &DiskInfo) -> Result<()>;

    /// 撤销发布，此后宿主不再向其投递请求
    fn unpublish(&mut self, identity: &UnitIdentity);
}
