//! 单元注册表
//!
//! 唯一拥有单元创建与拆除权的组件。
//!
//! # 启动中途失败
//!
//! 第 `i` 个单元创建失败时，只释放该单元已取得的部分资源，然后把错误返回给调用方；
//! 序号小于 `i` 的单元保持注册状态，由调用方决定何时调用 [`UnitRegistry::teardown_all`]。
//! 拆除是幂等的，注册表被丢弃时也会自动执行。

use crate::block::StorageBuffer;
use crate::config::RegistryConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::host::RequestSource;
use crate::request::RequestQueue;
use crate::unit::{Unit, UnitFlags, UnitHandle, UnitIdentity};
use alloc::sync::Arc;
use alloc::vec::Vec;

/// 单元注册表
pub struct UnitRegistry<S: RequestSource> {
    config: RegistryConfig,
    source: S,
    major: Option<u32>,
    units: Vec<UnitHandle<S::Queue>>,
}

impl<S: RequestSource> UnitRegistry<S> {
    /// 用显式配置和请求源创建注册表（尚未创建任何单元）
    pub fn new(config: RegistryConfig, source: S) -> Self {
        Self {
            config,
            source,
            major: None,
            units: Vec::new(),
        }
    }

    /// 配置
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// 请求源
    pub fn source(&self) -> &S {
        &self.source
    }

    /// 请求源（可变）
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// 已注册的主设备号
    pub fn major(&self) -> Option<u32> {
        self.major
    }

    /// 已创建的单元（按序号排列）
    pub fn units(&self) -> &[UnitHandle<S::Queue>] {
        &self.units
    }

    /// 按序号取单元
    pub fn unit(&self, index: usize) -> Option<&UnitHandle<S::Queue>> {
        self.units.get(index)
    }

    /// 按设备名取单元
    pub fn unit_by_name(&self, name: &str) -> Option<&UnitHandle<S::Queue>> {
        self.units.iter().find(|unit| unit.name() == name)
    }

    /// 已创建的单元数
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// 是否没有已创建的单元
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 按配置创建全部单元
    ///
    /// 按序号 `0..unit_count` 依次创建：分配存储、关联队列、确定身份、发布。
    ///
    /// # 错误
    ///
    /// - `InvalidInput`：配置无效，不创建任何单元
    /// - `InvalidState`：已经创建过且尚未拆除
    /// - `Init`：主设备号注册失败，或某个单元创建失败（在第一个失败处停止）
    pub fn create_all(&mut self) -> Result<Vec<UnitHandle<S::Queue>>> {
        self.config.validate()?;
        if self.major.is_some() || !self.units.is_empty() {
            return Err(Error::new(ErrorKind::InvalidState, "units already created"));
        }

        let prefix = self.config.name_prefix;
        let major = self
            .source
            .register_major(self.config.major, prefix)
            .map_err(|e| {
                log::error!("[REGISTRY] unable to get major number: {}", e);
                Error::new(ErrorKind::Init, "unable to get major number")
            })?;
        self.major = Some(major);
        log::info!("[REGISTRY] init driver {} (major {})", prefix, major);

        for index in 0..self.config.unit_count {
            let unit = self.create_unit(index, major)?;
            self.units.push(unit);
        }

        log::info!(
            "[REGISTRY] {} unit(s) of {} bytes ready",
            self.units.len(),
            self.config.capacity_bytes
        );
        Ok(self.units.clone())
    }

    /// 创建单个单元
    ///
    /// 失败时已取得的资源（存储、队列）在返回前释放。
    fn create_unit(&mut self, index: usize, major: u32) -> Result<UnitHandle<S::Queue>> {
        let identity = UnitIdentity::new(self.config.name_prefix, index, major);
        log::debug!("[REGISTRY] setting up {}", identity.name());

        let storage = StorageBuffer::allocate(self.config.capacity_bytes).map_err(|e| {
            log::error!("[REGISTRY] {}: {}", identity.name(), e);
            e
        })?;

        let queue = self.source.attach_queue(&identity).map_err(|e| {
            log::error!("[REGISTRY] {}: queue attach failure: {}", identity.name(), e);
            Error::new(ErrorKind::Init, "queue attach failure")
        })?;

        let unit = Arc::new(Unit::new(identity, self.config.sector_size, storage, queue));

        if let Err(e) = self.source.publish(&unit.disk_info()) {
            log::error!("[REGISTRY] {}: publish failure: {}", unit.name(), e);
            if let Some(queue) = unit.detach_queue() {
                self.source.release_queue(unit.identity(), queue);
            }
            unit.release_storage();
            return Err(Error::new(ErrorKind::Init, "disk publish failure"));
        }
        unit.set_flags(UnitFlags::PUBLISHED);

        log::info!(
            "[REGISTRY] {} ready: {} sectors of {} bytes",
            unit.name(),
            unit.capacity_sectors(),
            unit.sector_size()
        );
        Ok(unit)
    }

    /// 拆除全部单元
    ///
    /// 对每个已创建的单元依次：撤销发布、以 `NoDevice` 拒绝残留请求、回收队列、释放存储；
    /// 最后注销主设备号。单元之间互不影响。可重复调用，未创建的部分直接跳过。
    pub fn teardown_all(&mut self) {
        if self.units.is_empty() && self.major.is_none() {
            return;
        }
        log::info!("[REGISTRY] turning off driver {}", self.config.name_prefix);

        for unit in core::mem::take(&mut self.units) {
            teardown_unit(&mut self.source, &unit);
        }

        if let Some(major) = self.major.take() {
            self.source.unregister_major(major, self.config.name_prefix);
        }
        log::info!("[REGISTRY] driver turned off");
    }
}

fn teardown_unit<S: RequestSource>(source: &mut S, unit: &Unit<S::Queue>) {
    if unit.clear_published() {
        source.unpublish(unit.identity());
    }

    // 取队列需要单元锁，正在运行的分发会先完成
    if let Some(queue) = unit.detach_queue() {
        if !queue.is_empty() {
            log::debug!(
                "[REGISTRY] {} rejecting {} pending request(s)",
                unit.name(),
                queue.len()
            );
        }
        while let Some(request) = queue.fetch() {
            queue.complete(
                request,
                Err(Error::new(ErrorKind::NoDevice, "unit is being torn down")),
            );
        }
        source.release_queue(unit.identity(), queue);
    }

    unit.release_storage();
    log::debug!("[REGISTRY] {} released", unit.name());
}

impl<S: RequestSource> Drop for UnitRegistry<S> {
    fn drop(&mut self) {
        self.teardown_all();
    }
}
