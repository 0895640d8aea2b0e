//! 内存宿主实现

use super::RequestSource;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{Completion, Request, RequestQueue};
use crate::unit::{DiskInfo, UnitIdentity};
use alloc::collections::{BTreeMap, VecDeque};
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use spin::Mutex;

/// 动态分配的主设备号（从高往低分配）
const DYNAMIC_MAJOR_BASE: u32 = 254;

struct QueueInner {
    pending: VecDeque<Request>,
    completions: Vec<Completion>,
    accepting: bool,
}

/// 内存请求队列
///
/// 克隆得到的句柄共享同一个队列：宿主一侧投递请求、收取完成记录，
/// 单元一侧由分发器取请求、回报结果。
#[derive(Clone)]
pub struct MemoryQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl core::fmt::Debug for MemoryQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryQueue")
            .field("pending", &inner.pending.len())
            .field("completions", &inner.completions.len())
            .field("accepting", &inner.accepting)
            .finish()
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryQueue {
    /// 创建空队列
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner {
                pending: VecDeque::new(),
                completions: Vec::new(),
                accepting: true,
            })),
        }
    }

    /// 投递请求
    ///
    /// 单元撤销发布后返回 `NoDevice`。
    pub fn submit(&self, request: Request) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.accepting {
            return Err(Error::new(ErrorKind::NoDevice, "queue is not accepting requests"));
        }
        inner.pending.push_back(request);
        Ok(())
    }

    /// 待处理请求数
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// 取走所有完成记录（按完成顺序）
    pub fn take_completions(&self) -> Vec<Completion> {
        core::mem::take(&mut self.inner.lock().completions)
    }

    /// 是否仍接受新请求
    pub fn is_accepting(&self) -> bool {
        self.inner.lock().accepting
    }

    fn stop_accepting(&self) {
        self.inner.lock().accepting = false;
    }
}

impl RequestQueue for MemoryQueue {
    fn fetch(&self) -> Option<Request> {
        self.inner.lock().pending.pop_front()
    }

    fn complete(&self, request: Request, result: Result<()>) {
        self.inner.lock().completions.push(Completion { request, result });
    }

    fn len(&self) -> usize {
        self.pending_len()
    }
}

/// 内存请求源
///
/// 记录已注册的主设备号、已关联的队列和已发布的磁盘，
/// 并可在指定单元上注入失败，用于演练启动中途失败后的拆除。
#[derive(Debug, Default)]
pub struct MemorySource {
    major: Option<u32>,
    queues: BTreeMap<String, MemoryQueue>,
    published: BTreeMap<String, DiskInfo>,
    fail_register: bool,
    fail_attach_at: Option<usize>,
    fail_publish_at: Option<usize>,
}

impl MemorySource {
    /// 创建请求源
    pub fn new() -> Self {
        Self::default()
    }

    /// 让主设备号注册失败
    pub fn with_register_failure(mut self) -> Self {
        self.fail_register = true;
        self
    }

    /// 让第 `index` 个单元的队列关联失败
    pub fn with_attach_failure(mut self, index: usize) -> Self {
        self.fail_attach_at = Some(index);
        self
    }

    /// 让第 `index` 个单元的发布失败
    pub fn with_publish_failure(mut self, index: usize) -> Self {
        self.fail_publish_at = Some(index);
        self
    }

    /// 当前注册的主设备号
    pub fn registered_major(&self) -> Option<u32> {
        self.major
    }

    /// 按设备名取宿主侧的队列句柄
    pub fn queue(&self, name: &str) -> Option<MemoryQueue> {
        self.queues.get(name).cloned()
    }

    /// 已关联的队列数
    pub fn attached_count(&self) -> usize {
        self.queues.len()
    }

    /// 按设备名查询已发布的磁盘
    pub fn disk(&self, name: &str) -> Option<&DiskInfo> {
        self.published.get(name)
    }

    /// 已发布的磁盘（按设备名排序）
    pub fn disks(&self) -> impl Iterator<Item = &DiskInfo> {
        self.published.values()
    }

    /// 设备是否已发布
    pub fn is_published(&self, name: &str) -> bool {
        self.published.contains_key(name)
    }

    /// 已发布的磁盘数
    pub fn published_count(&self) -> usize {
        self.published.len()
    }
}

impl RequestSource for MemorySource {
    type Queue = MemoryQueue;

    fn register_major(&mut self, major: u32, name: &str) -> Result<u32> {
        if self.fail_register || self.major.is_some() {
            return Err(Error::new(ErrorKind::InvalidState, "major number unavailable"));
        }
        let major = if major == 0 { DYNAMIC_MAJOR_BASE } else { major };
        log::debug!("[HOST] registered major {} for {}", major, name);
        self.major = Some(major);
        Ok(major)
    }

    fn unregister_major(&mut self, major: u32, name: &str) {
        if self.major == Some(major) {
            log::debug!("[HOST] unregistered major {} for {}", major, name);
            self.major = None;
        }
    }

    fn attach_queue(&mut self, identity: &UnitIdentity) -> Result<MemoryQueue> {
        if self.fail_attach_at == Some(identity.index()) {
            return Err(Error::new(ErrorKind::Init, "queue allocation failure"));
        }
        let queue = MemoryQueue::new();
        self.queues.insert(identity.name().to_string(), queue.clone());
        Ok(queue)
    }

    fn release_queue(&mut self, identity: &UnitIdentity, queue: MemoryQueue) {
        queue.stop_accepting();
        self.queues.remove(identity.name());
    }

    fn publish(&mut self, disk: &DiskInfo) -> Result<()> {
        if self.fail_publish_at == Some(disk.identity.index()) {
            return Err(Error::new(ErrorKind::Init, "disk allocation failure"));
        }
        self.published
            .insert(disk.identity.name().to_string(), disk.clone());
        Ok(())
    }

    fn unpublish(&mut self, identity: &UnitIdentity) {
        if let Some(queue) = self.queues.get(identity.name()) {
            queue.stop_accepting();
        }
        self.published.remove(identity.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_fifo() {
        let queue = MemoryQueue::new();
        queue.submit(Request::read(1, 0, 1, 512)).unwrap();
        queue.submit(Request::read(2, 1, 1, 512)).unwrap();
        assert_eq!(queue.pending_len(), 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.fetch().unwrap().tag, 1);
        assert_eq!(queue.fetch().unwrap().tag, 2);
        assert!(queue.fetch().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_completions() {
        let queue = MemoryQueue::new();
        let handle = queue.clone();
        queue.complete(Request::other(7, 1), Ok(()));
        let done = handle.take_completions();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].request.tag, 7);
        assert!(handle.take_completions().is_empty());
    }

    #[test]
    fn test_source_lifecycle() {
        let mut source = MemorySource::new();
        let major = source.register_major(0, "vbdev").unwrap();
        assert_eq!(major, DYNAMIC_MAJOR_BASE);
        assert!(source.register_major(0, "vbdev").is_err());

        let id = UnitIdentity::new("vbdev", 0, major);
        let queue = source.attach_queue(&id).unwrap();
        let disk = DiskInfo { identity: id.clone(), capacity_sectors: 8, sector_size: 512 };
        source.publish(&disk).unwrap();
        assert!(source.is_published("vbdeva"));
        assert_eq!(source.disk("vbdeva").unwrap().capacity_sectors, 8);

        let host_side = source.queue("vbdeva").unwrap();
        host_side.submit(Request::read(1, 0, 1, 512)).unwrap();

        source.unpublish(&id);
        assert!(!source.is_published("vbdeva"));
        assert_eq!(
            host_side.submit(Request::read(2, 0, 1, 512)).unwrap_err().kind(),
            ErrorKind::NoDevice
        );

        source.release_queue(&id, queue);
        assert_eq!(source.attached_count(), 0);
        source.unregister_major(major, "vbdev");
        assert_eq!(source.registered_major(), None);
    }

    #[test]
    fn test_failure_injection() {
        let mut source = MemorySource::new()
            .with_attach_failure(1)
            .with_publish_failure(2);
        let a = UnitIdentity::new("vbdev", 1, 254);
        assert!(source.attach_queue(&a).is_err());

        let c = UnitIdentity::new("vbdev", 2, 254);
        let disk = DiskInfo { identity: c, capacity_sectors: 8, sector_size: 512 };
        assert!(source.publish(&disk).is_err());

        let mut refused = MemorySource::new().with_register_failure();
        assert!(refused.register_major(240, "vbdev").is_err());
    }
}
