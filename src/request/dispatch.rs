//! 请求分发器
//!
//! 宿主在有待处理请求时调用 [`drain`]。分发器在整个排空过程中持有单元锁，
//! 因此同一单元任意时刻最多只有一个分发器在运行，字节拷贝也不会交错。
//!
//! 状态机：
//!
//! ```text
//! Idle --drain()--> Draining --queue.fetch() == None--> Idle
//! ```

use super::{Request, RequestQueue};
use crate::block;
use crate::error::{Error, ErrorKind, Result};
use crate::unit::{Unit, UnitState};

/// 一次排空的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// 成功完成的请求数
    pub completed: usize,
    /// 传输失败的请求数
    pub failed: usize,
    /// 因类别不支持而拒绝的请求数
    pub unsupported: usize,
}

impl DrainStats {
    /// 本次处理的请求总数
    pub fn total(&self) -> usize {
        self.completed + self.failed + self.unsupported
    }
}

/// 排空单元的请求队列
///
/// 按宿主投递的顺序逐个处理，直到队列为空；不重试、不重排、不合并、不拆分。
/// 每个请求的结果只通过它自己的完成通道回报，不影响其他请求。
///
/// 单元已拆除（队列已解除关联）时什么也不做。
///
/// `RequestQueue::complete` 在持有单元锁时被调用，实现中不得再访问同一单元。
pub fn drain<Q: RequestQueue>(unit: &Unit<Q>) -> DrainStats {
    let mut stats = DrainStats::default();
    let sector_size = unit.sector_size();

    let mut guard = unit.lock();
    let UnitState { storage, queue, .. } = &mut *guard;
    let Some(queue) = queue.as_ref() else {
        log::debug!("[DISPATCH] {} has no attached queue", unit.name());
        return stats;
    };

    log::trace!("[DISPATCH] {} entering request routine", unit.name());

    while let Some(mut request) = queue.fetch() {
        if !request.is_filesystem_io() {
            log::error!(
                "[DISPATCH] {} skip non-fs request tag={} kind={:?}",
                unit.name(),
                request.tag,
                request.kind
            );
            stats.unsupported += 1;
            queue.complete(
                request,
                Err(Error::new(ErrorKind::UnsupportedRequest, "non-fs request")),
            );
            continue;
        }

        let result = service(storage.as_mut(), sector_size, &mut request);
        match result {
            Ok(()) => stats.completed += 1,
            Err(_) => stats.failed += 1,
        }
        queue.complete(request, result);
    }

    log::debug!(
        "[DISPATCH] {} drained: completed={} failed={} unsupported={}",
        unit.name(),
        stats.completed,
        stats.failed,
        stats.unsupported
    );
    stats
}

fn service(
    storage: Option<&mut block::StorageBuffer>,
    sector_size: u32,
    request: &mut Request,
) -> Result<()> {
    let storage =
        storage.ok_or(Error::new(ErrorKind::NoDevice, "unit has been torn down"))?;
    block::transfer(
        storage,
        sector_size,
        request.start_sector,
        request.sector_count,
        &mut request.data,
        request.direction,
    )
}
