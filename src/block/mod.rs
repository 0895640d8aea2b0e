//! 块存储核心
//!
//! block/storage.rs 提供每个单元独占的、零初始化的字节缓冲区
//! block/transfer.rs 提供按扇区寻址、带边界检查的拷贝操作（传输引擎）
//!
//! 两者都不持锁，调用方（单元、分发器）负责在持有单元锁时调用。

mod storage;
mod transfer;

pub use storage::StorageBuffer;
pub use transfer::{byte_span, read_sectors, transfer, write_sectors, Direction};
