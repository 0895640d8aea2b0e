//! 错误类型定义
//!
//! 提供块设备引擎各层（传输、分发、注册、控制通道）共用的错误类型。

use core::fmt;

/// 块设备引擎错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 请求的字节范围超出单元容量
    OutOfRange,
    /// 无法识别的请求类型
    UnsupportedRequest,
    /// 启动阶段创建单元失败
    Init,
    /// 控制通道命令未实现
    UnsupportedControlCommand,
    /// 无效参数
    InvalidInput,
    /// 无效状态
    InvalidState,
    /// 单元已被拆除
    NoDevice,
    /// 控制通道回复缓冲区不可写
    Fault,
}

impl ErrorKind {
    /// 对应的 errno（供宿主转换为平台错误码）
    pub const fn errno(self) -> i32 {
        match self {
            ErrorKind::OutOfRange | ErrorKind::UnsupportedRequest => 5, // EIO
            ErrorKind::Init => 12,                                      // ENOMEM
            ErrorKind::UnsupportedControlCommand => 25,                 // ENOTTY
            ErrorKind::InvalidInput => 22,                              // EINVAL
            ErrorKind::InvalidState => 16,                              // EBUSY
            ErrorKind::NoDevice => 19,                                  // ENODEV
            ErrorKind::Fault => 14,                                     // EFAULT
        }
    }
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
