//! 控制通道
//!
//! 唯一识别的查询是 `GetGeometry`（`HDIO_GETGEO`），其余命令一律返回
//! `UnsupportedControlCommand`。

use crate::consts::HDIO_GETGEO;
use crate::error::{Error, ErrorKind, Result};
use crate::geometry::Geometry;
use crate::unit::Unit;

/// 控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// 查询合成几何参数
    GetGeometry,
    /// 未识别的命令（原始命令码）
    Unknown(u32),
}

impl ControlCommand {
    /// 由原始命令码解析
    pub const fn from_raw(cmd: u32) -> Self {
        match cmd {
            HDIO_GETGEO => ControlCommand::GetGeometry,
            other => ControlCommand::Unknown(other),
        }
    }

    /// 原始命令码
    pub const fn raw(self) -> u32 {
        match self {
            ControlCommand::GetGeometry => HDIO_GETGEO,
            ControlCommand::Unknown(cmd) => cmd,
        }
    }
}

/// 控制命令回复
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    /// 几何参数
    Geometry(Geometry),
}

/// 执行控制命令
pub fn control<Q>(unit: &Unit<Q>, cmd: ControlCommand) -> Result<ControlReply> {
    log::debug!("[CONTROL] {} cmd={:#X}", unit.name(), cmd.raw());
    match cmd {
        ControlCommand::GetGeometry => Ok(ControlReply::Geometry(unit.geometry())),
        ControlCommand::Unknown(raw) => {
            log::error!("[CONTROL] {} unknown command {:#X}", unit.name(), raw);
            Err(Error::new(
                ErrorKind::UnsupportedControlCommand,
                "unknown control command",
            ))
        }
    }
}

/// 以原始命令码执行控制命令，回复编码写入 `arg`
///
/// 返回写入的字节数。`arg` 放不下回复时返回 `Fault`。
pub fn ioctl<Q>(unit: &Unit<Q>, cmd: u32, arg: &mut [u8]) -> Result<usize> {
    match control(unit, ControlCommand::from_raw(cmd))? {
        ControlReply::Geometry(geo) => geo.encode(arg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::StorageBuffer;
    use crate::unit::UnitIdentity;

    fn unit(capacity: u64) -> Unit<()> {
        let storage = StorageBuffer::allocate(capacity).unwrap();
        Unit::new(UnitIdentity::new("vbdev", 0, 254), 512, storage, ())
    }

    #[test]
    fn test_command_codes() {
        assert_eq!(ControlCommand::from_raw(0x0301), ControlCommand::GetGeometry);
        assert_eq!(ControlCommand::from_raw(0x1260), ControlCommand::Unknown(0x1260));
        assert_eq!(ControlCommand::GetGeometry.raw(), HDIO_GETGEO);
    }

    #[test]
    fn test_get_geometry() {
        let u = unit(100 * 1024 * 1024);
        let ControlReply::Geometry(geo) = control(&u, ControlCommand::GetGeometry).unwrap();
        assert_eq!(geo.heads, 4);
        assert_eq!(geo.sectors_per_track, 16);
        assert_eq!(geo.cylinders, 3200);
        assert_eq!(geo.start, 16);
    }

    #[test]
    fn test_ioctl_encodes_reply() {
        let u = unit(1024 * 1024);
        let mut arg = [0u8; 16];
        assert_eq!(ioctl(&u, HDIO_GETGEO, &mut arg).unwrap(), 16);
        let geo = Geometry::decode(&arg).unwrap();
        assert_eq!(geo.cylinders, 2048 / 64);

        let mut short = [0u8; 4];
        assert_eq!(ioctl(&u, HDIO_GETGEO, &mut short).unwrap_err().kind(), ErrorKind::Fault);
    }

    #[test]
    fn test_unknown_command() {
        let u = unit(4096);
        let mut arg = [0xAAu8; 16];
        let err = ioctl(&u, 0x1260, &mut arg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedControlCommand);
        assert!(arg.iter().all(|&b| b == 0xAA));
    }
}
