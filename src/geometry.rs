//! 兼容几何参数
//!
//! 为只认识柱面/磁头/扇区寻址的旧工具，从单元容量推导一个合成的 CHS 布局。
//! 仅作参考：传输引擎的边界检查只看容量，不看这里的几何参数。

use crate::consts::{GEOMETRY_HEADS, GEOMETRY_RECORD_SIZE, GEOMETRY_SECTORS_PER_TRACK};
use crate::error::{Error, ErrorKind, Result};
use byteorder::{ByteOrder, LittleEndian};

/// 合成几何参数
///
/// 对应 `struct hd_geometry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 磁头数
    pub heads: u8,
    /// 每磁道扇区数
    pub sectors_per_track: u8,
    /// 柱面数
    pub cylinders: u64,
    /// 分区起始扇区（保留第一条磁道）
    pub start: u64,
}

impl Geometry {
    /// 从容量推导几何参数
    ///
    /// `sector_size` 为 0 时按 0 个扇区处理。
    pub fn advise(capacity_bytes: u64, sector_size: u32) -> Self {
        let total_sectors = capacity_bytes.checked_div(sector_size as u64).unwrap_or(0);
        let heads = GEOMETRY_HEADS;
        let sectors_per_track = GEOMETRY_SECTORS_PER_TRACK;

        Self {
            heads,
            sectors_per_track,
            cylinders: total_sectors / heads as u64 / sectors_per_track as u64,
            start: sectors_per_track as u64,
        }
    }

    /// CHS 布局覆盖的扇区数
    pub fn chs_sectors(&self) -> u64 {
        self.cylinders * self.heads as u64 * self.sectors_per_track as u64
    }

    /// 编码为 `hd_geometry` 记录
    ///
    /// 布局（小端）：
    ///
    /// ```text
    /// 0   heads      u8
    /// 1   sectors    u8
    /// 2   cylinders  u16 (超出时饱和为 0xFFFF)
    /// 4   padding    [u8; 4]
    /// 8   start      u64
    /// ```
    ///
    /// # 错误
    ///
    /// `buf` 短于 16 字节时返回 `Fault`
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < GEOMETRY_RECORD_SIZE {
            return Err(Error::new(ErrorKind::Fault, "geometry reply buffer too small"));
        }

        let cylinders = u16::try_from(self.cylinders).unwrap_or(u16::MAX);
        buf[0] = self.heads;
        buf[1] = self.sectors_per_track;
        LittleEndian::write_u16(&mut buf[2..4], cylinders);
        buf[4..8].fill(0);
        LittleEndian::write_u64(&mut buf[8..16], self.start);
        Ok(GEOMETRY_RECORD_SIZE)
    }

    /// 从 `hd_geometry` 记录解码
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < GEOMETRY_RECORD_SIZE {
            return Err(Error::new(ErrorKind::InvalidInput, "geometry record too short"));
        }
        Ok(Self {
            heads: buf[0],
            sectors_per_track: buf[1],
            cylinders: LittleEndian::read_u16(&buf[2..4]) as u64,
            start: LittleEndian::read_u64(&buf[8..16]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_disk_geometry() {
        let geo = Geometry::advise(100 * 1024 * 1024, 512);
        assert_eq!(geo.heads, 4);
        assert_eq!(geo.sectors_per_track, 16);
        assert_eq!(geo.cylinders, 3200);
        assert_eq!(geo.start, 16);
        assert_eq!(geo.chs_sectors(), 204800);
    }

    #[test]
    fn test_small_disk_truncates() {
        // 100 个扇区不足两个柱面
        let geo = Geometry::advise(100 * 512, 512);
        assert_eq!(geo.cylinders, 1);
        assert!(geo.chs_sectors() < 100);

        let empty = Geometry::advise(4096, 0);
        assert_eq!(empty.cylinders, 0);
    }

    #[test]
    fn test_encode_layout() {
        let geo = Geometry::advise(100 * 1024 * 1024, 512);
        let mut buf = [0xEEu8; 16];
        assert_eq!(geo.encode(&mut buf).unwrap(), 16);
        assert_eq!(buf[0], 4);
        assert_eq!(buf[1], 16);
        assert_eq!(&buf[2..4], &3200u16.to_le_bytes());
        assert_eq!(&buf[4..8], &[0, 0, 0, 0]);
        assert_eq!(&buf[8..16], &16u64.to_le_bytes());
        assert_eq!(Geometry::decode(&buf).unwrap(), geo);
    }

    #[test]
    fn test_encode_saturates_cylinders() {
        let geo = Geometry::advise(1 << 40, 512);
        let mut buf = [0u8; 16];
        geo.encode(&mut buf).unwrap();
        assert_eq!(Geometry::decode(&buf).unwrap().cylinders, u16::MAX as u64);
    }

    #[test]
    fn test_encode_short_buffer() {
        let geo = Geometry::advise(4096, 512);
        let mut buf = [0u8; 8];
        assert_eq!(geo.encode(&mut buf).unwrap_err().kind(), ErrorKind::Fault);
    }
}
