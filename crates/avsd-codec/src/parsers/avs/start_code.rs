//! AVS 起始码扫描与类型识别.
//!
//! 起始码格式: `00 00 01 xx`, 其中 xx 标识后续语法结构.
//! 起始码之后到下一个起始码之前的字节构成一个语法单元.

use std::fmt;

/// 条带起始码的最大值 (0x00-0xAF 为条带)
pub const SLICE_START_CODE_MAX: u8 = 0xAF;
/// 序列头起始码
pub const SEQUENCE_HEADER_CODE: u8 = 0xB0;
/// 序列结束码
pub const SEQUENCE_END_CODE: u8 = 0xB1;
/// 用户数据起始码
pub const USER_DATA_CODE: u8 = 0xB2;
/// I 图像起始码
pub const I_PICTURE_CODE: u8 = 0xB3;
/// 扩展数据起始码
pub const EXTENSION_CODE: u8 = 0xB5;
/// P/B 图像起始码
pub const PB_PICTURE_CODE: u8 = 0xB6;
/// 视频编辑码
pub const VIDEO_EDIT_CODE: u8 = 0xB7;

/// 起始码前缀长度 (00 00 01)
pub const START_CODE_PREFIX_LEN: usize = 3;
/// 完整起始码长度 (00 00 01 xx)
pub const START_CODE_LEN: usize = 4;

/// AVS 起始码类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvsStartCodeType {
    /// 条带 (0x00-0xAF), 值为 slice_vertical_position
    Slice(u8),
    /// 序列头 (0xB0)
    SequenceHeader,
    /// 序列结束 (0xB1)
    SequenceEnd,
    /// 用户数据 (0xB2)
    UserData,
    /// I 图像头 (0xB3)
    IPicture,
    /// 扩展数据 (0xB5)
    Extension,
    /// P/B 图像头 (0xB6)
    PbPicture,
    /// 视频编辑 (0xB7)
    VideoEdit,
    /// 保留 (0xB4, 0xB8-0xFF)
    Reserved(u8),
}

impl AvsStartCodeType {
    /// 从起始码字节识别类型
    pub fn from_byte(code: u8) -> Self {
        match code {
            0x00..=SLICE_START_CODE_MAX => Self::Slice(code),
            SEQUENCE_HEADER_CODE => Self::SequenceHeader,
            SEQUENCE_END_CODE => Self::SequenceEnd,
            USER_DATA_CODE => Self::UserData,
            I_PICTURE_CODE => Self::IPicture,
            EXTENSION_CODE => Self::Extension,
            PB_PICTURE_CODE => Self::PbPicture,
            VIDEO_EDIT_CODE => Self::VideoEdit,
            other => Self::Reserved(other),
        }
    }

    /// 还原起始码字节
    pub fn code(&self) -> u8 {
        match *self {
            Self::Slice(pos) => pos,
            Self::SequenceHeader => SEQUENCE_HEADER_CODE,
            Self::SequenceEnd => SEQUENCE_END_CODE,
            Self::UserData => USER_DATA_CODE,
            Self::IPicture => I_PICTURE_CODE,
            Self::Extension => EXTENSION_CODE,
            Self::PbPicture => PB_PICTURE_CODE,
            Self::VideoEdit => VIDEO_EDIT_CODE,
            Self::Reserved(code) => code,
        }
    }

    /// 是否为图像头 (I 或 P/B)
    pub fn is_picture_start(&self) -> bool {
        matches!(self, Self::IPicture | Self::PbPicture)
    }

    /// 是否会结束当前图像 (新图像、新序列或序列结束)
    pub fn ends_picture(&self) -> bool {
        matches!(
            self,
            Self::IPicture | Self::PbPicture | Self::SequenceHeader | Self::SequenceEnd
        )
    }
}

impl fmt::Display for AvsStartCodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice(pos) => write!(f, "Slice({})", pos),
            Self::SequenceHeader => write!(f, "SequenceHeader"),
            Self::SequenceEnd => write!(f, "SequenceEnd"),
            Self::UserData => write!(f, "UserData"),
            Self::IPicture => write!(f, "IPicture"),
            Self::Extension => write!(f, "Extension"),
            Self::PbPicture => write!(f, "PbPicture"),
            Self::VideoEdit => write!(f, "VideoEdit"),
            Self::Reserved(code) => write!(f, "Reserved(0x{:02X})", code),
        }
    }
}

/// 起始码条目: 位置和类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartCodeEntry {
    /// 起始码 `00 00 01 xx` 的开始偏移
    pub offset: usize,
    /// 起始码之后的数据偏移 (offset + 4)
    pub data_offset: usize,
    /// 起始码类型
    pub code_type: AvsStartCodeType,
}

/// 从 `from` 开始查找下一个完整起始码, 返回其开始偏移
///
/// 只有 `00 00 01 xx` 四个字节都在 `data` 内时才算找到.
pub fn find_start_code(data: &[u8], from: usize) -> Option<usize> {
    if data.len() < START_CODE_LEN {
        return None;
    }
    let mut i = from;
    while i + START_CODE_PREFIX_LEN < data.len() {
        if data[i + 2] > 1 {
            // 第三个字节大于 1, 前缀不可能从 i..=i+2 开始
            i += 3;
        } else if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            return Some(i);
        } else {
            i += 1;
        }
    }
    None
}

/// 扫描数据中所有 AVS 起始码
///
/// 返回按偏移排序的起始码列表.
pub fn scan_start_codes(data: &[u8]) -> Vec<StartCodeEntry> {
    let mut entries = Vec::new();
    let mut pos = 0;
    while let Some(offset) = find_start_code(data, pos) {
        entries.push(StartCodeEntry {
            offset,
            data_offset: offset + START_CODE_LEN,
            code_type: AvsStartCodeType::from_byte(data[offset + START_CODE_PREFIX_LEN]),
        });
        pos = offset + START_CODE_LEN;
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_byte_ranges() {
        assert_eq!(AvsStartCodeType::from_byte(0x00), AvsStartCodeType::Slice(0));
        assert_eq!(AvsStartCodeType::from_byte(0xAF), AvsStartCodeType::Slice(0xAF));
        assert_eq!(
            AvsStartCodeType::from_byte(0xB0),
            AvsStartCodeType::SequenceHeader
        );
        assert_eq!(AvsStartCodeType::from_byte(0xB3), AvsStartCodeType::IPicture);
        assert_eq!(AvsStartCodeType::from_byte(0xB6), AvsStartCodeType::PbPicture);
        assert_eq!(
            AvsStartCodeType::from_byte(0xB4),
            AvsStartCodeType::Reserved(0xB4)
        );
        assert_eq!(
            AvsStartCodeType::from_byte(0xE0),
            AvsStartCodeType::Reserved(0xE0)
        );
        for code in [0x00u8, 0x42, 0xB1, 0xB5, 0xB7, 0xFF] {
            assert_eq!(AvsStartCodeType::from_byte(code).code(), code);
        }
    }

    #[test]
    fn test_ends_picture() {
        assert!(AvsStartCodeType::IPicture.ends_picture());
        assert!(AvsStartCodeType::SequenceEnd.ends_picture());
        assert!(!AvsStartCodeType::Slice(3).ends_picture());
        assert!(!AvsStartCodeType::UserData.ends_picture());
        assert!(AvsStartCodeType::PbPicture.is_picture_start());
        assert!(!AvsStartCodeType::SequenceHeader.is_picture_start());
    }

    #[test]
    fn test_scan_start_codes() {
        let data = [
            0xFF, 0x00, 0x00, 0x01, 0xB0, 0x20, 0x00, 0x00, 0x00, 0x01, 0xB3, 0x11, 0x00, 0x00,
            0x01, 0x00, 0x80,
        ];
        let entries = scan_start_codes(&data);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].offset, 1);
        assert_eq!(entries[0].code_type, AvsStartCodeType::SequenceHeader);
        assert_eq!(entries[1].offset, 7);
        assert_eq!(entries[1].data_offset, 11);
        assert_eq!(entries[1].code_type, AvsStartCodeType::IPicture);
        assert_eq!(entries[2].code_type, AvsStartCodeType::Slice(0));
    }

    #[test]
    fn test_find_start_code_requires_code_byte() {
        // 前缀在末尾但缺少类型字节, 不算完整起始码
        assert_eq!(find_start_code(&[0x12, 0x00, 0x00, 0x01], 0), None);
        assert_eq!(find_start_code(&[0x12, 0x00, 0x00, 0x01, 0xB6], 0), Some(1));
        assert_eq!(find_start_code(&[0x00, 0x00, 0x01, 0xB6], 1), None);
        assert_eq!(find_start_code(&[], 0), None);
    }

    #[test]
    fn test_find_start_code_skip_does_not_miss() {
        let data = [0x05, 0x00, 0x00, 0x00, 0x01, 0xB2];
        assert_eq!(find_start_code(&data, 0), Some(2));
    }
}
