//! AVS 序列头与序列显示扩展解析.
//!
//! 序列头 (`00 00 01 B0`) 携带整个序列不变的参数:
//! - 档次/级别 (仅支持基准档次 Jizhun)
//! - 图像尺寸 (14 位), 逐行/隔行
//! - 色度格式, 样本精度, 宽高比, 帧率, 码率
//! - low_delay 与 BBV 缓冲区大小

use avsd_core::bitreader::BitReader;
use avsd_core::{AvsdError, AvsdResult, Rational};

/// 基准档次 (Jizhun)
pub const PROFILE_JIZHUN: u8 = 0x20;
/// 伸展档次 (Shenzhan)
pub const PROFILE_SHENZHAN: u8 = 0x24;
/// 移动档次 (Yidong)
pub const PROFILE_YIDONG: u8 = 0x32;
/// 广电档次 (Guangdian, AVS+)
pub const PROFILE_GUANGDIAN: u8 = 0x48;

/// 合法的 level_id
pub const LEVELS: [u8; 5] = [0x10, 0x20, 0x22, 0x40, 0x42];

/// 色度格式 4:2:0
pub const CHROMA_FORMAT_420: u8 = 1;
/// 色度格式 4:2:2
pub const CHROMA_FORMAT_422: u8 = 2;

/// 扩展类型: 序列显示扩展
pub const EXTENSION_SEQUENCE_DISPLAY: u8 = 2;

/// frame_rate_code 1..=8 对应的帧率
const FRAME_RATES: [(i32, i32); 8] = [
    (24000, 1001),
    (24, 1),
    (25, 1),
    (30000, 1001),
    (30, 1),
    (50, 1),
    (60000, 1001),
    (60, 1),
];

/// 序列头解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceHeader {
    /// profile_id
    pub profile_id: u8,
    /// level_id
    pub level_id: u8,
    /// 是否逐行序列
    pub progressive_sequence: bool,
    /// 水平尺寸 (像素)
    pub horizontal_size: u32,
    /// 垂直尺寸 (像素)
    pub vertical_size: u32,
    /// 色度格式 (1=4:2:0)
    pub chroma_format: u8,
    /// 样本精度 (1=8 位)
    pub sample_precision: u8,
    /// 宽高比索引 (1..=4)
    pub aspect_ratio: u8,
    /// 帧率索引 (1..=8)
    pub frame_rate_code: u8,
    /// 码率, 以 400 bit/s 为单位 (30 位)
    pub bit_rate: u32,
    /// 低延迟模式 (无 B 帧重排, 图像头携带 bbv_check_times)
    pub low_delay: bool,
    /// BBV 缓冲区大小 (18 位)
    pub bbv_buffer_size: u32,
}

impl SequenceHeader {
    /// 宏块列数
    pub fn mb_width(&self) -> u32 {
        self.horizontal_size.div_ceil(16)
    }

    /// 宏块行数 (隔行序列按场对齐)
    pub fn mb_height(&self) -> u32 {
        if self.progressive_sequence {
            self.vertical_size.div_ceil(16)
        } else {
            2 * self.vertical_size.div_ceil(32)
        }
    }

    /// 帧率
    pub fn frame_rate(&self) -> Rational {
        match self.frame_rate_code {
            code @ 1..=8 => {
                let (num, den) = FRAME_RATES[usize::from(code - 1)];
                Rational::new(num, den)
            }
            _ => Rational::UNDEFINED,
        }
    }

    /// 码率 (bit/s)
    pub fn bit_rate_bps(&self) -> u64 {
        u64::from(self.bit_rate) * 400
    }

    /// 条带头是否携带 slice_vertical_position_extension
    pub fn has_slice_position_extension(&self) -> bool {
        self.vertical_size > 2800
    }

    /// 两个序列头是否需要重建参考状态 (档次或几何尺寸变化)
    pub fn requires_reset(&self, other: &SequenceHeader) -> bool {
        self.profile_id != other.profile_id
            || self.horizontal_size != other.horizontal_size
            || self.vertical_size != other.vertical_size
            || self.progressive_sequence != other.progressive_sequence
            || self.chroma_format != other.chroma_format
    }
}

/// 解析序列头
///
/// `payload` 为起始码 `00 00 01 B0` 之后的数据.
pub fn parse_sequence_header(payload: &[u8]) -> AvsdResult<SequenceHeader> {
    let mut br = BitReader::new(payload);

    let profile_id = br.read_bits(8)? as u8;
    match profile_id {
        PROFILE_JIZHUN => {}
        PROFILE_SHENZHAN | PROFILE_YIDONG | PROFILE_GUANGDIAN => {
            return Err(AvsdError::UnsupportedFeature(format!(
                "AVS profile_id=0x{:02X}",
                profile_id
            )));
        }
        other => {
            return Err(AvsdError::SyntaxViolation(format!(
                "未知 profile_id=0x{:02X}",
                other
            )));
        }
    }

    let level_id = br.read_bits(8)? as u8;
    if !LEVELS.contains(&level_id) {
        return Err(AvsdError::SyntaxViolation(format!(
            "未知 level_id=0x{:02X}",
            level_id
        )));
    }

    let progressive_sequence = br.read_flag()?;
    let horizontal_size = br.read_bits(14)?;
    let vertical_size = br.read_bits(14)?;
    if horizontal_size == 0 || vertical_size == 0 {
        return Err(AvsdError::SyntaxViolation(format!(
            "图像尺寸为零: {}x{}",
            horizontal_size, vertical_size
        )));
    }

    let chroma_format = br.read_bits(2)? as u8;
    match chroma_format {
        CHROMA_FORMAT_420 => {}
        CHROMA_FORMAT_422 => {
            return Err(AvsdError::UnsupportedFeature("色度格式 4:2:2".into()));
        }
        other => {
            return Err(AvsdError::SyntaxViolation(format!(
                "chroma_format={} 非法",
                other
            )));
        }
    }

    let sample_precision = br.read_bits(3)? as u8;
    if sample_precision != 1 {
        return Err(AvsdError::SyntaxViolation(format!(
            "sample_precision={} 非法",
            sample_precision
        )));
    }

    let aspect_ratio = br.read_bits(4)? as u8;
    if !(1..=4).contains(&aspect_ratio) {
        return Err(AvsdError::SyntaxViolation(format!(
            "aspect_ratio={} 非法",
            aspect_ratio
        )));
    }

    let frame_rate_code = br.read_bits(4)? as u8;
    if !(1..=8).contains(&frame_rate_code) {
        return Err(AvsdError::SyntaxViolation(format!(
            "frame_rate_code={} 非法",
            frame_rate_code
        )));
    }

    let bit_rate_lower = br.read_bits(18)?;
    br.read_marker("bit_rate_lower 之后")?;
    let bit_rate_upper = br.read_bits(12)?;
    let low_delay = br.read_flag()?;
    br.read_marker("low_delay 之后")?;
    let bbv_buffer_size = br.read_bits(18)?;
    br.skip_bits(3)?;

    Ok(SequenceHeader {
        profile_id,
        level_id,
        progressive_sequence,
        horizontal_size,
        vertical_size,
        chroma_format,
        sample_precision,
        aspect_ratio,
        frame_rate_code,
        bit_rate: (bit_rate_upper << 18) | bit_rate_lower,
        low_delay,
        bbv_buffer_size,
    })
}

/// 色彩描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourDescription {
    /// colour_primaries
    pub colour_primaries: u8,
    /// transfer_characteristics
    pub transfer_characteristics: u8,
    /// matrix_coefficients
    pub matrix_coefficients: u8,
}

/// 序列显示扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceDisplayExtension {
    /// video_format
    pub video_format: u8,
    /// sample_range (0=受限范围, 1=全范围)
    pub sample_range: bool,
    /// 色彩描述 (可选)
    pub colour: Option<ColourDescription>,
    /// 显示宽度
    pub display_horizontal_size: u32,
    /// 显示高度
    pub display_vertical_size: u32,
}

/// 解析扩展数据
///
/// `payload` 为起始码 `00 00 01 B5` 之后的数据. 仅解析序列显示扩展,
/// 其他 extension_id 返回 `Ok(None)`.
pub fn parse_sequence_display_extension(
    payload: &[u8],
) -> AvsdResult<Option<SequenceDisplayExtension>> {
    let mut br = BitReader::new(payload);
    let extension_id = br.read_bits(4)? as u8;
    if extension_id != EXTENSION_SEQUENCE_DISPLAY {
        return Ok(None);
    }

    let video_format = br.read_bits(3)? as u8;
    let sample_range = br.read_flag()?;
    let colour = if br.read_flag()? {
        Some(ColourDescription {
            colour_primaries: br.read_bits(8)? as u8,
            transfer_characteristics: br.read_bits(8)? as u8,
            matrix_coefficients: br.read_bits(8)? as u8,
        })
    } else {
        None
    };
    let display_horizontal_size = br.read_bits(14)?;
    br.read_marker("display_horizontal_size 之后")?;
    let display_vertical_size = br.read_bits(14)?;
    br.skip_bits(2)?;

    Ok(Some(SequenceDisplayExtension {
        video_format,
        sample_range,
        colour,
        display_horizontal_size,
        display_vertical_size,
    }))
}
