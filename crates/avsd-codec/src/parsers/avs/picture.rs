//! AVS 图像头解析.
//!
//! - I 图像头: 起始码 `00 00 01 B3`
//! - P/B 图像头: 起始码 `00 00 01 B6`
//!
//! 两种图像头共享 [`PictureHeader`] 结构, 不存在的字段取语法默认值.

use std::fmt;

use avsd_core::bitreader::BitReader;
use avsd_core::{AvsdError, AvsdResult};

use super::sequence::SequenceHeader;

/// 去块滤波偏移的合法范围
const LOOP_FILTER_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -8..=8;

/// 图像编码类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureCodingType {
    /// 帧内图像
    I,
    /// 前向预测图像
    P,
    /// 双向预测图像
    B,
}

impl PictureCodingType {
    /// 是否作为后续图像的参考
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::B)
    }
}

impl fmt::Display for PictureCodingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::I => "I",
            Self::P => "P",
            Self::B => "B",
        };
        f.write_str(s)
    }
}

/// 图像结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictureStructure {
    /// 场对 (两场依次编码, picture_structure=0)
    FieldPair,
    /// 帧 (picture_structure=1)
    Frame,
}

/// 时间码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCode {
    /// 丢帧标志
    pub drop_frame: bool,
    /// 时 (0-23)
    pub hours: u8,
    /// 分 (0-59)
    pub minutes: u8,
    /// 秒 (0-59)
    pub seconds: u8,
    /// 帧号
    pub pictures: u8,
}

/// 去块滤波参数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopFilterParams {
    /// loop_filter_disable
    pub disable: bool,
    /// loop_filter_parameter_flag
    pub parameter_flag: bool,
    /// alpha_c_offset (-8..=8)
    pub alpha_c_offset: i32,
    /// beta_offset (-8..=8)
    pub beta_offset: i32,
}

/// 图像头解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureHeader {
    /// 编码类型
    pub coding_type: PictureCodingType,
    /// bbv_delay
    pub bbv_delay: u16,
    /// 时间码 (仅 I 图像, 可选)
    pub time_code: Option<TimeCode>,
    /// picture_distance (模 256 的显示顺序)
    pub picture_distance: u8,
    /// bbv_check_times (仅 low_delay 序列)
    pub bbv_check_times: Option<u32>,
    /// 是否逐行帧
    pub progressive_frame: bool,
    /// 图像结构
    pub picture_structure: PictureStructure,
    /// advanced_pred_mode_disable (仅 P/B 场对)
    pub advanced_pred_mode_disable: bool,
    /// 顶场优先
    pub top_field_first: bool,
    /// 重复首场
    pub repeat_first_field: bool,
    /// 图像级固定 QP
    pub fixed_picture_qp: bool,
    /// picture_qp (0-63)
    pub picture_qp: u8,
    /// picture_reference_flag (P/B), 为 0 时 P 图像使用两个参考
    pub picture_reference_flag: bool,
    /// skip_mode_flag
    pub skip_mode_flag: bool,
    /// 去块滤波参数
    pub loop_filter: LoopFilterParams,
}

impl PictureHeader {
    /// 是否为场对编码
    pub fn is_field_pair(&self) -> bool {
        self.picture_structure == PictureStructure::FieldPair
    }

    /// P/B 图像头中 picture_reference_flag 是否出现
    pub fn has_reference_flag(&self) -> bool {
        !(self.coding_type == PictureCodingType::B
            && self.picture_structure == PictureStructure::Frame)
    }
}

/// 解析 I 图像头
///
/// `payload` 为起始码 `00 00 01 B3` 之后的数据.
pub fn parse_i_picture_header(
    payload: &[u8],
    seq: &SequenceHeader,
) -> AvsdResult<PictureHeader> {
    let mut br = BitReader::new(payload);

    let bbv_delay = br.read_bits(16)? as u16;
    let time_code = if br.read_flag()? {
        Some(parse_time_code(&mut br)?)
    } else {
        None
    };
    br.read_marker("marker_bit (time_code 之后)")?;
    let picture_distance = br.read_bits(8)? as u8;
    let bbv_check_times = read_bbv_check_times(&mut br, seq)?;

    let progressive_frame = br.read_flag()?;
    check_progressive(seq, progressive_frame)?;
    let picture_structure = if progressive_frame {
        PictureStructure::Frame
    } else {
        read_picture_structure(&mut br)?
    };

    let top_field_first = br.read_flag()?;
    let repeat_first_field = br.read_flag()?;
    let fixed_picture_qp = br.read_flag()?;
    let picture_qp = br.read_bits(6)? as u8;

    let skip_mode_flag = if !progressive_frame && picture_structure == PictureStructure::FieldPair
    {
        br.read_flag()?
    } else {
        false
    };
    br.skip_bits(4)?;
    let loop_filter = parse_loop_filter(&mut br)?;

    Ok(PictureHeader {
        coding_type: PictureCodingType::I,
        bbv_delay,
        time_code,
        picture_distance,
        bbv_check_times,
        progressive_frame,
        picture_structure,
        advanced_pred_mode_disable: false,
        top_field_first,
        repeat_first_field,
        fixed_picture_qp,
        picture_qp,
        picture_reference_flag: false,
        skip_mode_flag,
        loop_filter,
    })
}

/// 解析 P/B 图像头
///
/// `payload` 为起始码 `00 00 01 B6` 之后的数据.
pub fn parse_pb_picture_header(
    payload: &[u8],
    seq: &SequenceHeader,
) -> AvsdResult<PictureHeader> {
    let mut br = BitReader::new(payload);

    let bbv_delay = br.read_bits(16)? as u16;
    let coding_type = match br.read_bits(2)? {
        1 => PictureCodingType::P,
        2 => PictureCodingType::B,
        other => {
            return Err(AvsdError::SyntaxViolation(format!(
                "picture_coding_type={} 非法",
                other
            )));
        }
    };
    let picture_distance = br.read_bits(8)? as u8;
    let bbv_check_times = read_bbv_check_times(&mut br, seq)?;

    let progressive_frame = br.read_flag()?;
    check_progressive(seq, progressive_frame)?;
    let mut advanced_pred_mode_disable = false;
    let picture_structure = if progressive_frame {
        PictureStructure::Frame
    } else {
        let structure = read_picture_structure(&mut br)?;
        if structure == PictureStructure::FieldPair {
            advanced_pred_mode_disable = br.read_flag()?;
        }
        structure
    };

    let top_field_first = br.read_flag()?;
    let repeat_first_field = br.read_flag()?;
    let fixed_picture_qp = br.read_flag()?;
    let picture_qp = br.read_bits(6)? as u8;

    let picture_reference_flag =
        if !(coding_type == PictureCodingType::B && picture_structure == PictureStructure::Frame) {
            br.read_flag()?
        } else {
            false
        };
    br.skip_bits(4)?;
    let skip_mode_flag = br.read_flag()?;
    let loop_filter = parse_loop_filter(&mut br)?;

    Ok(PictureHeader {
        coding_type,
        bbv_delay,
        time_code: None,
        picture_distance,
        bbv_check_times,
        progressive_frame,
        picture_structure,
        advanced_pred_mode_disable,
        top_field_first,
        repeat_first_field,
        fixed_picture_qp,
        picture_qp,
        picture_reference_flag,
        skip_mode_flag,
        loop_filter,
    })
}

fn parse_time_code(br: &mut BitReader) -> AvsdResult<TimeCode> {
    let drop_frame = br.read_flag()?;
    let hours = br.read_bits(5)? as u8;
    let minutes = br.read_bits(6)? as u8;
    br.read_marker("marker_bit (time_code)")?;
    let seconds = br.read_bits(6)? as u8;
    let pictures = br.read_bits(6)? as u8;
    if hours > 23 || minutes > 59 || seconds > 59 {
        return Err(AvsdError::SyntaxViolation(format!(
            "time_code 越界: {:02}:{:02}:{:02}",
            hours, minutes, seconds
        )));
    }
    Ok(TimeCode {
        drop_frame,
        hours,
        minutes,
        seconds,
        pictures,
    })
}

fn read_bbv_check_times(br: &mut BitReader, seq: &SequenceHeader) -> AvsdResult<Option<u32>> {
    if seq.low_delay {
        Ok(Some(br.read_ue()?))
    } else {
        Ok(None)
    }
}

fn read_picture_structure(br: &mut BitReader) -> AvsdResult<PictureStructure> {
    Ok(if br.read_flag()? {
        PictureStructure::Frame
    } else {
        PictureStructure::FieldPair
    })
}

fn check_progressive(seq: &SequenceHeader, progressive_frame: bool) -> AvsdResult<()> {
    if seq.progressive_sequence && !progressive_frame {
        return Err(AvsdError::SyntaxViolation(
            "逐行序列中出现 progressive_frame=0".into(),
        ));
    }
    Ok(())
}

fn parse_loop_filter(br: &mut BitReader) -> AvsdResult<LoopFilterParams> {
    let mut lf = LoopFilterParams {
        disable: br.read_flag()?,
        ..LoopFilterParams::default()
    };
    if lf.disable {
        return Ok(lf);
    }
    lf.parameter_flag = br.read_flag()?;
    if lf.parameter_flag {
        lf.alpha_c_offset = br.read_se()?;
        lf.beta_offset = br.read_se()?;
        if !LOOP_FILTER_OFFSET_RANGE.contains(&lf.alpha_c_offset)
            || !LOOP_FILTER_OFFSET_RANGE.contains(&lf.beta_offset)
        {
            return Err(AvsdError::SyntaxViolation(format!(
                "去块滤波偏移越界: alpha_c={}, beta={}",
                lf.alpha_c_offset, lf.beta_offset
            )));
        }
    }
    Ok(lf)
}
