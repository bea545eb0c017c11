//! AVS 条带头解析.
//!
//! 条带起始码 `00 00 01 xx` (xx = 0x00-0xAF) 的 xx 即 slice_vertical_position.
//! 条带头之后紧接宏块数据, [`SliceHeader::header_bits`] 记录宏块数据起始位.

use avsd_core::bitreader::BitReader;
use avsd_core::{AvsdError, AvsdResult};

use super::picture::{PictureCodingType, PictureHeader, PictureStructure};
use super::sequence::SequenceHeader;

/// 单个参考的加权预测参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightEntry {
    /// 亮度缩放
    pub luma_scale: u8,
    /// 亮度偏移
    pub luma_shift: i8,
    /// 色度缩放
    pub chroma_scale: u8,
    /// 色度偏移
    pub chroma_shift: i8,
}

/// 条带头解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceHeader {
    /// 条带首宏块行 (已合并扩展位)
    pub vertical_position: u32,
    /// 条带级固定 QP
    pub fixed_slice_qp: bool,
    /// 条带 QP (图像级固定 QP 时等于 picture_qp)
    pub slice_qp: u8,
    /// slice_weighting_flag
    pub weighting: bool,
    /// 加权预测参数 (帧 2 项, 场 4 项)
    pub weights: Vec<WeightEntry>,
    /// mb_weighting_flag
    pub mb_weighting: bool,
    /// 条带头位长 (起始码之后到首个宏块)
    pub header_bits: usize,
}

/// 条带是否使用帧间预测
///
/// P/B 图像的所有条带均为帧间条带; I 场对的第二场以第一场为参考, 同样按帧间条带解析.
pub fn is_inter_slice(seq: &SequenceHeader, pic: &PictureHeader, vertical_position: u32) -> bool {
    match pic.coding_type {
        PictureCodingType::P | PictureCodingType::B => true,
        PictureCodingType::I => {
            pic.picture_structure == PictureStructure::FieldPair
                && vertical_position >= seq.mb_height() / 2
        }
    }
}

/// 加权预测表项数 (帧 2 项, 场 4 项)
pub fn weight_entry_count(pic: &PictureHeader) -> usize {
    match pic.picture_structure {
        PictureStructure::Frame => 2,
        PictureStructure::FieldPair => 4,
    }
}

/// 解析条带头
///
/// - `start_code`: 起始码字节 (slice_vertical_position)
/// - `payload`: 起始码之后的数据
pub fn parse_slice_header(
    start_code: u8,
    payload: &[u8],
    seq: &SequenceHeader,
    pic: &PictureHeader,
) -> AvsdResult<SliceHeader> {
    let mut br = BitReader::new(payload);

    let mut vertical_position = u32::from(start_code);
    if seq.has_slice_position_extension() {
        let ext = br.read_bits(3)?;
        vertical_position |= ext << 7;
    }
    if vertical_position >= seq.mb_height() {
        return Err(AvsdError::SyntaxViolation(format!(
            "slice_vertical_position={} 超出宏块行数 {}",
            vertical_position,
            seq.mb_height()
        )));
    }

    let (fixed_slice_qp, slice_qp) = if pic.fixed_picture_qp {
        (true, pic.picture_qp)
    } else {
        (br.read_flag()?, br.read_bits(6)? as u8)
    };

    let mut weighting = false;
    let mut weights = Vec::new();
    let mut mb_weighting = false;
    if is_inter_slice(seq, pic, vertical_position) {
        weighting = br.read_flag()?;
        if weighting {
            for _ in 0..weight_entry_count(pic) {
                let luma_scale = br.read_bits(8)? as u8;
                let luma_shift = br.read_bits_signed(8)? as i8;
                br.read_marker("marker_bit (luma_shift 之后)")?;
                let chroma_scale = br.read_bits(8)? as u8;
                let chroma_shift = br.read_bits_signed(8)? as i8;
                br.read_marker("marker_bit (chroma_shift 之后)")?;
                weights.push(WeightEntry {
                    luma_scale,
                    luma_shift,
                    chroma_scale,
                    chroma_shift,
                });
            }
            mb_weighting = br.read_flag()?;
        }
    }

    Ok(SliceHeader {
        vertical_position,
        fixed_slice_qp,
        slice_qp,
        weighting,
        weights,
        mb_weighting,
        header_bits: br.bits_read(),
    })
}
