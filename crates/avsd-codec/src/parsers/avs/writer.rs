//! AVS 头部写入.
//!
//! 与各解析函数逐字段对应, 用于构造测试码流和基准测试输入.
//! 只写入头部语法, 不产生宏块数据. 调用方负责写入起始码.

use avsd_core::bitwriter::BitWriter;

use super::picture::{PictureCodingType, PictureHeader, PictureStructure};
use super::sequence::{EXTENSION_SEQUENCE_DISPLAY, SequenceDisplayExtension, SequenceHeader};
use super::slice::{SliceHeader, is_inter_slice};

/// 写入序列头 (不含起始码)
pub fn write_sequence_header(bw: &mut BitWriter, seq: &SequenceHeader) {
    bw.write_bits(u32::from(seq.profile_id), 8);
    bw.write_bits(u32::from(seq.level_id), 8);
    bw.write_flag(seq.progressive_sequence);
    bw.write_bits(seq.horizontal_size, 14);
    bw.write_bits(seq.vertical_size, 14);
    bw.write_bits(u32::from(seq.chroma_format), 2);
    bw.write_bits(u32::from(seq.sample_precision), 3);
    bw.write_bits(u32::from(seq.aspect_ratio), 4);
    bw.write_bits(u32::from(seq.frame_rate_code), 4);
    bw.write_bits(seq.bit_rate & 0x3FFFF, 18);
    bw.write_bit(1);
    bw.write_bits(seq.bit_rate >> 18, 12);
    bw.write_flag(seq.low_delay);
    bw.write_bit(1);
    bw.write_bits(seq.bbv_buffer_size, 18);
    bw.write_bits(0, 3);
}

/// 写入序列显示扩展 (不含起始码)
pub fn write_sequence_display_extension(bw: &mut BitWriter, ext: &SequenceDisplayExtension) {
    bw.write_bits(u32::from(EXTENSION_SEQUENCE_DISPLAY), 4);
    bw.write_bits(u32::from(ext.video_format), 3);
    bw.write_flag(ext.sample_range);
    bw.write_flag(ext.colour.is_some());
    if let Some(colour) = ext.colour {
        bw.write_bits(u32::from(colour.colour_primaries), 8);
        bw.write_bits(u32::from(colour.transfer_characteristics), 8);
        bw.write_bits(u32::from(colour.matrix_coefficients), 8);
    }
    bw.write_bits(ext.display_horizontal_size, 14);
    bw.write_bit(1);
    bw.write_bits(ext.display_vertical_size, 14);
    bw.write_bits(0, 2);
}

/// 写入 I 图像头 (不含起始码)
pub fn write_i_picture_header(bw: &mut BitWriter, pic: &PictureHeader, seq: &SequenceHeader) {
    bw.write_bits(u32::from(pic.bbv_delay), 16);
    bw.write_flag(pic.time_code.is_some());
    if let Some(tc) = pic.time_code {
        bw.write_flag(tc.drop_frame);
        bw.write_bits(u32::from(tc.hours), 5);
        bw.write_bits(u32::from(tc.minutes), 6);
        bw.write_bit(1);
        bw.write_bits(u32::from(tc.seconds), 6);
        bw.write_bits(u32::from(tc.pictures), 6);
    }
    bw.write_bit(1);
    bw.write_bits(u32::from(pic.picture_distance), 8);
    if seq.low_delay {
        bw.write_ue(pic.bbv_check_times.unwrap_or(0));
    }
    bw.write_flag(pic.progressive_frame);
    if !pic.progressive_frame {
        bw.write_flag(pic.picture_structure == PictureStructure::Frame);
    }
    write_qp_fields(bw, pic);
    if !pic.progressive_frame && pic.picture_structure == PictureStructure::FieldPair {
        bw.write_flag(pic.skip_mode_flag);
    }
    bw.write_bits(0, 4);
    write_loop_filter(bw, pic);
}

/// 写入 P/B 图像头 (不含起始码)
pub fn write_pb_picture_header(bw: &mut BitWriter, pic: &PictureHeader, seq: &SequenceHeader) {
    bw.write_bits(u32::from(pic.bbv_delay), 16);
    let coding_type = match pic.coding_type {
        PictureCodingType::B => 2,
        _ => 1,
    };
    bw.write_bits(coding_type, 2);
    bw.write_bits(u32::from(pic.picture_distance), 8);
    if seq.low_delay {
        bw.write_ue(pic.bbv_check_times.unwrap_or(0));
    }
    bw.write_flag(pic.progressive_frame);
    if !pic.progressive_frame {
        bw.write_flag(pic.picture_structure == PictureStructure::Frame);
        if pic.picture_structure == PictureStructure::FieldPair {
            bw.write_flag(pic.advanced_pred_mode_disable);
        }
    }
    write_qp_fields(bw, pic);
    if pic.has_reference_flag() {
        bw.write_flag(pic.picture_reference_flag);
    }
    bw.write_bits(0, 4);
    bw.write_flag(pic.skip_mode_flag);
    write_loop_filter(bw, pic);
}

/// 写入条带头 (不含起始码), 返回应使用的起始码字节
pub fn write_slice_header(
    bw: &mut BitWriter,
    slice: &SliceHeader,
    seq: &SequenceHeader,
    pic: &PictureHeader,
) -> u8 {
    let code = if seq.has_slice_position_extension() {
        bw.write_bits(slice.vertical_position >> 7, 3);
        (slice.vertical_position & 0x7F) as u8
    } else {
        slice.vertical_position as u8
    };
    if !pic.fixed_picture_qp {
        bw.write_flag(slice.fixed_slice_qp);
        bw.write_bits(u32::from(slice.slice_qp), 6);
    }
    if is_inter_slice(seq, pic, slice.vertical_position) {
        bw.write_flag(slice.weighting);
        if slice.weighting {
            for w in &slice.weights {
                bw.write_bits(u32::from(w.luma_scale), 8);
                bw.write_bits_signed(i32::from(w.luma_shift), 8);
                bw.write_bit(1);
                bw.write_bits(u32::from(w.chroma_scale), 8);
                bw.write_bits_signed(i32::from(w.chroma_shift), 8);
                bw.write_bit(1);
            }
            bw.write_flag(slice.mb_weighting);
        }
    }
    code
}

fn write_qp_fields(bw: &mut BitWriter, pic: &PictureHeader) {
    bw.write_flag(pic.top_field_first);
    bw.write_flag(pic.repeat_first_field);
    bw.write_flag(pic.fixed_picture_qp);
    bw.write_bits(u32::from(pic.picture_qp), 6);
}

fn write_loop_filter(bw: &mut BitWriter, pic: &PictureHeader) {
    let lf = &pic.loop_filter;
    bw.write_flag(lf.disable);
    if lf.disable {
        return;
    }
    bw.write_flag(lf.parameter_flag);
    if lf.parameter_flag {
        bw.write_se(lf.alpha_c_offset);
        bw.write_se(lf.beta_offset);
    }
}
