//! 硬件任务组装.
//!
//! 检查条带覆盖, 生成 [`AvsPictureParams`] 与 [`HwTask`], 并把输出槽位标记为
//! 待硬件/待输出.

use avsd_core::{AvsdError, AvsdResult, Rational, Timestamp};
use bytes::Bytes;

use crate::parsers::avs::{
    LoopFilterParams, PictureCodingType, PictureHeader, PictureStructure,
    SequenceDisplayExtension, SequenceHeader,
};
use crate::task::{
    Concealment, HwTask, PictureParams, RefBinding, RefRole, SliceSegment, TaskId,
};

use super::refs::{PictureDescriptor, RefPictureManager};

/// AVS 图像参数块
#[derive(Debug, Clone, PartialEq)]
pub struct AvsPictureParams {
    /// profile_id
    pub profile_id: u8,
    /// level_id
    pub level_id: u8,
    /// 图像宽度 (像素)
    pub width: u32,
    /// 图像高度 (像素)
    pub height: u32,
    /// 宏块列数
    pub mb_width: u32,
    /// 宏块行数
    pub mb_height: u32,
    /// 逐行序列
    pub progressive_sequence: bool,
    /// low_delay
    pub low_delay: bool,
    /// 帧率
    pub frame_rate: Rational,
    /// 编码类型
    pub coding_type: PictureCodingType,
    /// picture_distance
    pub picture_distance: u8,
    /// 图像顺序计数
    pub poc: i32,
    /// 逐行帧
    pub progressive_frame: bool,
    /// 图像结构
    pub picture_structure: PictureStructure,
    /// 顶场优先
    pub top_field_first: bool,
    /// 重复首场
    pub repeat_first_field: bool,
    /// 图像级固定 QP
    pub fixed_picture_qp: bool,
    /// picture_qp
    pub picture_qp: u8,
    /// picture_reference_flag
    pub picture_reference_flag: bool,
    /// skip_mode_flag
    pub skip_mode_flag: bool,
    /// advanced_pred_mode_disable
    pub advanced_pred_mode_disable: bool,
    /// 去块滤波参数
    pub loop_filter: LoopFilterParams,
    /// 显示尺寸 (来自序列显示扩展)
    pub display_size: Option<(u32, u32)>,
    /// 全范围样本
    pub full_range: bool,
}

impl AvsPictureParams {
    pub(super) fn new(
        seq: &SequenceHeader,
        display: Option<&SequenceDisplayExtension>,
        pic: &PictureHeader,
        poc: i32,
    ) -> Self {
        Self {
            profile_id: seq.profile_id,
            level_id: seq.level_id,
            width: seq.horizontal_size,
            height: seq.vertical_size,
            mb_width: seq.mb_width(),
            mb_height: seq.mb_height(),
            progressive_sequence: seq.progressive_sequence,
            low_delay: seq.low_delay,
            frame_rate: seq.frame_rate(),
            coding_type: pic.coding_type,
            picture_distance: pic.picture_distance,
            poc,
            progressive_frame: pic.progressive_frame,
            picture_structure: pic.picture_structure,
            top_field_first: pic.top_field_first,
            repeat_first_field: pic.repeat_first_field,
            fixed_picture_qp: pic.fixed_picture_qp,
            picture_qp: pic.picture_qp,
            picture_reference_flag: pic.picture_reference_flag,
            skip_mode_flag: pic.skip_mode_flag,
            advanced_pred_mode_disable: pic.advanced_pred_mode_disable,
            loop_filter: pic.loop_filter,
            display_size: display.map(|d| (d.display_horizontal_size, d.display_vertical_size)),
            full_range: display.is_some_and(|d| d.sample_range),
        }
    }
}

/// 检查条带是否完整覆盖图像
///
/// 至少一个条带, 没有损坏条带, 首条带从第 0 行开始, 行号严格递增且小于 `mb_height`.
pub fn check_slice_coverage(
    slices: &[SliceSegment],
    mb_height: u32,
    damaged_slices: usize,
) -> AvsdResult<()> {
    if damaged_slices > 0 {
        return Err(AvsdError::IncompleteSlices(format!(
            "{} 个条带头损坏",
            damaged_slices
        )));
    }
    let Some(first) = slices.first() else {
        return Err(AvsdError::IncompleteSlices("图像没有条带".into()));
    };
    if first.vertical_position != 0 {
        return Err(AvsdError::IncompleteSlices(format!(
            "首条带从第 {} 行开始",
            first.vertical_position
        )));
    }
    for pair in slices.windows(2) {
        if pair[1].vertical_position <= pair[0].vertical_position {
            return Err(AvsdError::IncompleteSlices(format!(
                "条带行号未递增: {} -> {}",
                pair[0].vertical_position, pair[1].vertical_position
            )));
        }
    }
    if let Some(last) = slices.last() {
        if last.vertical_position >= mb_height {
            return Err(AvsdError::IncompleteSlices(format!(
                "条带行号 {} 超出宏块行数 {}",
                last.vertical_position, mb_height
            )));
        }
    }
    Ok(())
}

/// 组装任务所需的输入
pub(super) struct TaskInput<'a> {
    pub id: TaskId,
    pub desc: &'a PictureDescriptor,
    pub seq: &'a SequenceHeader,
    pub display: Option<&'a SequenceDisplayExtension>,
    pub header: &'a PictureHeader,
    pub slices: &'a [SliceSegment],
    pub damaged_slices: usize,
    pub bitstream: Bytes,
    pub pts: Timestamp,
    pub dts: i64,
    pub slot: usize,
    pub concealment: Option<Concealment>,
}

/// 组装硬件任务并标记输出槽位
pub(super) fn build_task(input: TaskInput<'_>, rpm: &mut RefPictureManager) -> AvsdResult<HwTask> {
    check_slice_coverage(input.slices, input.seq.mb_height(), input.damaged_slices)?;

    let output = rpm
        .slot(input.slot)
        .map(|s| s.handle)
        .ok_or_else(|| AvsdError::InvalidState(format!("槽位 {} 不存在", input.slot)))?;

    let roles: &[RefRole] = match input.desc.coding_type {
        PictureCodingType::B => &[RefRole::Forward, RefRole::Backward],
        _ => &[RefRole::Forward, RefRole::Forward],
    };
    let mut refs = Vec::with_capacity(input.desc.refs.len());
    for (&idx, &role) in input.desc.refs.iter().zip(roles) {
        let slot = rpm
            .slot(idx)
            .ok_or_else(|| AvsdError::InvalidState(format!("参考槽位 {} 不存在", idx)))?;
        refs.push(RefBinding {
            handle: slot.handle,
            poc: slot.poc,
            decode_order: slot.decode_order,
            role,
        });
    }

    let params = AvsPictureParams::new(input.seq, input.display, input.header, input.desc.poc);
    rpm.mark_submitted(input.slot, input.id, input.desc);

    Ok(HwTask {
        id: input.id,
        pts: input.pts,
        dts: input.dts,
        bitstream: input.bitstream,
        slices: input.slices.to_vec(),
        output,
        refs,
        params: PictureParams::Avs(params),
        concealment: input.concealment,
    })
}
