//! 参考帧管理.
//!
//! 槽位表 [`SlotTable`] 保存固定数量的帧缓冲, 每个槽位有三个占用标志:
//! 参考、待输出、待硬件. 三者全部清除后槽位才可复用.
//!
//! [`RefPictureManager`] 在槽位表之上维护参考列表 (最多 [`MAX_REF_PICTURES`] 个),
//! 负责参考解析、隐藏替代与硬件完成状态.

use std::collections::VecDeque;

use avsd_core::{AvsdError, AvsdResult};
use log::debug;

use crate::parsers::avs::PictureCodingType;
use crate::task::{BufferHandle, TaskId};

/// AVS 参考帧数上限
pub const MAX_REF_PICTURES: usize = 2;

/// 参考帧管理器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpmState {
    /// 尚无有效序列头, 或刚 reset
    Empty,
    /// 正常解析
    Active,
    /// flush 之后, 拒绝新图像直到 reset
    Draining,
}

/// 帧缓冲槽位
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    /// 缓冲句柄
    pub handle: BufferHandle,
    /// 是否曾被分配
    pub used: bool,
    /// 当前占用该槽位的任务
    pub task: Option<TaskId>,
    /// 解码序号
    pub decode_order: u64,
    /// 图像顺序计数
    pub poc: i32,
    /// 编码类型
    pub coding_type: Option<PictureCodingType>,
    /// 是否在参考列表中
    pub is_reference: bool,
    /// 等待调用方释放输出
    pub pending_output: bool,
    /// 等待硬件完成
    pub pending_hw: bool,
    /// 硬件已成功解码
    pub decoded: bool,
    /// 硬件报错, 内容不可信
    pub corrupt: bool,
}

impl Slot {
    /// 是否可复用
    pub fn is_free(&self) -> bool {
        !self.is_reference && !self.pending_output && !self.pending_hw
    }

    fn recycle(&mut self) {
        *self = Slot {
            handle: self.handle,
            used: true,
            ..Slot::default()
        };
    }
}

/// 固定容量的槽位表
#[derive(Debug, Clone)]
pub struct SlotTable {
    slots: Vec<Slot>,
}

impl SlotTable {
    /// 创建槽位表, 句柄即槽位索引
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|i| Slot {
                handle: BufferHandle(i as u32),
                ..Slot::default()
            })
            .collect();
        Self { slots }
    }

    /// 槽位总数
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 获取槽位
    pub fn get(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx)
    }

    fn get_mut(&mut self, idx: usize) -> Option<&mut Slot> {
        self.slots.get_mut(idx)
    }

    /// 遍历所有槽位
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// 空闲槽位数
    pub fn free_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_free()).count()
    }

    /// 分配一个空闲槽位
    ///
    /// 优先从未使用过的槽位, 其次解码序号最早的槽位.
    pub fn allocate(&mut self) -> AvsdResult<usize> {
        let idx = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_free())
            .min_by_key(|(_, s)| (s.used, s.decode_order))
            .map(|(i, _)| i)
            .ok_or(AvsdError::BufferPoolExhausted)?;
        self.slots[idx].recycle();
        Ok(idx)
    }

    /// 按任务查找槽位
    pub fn find_by_task(&self, task: TaskId) -> Option<usize> {
        self.slots.iter().position(|s| s.task == Some(task))
    }

    /// 按句柄查找槽位
    pub fn find_by_handle(&self, handle: BufferHandle) -> Option<usize> {
        self.slots.iter().position(|s| s.handle == handle)
    }

    /// 标记为参考的槽位数
    pub fn reference_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_reference).count()
    }

    /// 释放所有槽位
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot {
                handle: slot.handle,
                ..Slot::default()
            };
        }
    }
}

/// 图像的参考需求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefRequirement {
    /// 必须的参考数
    pub needed: usize,
    /// 码流声明使用的参考数
    pub wanted: usize,
}

impl RefRequirement {
    /// 按编码类型计算参考需求
    ///
    /// P 图像 picture_reference_flag 为 0 时使用两个参考.
    pub fn for_picture(coding_type: PictureCodingType, picture_reference_flag: bool) -> Self {
        match coding_type {
            PictureCodingType::I => Self {
                needed: 0,
                wanted: 0,
            },
            PictureCodingType::P => Self {
                needed: 1,
                wanted: if picture_reference_flag { 1 } else { 2 },
            },
            PictureCodingType::B => Self {
                needed: 2,
                wanted: 2,
            },
        }
    }
}

/// 图像描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureDescriptor {
    /// 解码序号
    pub decode_order: u64,
    /// 图像顺序计数
    pub poc: i32,
    /// 编码类型
    pub coding_type: PictureCodingType,
    /// 是否作为后续图像的参考
    pub is_reference: bool,
    /// 参考需求
    pub requirement: RefRequirement,
    /// 输出槽位 (图像完成时分配)
    pub slot: Option<usize>,
    /// 已解析的参考槽位
    pub refs: Vec<usize>,
}

/// 隐藏替代的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcealedRefs {
    /// 替代后的参考槽位
    pub slots: Vec<usize>,
    /// 被替代的位置数
    pub substituted: usize,
}

/// 参考帧管理器
#[derive(Debug, Clone)]
pub struct RefPictureManager {
    state: RpmState,
    slots: SlotTable,
    /// 参考列表, 按解码顺序由旧到新
    refs: VecDeque<usize>,
    /// 上一幅图像的 (picture_distance, poc)
    last_distance: Option<(u8, i32)>,
}

impl RefPictureManager {
    /// 创建管理器
    pub fn new(slot_capacity: usize) -> Self {
        Self {
            state: RpmState::Empty,
            slots: SlotTable::new(slot_capacity),
            refs: VecDeque::with_capacity(MAX_REF_PICTURES + 1),
            last_distance: None,
        }
    }

    /// 当前状态
    pub fn state(&self) -> RpmState {
        self.state
    }

    /// 进入 Active (排空状态下不变)
    pub fn activate(&mut self) {
        if self.state == RpmState::Empty {
            self.state = RpmState::Active;
        }
    }

    /// 进入 Draining
    pub fn set_draining(&mut self) {
        self.state = RpmState::Draining;
    }

    /// 槽位表
    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// 槽位
    pub fn slot(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx)
    }

    /// 当前参考数
    pub fn reference_count(&self) -> usize {
        self.refs.len()
    }

    /// 参考槽位, 由旧到新
    pub fn references(&self) -> Vec<usize> {
        self.refs.iter().copied().collect()
    }

    /// 是否有等待硬件完成的任务
    pub fn has_pending_hw(&self) -> bool {
        self.slots.iter().any(|s| s.pending_hw)
    }

    /// 由 picture_distance (模 256) 推导单调的 POC
    pub fn next_poc(&mut self, picture_distance: u8) -> i32 {
        let poc = match self.last_distance {
            None => i32::from(picture_distance),
            Some((prev_distance, prev_poc)) => {
                prev_poc + i32::from(picture_distance.wrapping_sub(prev_distance) as i8)
            }
        };
        self.last_distance = Some((picture_distance, poc));
        poc
    }

    /// 分配输出槽位
    pub fn allocate(&mut self) -> AvsdResult<usize> {
        self.slots.allocate()
    }

    /// 归还尚未提交的槽位
    pub fn release_unsubmitted(&mut self, idx: usize) {
        if let Some(slot) = self.slots.get_mut(idx) {
            if !slot.pending_hw {
                slot.recycle();
            }
        }
    }

    /// 严格解析参考: 缺失或损坏即返回错误
    ///
    /// P 图像按 "最新, 次新" 绑定; B 图像按 "前向 (次新), 后向 (最新)" 绑定.
    pub fn resolve(&self, desc: &PictureDescriptor) -> AvsdResult<Vec<usize>> {
        let req = desc.requirement;
        if req.needed == 0 {
            return Ok(Vec::new());
        }
        if self.refs.len() < req.needed {
            return Err(AvsdError::MissingReference {
                needed: req.needed,
                available: self.refs.len(),
            });
        }
        let chosen: Vec<usize> = self
            .candidates(desc.coding_type, req)
            .into_iter()
            .flatten()
            .collect();
        for &idx in &chosen {
            if let Some(slot) = self.slots.get(idx) {
                if slot.corrupt {
                    return Err(AvsdError::CorruptReference(slot.decode_order));
                }
            }
        }
        Ok(chosen)
    }

    /// 隐藏替代: 缺失或损坏的位置用最近的有效参考填充
    ///
    /// 没有任何有效参考时返回 None.
    pub fn conceal(&self, desc: &PictureDescriptor) -> Option<ConcealedRefs> {
        let fallback = self
            .refs
            .iter()
            .rev()
            .copied()
            .find(|&idx| self.slots.get(idx).is_some_and(|s| !s.corrupt))?;
        let mut substituted = 0;
        let slots = self
            .candidates(desc.coding_type, desc.requirement)
            .into_iter()
            .map(|candidate| match candidate {
                Some(idx) if self.slots.get(idx).is_some_and(|s| !s.corrupt) => idx,
                _ => {
                    substituted += 1;
                    fallback
                }
            })
            .collect();
        Some(ConcealedRefs { slots, substituted })
    }

    /// 各参考位置对应的槽位 (缺失为 None)
    fn candidates(
        &self,
        coding_type: PictureCodingType,
        req: RefRequirement,
    ) -> Vec<Option<usize>> {
        let len = self.refs.len();
        let nth_latest = |k: usize| (k < len).then(|| self.refs[len - 1 - k]);
        match coding_type {
            PictureCodingType::I => Vec::new(),
            PictureCodingType::P => {
                let count = req.needed.max(req.wanted.min(len));
                (0..count).map(nth_latest).collect()
            }
            PictureCodingType::B => vec![nth_latest(1), nth_latest(0)],
        }
    }

    /// 任务已提交硬件: 标记待硬件与待输出
    pub fn mark_submitted(&mut self, idx: usize, task: TaskId, desc: &PictureDescriptor) {
        if let Some(slot) = self.slots.get_mut(idx) {
            slot.task = Some(task);
            slot.decode_order = desc.decode_order;
            slot.poc = desc.poc;
            slot.coding_type = Some(desc.coding_type);
            slot.pending_hw = true;
            slot.pending_output = true;
        }
    }

    /// 把槽位加入参考列表, 超出上限时移除最旧的参考
    pub fn commit_reference(&mut self, idx: usize) {
        if let Some(slot) = self.slots.get_mut(idx) {
            slot.is_reference = true;
        }
        self.refs.push_back(idx);
        while self.refs.len() > MAX_REF_PICTURES {
            if let Some(old) = self.refs.pop_front() {
                if let Some(slot) = self.slots.get_mut(old) {
                    slot.is_reference = false;
                    debug!("AVS: 参考帧出列, 解码序号={}", slot.decode_order);
                }
            }
        }
    }

    /// 处理硬件完成, 返回对应槽位
    ///
    /// 未知任务或重复通知返回 None.
    pub fn complete(&mut self, task: TaskId, ok: bool) -> Option<usize> {
        let idx = self.slots.find_by_task(task)?;
        let slot = self.slots.get_mut(idx)?;
        if !slot.pending_hw {
            return None;
        }
        slot.pending_hw = false;
        if ok {
            slot.decoded = true;
        } else {
            slot.corrupt = true;
        }
        Some(idx)
    }

    /// 调用方释放输出帧
    pub fn release_output(&mut self, handle: BufferHandle) -> AvsdResult<()> {
        let idx = self
            .slots
            .find_by_handle(handle)
            .ok_or_else(|| AvsdError::InvalidArgument(format!("未知缓冲句柄 {}", handle)))?;
        let slot = self
            .slots
            .get_mut(idx)
            .ok_or_else(|| AvsdError::InvalidArgument(format!("未知缓冲句柄 {}", handle)))?;
        if !slot.pending_output {
            return Err(AvsdError::InvalidArgument(format!(
                "{} 不在待输出状态",
                handle
            )));
        }
        slot.pending_output = false;
        Ok(())
    }

    /// 强制丢弃所有等待硬件的任务, 返回被丢弃的任务
    pub fn force_discard_pending(&mut self) -> Vec<TaskId> {
        let mut discarded = Vec::new();
        for idx in 0..self.slots.capacity() {
            let Some(slot) = self.slots.get_mut(idx) else {
                continue;
            };
            if !slot.pending_hw {
                continue;
            }
            slot.pending_hw = false;
            slot.pending_output = false;
            slot.is_reference = false;
            slot.corrupt = true;
            if let Some(task) = slot.task {
                discarded.push(task);
            }
        }
        let slots = &self.slots;
        self.refs
            .retain(|&idx| slots.get(idx).is_some_and(|s| s.is_reference));
        discarded.sort();
        discarded
    }

    /// 清空参考列表 (序列参数变化)
    pub fn drop_references(&mut self) {
        for idx in self.refs.drain(..) {
            if let Some(slot) = self.slots.get_mut(idx) {
                slot.is_reference = false;
            }
        }
        self.last_distance = None;
    }

    /// 回到 Empty, 释放所有槽位
    pub fn reset(&mut self) {
        self.slots.clear();
        self.refs.clear();
        self.last_distance = None;
        self.state = RpmState::Empty;
    }
}
