//! AVS 流上下文.
//!
//! 保存单条码流的全部状态: 当前序列参数、参考帧管理器、码流缓冲、
//! 正在组装的图像、解码序号与会话纪元、统计信息和硬件完成收件箱.
//!
//! 图像在以下情况结束:
//! - 遇到新的图像起始码、序列头或序列结束码
//! - 非分割模式下数据包结束

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use avsd_core::{AvsdError, AvsdResult, ErrorCategory, Timestamp};
use bytes::Bytes;
use log::{debug, error, info, warn};

use crate::config::{ConcealmentMode, DebugFlags, ParserConfig};
use crate::control::{ControlCommand, ControlResponse, ParserStats};
use crate::packet::Packet;
use crate::parsers::avs::start_code::{START_CODE_LEN, START_CODE_PREFIX_LEN};
use crate::parsers::avs::{
    AvsStartCodeType, PictureHeader, SequenceDisplayExtension, SequenceHeader, find_start_code,
    parse_i_picture_header, parse_pb_picture_header, parse_sequence_display_extension,
    parse_sequence_header, parse_slice_header,
};
use crate::task::{
    CompletionNotifier, Concealment, DecodeTask, DroppedPicture, FlushReport, HwCompletion,
    HwStatus, ParseOutcome, SliceSegment, TaskId,
};

use super::refs::{
    MAX_REF_PICTURES, PictureDescriptor, RefPictureManager, RefRequirement, RpmState,
};
use super::stream::StreamBuffer;
use super::task_builder::{TaskInput, build_task, check_slice_coverage};

/// 正在组装的图像
#[derive(Debug)]
struct PendingPicture {
    desc: PictureDescriptor,
    header: PictureHeader,
    seq: SequenceHeader,
    slices: Vec<SliceSegment>,
    damaged_slices: usize,
    pts: Timestamp,
    dts: i64,
}

/// 码流已收齐, 等待槽位的图像
#[derive(Debug)]
struct CompletedPicture {
    picture: PendingPicture,
    bitstream: Bytes,
}

/// 单条码流的解析状态
pub(crate) struct StreamContext {
    config: ParserConfig,
    /// 当前生效的序列头
    seq: Option<SequenceHeader>,
    /// 最近一次序列头失败原因, 用于说明后续图像为何被丢弃
    seq_error: Option<AvsdError>,
    display: Option<SequenceDisplayExtension>,
    rpm: RefPictureManager,
    buffer: StreamBuffer,
    /// 当前图像内下一个待处理语法单元的偏移
    scan_pos: usize,
    current: Option<PendingPicture>,
    stalled: Option<CompletedPicture>,
    /// 非分割模式: 缓冲区末尾即数据包边界
    boundary: bool,
    decode_order: u64,
    epoch: u32,
    consecutive_hw_errors: u32,
    stats: ParserStats,
    inbox: Receiver<HwCompletion>,
    sender: Sender<HwCompletion>,
}

impl StreamContext {
    pub(crate) fn new(config: ParserConfig) -> Self {
        let (sender, inbox) = mpsc::channel();
        let rpm = RefPictureManager::new(config.slot_capacity);
        Self {
            config,
            seq: None,
            seq_error: None,
            display: None,
            rpm,
            buffer: StreamBuffer::new(),
            scan_pos: 0,
            current: None,
            stalled: None,
            boundary: false,
            decode_order: 0,
            epoch: 0,
            consecutive_hw_errors: 0,
            stats: ParserStats::default(),
            inbox,
            sender,
        }
    }

    pub(crate) fn notifier(&self) -> CompletionNotifier {
        CompletionNotifier::new(self.sender.clone())
    }

    pub(crate) fn sequence_header(&self) -> Option<&SequenceHeader> {
        self.seq.as_ref()
    }

    pub(crate) fn ref_manager(&self) -> &RefPictureManager {
        &self.rpm
    }

    pub(crate) fn epoch(&self) -> u32 {
        self.epoch
    }

    pub(crate) fn stats(&self) -> &ParserStats {
        &self.stats
    }

    fn flags(&self) -> DebugFlags {
        self.config.debug_flags()
    }

    // ============================================================
    // 生命周期
    // ============================================================

    pub(crate) fn reset(&mut self) {
        self.current = None;
        self.stalled = None;
        self.buffer.clear();
        self.scan_pos = 0;
        self.boundary = false;
        self.rpm.reset();
        self.decode_order = 0;
        self.epoch = self.epoch.wrapping_add(1);
        self.consecutive_hw_errors = 0;
        while self.inbox.try_recv().is_ok() {}
        info!(
            "AVS: reset, epoch={}, 保留序列头={}",
            self.epoch,
            self.seq.is_some()
        );
    }

    pub(crate) fn flush(&mut self) -> FlushReport {
        let mut report = FlushReport::default();
        if let Some(picture) = self.current.take() {
            report.discarded.push(picture.desc.decode_order);
        }
        if let Some(stalled) = self.stalled.take() {
            report.discarded.push(stalled.picture.desc.decode_order);
        }
        report.discarded.sort_unstable();
        self.buffer.clear();
        self.scan_pos = 0;
        self.boundary = false;

        let deadline = Instant::now() + self.config.flush_timeout();
        loop {
            while let Ok(completion) = self.inbox.try_recv() {
                self.apply_during_flush(completion, &mut report);
            }
            if !self.rpm.has_pending_hw() {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match self.inbox.recv_timeout(deadline - now) {
                Ok(completion) => self.apply_during_flush(completion, &mut report),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        report.force_discarded = self.rpm.force_discard_pending();
        if !report.force_discarded.is_empty() {
            warn!(
                "AVS: flush 等待 {:?} 超时, 强制丢弃 {} 个硬件任务",
                self.config.flush_timeout(),
                report.force_discarded.len()
            );
        }
        self.rpm.set_draining();
        info!(
            "AVS: flush 完成, 丢弃图像 {}, 完成通知 {}, 硬件出错 {}, 强制丢弃 {}",
            report.discarded.len(),
            report.completed,
            report.hw_errors.len(),
            report.force_discarded.len()
        );
        report
    }

    fn apply_during_flush(&mut self, completion: HwCompletion, report: &mut FlushReport) {
        report.completed += 1;
        let errors_before = self.stats.hw_errors;
        let result = self.apply_completion(completion);
        if self.stats.hw_errors > errors_before {
            report.hw_errors.push(completion.task);
        }
        if let Err(e) = result {
            error!("AVS: flush 期间硬件错误: {}", e);
            report.fatal = Some(e);
        }
    }

    pub(crate) fn control(&mut self, cmd: ControlCommand) -> AvsdResult<ControlResponse> {
        self.drain_inbox()?;
        if self.flags().contains(DebugFlags::LOG) {
            debug!("AVS: control {:?}", cmd);
        }
        match cmd {
            ControlCommand::SetConcealment(mode) => self.config.concealment = mode,
            ControlCommand::SetSplitMode(on) => self.config.split_mode = on,
            ControlCommand::SetFlushTimeout(timeout) => {
                self.config.flush_timeout_ms = duration_to_millis(timeout);
            }
            ControlCommand::SetMaxHwRetries(n) => self.config.max_hw_retries = n,
            ControlCommand::GetSequenceHeader => {
                return Ok(ControlResponse::SequenceHeader(
                    self.seq.clone().map(Box::new),
                ));
            }
            ControlCommand::GetStats => return Ok(ControlResponse::Stats(self.stats.clone())),
            ControlCommand::ReleaseOutput(handle) => self.rpm.release_output(handle)?,
            ControlCommand::Other(code) => {
                return Err(AvsdError::UnsupportedCommand(format!("0x{:X}", code)));
            }
        }
        Ok(ControlResponse::Ack)
    }

    pub(crate) fn prepare(&mut self, packet: Packet, task: &mut DecodeTask) -> AvsdResult<()> {
        self.drain_inbox()?;
        self.ensure_accepting()?;
        if packet.is_empty() && !packet.eos {
            return Err(AvsdError::InvalidPacket("数据包为空".into()));
        }
        if task.is_bound() {
            return Err(AvsdError::InvalidState("任务仍持有未解析的数据包".into()));
        }
        if self.flags().contains(DebugFlags::INPUT) {
            debug!(
                "AVS: 输入数据包 {} 字节, pts={}, pos={}",
                packet.size(),
                packet.timestamp(),
                packet.pos
            );
        }
        task.bind(packet);
        Ok(())
    }

    pub(crate) fn callback(&mut self, completion: HwCompletion) -> AvsdResult<()> {
        self.drain_inbox()?;
        self.apply_completion(completion)
    }

    fn ensure_accepting(&self) -> AvsdResult<()> {
        if self.rpm.state() == RpmState::Draining {
            return Err(AvsdError::InvalidState(
                "flush 之后需要先 reset 才能继续送入数据".into(),
            ));
        }
        Ok(())
    }

    // ============================================================
    // 硬件完成
    // ============================================================

    fn drain_inbox(&mut self) -> AvsdResult<()> {
        while let Ok(completion) = self.inbox.try_recv() {
            self.apply_completion(completion)?;
        }
        Ok(())
    }

    fn apply_completion(&mut self, completion: HwCompletion) -> AvsdResult<()> {
        if self.flags().contains(DebugFlags::CALLBACK) {
            debug!(
                "AVS: 硬件回调 task={}, status={:?}",
                completion.task, completion.status
            );
        }
        if completion.task.epoch != self.epoch {
            debug!("AVS: 忽略旧纪元的完成通知 task={}", completion.task);
            return Ok(());
        }
        let ok = completion.status == HwStatus::Ok;
        if self.rpm.complete(completion.task, ok).is_none() {
            debug!("AVS: 未知或重复的完成通知 task={}", completion.task);
            return Ok(());
        }
        if ok {
            self.consecutive_hw_errors = 0;
            self.stats.hw_completed += 1;
            return Ok(());
        }

        self.consecutive_hw_errors += 1;
        self.stats.hw_errors += 1;
        warn!(
            "AVS: 硬件解码出错 task={}, 连续 {} 次",
            completion.task, self.consecutive_hw_errors
        );
        if self.consecutive_hw_errors > self.config.max_hw_retries {
            error!(
                "AVS: 硬件连续错误 {} 次, 超过上限 {}",
                self.consecutive_hw_errors, self.config.max_hw_retries
            );
            return Err(AvsdError::HardwareFatal {
                consecutive_errors: self.consecutive_hw_errors,
            });
        }
        Ok(())
    }

    // ============================================================
    // 解析
    // ============================================================

    pub(crate) fn parse(&mut self, task: &mut DecodeTask) -> AvsdResult<ParseOutcome> {
        let started = Instant::now();
        let result = self.parse_inner(task);
        if self.flags().contains(DebugFlags::TIME) {
            debug!("AVS: parse 耗时 {:?}", started.elapsed());
        }
        result
    }

    fn parse_inner(&mut self, task: &mut DecodeTask) -> AvsdResult<ParseOutcome> {
        self.drain_inbox()?;
        self.ensure_accepting()?;

        if let Some(packet) = task.take_packet() {
            self.stats.packets += 1;
            if !packet.is_empty() {
                self.buffer.push(&packet);
            }
            if !self.config.split_mode || packet.eos {
                self.boundary = true;
            }
            if packet.eos {
                debug!("AVS: 码流结束, 缓冲 {} 字节", self.buffer.len());
            }
        }

        if let Some(stalled) = self.stalled.take() {
            return self.submit_picture(stalled);
        }

        while let Some((start, end)) = self.next_unit() {
            if let Some(outcome) = self.handle_unit(start, end)? {
                return Ok(outcome);
            }
        }

        if self.boundary {
            self.boundary = false;
            if let Some(outcome) = self.finish_current(self.buffer.len())? {
                return Ok(outcome);
            }
        }
        Ok(ParseOutcome::NeedMoreData)
    }

    /// 定位下一个完整语法单元 `[start, end)`
    fn next_unit(&mut self) -> Option<(usize, usize)> {
        let Some(mut start) = find_start_code(self.buffer.as_slice(), self.scan_pos) else {
            self.drop_orphan_bytes();
            return None;
        };
        if self.current.is_none() && start > 0 {
            debug!("AVS: 丢弃起始码之前的 {} 字节", start);
            self.buffer.discard(start);
            self.scan_pos = 0;
            start = 0;
        }
        let data = self.buffer.as_slice();
        match find_start_code(data, start + START_CODE_LEN) {
            Some(end) => Some((start, end)),
            None if self.boundary => Some((start, data.len())),
            // 结束当前图像只需起始码本身, 不必等待该单元收齐
            None if self.current.is_some()
                && AvsStartCodeType::from_byte(data[start + START_CODE_PREFIX_LEN])
                    .ends_picture() =>
            {
                Some((start, data.len()))
            }
            None => None,
        }
    }

    /// 图像之外且不含起始码的字节无法归属
    fn drop_orphan_bytes(&mut self) {
        if self.current.is_some() {
            return;
        }
        // 分割模式下保留末尾可能构成起始码前缀的字节
        let keep = if self.boundary {
            0
        } else {
            START_CODE_PREFIX_LEN
        };
        let orphan = self.buffer.len().saturating_sub(keep);
        if orphan > 0 {
            self.buffer.discard(orphan);
        }
        self.scan_pos = 0;
    }

    /// 处理一个语法单元, 图像完成时返回结果
    fn handle_unit(&mut self, start: usize, end: usize) -> AvsdResult<Option<ParseOutcome>> {
        let code = self.buffer.as_slice()[start + START_CODE_PREFIX_LEN];
        let code_type = AvsStartCodeType::from_byte(code);
        if self.current.is_some() && code_type.ends_picture() {
            return self.finish_current(start);
        }

        let mut outcome = None;
        match code_type {
            AvsStartCodeType::Slice(position) => self.handle_slice(position, start, end),
            AvsStartCodeType::IPicture | AvsStartCodeType::PbPicture => {
                outcome = self.begin_picture(code_type, start, end);
            }
            AvsStartCodeType::SequenceHeader => self.handle_sequence_header(start, end),
            AvsStartCodeType::SequenceEnd => debug!("AVS: 序列结束"),
            AvsStartCodeType::Extension => {
                if self.current.is_none() {
                    self.handle_extension(start, end);
                }
            }
            AvsStartCodeType::UserData
            | AvsStartCodeType::VideoEdit
            | AvsStartCodeType::Reserved(_) => {}
        }
        self.advance(end);
        Ok(outcome)
    }

    /// 图像内单元保留在缓冲区中, 图像外单元直接丢弃
    fn advance(&mut self, end: usize) {
        if self.current.is_some() {
            self.scan_pos = end;
        } else {
            self.buffer.discard(end);
            self.scan_pos = 0;
        }
    }

    fn handle_sequence_header(&mut self, start: usize, end: usize) {
        let payload = &self.buffer.as_slice()[start + START_CODE_LEN..end];
        match parse_sequence_header(payload) {
            Ok(seq) => self.apply_sequence(seq),
            Err(e) => {
                self.stats.syntax_errors += 1;
                warn!("AVS: 序列头解析失败: {}", e);
                if matches!(e, AvsdError::UnsupportedFeature(_)) && self.seq.is_some() {
                    // 码流切换到不支持的档次, 旧参数不再适用
                    self.seq = None;
                    self.display = None;
                    self.rpm.drop_references();
                }
                self.seq_error = Some(e);
            }
        }
    }

    fn apply_sequence(&mut self, seq: SequenceHeader) {
        match &self.seq {
            Some(old) if old.requires_reset(&seq) => {
                info!(
                    "AVS: 序列参数变化 {}x{} -> {}x{}, 清空参考帧",
                    old.horizontal_size, old.vertical_size, seq.horizontal_size, seq.vertical_size
                );
                self.rpm.drop_references();
                self.display = None;
            }
            Some(_) => {}
            None => info!(
                "AVS: 序列头 profile=0x{:02X}, level=0x{:02X}, {}x{}, {}, low_delay={}",
                seq.profile_id,
                seq.level_id,
                seq.horizontal_size,
                seq.vertical_size,
                if seq.progressive_sequence {
                    "逐行"
                } else {
                    "隔行"
                },
                seq.low_delay
            ),
        }
        self.stats.sequence_headers += 1;
        self.rpm.activate();
        self.seq = Some(seq);
        self.seq_error = None;
    }

    fn handle_extension(&mut self, start: usize, end: usize) {
        let payload = &self.buffer.as_slice()[start + START_CODE_LEN..end];
        match parse_sequence_display_extension(payload) {
            Ok(Some(ext)) => {
                debug!(
                    "AVS: 序列显示扩展 {}x{}",
                    ext.display_horizontal_size, ext.display_vertical_size
                );
                self.display = Some(ext);
            }
            Ok(None) => {}
            Err(e) => {
                self.stats.syntax_errors += 1;
                warn!("AVS: 扩展数据解析失败: {}", e);
            }
        }
    }

    /// 解析图像头并开始组装, 图像头损坏时返回丢弃结果
    fn begin_picture(
        &mut self,
        code_type: AvsStartCodeType,
        start: usize,
        end: usize,
    ) -> Option<ParseOutcome> {
        let (pts, dts) = self.buffer.timestamps_at(start);
        let payload = &self.buffer.as_slice()[start + START_CODE_LEN..end];
        let parsed = match &self.seq {
            None => Err(self.seq_error.clone().unwrap_or_else(|| {
                AvsdError::SyntaxViolation("图像头之前没有序列头".into())
            })),
            Some(seq) => {
                let header = if code_type == AvsStartCodeType::IPicture {
                    parse_i_picture_header(payload, seq)
                } else {
                    parse_pb_picture_header(payload, seq)
                };
                header.map(|h| (seq.clone(), h))
            }
        };
        let (seq, header) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                self.stats.syntax_errors += 1;
                self.stats.dropped += 1;
                warn!("AVS: {} 图像头无效, 跳到下一图像: {}", code_type, e);
                return Some(ParseOutcome::Dropped(DroppedPicture {
                    decode_order: None,
                    pts,
                    reason: e,
                }));
            }
        };

        self.rpm.activate();
        let decode_order = self.decode_order;
        self.decode_order += 1;
        let poc = self.rpm.next_poc(header.picture_distance);
        self.stats.pictures += 1;
        if self.flags().contains(DebugFlags::LOG) {
            debug!(
                "AVS: 图像 {} decode_order={}, distance={}, poc={}, qp={}",
                header.coding_type, decode_order, header.picture_distance, poc, header.picture_qp
            );
        }

        let desc = PictureDescriptor {
            decode_order,
            poc,
            coding_type: header.coding_type,
            is_reference: header.coding_type.is_reference(),
            requirement: RefRequirement::for_picture(
                header.coding_type,
                header.picture_reference_flag,
            ),
            slot: None,
            refs: Vec::new(),
        };
        self.current = Some(PendingPicture {
            desc,
            header,
            seq,
            slices: Vec::new(),
            damaged_slices: 0,
            pts,
            dts,
        });
        None
    }

    fn handle_slice(&mut self, position: u8, start: usize, end: usize) {
        let Some(current) = self.current.as_mut() else {
            debug!("AVS: 丢弃图像之外的条带 {}", position);
            return;
        };
        let payload = &self.buffer.as_slice()[start + START_CODE_LEN..end];
        match parse_slice_header(position, payload, &current.seq, &current.header) {
            Ok(slice) => current.slices.push(SliceSegment {
                offset: start,
                size: end - start,
                vertical_position: slice.vertical_position,
                slice_qp: slice.slice_qp,
                header_bits: slice.header_bits,
            }),
            Err(e) => {
                current.damaged_slices += 1;
                self.stats.syntax_errors += 1;
                warn!(
                    "AVS: 条带头无效 decode_order={}: {}",
                    current.desc.decode_order, e
                );
            }
        }
    }

    /// 以缓冲区前 `end` 字节结束当前图像
    fn finish_current(&mut self, end: usize) -> AvsdResult<Option<ParseOutcome>> {
        let Some(picture) = self.current.take() else {
            return Ok(None);
        };
        let bitstream = self.buffer.take(end);
        self.scan_pos = 0;
        self.submit_picture(CompletedPicture { picture, bitstream }).map(Some)
    }

    /// 分配槽位、解析参考并组装任务
    fn submit_picture(&mut self, completed: CompletedPicture) -> AvsdResult<ParseOutcome> {
        let CompletedPicture { picture, bitstream } = completed;
        if let Err(e) = check_slice_coverage(
            &picture.slices,
            picture.seq.mb_height(),
            picture.damaged_slices,
        ) {
            return Ok(self.drop_picture(&picture, e));
        }

        let slot = match self.rpm.allocate() {
            Ok(slot) => slot,
            Err(e) => {
                self.stats.pool_stalls += 1;
                warn!(
                    "AVS: 帧缓冲槽位耗尽, 图像 {} 等待输出释放",
                    picture.desc.decode_order
                );
                self.stalled = Some(CompletedPicture { picture, bitstream });
                return Err(e);
            }
        };

        let mut desc = picture.desc.clone();
        let concealment = match self.rpm.resolve(&desc) {
            Ok(refs) => {
                desc.refs = refs;
                None
            }
            Err(fault) => {
                let concealed = match self.config.concealment {
                    ConcealmentMode::Substitute => self.rpm.conceal(&desc),
                    ConcealmentMode::Drop => None,
                };
                let Some(concealed) = concealed else {
                    self.rpm.release_unsubmitted(slot);
                    return Ok(self.drop_picture(&picture, fault));
                };
                warn!(
                    "AVS: 图像 {} 参考帧有缺陷 ({}), 替代 {} 个位置",
                    desc.decode_order, fault, concealed.substituted
                );
                if self.flags().contains(DebugFlags::WARNING) {
                    for slot in self.rpm.slots().iter() {
                        debug!("AVS: 隐藏时槽位 {:?}", slot);
                    }
                }
                desc.refs = concealed.slots;
                Some(Concealment {
                    fault,
                    substituted: concealed.substituted,
                })
            }
        };
        desc.slot = Some(slot);

        let id = TaskId {
            epoch: self.epoch,
            decode_order: desc.decode_order,
        };
        let input = TaskInput {
            id,
            desc: &desc,
            seq: &picture.seq,
            display: self.display.as_ref(),
            header: &picture.header,
            slices: &picture.slices,
            damaged_slices: picture.damaged_slices,
            bitstream,
            pts: picture.pts,
            dts: picture.dts,
            slot,
            concealment,
        };
        let task = match build_task(input, &mut self.rpm) {
            Ok(task) => task,
            Err(e) => {
                self.rpm.release_unsubmitted(slot);
                if e.category() == ErrorCategory::StreamData {
                    return Ok(self.drop_picture(&picture, e));
                }
                return Err(e);
            }
        };

        if desc.is_reference {
            self.rpm.commit_reference(slot);
        }
        if self.flags().contains(DebugFlags::ASSERT) {
            self.check_references();
        }
        self.stats.tasks += 1;
        if task.concealment.is_some() {
            self.stats.concealed += 1;
        }
        debug!(
            "AVS: 任务 {} {} -> {}, 参考 {:?}, 条带 {}, {} 字节",
            task.id,
            desc.coding_type,
            task.output,
            task.ref_handles(),
            task.slices.len(),
            task.bitstream.len()
        );
        Ok(ParseOutcome::Ready(task))
    }

    /// 参考帧不变式检查, 失败只记录日志
    fn check_references(&self) {
        let refs = self.rpm.references();
        if refs.len() > MAX_REF_PICTURES {
            error!(
                "AVS: 断言失败: 参考帧 {} 个, 上限 {}",
                refs.len(),
                MAX_REF_PICTURES
            );
        }
        for idx in refs {
            if self.rpm.slot(idx).is_some_and(|slot| !slot.is_reference) {
                error!("AVS: 断言失败: 参考列表中的槽位 {} 未标记为参考", idx);
            }
        }
    }

    fn drop_picture(&mut self, picture: &PendingPicture, reason: AvsdError) -> ParseOutcome {
        self.stats.dropped += 1;
        warn!(
            "AVS: 丢弃图像 decode_order={} ({}): {}",
            picture.desc.decode_order, picture.desc.coding_type, reason
        );
        if self.flags().contains(DebugFlags::ERROR) {
            debug!(
                "AVS: 丢弃图像详情 {:?}, 条带 {:?}, 损坏条带 {}",
                picture.desc, picture.slices, picture.damaged_slices
            );
        }
        ParseOutcome::Dropped(DroppedPicture {
            decode_order: Some(picture.desc.decode_order),
            pts: picture.pts,
            reason,
        })
    }
}

fn duration_to_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
