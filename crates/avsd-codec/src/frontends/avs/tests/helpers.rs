use avsd_core::Rational;
use avsd_core::bitwriter::BitWriter;

use crate::config::ParserConfig;
use crate::packet::Packet;
use crate::parser::Parser;
use crate::parsers::avs::picture::{
    LoopFilterParams, PictureCodingType, PictureHeader, PictureStructure,
};
use crate::parsers::avs::sequence::{CHROMA_FORMAT_420, PROFILE_JIZHUN, SequenceHeader};
use crate::parsers::avs::slice::SliceHeader;
use crate::parsers::avs::start_code::{
    I_PICTURE_CODE, PB_PICTURE_CODE, SEQUENCE_END_CODE, SEQUENCE_HEADER_CODE,
};
use crate::parsers::avs::writer::{
    write_i_picture_header, write_pb_picture_header, write_sequence_header, write_slice_header,
};
use crate::task::{DecodeTask, HwTask, ParseOutcome};

use super::super::AvsParser;

/// 测试用条带行号 (352x288 共 18 行)
pub const TEST_ROWS: [u32; 2] = [0, 9];

/// CIF 逐行序列头
pub fn test_seq() -> SequenceHeader {
    SequenceHeader {
        profile_id: PROFILE_JIZHUN,
        level_id: 0x20,
        progressive_sequence: true,
        horizontal_size: 352,
        vertical_size: 288,
        chroma_format: CHROMA_FORMAT_420,
        sample_precision: 1,
        aspect_ratio: 1,
        frame_rate_code: 3,
        bit_rate: 0x3FFF,
        low_delay: false,
        bbv_buffer_size: 0x3FF,
    }
}

pub fn picture(
    coding_type: PictureCodingType,
    picture_distance: u8,
    picture_reference_flag: bool,
) -> PictureHeader {
    PictureHeader {
        coding_type,
        bbv_delay: 0xFFFF,
        time_code: None,
        picture_distance,
        bbv_check_times: None,
        progressive_frame: true,
        picture_structure: PictureStructure::Frame,
        advanced_pred_mode_disable: false,
        top_field_first: false,
        repeat_first_field: false,
        fixed_picture_qp: true,
        picture_qp: 30,
        picture_reference_flag,
        skip_mode_flag: false,
        loop_filter: LoopFilterParams::default(),
    }
}

/// 码流构造器
pub struct StreamBuilder {
    bw: BitWriter,
    seq: SequenceHeader,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self {
            bw: BitWriter::new(),
            seq: test_seq(),
        }
    }

    pub fn sequence(mut self) -> Self {
        self.bw.write_start_code(SEQUENCE_HEADER_CODE);
        write_sequence_header(&mut self.bw, &self.seq);
        self
    }

    pub fn sequence_with(mut self, seq: SequenceHeader) -> Self {
        self.seq = seq;
        self.sequence()
    }

    pub fn picture_with_rows(mut self, pic: &PictureHeader, rows: &[u32]) -> Self {
        if pic.coding_type == PictureCodingType::I {
            self.bw.write_start_code(I_PICTURE_CODE);
            write_i_picture_header(&mut self.bw, pic, &self.seq);
        } else {
            self.bw.write_start_code(PB_PICTURE_CODE);
            write_pb_picture_header(&mut self.bw, pic, &self.seq);
        }
        for &row in rows {
            let slice = SliceHeader {
                vertical_position: row,
                fixed_slice_qp: true,
                slice_qp: pic.picture_qp,
                weighting: false,
                weights: Vec::new(),
                mb_weighting: false,
                header_bits: 0,
            };
            // 条带起始码由行号决定, 条带头先写入临时缓冲
            let mut header = BitWriter::new();
            let code = write_slice_header(&mut header, &slice, &self.seq, pic);
            self.bw.write_start_code(code);
            let header_bits = header.bits_written();
            let header_bytes = header.finish();
            for i in 0..header_bits {
                let bit = (header_bytes[i / 8] >> (7 - i % 8)) & 1;
                self.bw.write_bit(u32::from(bit));
            }
            // 宏块数据占位
            self.bw.write_bytes(&[0xA5, 0xFF]);
        }
        self
    }

    pub fn i(self, distance: u8) -> Self {
        self.picture_with_rows(&picture(PictureCodingType::I, distance, false), &TEST_ROWS)
    }

    /// 单参考 P 图像
    pub fn p(self, distance: u8) -> Self {
        self.picture_with_rows(&picture(PictureCodingType::P, distance, true), &TEST_ROWS)
    }

    /// 双参考 P 图像
    pub fn p2(self, distance: u8) -> Self {
        self.picture_with_rows(&picture(PictureCodingType::P, distance, false), &TEST_ROWS)
    }

    pub fn b(self, distance: u8) -> Self {
        self.picture_with_rows(&picture(PictureCodingType::B, distance, false), &TEST_ROWS)
    }

    pub fn sequence_end(mut self) -> Self {
        self.bw.write_start_code(SEQUENCE_END_CODE);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bw.align_to_byte();
        self.bw.write_bytes(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.bw.finish()
    }
}

pub fn new_parser(config: ParserConfig) -> AvsParser {
    let mut parser = AvsParser::new();
    parser.init(config).expect("初始化解析器失败");
    parser
}

pub fn default_parser() -> AvsParser {
    new_parser(ParserConfig::default())
}

pub fn packet(data: Vec<u8>, pts: i64) -> Packet {
    Packet::from_data(data).with_pts(pts, Rational::new(1, 90000))
}

/// 送入一个数据包并解析到 NeedMoreData
pub fn feed(parser: &mut AvsParser, data: Vec<u8>) -> Vec<ParseOutcome> {
    feed_packet(parser, Packet::from_data(data))
}

pub fn feed_packet(parser: &mut AvsParser, pkt: Packet) -> Vec<ParseOutcome> {
    let mut task = DecodeTask::new();
    parser.prepare(pkt, &mut task).expect("prepare 失败");
    drain(parser, &mut task)
}

pub fn drain(parser: &mut AvsParser, task: &mut DecodeTask) -> Vec<ParseOutcome> {
    let mut outcomes = Vec::new();
    loop {
        match parser.parse(task).expect("parse 失败") {
            ParseOutcome::NeedMoreData => return outcomes,
            outcome => outcomes.push(outcome),
        }
    }
}

pub fn ready(outcomes: Vec<ParseOutcome>) -> Vec<HwTask> {
    outcomes.into_iter().filter_map(|o| o.into_task()).collect()
}

/// 送入一个数据包, 期望恰好生成一个任务
pub fn feed_one(parser: &mut AvsParser, data: Vec<u8>) -> HwTask {
    let outcomes = feed(parser, data);
    assert_eq!(outcomes.len(), 1, "outcomes={:?}", outcomes);
    ready(outcomes).pop().expect("应生成硬件任务")
}
