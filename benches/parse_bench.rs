//! AVS 解析前端性能基准测试.
//!
//! 覆盖起始码扫描、序列头解析与完整的图像组装路径.

use avsd::codec::parsers::avs::picture::{LoopFilterParams, PictureStructure};
use avsd::codec::parsers::avs::start_code::{
    I_PICTURE_CODE, PB_PICTURE_CODE, SEQUENCE_HEADER_CODE,
};
use avsd::codec::parsers::avs::writer::{
    write_i_picture_header, write_pb_picture_header, write_sequence_header, write_slice_header,
};
use avsd::codec::parsers::avs::{
    PictureCodingType, PictureHeader, SequenceHeader, SliceHeader, parse_sequence_header,
    scan_start_codes,
};
use avsd::codec::{
    CodecId, ControlCommand, DecodeTask, HwCompletion, Packet, ParseOutcome, ParserConfig,
};
use avsd::core::bitwriter::BitWriter;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

/// 1080p 逐行序列头
fn hd_sequence() -> SequenceHeader {
    SequenceHeader {
        profile_id: 0x20,
        level_id: 0x42,
        progressive_sequence: true,
        horizontal_size: 1920,
        vertical_size: 1080,
        chroma_format: 1,
        sample_precision: 1,
        aspect_ratio: 3,
        frame_rate_code: 3,
        bit_rate: 50_000,
        low_delay: false,
        bbv_buffer_size: 1024,
    }
}

fn picture(coding_type: PictureCodingType, distance: u8) -> PictureHeader {
    PictureHeader {
        coding_type,
        bbv_delay: 0xFFFF,
        time_code: None,
        picture_distance: distance,
        bbv_check_times: None,
        progressive_frame: true,
        picture_structure: PictureStructure::Frame,
        advanced_pred_mode_disable: false,
        top_field_first: false,
        repeat_first_field: false,
        fixed_picture_qp: true,
        picture_qp: 28,
        picture_reference_flag: true,
        skip_mode_flag: false,
        loop_filter: LoopFilterParams::default(),
    }
}

/// 每行一个条带, 条带数据为 `slice_bytes` 字节填充
fn write_picture(
    bw: &mut BitWriter,
    seq: &SequenceHeader,
    pic: &PictureHeader,
    slice_bytes: usize,
) {
    if pic.coding_type == PictureCodingType::I {
        bw.write_start_code(I_PICTURE_CODE);
        write_i_picture_header(bw, pic, seq);
    } else {
        bw.write_start_code(PB_PICTURE_CODE);
        write_pb_picture_header(bw, pic, seq);
    }
    let filler = vec![0xA5u8; slice_bytes];
    for row in 0..seq.mb_height() {
        let slice = SliceHeader {
            vertical_position: row,
            fixed_slice_qp: true,
            slice_qp: pic.picture_qp,
            weighting: false,
            weights: Vec::new(),
            mb_weighting: false,
            header_bits: 0,
        };
        let mut header = BitWriter::new();
        let code = write_slice_header(&mut header, &slice, seq, pic);
        let bits = header.bits_written();
        let bytes = header.finish();
        bw.write_start_code(code);
        for i in 0..bits {
            bw.write_bit(u32::from((bytes[i / 8] >> (7 - i % 8)) & 1));
        }
        bw.write_bytes(&filler);
    }
}

/// 按图像切分的数据包: 首包含序列头与 I 图像, 之后为 P 图像
fn build_packets(count: usize, slice_bytes: usize) -> Vec<Vec<u8>> {
    let seq = hd_sequence();
    let mut packets = Vec::with_capacity(count);
    for n in 0..count {
        let mut bw = BitWriter::new();
        if n == 0 {
            bw.write_start_code(SEQUENCE_HEADER_CODE);
            write_sequence_header(&mut bw, &seq);
            write_picture(&mut bw, &seq, &picture(PictureCodingType::I, 0), slice_bytes);
        } else {
            let distance = (n * 2 % 256) as u8;
            write_picture(&mut bw, &seq, &picture(PictureCodingType::P, distance), slice_bytes);
        }
        packets.push(bw.finish());
    }
    packets
}

fn bench_scan_start_codes(c: &mut Criterion) {
    let data: Vec<u8> = build_packets(8, 2048).concat();
    c.bench_function("scan_start_codes_1080p_8_pictures", |b| {
        b.iter(|| {
            let entries = scan_start_codes(black_box(&data));
            black_box(entries.len());
        });
    });
}

fn bench_sequence_header(c: &mut Criterion) {
    let mut bw = BitWriter::new();
    write_sequence_header(&mut bw, &hd_sequence());
    let payload = bw.finish();
    c.bench_function("parse_sequence_header", |b| {
        b.iter(|| parse_sequence_header(black_box(&payload)).unwrap());
    });
}

fn bench_parse_pictures(c: &mut Criterion) {
    let packets = build_packets(32, 512);
    let registry = avsd::default_parser_registry();
    c.bench_function("parse_1080p_32_pictures", |b| {
        b.iter(|| {
            let mut parser = registry.create_parser(CodecId::Avs).unwrap();
            parser.init(ParserConfig::default()).unwrap();
            let mut tasks = 0usize;
            for data in &packets {
                let mut task = DecodeTask::new();
                parser
                    .prepare(Packet::from_data(data.clone()), &mut task)
                    .unwrap();
                while let ParseOutcome::Ready(hw) = parser.parse(&mut task).unwrap() {
                    parser.callback(HwCompletion::ok(hw.id)).unwrap();
                    parser
                        .control(ControlCommand::ReleaseOutput(hw.output))
                        .unwrap();
                    tasks += 1;
                }
            }
            black_box(tasks);
        });
    });
}

criterion_group!(
    benches,
    bench_scan_start_codes,
    bench_sequence_header,
    bench_parse_pictures,
);
criterion_main!(benches);
