use avsd_core::AvsdError;

use super::helpers::*;
use crate::config::ParserConfig;
use crate::frontends::avs::AvsParser;
use crate::packet::Packet;
use crate::parser::Parser;
use crate::parsers::avs::PictureCodingType;
use crate::task::{HwCompletion, HwTask, ParseOutcome};

fn split_parser() -> AvsParser {
    new_parser(ParserConfig {
        split_mode: true,
        ..ParserConfig::default()
    })
}

fn feed_chunks(parser: &mut AvsParser, data: &[u8], size: usize) -> Vec<ParseOutcome> {
    let mut outcomes = Vec::new();
    for chunk in data.chunks(size) {
        outcomes.extend(feed(parser, chunk.to_vec()));
    }
    outcomes
}

fn gop() -> Vec<u8> {
    StreamBuilder::new()
        .sequence()
        .i(0)
        .p(4)
        .b(2)
        .sequence_end()
        .build()
}

fn assert_slices_at_start_codes(task: &HwTask) {
    let bs = &task.bitstream;
    for slice in &task.slices {
        assert_eq!(&bs[slice.offset..slice.offset + 3], &[0, 0, 1]);
        assert_eq!(u32::from(bs[slice.offset + 3]), slice.vertical_position);
    }
    let last = task.slices.last().expect("至少一个条带");
    assert_eq!(last.offset + last.size, bs.len());
}

#[test]
fn test_arbitrary_chunks_match_whole_packet() {
    let data = gop();
    let mut whole = default_parser();
    let expected = ready(feed(&mut whole, data.clone()));
    assert_eq!(expected.len(), 3);

    for size in [1, 3, 7, 64] {
        let mut parser = split_parser();
        let tasks = ready(feed_chunks(&mut parser, &data, size));
        assert_eq!(tasks.len(), 3, "chunk={}", size);
        for (got, want) in tasks.iter().zip(&expected) {
            assert_eq!(got.bitstream, want.bitstream, "chunk={}", size);
            assert_eq!(got.slices, want.slices, "chunk={}", size);
            assert_eq!(got.id, want.id, "chunk={}", size);
        }
    }
}

#[test]
fn test_split_mode_waits_for_next_start_code() {
    let mut parser = split_parser();
    let outcomes = feed(&mut parser, StreamBuilder::new().sequence().i(0).build());
    assert!(outcomes.is_empty());

    // 下一图像的起始码到达后, 前一图像即完成
    let tasks = ready(feed(&mut parser, StreamBuilder::new().p(2).build()));
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].avs_params().coding_type, PictureCodingType::I);

    let tasks = ready(feed(&mut parser, vec![0, 0, 1, 0xB1]));
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].avs_params().coding_type, PictureCodingType::P);
}

#[test]
fn test_garbage_before_first_start_code_skipped() {
    let data = StreamBuilder::new()
        .raw(&[0x12, 0x34, 0x56, 0x00])
        .sequence()
        .i(0)
        .build();
    let mut parser = default_parser();
    let task = feed_one(&mut parser, data.clone());
    assert_eq!(&task.bitstream[..4], &[0, 0, 1, 0xB3]);

    let mut parser = split_parser();
    let mut stream = data;
    stream.extend_from_slice(&[0, 0, 1, 0xB1]);
    let tasks = ready(feed_chunks(&mut parser, &stream, 5));
    assert_eq!(tasks.len(), 1);
    assert_eq!(&tasks[0].bitstream[..4], &[0, 0, 1, 0xB3]);
}

#[test]
fn test_timestamps_follow_picture_start() {
    let mut parser = default_parser();
    let task = feed_packet(
        &mut parser,
        packet(StreamBuilder::new().sequence().i(0).build(), 90),
    )
    .into_iter()
    .find_map(|o| o.into_task())
    .expect("应生成任务");
    assert_eq!(task.pts.pts, 90);
    assert_eq!(task.dts, 90);

    let mut parser = split_parser();
    let first = feed_packet(
        &mut parser,
        packet(StreamBuilder::new().sequence().i(0).build(), 1000),
    );
    assert!(first.is_empty());
    let second = ready(feed_packet(
        &mut parser,
        packet(StreamBuilder::new().p(2).build(), 4600),
    ));
    let third = ready(feed_packet(&mut parser, packet(vec![0, 0, 1, 0xB1], 8200)));
    assert_eq!(second.len(), 1);
    assert_eq!(third.len(), 1);
    assert_eq!(second[0].pts.pts, 1000);
    assert_eq!(third[0].pts.pts, 4600);
}

#[test]
fn test_slice_offsets_point_at_start_codes() {
    let mut parser = default_parser();
    let tasks = ready(feed(&mut parser, gop()));
    assert_eq!(tasks.len(), 3);
    for task in &tasks {
        assert_eq!(task.slices.len(), 2);
        assert!(task.slices[0].offset > 4);
        assert_slices_at_start_codes(task);
    }
}

#[test]
fn test_incomplete_slices_dropped() {
    let mut parser = default_parser();
    let pic = picture(PictureCodingType::I, 0, false);
    let data = StreamBuilder::new()
        .sequence()
        .picture_with_rows(&pic, &[3, 9])
        .build();
    let outcomes = feed(&mut parser, data);
    assert_eq!(outcomes.len(), 1);
    match &outcomes[0] {
        ParseOutcome::Dropped(dropped) => {
            assert_eq!(dropped.decode_order, Some(0));
            assert!(matches!(dropped.reason, AvsdError::IncompleteSlices(_)));
        }
        other => panic!("期望丢弃, 实际 {:?}", other),
    }

    let data = StreamBuilder::new()
        .picture_with_rows(&picture(PictureCodingType::I, 2, false), &[0, 9, 4])
        .build();
    let outcomes = feed(&mut parser, data);
    assert!(matches!(
        &outcomes[..],
        [ParseOutcome::Dropped(d)] if matches!(d.reason, AvsdError::IncompleteSlices(_))
    ));

    let task = feed_one(&mut parser, StreamBuilder::new().i(4).build());
    assert_eq!(task.id.decode_order, 2);
    assert_eq!(parser.stats().unwrap().dropped, 2);
}

#[test]
fn test_bad_picture_header_skipped() {
    let mut parser = default_parser();
    let data = StreamBuilder::new()
        .sequence()
        .raw(&[0, 0, 1, 0xB6, 0xFF])
        .i(2)
        .build();
    let outcomes = feed(&mut parser, data);
    assert_eq!(outcomes.len(), 2);
    match &outcomes[0] {
        ParseOutcome::Dropped(dropped) => {
            assert_eq!(dropped.decode_order, None);
            assert!(matches!(dropped.reason, AvsdError::BitstreamExhausted));
        }
        other => panic!("期望丢弃, 实际 {:?}", other),
    }
    let task = outcomes[1].clone().into_task().expect("应生成任务");
    assert_eq!(task.id.decode_order, 0);
    assert_eq!(parser.stats().unwrap().syntax_errors, 1);
}

#[test]
fn test_picture_before_sequence_header_dropped() {
    let mut parser = default_parser();
    let outcomes = feed(&mut parser, StreamBuilder::new().i(0).build());
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        &outcomes[0],
        ParseOutcome::Dropped(d) if d.decode_order.is_none()
            && matches!(d.reason, AvsdError::SyntaxViolation(_))
    ));
    assert!(parser.sequence_header().is_none());
}

#[test]
fn test_end_of_stream_completes_last_picture() {
    let mut parser = split_parser();
    let data = StreamBuilder::new().sequence().i(0).p(2).build();
    let outcomes = feed(&mut parser, data);
    // 没有后续起始码, P 图像仍在缓冲中
    let head = ready(outcomes);
    assert_eq!(head.len(), 1);

    let tail = ready(feed_packet(&mut parser, Packet::end_of_stream()));
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].id.decode_order, 1);
    assert_eq!(tail[0].avs_params().coding_type, PictureCodingType::P);
    assert_eq!(tail[0].slices.len(), 2);
    assert_eq!(tail[0].ref_handles(), vec![head[0].output]);

    for task in head.iter().chain(&tail) {
        parser.callback(HwCompletion::ok(task.id)).unwrap();
    }
    let report = parser.flush().unwrap();
    assert!(report.discarded.is_empty());
    assert!(report.is_clean());
}

#[test]
fn test_eos_flag_on_data_packet() {
    let mut parser = split_parser();
    let data = StreamBuilder::new().sequence().i(0).p(2).build();
    let tasks = ready(feed_packet(&mut parser, Packet::from_data(data).with_eos()));
    assert_eq!(
        tasks.iter().map(|t| t.id.decode_order).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert!(parser.flush().unwrap().discarded.is_empty());
}

#[test]
fn test_flush_without_eos_discards_tail() {
    let mut parser = split_parser();
    let outcomes = feed(&mut parser, StreamBuilder::new().sequence().i(0).build());
    assert!(outcomes.is_empty());

    let report = parser.flush().unwrap();
    assert_eq!(report.discarded, vec![0]);
    assert!(report.force_discarded.is_empty());
}
