use avsd_core::AvsdError;

use super::helpers::*;
use crate::config::ParserConfig;
use crate::parser::Parser;
use crate::task::{DecodeTask, HwCompletion, HwTask};

fn three_pictures(parser: &mut crate::frontends::avs::AvsParser) -> Vec<HwTask> {
    let tasks = ready(feed(
        parser,
        StreamBuilder::new().sequence().i(0).p(2).p(4).build(),
    ));
    assert_eq!(tasks.len(), 3);
    tasks
}

#[test]
fn test_stale_epoch_completion_ignored() {
    let mut parser = default_parser();
    let t0 = feed_one(&mut parser, StreamBuilder::new().sequence().i(0).build());
    parser.reset().unwrap();

    parser.callback(HwCompletion::ok(t0.id)).unwrap();
    parser.callback(HwCompletion::error(t0.id)).unwrap();
    let stats = parser.stats().unwrap();
    assert_eq!(stats.hw_completed, 0);
    assert_eq!(stats.hw_errors, 0);
}

#[test]
fn test_duplicate_completion_ignored() {
    let mut parser = default_parser();
    let t0 = feed_one(&mut parser, StreamBuilder::new().sequence().i(0).build());
    parser.callback(HwCompletion::ok(t0.id)).unwrap();
    parser.callback(HwCompletion::ok(t0.id)).unwrap();
    parser.callback(HwCompletion::error(t0.id)).unwrap();
    let stats = parser.stats().unwrap();
    assert_eq!(stats.hw_completed, 1);
    assert_eq!(stats.hw_errors, 0);
}

#[test]
fn test_consecutive_errors_become_fatal() {
    let mut parser = new_parser(ParserConfig {
        max_hw_retries: 1,
        ..ParserConfig::default()
    });
    let tasks = three_pictures(&mut parser);

    parser.callback(HwCompletion::error(tasks[0].id)).unwrap();
    let err = parser
        .callback(HwCompletion::error(tasks[1].id))
        .unwrap_err();
    assert_eq!(
        err,
        AvsdError::HardwareFatal {
            consecutive_errors: 2
        }
    );
    assert_eq!(parser.stats().unwrap().hw_errors, 2);
}

#[test]
fn test_success_resets_error_streak() {
    let mut parser = new_parser(ParserConfig {
        max_hw_retries: 1,
        ..ParserConfig::default()
    });
    let tasks = three_pictures(&mut parser);

    parser.callback(HwCompletion::error(tasks[0].id)).unwrap();
    parser.callback(HwCompletion::ok(tasks[1].id)).unwrap();
    parser.callback(HwCompletion::error(tasks[2].id)).unwrap();
    let stats = parser.stats().unwrap();
    assert_eq!(stats.hw_errors, 2);
    assert_eq!(stats.hw_completed, 1);
}

#[test]
fn test_notifier_drained_on_parse() {
    let mut parser = default_parser();
    let t0 = feed_one(&mut parser, StreamBuilder::new().sequence().i(0).build());
    let notifier = parser.completion_notifier().unwrap();
    notifier.notify(HwCompletion::ok(t0.id)).unwrap();
    assert_eq!(parser.stats().unwrap().hw_completed, 0);

    let mut empty = DecodeTask::new();
    assert!(parser.parse(&mut empty).unwrap().is_need_more_data());
    assert_eq!(parser.stats().unwrap().hw_completed, 1);
}

#[test]
fn test_fatal_error_surfaces_through_parse() {
    let mut parser = new_parser(ParserConfig {
        max_hw_retries: 0,
        ..ParserConfig::default()
    });
    let t0 = feed_one(&mut parser, StreamBuilder::new().sequence().i(0).build());
    let notifier = parser.completion_notifier().unwrap();
    notifier.notify(HwCompletion::error(t0.id)).unwrap();

    let mut empty = DecodeTask::new();
    assert!(matches!(
        parser.parse(&mut empty),
        Err(AvsdError::HardwareFatal {
            consecutive_errors: 1
        })
    ));
}

#[test]
fn test_notifier_after_deinit_fails() {
    let mut parser = default_parser();
    let notifier = parser.completion_notifier().unwrap();
    parser.deinit();
    let id = crate::task::TaskId {
        epoch: 0,
        decode_order: 0,
    };
    assert!(matches!(
        notifier.notify(HwCompletion::ok(id)),
        Err(AvsdError::InvalidState(_))
    ));
}

#[test]
fn test_flush_reports_hardware_errors() {
    let mut parser = new_parser(ParserConfig {
        max_hw_retries: 1,
        ..ParserConfig::default()
    });
    let tasks = three_pictures(&mut parser);
    let notifier = parser.completion_notifier().unwrap();
    for task in &tasks {
        notifier.notify(HwCompletion::error(task.id)).unwrap();
    }

    let report = parser.flush().unwrap();
    assert_eq!(report.completed, 3);
    assert!(report.force_discarded.is_empty());
    assert_eq!(
        report.hw_errors,
        tasks.iter().map(|t| t.id).collect::<Vec<_>>()
    );
    assert_eq!(
        report.fatal,
        Some(AvsdError::HardwareFatal {
            consecutive_errors: 3
        })
    );
    assert!(!report.is_clean());
}

#[test]
fn test_flush_hardware_error_below_limit() {
    let mut parser = default_parser();
    let tasks = three_pictures(&mut parser);
    parser.callback(HwCompletion::ok(tasks[0].id)).unwrap();
    let notifier = parser.completion_notifier().unwrap();
    notifier.notify(HwCompletion::error(tasks[1].id)).unwrap();
    notifier.notify(HwCompletion::ok(tasks[2].id)).unwrap();

    let report = parser.flush().unwrap();
    assert_eq!(report.completed, 2);
    assert_eq!(report.hw_errors, vec![tasks[1].id]);
    assert!(report.fatal.is_none());
    assert!(!report.is_clean());
}
