//! AVS (GB/T 20090.2) 码流语法解析器.
//!
//! 提供对 AVS 基准档次原始码流的解析能力:
//! - 起始码扫描与类型识别
//! - 序列头 / 序列显示扩展解析
//! - I 图像头与 P/B 图像头解析
//! - 条带头解析
//!
//! 所有解析函数均为无状态函数, 输入为起始码之后的字节.

pub mod picture;
pub mod sequence;
pub mod slice;
pub mod start_code;
pub mod writer;

pub use picture::{
    LoopFilterParams, PictureCodingType, PictureHeader, PictureStructure, TimeCode,
    parse_i_picture_header, parse_pb_picture_header,
};
pub use sequence::{
    ColourDescription, SequenceDisplayExtension, SequenceHeader, parse_sequence_display_extension,
    parse_sequence_header,
};
pub use slice::{SliceHeader, WeightEntry, parse_slice_header};
pub use start_code::{AvsStartCodeType, StartCodeEntry, find_start_code, scan_start_codes};
