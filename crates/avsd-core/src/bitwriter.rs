//! 比特流写入器.
//!
//! 按大端位序 (MSB first) 写入, 与 [`BitReader`](crate::bitreader::BitReader) 对应.
//! 主要用于构造测试码流与基准测试输入.

/// 比特流写入器
///
/// # 示例
/// ```
/// use avsd_core::bitwriter::BitWriter;
///
/// let mut bw = BitWriter::new();
/// bw.write_bits(0b1011, 4);
/// bw.write_ue(0);
/// bw.write_bits(0b000, 3);
/// assert_eq!(bw.finish(), vec![0b10111000]);
/// ```
pub struct BitWriter {
    /// 输出缓冲区
    data: Vec<u8>,
    /// 当前字节 (正在填充)
    current_byte: u8,
    /// 当前字节中已填充的位数 (0-7)
    bit_count: u8,
}

impl BitWriter {
    /// 创建新的比特流写入器
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// 获取已写入的总位数
    pub fn bits_written(&self) -> usize {
        self.data.len() * 8 + self.bit_count as usize
    }

    /// 写入 1 个位
    pub fn write_bit(&mut self, bit: u32) {
        self.current_byte = (self.current_byte << 1) | (bit & 1) as u8;
        self.bit_count += 1;
        if self.bit_count >= 8 {
            self.data.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 写入布尔标志
    pub fn write_flag(&mut self, flag: bool) {
        self.write_bit(u32::from(flag));
    }

    /// 写入 N 个位 (最多 32 位), 值的低 N 位有效
    pub fn write_bits(&mut self, value: u32, n: u32) {
        debug_assert!(n <= 32, "write_bits: n={} 超过 32 位", n);
        for i in (0..n).rev() {
            self.write_bit((value >> i) & 1);
        }
    }

    /// 写入有符号整数 (二进制补码)
    pub fn write_bits_signed(&mut self, value: i32, n: u32) {
        let mask = ((1u64 << n) - 1) as u32;
        self.write_bits((value as u32) & mask, n);
    }

    /// 写入无符号 Exp-Golomb 编码 ue(v)
    pub fn write_ue(&mut self, value: u32) {
        let code = u64::from(value) + 1;
        let num_bits = 64 - code.leading_zeros();
        for _ in 0..num_bits - 1 {
            self.write_bit(0);
        }
        for i in (0..num_bits).rev() {
            self.write_bit(((code >> i) & 1) as u32);
        }
    }

    /// 写入有符号 Exp-Golomb 编码 se(v)
    pub fn write_se(&mut self, value: i32) {
        let code = if value <= 0 {
            (-2 * i64::from(value)) as u32
        } else {
            (2 * i64::from(value) - 1) as u32
        };
        self.write_ue(code);
    }

    /// 写入 `00 00 01 code` 起始码 (先对齐到字节边界)
    pub fn write_start_code(&mut self, code: u8) {
        self.align_to_byte();
        self.data.extend_from_slice(&[0x00, 0x00, 0x01, code]);
    }

    /// 对齐到字节边界 (用 0 填充)
    pub fn align_to_byte(&mut self) {
        if self.bit_count > 0 {
            let pad = 8 - self.bit_count;
            self.current_byte <<= pad;
            self.data.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// 写入完整字节
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.bit_count == 0 {
            self.data.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(u32::from(b), 8);
            }
        }
    }

    /// 完成写入, 返回字节数据
    ///
    /// 如果当前不在字节边界, 自动用 0 填充.
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.data
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}
