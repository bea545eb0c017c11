//! 比特流读取器.
//!
//! 提供从字节缓冲区中按位读取数据的能力, 是 AVS 语法解析的基础设施.
//!
//! 按大端位序读取 (MSB first). 除游标外不持有任何状态.

use crate::{AvsdError, AvsdResult};

/// Exp-Golomb 码字允许的最大前导零个数
const MAX_EXP_GOLOMB_LEADING_ZEROS: u32 = 31;

/// 比特流读取器
///
/// 从字节缓冲区中按位读取数据, 使用大端位序 (MSB first).
///
/// # 示例
/// ```
/// use avsd_core::bitreader::BitReader;
///
/// let data = [0b10110001, 0b01010101];
/// let mut br = BitReader::new(&data);
/// assert_eq!(br.read_bits(4).unwrap(), 0b1011);
/// assert_eq!(br.read_bits(4).unwrap(), 0b0001);
/// assert_eq!(br.read_bits(8).unwrap(), 0b01010101);
/// ```
pub struct BitReader<'a> {
    /// 源数据
    data: &'a [u8],
    /// 当前字节索引
    byte_pos: usize,
    /// 当前字节中的位位置 (0-7, 0 表示最高位)
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// 创建新的比特流读取器
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// 获取已读取的总位数
    pub fn bits_read(&self) -> usize {
        self.byte_pos * 8 + self.bit_pos as usize
    }

    /// 获取剩余可读位数
    pub fn bits_left(&self) -> usize {
        if self.byte_pos >= self.data.len() {
            return 0;
        }
        (self.data.len() - self.byte_pos) * 8 - self.bit_pos as usize
    }

    /// 是否已到达末尾
    pub fn is_eof(&self) -> bool {
        self.bits_left() == 0
    }

    /// 读取 1 个位
    pub fn read_bit(&mut self) -> AvsdResult<u32> {
        if self.byte_pos >= self.data.len() {
            return Err(AvsdError::BitstreamExhausted);
        }

        let bit = (self.data[self.byte_pos] >> (7 - self.bit_pos)) & 1;
        self.bit_pos += 1;
        if self.bit_pos >= 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok(u32::from(bit))
    }

    /// 读取 1 位标志
    pub fn read_flag(&mut self) -> AvsdResult<bool> {
        Ok(self.read_bit()? == 1)
    }

    /// 读取 marker_bit, 值必须为 1
    pub fn read_marker(&mut self, name: &str) -> AvsdResult<()> {
        if self.read_bit()? != 1 {
            return Err(AvsdError::SyntaxViolation(format!(
                "{} 应为 1, 位置={}",
                name,
                self.bits_read() - 1
            )));
        }
        Ok(())
    }

    /// 读取 N 个位 (最多 32 位)
    ///
    /// 按大端位序读取, 返回值的低 N 位有效.
    pub fn read_bits(&mut self, n: u32) -> AvsdResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        if n > 32 {
            return Err(AvsdError::InvalidArgument(format!(
                "read_bits: n={} 超过 32 位",
                n,
            )));
        }
        if (n as usize) > self.bits_left() {
            return Err(AvsdError::BitstreamExhausted);
        }

        let mut result: u32 = 0;
        let mut remaining = n;

        while remaining > 0 {
            let available = 8 - self.bit_pos as u32;
            let to_read = remaining.min(available);

            let shift = available - to_read;
            let mask = ((1u32 << to_read) - 1) as u8;
            let bits = (self.data[self.byte_pos] >> shift) & mask;

            result = (result << to_read) | u32::from(bits);

            self.bit_pos += to_read as u8;
            if self.bit_pos >= 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
            remaining -= to_read;
        }

        Ok(result)
    }

    /// 读取有符号整数 (二进制补码)
    pub fn read_bits_signed(&mut self, n: u32) -> AvsdResult<i32> {
        let val = self.read_bits(n)?;
        if n == 0 {
            return Ok(0);
        }
        if n >= 32 {
            return Ok(val as i32);
        }
        // 符号扩展: 若最高有效位为 1, 则填充高位
        if (val >> (n - 1)) & 1 != 0 {
            Ok(val as i32 | !((1i32 << n) - 1))
        } else {
            Ok(val as i32)
        }
    }

    /// 读取无符号 Exp-Golomb 编码值 ue(v)
    pub fn read_ue(&mut self) -> AvsdResult<u32> {
        let mut leading_zeros = 0u32;
        while self.read_bit()? == 0 {
            leading_zeros += 1;
            if leading_zeros > MAX_EXP_GOLOMB_LEADING_ZEROS {
                return Err(AvsdError::InvalidCode(format!(
                    "Exp-Golomb 前导零过多, 位置={}",
                    self.bits_read()
                )));
            }
        }

        if leading_zeros == 0 {
            return Ok(0);
        }

        let suffix = u64::from(self.read_bits(leading_zeros)?);
        let value = (1u64 << leading_zeros) - 1 + suffix;
        u32::try_from(value).map_err(|_| {
            AvsdError::InvalidCode(format!("Exp-Golomb 值溢出, value={}", value))
        })
    }

    /// 读取有符号 Exp-Golomb 编码值 se(v)
    pub fn read_se(&mut self) -> AvsdResult<i32> {
        let code = self.read_ue()?;
        // 映射: 0→0, 1→1, 2→-1, 3→2, 4→-2, ...
        let value = code.div_ceil(2) as i64;
        let signed = if code & 1 == 0 { -value } else { value };
        i32::try_from(signed)
            .map_err(|_| AvsdError::InvalidCode(format!("se(v) 溢出, code={}", code)))
    }

    /// 窥视 N 个位 (不移动位置)
    pub fn peek_bits(&mut self, n: u32) -> AvsdResult<u32> {
        let saved_byte = self.byte_pos;
        let saved_bit = self.bit_pos;
        let result = self.read_bits(n);
        self.byte_pos = saved_byte;
        self.bit_pos = saved_bit;
        result
    }

    /// 跳过 N 个位
    pub fn skip_bits(&mut self, n: u32) -> AvsdResult<()> {
        if (n as usize) > self.bits_left() {
            return Err(AvsdError::BitstreamExhausted);
        }

        let total_bits = self.bit_pos as u32 + n;
        self.byte_pos += (total_bits / 8) as usize;
        self.bit_pos = (total_bits % 8) as u8;

        Ok(())
    }

    /// 对齐到下一个字节边界
    ///
    /// 如果当前已在字节边界, 则不做任何事.
    pub fn align_to_byte(&mut self) {
        if self.bit_pos > 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }

    /// 获取当前字节位置
    pub fn byte_position(&self) -> usize {
        self.byte_pos
    }
}
