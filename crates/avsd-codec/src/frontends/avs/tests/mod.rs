//! AVS 前端端到端测试: 由写入器合成码流, 驱动解析器并检查硬件任务.

mod completion;
mod helpers;
mod split;
