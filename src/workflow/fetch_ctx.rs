//! 查询上下文
//!
//! 封装"正在查哪个 Diary No、第几次尝试"这一信息

use std::fmt::Display;

/// 单个 Diary No 查询的上下文
///
/// 只在重试循环内部存活，成功或放弃后即丢弃
#[derive(Debug, Clone)]
pub struct FetchCtx {
    /// Diary No（站点的收案编号，主查询键）
    pub diary_no: u32,

    /// 查询年份
    pub year: u16,

    /// 当前尝试次数（从 1 开始，用于日志与重试判定）
    pub attempt: u32,
}

impl FetchCtx {
    /// 创建新的查询上下文
    pub fn new(diary_no: u32, year: u16) -> Self {
        Self {
            diary_no,
            year,
            attempt: 1,
        }
    }
}

impl Display for FetchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Diary {} 年份 {} 第 {} 次尝试]",
            self.diary_no, self.year, self.attempt
        )
    }
}
