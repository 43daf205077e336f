use serde::{Deserialize, Serialize};

/// 一条结构化案件状态记录
///
/// 每次成功查询构造一条，此后不再修改；写入 CSV 后即丢弃，
/// 运行期间不做跨记录的内存累积之外的任何关联。
/// 所有文本字段都是确定存在的字符串，允许为空，绝不缺失。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub diary_no: u32,
    pub year: u16,
    #[serde(default)]
    pub case_no: String,
    #[serde(default)]
    pub petitioner: String,
    #[serde(default)]
    pub respondent: String,
    #[serde(default)]
    pub petitioner_advocate: String,
    #[serde(default)]
    pub respondent_advocate: String,
    #[serde(default)]
    pub last_listed_on: String,
    #[serde(default)]
    pub status: String,
    /// 最近一次命令的原文，或其摘要（启用内容分析时）
    #[serde(default)]
    pub last_order: String,
}

impl CaseRecord {
    /// 所有文本字段是否全为空（全空视同站点无记录）
    pub fn is_empty(&self) -> bool {
        self.case_no.is_empty()
            && self.petitioner.is_empty()
            && self.respondent.is_empty()
            && self.petitioner_advocate.is_empty()
            && self.respondent_advocate.is_empty()
            && self.last_listed_on.is_empty()
            && self.status.is_empty()
            && self.last_order.is_empty()
    }
}

/// 通用列表爬取模式的一条记录
///
/// 站点列表页给什么就存什么，标题/链接缺失时按 "N/A" 处理
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub diary_no: String,
    pub year: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub analysis: String,
}

/// 单个 Diary No 查询的结果
///
/// 站点明确无此案件与瞬时错误是两回事：前者走 `NotFound`，
/// 后者以 `Err(AppError)` 形式交给编排层分类处置
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 查到记录
    Found(CaseRecord),
    /// 站点无此案件
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_with_only_ids_is_empty() {
        let record = CaseRecord {
            diary_no: 12,
            year: 2024,
            case_no: String::new(),
            petitioner: String::new(),
            respondent: String::new(),
            petitioner_advocate: String::new(),
            respondent_advocate: String::new(),
            last_listed_on: String::new(),
            status: String::new(),
            last_order: String::new(),
        };
        assert!(record.is_empty());
    }

    #[test]
    fn record_with_any_field_is_not_empty() {
        let record = CaseRecord {
            diary_no: 12,
            year: 2024,
            case_no: "W.P.(C) 12/2024".to_string(),
            petitioner: String::new(),
            respondent: String::new(),
            petitioner_advocate: String::new(),
            respondent_advocate: String::new(),
            last_listed_on: String::new(),
            status: String::new(),
            last_order: String::new(),
        };
        assert!(!record.is_empty());
    }
}
