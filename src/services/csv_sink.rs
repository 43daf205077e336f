//! CSV 输出 - 业务能力层
//!
//! 只负责"整批落盘"能力：表头 + 每条记录一行，一次写完。
//! 是否落盘（空结果不建文件）由编排层决定。

use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::debug;

use crate::error::Result;
use crate::models::{CaseRecord, CrawlRecord};

/// 结构化案件状态模式的表头
const CASE_HEADERS: [&str; 10] = [
    "Diary No",
    "Year",
    "Case No",
    "Petitioner",
    "Respondent",
    "Pet. Advocate",
    "Resp. Advocate",
    "Last Listed On",
    "Status",
    "Last Order",
];

/// 通用列表爬取模式的表头
const CRAWL_HEADERS: [&str; 5] = ["Diary No", "Year", "Title", "Link", "Analysis"];

/// CSV 输出服务
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 一次性写出全部案件记录（含表头），行序即传入顺序
    pub fn write_case_records(&self, records: &[CaseRecord]) -> Result<()> {
        debug!("写出 {} 条案件记录到 {}", records.len(), self.path.display());

        let mut writer = Writer::from_path(&self.path)?;
        writer.write_record(&CASE_HEADERS)?;
        for record in records {
            writer.write_record(&[
                record.diary_no.to_string(),
                record.year.to_string(),
                record.case_no.clone(),
                record.petitioner.clone(),
                record.respondent.clone(),
                record.petitioner_advocate.clone(),
                record.respondent_advocate.clone(),
                record.last_listed_on.clone(),
                record.status.clone(),
                record.last_order.clone(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// 一次性写出全部列表记录（含表头）
    pub fn write_crawl_records(&self, records: &[CrawlRecord]) -> Result<()> {
        debug!("写出 {} 条列表记录到 {}", records.len(), self.path.display());

        let mut writer = Writer::from_path(&self.path)?;
        writer.write_record(&CRAWL_HEADERS)?;
        for record in records {
            writer.write_record(&[
                record.diary_no.clone(),
                record.year.clone(),
                record.title.clone(),
                record.link.clone(),
                record.analysis.clone(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_record(diary_no: u32) -> CaseRecord {
        CaseRecord {
            diary_no,
            year: 2024,
            case_no: format!("W.P.(C) {}/2024", diary_no),
            petitioner: format!("Petitioner {}", diary_no),
            respondent: "Union of India".to_string(),
            petitioner_advocate: "A. Kumar".to_string(),
            respondent_advocate: "B. Singh".to_string(),
            last_listed_on: "2024-03-15".to_string(),
            status: "Pending".to_string(),
            last_order: "Notice issued".to_string(),
        }
    }

    fn temp_csv(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}_{}.csv", name, std::process::id()))
    }

    #[test]
    fn case_records_round_trip_preserves_order_and_values() {
        let path = temp_csv("case_round_trip");
        let sink = CsvSink::new(&path);
        let records: Vec<CaseRecord> = (1..=3).map(case_record).collect();

        sink.write_case_records(&records).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("Diary No"));
        assert_eq!(headers.get(2), Some("Case No"));

        let rows: Vec<csv::StringRecord> =
            reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        for (i, row) in rows.iter().enumerate() {
            let expected = &records[i];
            assert_eq!(row.get(0).unwrap(), expected.diary_no.to_string());
            assert_eq!(row.get(1).unwrap(), expected.year.to_string());
            assert_eq!(row.get(2).unwrap(), expected.case_no);
            assert_eq!(row.get(3).unwrap(), expected.petitioner);
            assert_eq!(row.get(9).unwrap(), expected.last_order);
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn crawl_records_get_crawl_headers() {
        let path = temp_csv("crawl_headers");
        let sink = CsvSink::new(&path);
        let records = vec![CrawlRecord {
            diary_no: "7".to_string(),
            year: "2024".to_string(),
            title: "N/A".to_string(),
            link: "N/A".to_string(),
            analysis: String::new(),
        }];

        sink.write_crawl_records(&records).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["Diary No", "Year", "Title", "Link", "Analysis"]
        );
        assert_eq!(reader.records().count(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
