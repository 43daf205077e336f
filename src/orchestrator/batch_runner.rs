//! 批量查询处理器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：写日志文件头、获取浏览器会话、创建 JsExecutor
//! 2. **顺序遍历**：闭区间 [start, end] 内逐个 Diary No 处理
//! 3. **重试决策**：会话级失败重建会话后重试，其余失败直接跳过
//! 4. **限速停顿**：相邻 Diary No 之间统一停顿，成功失败一视同仁
//! 5. **资源管理**：唯一持有 Browser，退出前保证释放
//! 6. **结果落盘**：至少一条记录才写 CSV，否则报告未找到数据
//!
//! 每个 Diary No 的状态机：待处理 → 查询中 → {成功, 跳过}，
//! 查询中的自环（会话重建后重试）最多 max_retries 次。

use std::time::Duration;

use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::{Config, ScrapeMode};
use crate::error::{AppError, Result};
use crate::infrastructure::JsExecutor;
use crate::models::{CaseRecord, CrawlRecord, FetchOutcome};
use crate::services::CsvSink;
use crate::utils::logging::init_log_file;
use crate::workflow::{CaseFlow, CrawlFlow, FetchCtx};

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    executor: JsExecutor,
}

impl App {
    /// 初始化应用
    ///
    /// 浏览器会话获取失败是唯一允许中止整轮运行的错误
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let (browser, page) = browser::acquire_session(&config).await?;
        let executor = JsExecutor::new(page);

        Ok(Self {
            config,
            browser,
            executor,
        })
    }

    /// 运行应用主逻辑
    ///
    /// 无论成功失败，退出前都会尝试释放浏览器
    pub async fn run(mut self) -> Result<()> {
        let outcome = self.run_inner().await;
        self.shutdown().await;
        outcome
    }

    async fn run_inner(&mut self) -> Result<()> {
        match self.config.scrape_mode {
            ScrapeMode::CaseStatus => self.run_case_status().await,
            ScrapeMode::Crawl => self.run_crawl().await,
        }
    }

    /// 结构化案件状态模式：逐个 Diary No 查询
    async fn run_case_status(&mut self) -> Result<()> {
        let flow = CaseFlow::new(&self.config)?;
        let sink = CsvSink::new(&self.config.output_csv);

        let mut stats = ProcessingStats::default();
        let mut results: Vec<CaseRecord> = Vec::new();

        for diary_no in self.config.start_diary_no..=self.config.end_diary_no {
            match self.process_diary_no(&flow, diary_no).await {
                DiaryResult::Found(record) => {
                    info!("✅ Diary No {} 处理成功", diary_no);
                    results.push(record);
                    stats.found += 1;
                }
                DiaryResult::NotFound => {
                    info!("⚪ Diary No {} 无数据", diary_no);
                    stats.not_found += 1;
                }
                DiaryResult::Skipped => {
                    stats.skipped += 1;
                }
            }

            // 对站点的礼貌性停顿，成功失败一视同仁
            sleep(Duration::from_secs(self.config.request_delay_secs)).await;
        }

        print_final_stats(&stats, &self.config);
        persist_case_results(&sink, &results)?;
        Ok(())
    }

    /// 通用列表爬取模式
    async fn run_crawl(&mut self) -> Result<()> {
        let flow = CrawlFlow::new(&self.config);
        let sink = CsvSink::new(&self.config.output_csv);

        let records = flow.run(&self.executor).await?;
        persist_crawl_results(&sink, &records)?;
        Ok(())
    }

    /// 处理单个 Diary No（含会话级失败的重建与重试）
    async fn process_diary_no(&mut self, flow: &CaseFlow, diary_no: u32) -> DiaryResult {
        let mut ctx = FetchCtx::new(diary_no, self.config.year);

        loop {
            info!(
                "▶ 处理 Diary No {}，年份 {}（第 {}/{} 次尝试）",
                diary_no, ctx.year, ctx.attempt, self.config.max_retries
            );

            match flow.run(&self.executor, &ctx).await {
                Ok(FetchOutcome::Found(record)) => return DiaryResult::Found(record),
                Ok(FetchOutcome::NotFound) => return DiaryResult::NotFound,
                Err(e) => match classify_failure(&e, ctx.attempt, self.config.max_retries) {
                    RetryDecision::Reinit => {
                        warn!(
                            "[Diary {}] 会话失效（第 {}/{} 次尝试）: {}",
                            diary_no, ctx.attempt, self.config.max_retries, e
                        );
                        if let Err(re) = self.reinit_session().await {
                            error!("[Diary {}] 会话重建失败: {}", diary_no, re);
                        }
                        sleep(self.config.backoff.delay(ctx.attempt)).await;
                        ctx.attempt += 1;
                    }
                    RetryDecision::GiveUp => {
                        error!("[Diary {}] ❌ 放弃: {}", diary_no, e);
                        return DiaryResult::Skipped;
                    }
                },
            }
        }
    }

    /// 整体重建浏览器会话
    async fn reinit_session(&mut self) -> Result<()> {
        warn!("🔄 正在重建浏览器会话...");
        if let Err(e) = self.browser.close().await {
            warn!("旧会话关闭失败（忽略）: {}", e);
        }

        let (browser, page) = browser::acquire_session(&self.config).await?;
        self.browser = browser;
        self.executor = JsExecutor::new(page);
        info!("✓ 浏览器会话已重建");
        Ok(())
    }

    /// 释放浏览器资源
    async fn shutdown(&mut self) {
        info!("正在释放浏览器资源...");
        if let Err(e) = self.browser.close().await {
            warn!("释放浏览器失败: {}", e);
        }
    }
}

/// 单个 Diary No 的最终去向
enum DiaryResult {
    Found(CaseRecord),
    NotFound,
    Skipped,
}

/// 重试决策
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RetryDecision {
    /// 重建会话后重试
    Reinit,
    /// 放弃本号，处理下一个
    GiveUp,
}

/// 会话级错误在尝试次数未用尽时重试，其余错误直接放弃
pub(crate) fn classify_failure(err: &AppError, attempt: u32, max_retries: u32) -> RetryDecision {
    if err.is_recoverable() && attempt < max_retries {
        RetryDecision::Reinit
    } else {
        RetryDecision::GiveUp
    }
}

/// 至少一条记录才写 CSV；空结果不建文件，返回是否落盘
pub(crate) fn persist_case_results(sink: &CsvSink, records: &[CaseRecord]) -> Result<bool> {
    if records.is_empty() {
        warn!("⚠️ 没有抓到任何数据，不生成 CSV 文件");
        return Ok(false);
    }
    sink.write_case_records(records)?;
    info!(
        "💾 已写出 {} 条记录到 {}",
        records.len(),
        sink.path().display()
    );
    Ok(true)
}

pub(crate) fn persist_crawl_results(sink: &CsvSink, records: &[CrawlRecord]) -> Result<bool> {
    if records.is_empty() {
        warn!("⚠️ 没有抓到任何数据，不生成 CSV 文件");
        return Ok(false);
    }
    sink.write_crawl_records(records)?;
    info!(
        "💾 已写出 {} 条记录到 {}",
        records.len(),
        sink.path().display()
    );
    Ok(true)
}

/// 处理统计
#[derive(Debug, Default)]
struct ProcessingStats {
    found: usize,
    not_found: usize,
    skipped: usize,
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 案件状态批量抓取");
    info!(
        "📋 Diary No 区间: {}-{}，年份: {}",
        config.start_diary_no, config.end_diary_no, config.year
    );
    info!(
        "📊 最大尝试次数: {}，号间停顿: {} 秒",
        config.max_retries, config.request_delay_secs
    );
    info!("{}", "=".repeat(60));
}

fn print_final_stats(stats: &ProcessingStats, config: &Config) {
    let total = stats.found + stats.not_found + stats.skipped;
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 命中: {}/{}", stats.found, total);
    info!("⚪ 无记录: {}", stats.not_found);
    info!("❌ 跳过: {}", stats.skipped);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", config.output_log_file);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_retry_until_attempts_exhausted() {
        // max_retries=3：三次连续会话失败 → 重试、重试、放弃，恰好一次跳过
        let err = AppError::Session("window closed".to_string());
        assert_eq!(classify_failure(&err, 1, 3), RetryDecision::Reinit);
        assert_eq!(classify_failure(&err, 2, 3), RetryDecision::Reinit);
        assert_eq!(classify_failure(&err, 3, 3), RetryDecision::GiveUp);
    }

    #[test]
    fn non_recoverable_errors_give_up_immediately() {
        let timeout = AppError::Timeout("结果容器".to_string());
        assert_eq!(classify_failure(&timeout, 1, 3), RetryDecision::GiveUp);

        let solver = AppError::Solver("ocr".to_string());
        assert_eq!(classify_failure(&solver, 1, 3), RetryDecision::GiveUp);
    }

    #[test]
    fn empty_results_do_not_create_csv() {
        let path =
            std::env::temp_dir().join(format!("no_data_{}.csv", std::process::id()));
        let sink = CsvSink::new(&path);

        let written = persist_case_results(&sink, &[]).unwrap();
        assert!(!written);
        assert!(!path.exists());
    }

    #[test]
    fn non_empty_results_are_persisted() {
        let path =
            std::env::temp_dir().join(format!("with_data_{}.csv", std::process::id()));
        let sink = CsvSink::new(&path);
        let records = vec![CaseRecord {
            diary_no: 1,
            year: 2024,
            case_no: "W.P.(C) 1/2024".to_string(),
            petitioner: String::new(),
            respondent: String::new(),
            petitioner_advocate: String::new(),
            respondent_advocate: String::new(),
            last_listed_on: String::new(),
            status: String::new(),
            last_order: String::new(),
        }];

        let written = persist_case_results(&sink, &records).unwrap();
        assert!(written);
        assert!(path.exists());

        let _ = std::fs::remove_file(&path);
    }
}
