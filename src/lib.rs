//! # SCI Case Scraper
//!
//! 一个按 Diary No 批量抓取法院案件状态的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 goto / eval / wait_for 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个动作
//! - `CaptchaSolver` - 验证码识别能力（OCR / 视觉模型）
//! - `ContentAnalyzer` - 内容摘要能力（失败落哨兵文本）
//! - `StatusEndpoint` - 数据接口查询能力
//! - `CsvSink` / `SnapshotWriter` - 结果落盘与调试快照能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次查询"的完整处理流程
//! - `FetchCtx` - 上下文封装（diary_no + year + attempt）
//! - `CaseFlow` - 单号查询编排（验证码 → 提交 → 等待 → 解析）
//! - `CrawlFlow` - 分页列表爬取编排
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 批量处理器，管理浏览器资源、
//!   重试决策与结果落盘

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::acquire_session;
pub use config::{Backoff, CaptchaStrategy, Config, ScrapeMode, SubmitVia};
pub use error::{AppError, Result};
pub use infrastructure::JsExecutor;
pub use models::{CaptchaChallenge, CaseRecord, CrawlRecord, FetchOutcome};
pub use orchestrator::App;
pub use workflow::{CaseFlow, CrawlFlow, FetchCtx};
