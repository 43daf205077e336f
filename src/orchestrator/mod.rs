//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和资源管理，是整个系统的"指挥中心"。
//!
//! ### `batch_runner` - 批量查询处理器
//! - 管理应用生命周期（初始化、运行、保证释放浏览器）
//! - 顺序遍历 Diary No 区间，一个号处理完再处理下一个
//! - 会话级失败时整体重建浏览器会话并重试（受 max_retries 约束）
//! - 相邻号之间统一停顿，作为对站点的限速礼貌
//! - 汇总统计并决定是否落盘 CSV
//!
//! ## 层次关系
//!
//! ```text
//! batch_runner (遍历 Diary No 区间)
//!     ↓
//! workflow::CaseFlow / CrawlFlow (处理单个查询)
//!     ↓
//! services (能力层：captcha / analyze / csv / snapshot / endpoint)
//!     ↓
//! infrastructure (基础设施：JsExecutor)
//! ```

pub mod batch_runner;

pub use batch_runner::App;
