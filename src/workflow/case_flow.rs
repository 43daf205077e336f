//! 案件查询流程 - 流程层
//!
//! 定义"一个 Diary No"的完整查询流程：
//! 1. 打开查询页，等验证码图片出现
//! 2. 识别验证码（可选人工兜底）
//! 3. 提交 Diary No + 年份 + 验证码答案（表单或数据接口）
//! 4. 限时等待结果容器
//! 5. 解析字段，缺失填空串；命中且启用分析时对 Last Order 生成摘要
//!
//! 超时会在返回错误前把页面源码落成调试快照。

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{Config, SubmitVia};
use crate::error::{AppError, Result};
use crate::infrastructure::JsExecutor;
use crate::models::{CaseRecord, FetchOutcome};
use crate::services::{
    AnalyzeContent, CaptchaSolver, ContentAnalyzer, SnapshotWriter, SolveCaptcha, StatusEndpoint,
};
use crate::utils::logging::truncate_text;
use crate::workflow::captcha_step::{self, CAPTCHA_INPUT_ID};
use crate::workflow::fetch_ctx::FetchCtx;

/// 查询表单各元素的 ID（站点结构变更时只需改这里）
const DIARY_NO_INPUT_ID: &str = "diary_no";
const DIARY_YEAR_INPUT_ID: &str = "diary_year";
const SUBMIT_BUTTON_ID: &str = "getDetails";
const RESULTS_CONTAINER_ID: &str = "cnrResultsDetails";

/// 结果容器里解析出的原始字段
#[derive(Debug, Default, Deserialize)]
struct RawCaseDetails {
    /// 容器里是否真的出现了案件条目
    #[serde(default)]
    has_entry: bool,
    #[serde(default)]
    case_no: String,
    #[serde(default)]
    petitioner: String,
    #[serde(default)]
    respondent: String,
    #[serde(default)]
    petitioner_advocate: String,
    #[serde(default)]
    respondent_advocate: String,
    #[serde(default)]
    last_listed_on: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    last_order: String,
}

/// 案件查询流程
///
/// - 编排单个 Diary No 的完整查询
/// - 不持有任何浏览器资源（executor 由编排层传入）
/// - 只依赖业务能力（services）
pub struct CaseFlow {
    solver: Box<dyn SolveCaptcha>,
    analyzer: Box<dyn AnalyzeContent>,
    endpoint: StatusEndpoint,
    snapshots: SnapshotWriter,
    target_url: String,
    submit_via: SubmitVia,
    captcha_timeout: Duration,
    results_timeout: Duration,
    manual_captcha_fallback: bool,
    analyze_orders: bool,
}

impl CaseFlow {
    /// 创建新的案件查询流程（真实外部服务）
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_capabilities(
            config,
            Box::new(CaptchaSolver::new(config)),
            Box::new(ContentAnalyzer::new(config)),
        )
    }

    /// 注入自定义识别/分析实现（测试或替换实现用）
    pub fn with_capabilities(
        config: &Config,
        solver: Box<dyn SolveCaptcha>,
        analyzer: Box<dyn AnalyzeContent>,
    ) -> Result<Self> {
        Ok(Self {
            solver,
            analyzer,
            endpoint: StatusEndpoint::new(config)?,
            snapshots: SnapshotWriter::new(&config.snapshot_dir),
            target_url: config.target_url.clone(),
            submit_via: config.submit_via,
            captcha_timeout: Duration::from_secs(config.captcha_timeout_secs),
            results_timeout: Duration::from_secs(config.results_timeout_secs),
            manual_captcha_fallback: config.manual_captcha_fallback,
            analyze_orders: config.analyze_orders,
        })
    }

    /// 执行一次完整查询
    pub async fn run(&self, executor: &JsExecutor, ctx: &FetchCtx) -> Result<FetchOutcome> {
        let result = self.run_inner(executor, ctx).await;

        // 超时是唯一触发诊断快照的失败
        if matches!(result, Err(AppError::Timeout(_))) {
            self.snapshot_page(executor, ctx).await;
        }
        result
    }

    async fn run_inner(&self, executor: &JsExecutor, ctx: &FetchCtx) -> Result<FetchOutcome> {
        info!("[Diary {}] 打开查询页面...", ctx.diary_no);
        executor.goto(&self.target_url).await?;

        let challenge = captcha_step::acquire_challenge(executor, self.captcha_timeout).await?;

        let answer =
            captcha_step::resolve_challenge(self.solver.as_ref(), &challenge, self.manual_captcha_fallback)
                .await?;
        info!("[Diary {}] ✓ 验证码答案: {}", ctx.diary_no, answer);

        match self.submit_via {
            SubmitVia::Form => self.submit_via_form(executor, ctx, &answer).await,
            SubmitVia::Endpoint => self.submit_via_endpoint(ctx, &answer).await,
        }
    }

    /// 表单通道：JS 填表 + 点击提交，等结果容器出现后解析
    async fn submit_via_form(
        &self,
        executor: &JsExecutor,
        ctx: &FetchCtx,
        captcha_answer: &str,
    ) -> Result<FetchOutcome> {
        info!("[Diary {}] 📤 提交查询表单...", ctx.diary_no);

        // 答案可能来自视觉模型的自由文本，序列化成 JS 字符串防止破坏脚本
        let answer_js = serde_json::to_string(captcha_answer)?;
        let fill_js = format!(
            r#"
            (() => {{
                document.getElementById('{diary_id}').value = '{diary_no}';
                document.getElementById('{year_id}').value = '{year}';
                document.getElementById('{captcha_id}').value = {answer};
                document.getElementById('{submit_id}').click();
                return true;
            }})()
            "#,
            diary_id = DIARY_NO_INPUT_ID,
            diary_no = ctx.diary_no,
            year_id = DIARY_YEAR_INPUT_ID,
            year = ctx.year,
            captcha_id = CAPTCHA_INPUT_ID,
            answer = answer_js,
            submit_id = SUBMIT_BUTTON_ID,
        );
        executor.eval(fill_js).await?;

        executor
            .wait_for(
                &format!("!!document.getElementById('{}')", RESULTS_CONTAINER_ID),
                self.results_timeout,
                "结果容器",
            )
            .await?;

        let raw: RawCaseDetails = executor.eval_as(extract_details_js()).await?;
        self.build_record(raw, ctx).await
    }

    /// 接口通道：验证码答案与会话令牌随 query 参数直达数据接口
    async fn submit_via_endpoint(&self, ctx: &FetchCtx, answer: &str) -> Result<FetchOutcome> {
        info!("[Diary {}] 📤 调用数据接口查询...", ctx.diary_no);

        match self.endpoint.fetch_case(ctx.diary_no, ctx.year, answer).await? {
            Some(mut record) => {
                if self.analyze_orders && !record.last_order.is_empty() {
                    record.last_order = self.analyzer.summarize(&record.last_order).await;
                }
                Ok(FetchOutcome::Found(record))
            }
            None => Ok(FetchOutcome::NotFound),
        }
    }

    /// 原始字段 → 记录；无条目或全空视为站点无记录
    async fn build_record(&self, raw: RawCaseDetails, ctx: &FetchCtx) -> Result<FetchOutcome> {
        if !raw.has_entry {
            return Ok(FetchOutcome::NotFound);
        }

        let mut record = CaseRecord {
            diary_no: ctx.diary_no,
            year: ctx.year,
            case_no: clean_text(&raw.case_no),
            petitioner: clean_text(&raw.petitioner),
            respondent: clean_text(&raw.respondent),
            petitioner_advocate: clean_text(&raw.petitioner_advocate),
            respondent_advocate: clean_text(&raw.respondent_advocate),
            last_listed_on: clean_text(&raw.last_listed_on),
            status: clean_text(&raw.status),
            last_order: clean_text(&raw.last_order),
        };

        if record.is_empty() {
            return Ok(FetchOutcome::NotFound);
        }

        debug!(
            "[Diary {}] 解析到案件: {}",
            ctx.diary_no,
            truncate_text(&record.case_no, 40)
        );

        if self.analyze_orders && !record.last_order.is_empty() {
            record.last_order = self.analyzer.summarize(&record.last_order).await;
        }

        Ok(FetchOutcome::Found(record))
    }

    /// 把当前页面源码落成调试快照（尽力而为，失败只记日志）
    async fn snapshot_page(&self, executor: &JsExecutor, ctx: &FetchCtx) {
        match executor.page_html().await {
            Ok(html) => match self.snapshots.write(&html) {
                Ok(path) => warn!(
                    "[Diary {}] 已保存调试快照: {}",
                    ctx.diary_no,
                    path.display()
                ),
                Err(e) => warn!("[Diary {}] 保存调试快照失败: {}", ctx.diary_no, e),
            },
            Err(e) => warn!("[Diary {}] 无法读取页面源码: {}", ctx.diary_no, e),
        }
    }
}

/// 从结果容器提取各字段的脚本；元素缺失一律给空串
fn extract_details_js() -> String {
    format!(
        r#"
        (() => {{
            const container = document.getElementById('{container}');
            const entry = container ? container.querySelector('.diary-entry') : null;
            const text = (cls) => {{
                if (!entry) return '';
                const el = entry.querySelector(cls);
                return el ? el.textContent.trim() : '';
            }};
            return {{
                has_entry: !!entry,
                case_no: text('.case_no'),
                petitioner: text('.petitioner'),
                respondent: text('.respondent'),
                petitioner_advocate: text('.pet_advocate'),
                respondent_advocate: text('.resp_advocate'),
                last_listed_on: text('.last_listed'),
                status: text('.case_status'),
                last_order: text('.last_order'),
            }};
        }})()
        "#,
        container = RESULTS_CONTAINER_ID,
    )
}

/// 压缩抓取文本中的换行与连续空白
fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::models::CaptchaChallenge;

    struct FixedSolver;

    #[async_trait]
    impl SolveCaptcha for FixedSolver {
        async fn solve(&self, _challenge: &CaptchaChallenge) -> Result<String> {
            Ok("123456".to_string())
        }
    }

    struct FixedAnalyzer;

    #[async_trait]
    impl AnalyzeContent for FixedAnalyzer {
        async fn summarize(&self, _content: &str) -> String {
            "SUMMARY".to_string()
        }
    }

    fn test_flow() -> CaseFlow {
        CaseFlow::with_capabilities(
            &Config::default(),
            Box::new(FixedSolver),
            Box::new(FixedAnalyzer),
        )
        .unwrap()
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  W.P.(C)\n  5/2024 "), "W.P.(C) 5/2024");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn raw_details_tolerate_missing_fields() {
        let raw: RawCaseDetails =
            serde_json::from_str(r#"{"has_entry": true, "case_no": "W.P.(C) 1/2024"}"#).unwrap();
        assert!(raw.has_entry);
        assert_eq!(raw.case_no, "W.P.(C) 1/2024");
        assert_eq!(raw.petitioner, "");
    }

    #[tokio::test]
    async fn entryless_container_is_not_found() {
        let flow = test_flow();
        let ctx = FetchCtx::new(5, 2024);
        let raw = RawCaseDetails::default();

        let outcome = flow.build_record(raw, &ctx).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn all_empty_entry_is_not_found() {
        let flow = test_flow();
        let ctx = FetchCtx::new(5, 2024);
        let raw = RawCaseDetails {
            has_entry: true,
            ..Default::default()
        };

        let outcome = flow.build_record(raw, &ctx).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::NotFound));
    }

    #[tokio::test]
    async fn found_entry_is_cleaned_and_order_summarized() {
        let flow = test_flow();
        let ctx = FetchCtx::new(3, 2024);
        let raw = RawCaseDetails {
            has_entry: true,
            case_no: "  W.P.(C)\n3/2024 ".to_string(),
            petitioner: "Some  Petitioner".to_string(),
            last_order: "Long order text".to_string(),
            ..Default::default()
        };

        let outcome = flow.build_record(raw, &ctx).await.unwrap();
        match outcome {
            FetchOutcome::Found(record) => {
                assert_eq!(record.diary_no, 3);
                assert_eq!(record.case_no, "W.P.(C) 3/2024");
                assert_eq!(record.petitioner, "Some Petitioner");
                assert_eq!(record.last_order, "SUMMARY");
            }
            FetchOutcome::NotFound => panic!("应当命中记录"),
        }
    }
}
