//! 列表爬取流程 - 流程层
//!
//! 站点的分页列表模式：逐页解析 diary 条目，抓取链接正文并生成摘要。
//! 单页超时只落快照并继续下一页，不中断整轮爬取。

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::infrastructure::JsExecutor;
use crate::models::CrawlRecord;
use crate::services::{
    AnalyzeContent, CaptchaSolver, ContentAnalyzer, SnapshotWriter, SolveCaptcha, ANALYSIS_FAILED,
};
use crate::workflow::captcha_step::{self, CAPTCHA_INPUT_ID};

const SUBMIT_BUTTON_ID: &str = "getDetails";
const RESULTS_CONTAINER_ID: &str = "cnrResultsDetails";

/// 列表页一条 diary 条目的原始字段
#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    diary_no: String,
    #[serde(default)]
    year: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
}

/// 列表爬取流程
pub struct CrawlFlow {
    solver: Box<dyn SolveCaptcha>,
    analyzer: Box<dyn AnalyzeContent>,
    snapshots: SnapshotWriter,
    http: reqwest::Client,
    target_url: String,
    pages: u32,
    captcha_timeout: Duration,
    results_timeout: Duration,
    manual_captcha_fallback: bool,
}

impl CrawlFlow {
    /// 创建新的列表爬取流程（真实外部服务）
    pub fn new(config: &Config) -> Self {
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
    ) -> Self {
        Self {
            solver,
            analyzer,
            snapshots: SnapshotWriter::new(&config.snapshot_dir),
            http: reqwest::Client::new(),
            target_url: config.target_url.clone(),
            pages: config.crawl_pages,
            captcha_timeout: Duration::from_secs(config.captcha_timeout_secs),
            results_timeout: Duration::from_secs(config.results_timeout_secs),
            manual_captcha_fallback: config.manual_captcha_fallback,
        }
    }

    /// 逐页爬取，返回全部条目（顺序即页面顺序）
    pub async fn run(&self, executor: &JsExecutor) -> Result<Vec<CrawlRecord>> {
        executor.goto(&self.target_url).await?;

        let mut records = Vec::new();
        for page_no in 1..=self.pages {
            info!("📄 正在处理第 {}/{} 页", page_no, self.pages);

            match self.scrape_page(executor).await {
                Ok(mut rows) => {
                    info!("✓ 第 {} 页解析到 {} 条", page_no, rows.len());
                    records.append(&mut rows);
                }
                Err(AppError::Timeout(msg)) => {
                    warn!("⚠️ 第 {} 页等待超时: {}，保存快照后继续", page_no, msg);
                    self.snapshot_page(executor).await;
                    continue;
                }
                Err(e) => return Err(e),
            }

            if !self.go_to_next_page(executor).await? {
                info!("没有下一页，提前结束");
                break;
            }
        }

        Ok(records)
    }

    /// 处理当前页：过验证码 → 等结果 → 解析条目 → 逐条分析
    async fn scrape_page(&self, executor: &JsExecutor) -> Result<Vec<CrawlRecord>> {
        let challenge = captcha_step::acquire_challenge(executor, self.captcha_timeout).await?;
        let answer = captcha_step::resolve_challenge(
            self.solver.as_ref(),
            &challenge,
            self.manual_captcha_fallback,
        )
        .await?;

        let answer_js = serde_json::to_string(&answer)?;
        executor
            .eval(format!(
                r#"
                (() => {{
                    document.getElementById('{captcha_id}').value = {answer};
                    document.getElementById('{submit_id}').click();
                    return true;
                }})()
                "#,
                captcha_id = CAPTCHA_INPUT_ID,
                answer = answer_js,
                submit_id = SUBMIT_BUTTON_ID,
            ))
            .await?;

        executor
            .wait_for(
                &format!("!!document.getElementById('{}')", RESULTS_CONTAINER_ID),
                self.results_timeout,
                "结果容器",
            )
            .await?;

        let raws: Vec<RawEntry> = executor.eval_as(extract_entries_js()).await?;

        let mut records = Vec::with_capacity(raws.len());
        for raw in raws {
            let analysis = self.analyze_link(&raw.link).await;
            records.push(CrawlRecord {
                diary_no: raw.diary_no,
                year: raw.year,
                title: raw.title,
                link: raw.link,
                analysis,
            });
        }
        Ok(records)
    }

    /// 抓取链接正文并生成摘要；链接缺失返回空串，抓取失败给哨兵文本
    async fn analyze_link(&self, link: &str) -> String {
        if link.is_empty() || link == "N/A" {
            return String::new();
        }

        let html = match self.fetch_html(link).await {
            Ok(html) => html,
            Err(e) => {
                warn!("抓取链接正文失败 {}: {}", link, e);
                return ANALYSIS_FAILED.to_string();
            }
        };

        let text = match visible_text(&html) {
            Ok(text) => text,
            Err(e) => {
                warn!("正文清洗失败 {}: {}", link, e);
                html
            }
        };

        self.analyzer.summarize(&text).await
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.http.get(url).timeout(self.results_timeout).send().await?;
        Ok(response.text().await?)
    }

    /// 点击下一页；按钮缺失或禁用时返回 false
    async fn go_to_next_page(&self, executor: &JsExecutor) -> Result<bool> {
        let clicked: bool = executor
            .eval_as(
                r#"
                (() => {
                    const btn = document.querySelector('.next-button');
                    if (btn && !btn.disabled) {
                        btn.click();
                        return true;
                    }
                    return false;
                })()
                "#,
            )
            .await?;

        if clicked {
            // 给站点留出换页加载时间
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        Ok(clicked)
    }

    /// 把当前页面源码落成调试快照（尽力而为）
    async fn snapshot_page(&self, executor: &JsExecutor) {
        match executor.page_html().await {
            Ok(html) => {
                if let Err(e) = self.snapshots.write(&html) {
                    warn!("保存调试快照失败: {}", e);
                }
            }
            Err(e) => warn!("无法读取页面源码: {}", e),
        }
    }
}

/// 解析列表页全部 diary 条目的脚本；标题/链接缺失按 N/A 处理
fn extract_entries_js() -> String {
    format!(
        r#"
        (() => {{
            const container = document.getElementById('{container}');
            const entries = container
                ? Array.from(container.querySelectorAll('.diary-entry'))
                : [];
            return entries.map((entry) => {{
                const text = (cls) => {{
                    const el = entry.querySelector(cls);
                    return el ? el.textContent.trim() : '';
                }};
                const titleEl = entry.querySelector('h2');
                const linkEl = entry.querySelector('a');
                return {{
                    diary_no: text('.diary_no'),
                    year: text('.year'),
                    title: titleEl ? titleEl.textContent.trim() : 'N/A',
                    link: linkEl ? (linkEl.getAttribute('href') || 'N/A') : 'N/A',
                }};
            }});
        }})()
        "#,
        container = RESULTS_CONTAINER_ID,
    )
}

/// 去掉脚本、样式与标签，压成可供摘要的纯文本
fn visible_text(html: &str) -> Result<String> {
    let script_re = Regex::new(r"(?is)<script[^>]*>.*?</script>")
        .map_err(|e| AppError::Analysis(format!("正则构建失败: {}", e)))?;
    let style_re = Regex::new(r"(?is)<style[^>]*>.*?</style>")
        .map_err(|e| AppError::Analysis(format!("正则构建失败: {}", e)))?;
    let tag_re = Regex::new(r"(?s)<[^>]*>")
        .map_err(|e| AppError::Analysis(format!("正则构建失败: {}", e)))?;

    let without_scripts = script_re.replace_all(html, " ");
    let without_styles = style_re.replace_all(&without_scripts, " ");
    let without_tags = tag_re.replace_all(&without_styles, " ");

    Ok(without_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_text_strips_tags_and_scripts() {
        let html = r#"
            <html><head><style>body { color: red; }</style></head>
            <body><script>var x = 1;</script>
            <h1>Case  Title</h1><p>Order   passed.</p></body></html>
        "#;
        assert_eq!(visible_text(html).unwrap(), "Case Title Order passed.");
    }

    #[test]
    fn raw_entries_tolerate_missing_fields() {
        let raws: Vec<RawEntry> = serde_json::from_str(
            r#"[{"diary_no": "7", "year": "2024", "title": "N/A", "link": "N/A"}, {}]"#,
        )
        .unwrap();
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[0].diary_no, "7");
        assert_eq!(raws[1].title, "");
    }
}
