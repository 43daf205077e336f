use std::time::Duration;

/// 抓取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    /// 结构化案件状态模式：按 Diary No 逐号精确查询
    CaseStatus,
    /// 通用列表爬取模式：逐页抓取 diary 条目的标题与链接
    Crawl,
}

impl ScrapeMode {
    /// 尝试从字符串解析模式
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "case_status" | "case" => Some(ScrapeMode::CaseStatus),
            "crawl" | "list" => Some(ScrapeMode::Crawl),
            _ => None,
        }
    }
}

/// 查询提交通道
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitVia {
    /// 模拟页面表单交互
    Form,
    /// 直接调用站点的 JSON 数据接口（携带会话令牌）
    Endpoint,
}

impl SubmitVia {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "form" => Some(SubmitVia::Form),
            "endpoint" | "api" => Some(SubmitVia::Endpoint),
            _ => None,
        }
    }
}

/// 验证码识别策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptchaStrategy {
    /// 本地 OCR（灰度 + 固定阈值二值化 + 纯数字识别）
    Ocr,
    /// 外部视觉模型（图片原样转发，返回文本原样使用）
    Vision,
}

impl CaptchaStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ocr" | "tesseract" => Some(CaptchaStrategy::Ocr),
            "vision" | "llm" | "model" => Some(CaptchaStrategy::Vision),
            _ => None,
        }
    }
}

/// 重试间隔策略
///
/// 固定间隔保持站点原有节奏；指数退避用于避免站点故障期间放大压力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// 每次重试前固定等待
    Fixed { delay_secs: u64 },
    /// 按尝试次数翻倍，封顶 cap_secs
    Exponential { base_secs: u64, cap_secs: u64 },
}

impl Backoff {
    /// 第 attempt 次失败后的等待时长（attempt 从 1 开始）
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Fixed { delay_secs } => Duration::from_secs(delay_secs),
            Backoff::Exponential {
                base_secs,
                cap_secs,
            } => {
                let factor = 1u64 << attempt.saturating_sub(1).min(16);
                Duration::from_secs(base_secs.saturating_mul(factor).min(cap_secs))
            }
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 查询页面 URL
    pub target_url: String,
    /// JSON 数据接口 URL（SubmitVia::Endpoint 时使用）
    pub endpoint_url: String,
    /// 站点签发的会话/安全令牌，按不透明常量对待
    pub endpoint_token: String,
    /// 抓取模式
    pub scrape_mode: ScrapeMode,
    /// 查询提交通道
    pub submit_via: SubmitVia,
    /// 验证码识别策略
    pub captcha_strategy: CaptchaStrategy,
    /// 自动识别全部失败时是否允许阻塞等待人工输入
    pub manual_captcha_fallback: bool,
    /// Diary No 范围（闭区间）
    pub start_diary_no: u32,
    pub end_diary_no: u32,
    /// 查询年份
    pub year: u16,
    /// 列表爬取模式的最大页数
    pub crawl_pages: u32,
    /// 单个 Diary No 的最大尝试次数
    pub max_retries: u32,
    /// 相邻 Diary No 之间的礼貌性停顿（秒），成功失败一视同仁
    pub request_delay_secs: u64,
    /// 重试间隔策略
    pub backoff: Backoff,
    /// 等待验证码图片出现的上限（秒）
    pub captcha_timeout_secs: u64,
    /// 等待结果容器/接口响应的上限（秒）
    pub results_timeout_secs: u64,
    /// 是否用语言模型对 Last Order 文本生成摘要
    pub analyze_orders: bool,
    /// 输出 CSV 路径
    pub output_csv: String,
    /// 调试快照目录
    pub snapshot_dir: String,
    /// 运行日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 已有浏览器的调试端口；为空则自行启动无头浏览器
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径；为空则交给 chromiumoxide 自动探测
    pub chrome_path: Option<String>,
    /// OCR 命令行程序
    pub tesseract_cmd: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://www.sci.gov.in/case-status-diary-no/".to_string(),
            endpoint_url: "https://www.sci.gov.in/wp-admin/admin-ajax.php".to_string(),
            endpoint_token: String::new(),
            scrape_mode: ScrapeMode::CaseStatus,
            submit_via: SubmitVia::Form,
            captcha_strategy: CaptchaStrategy::Ocr,
            manual_captcha_fallback: false,
            start_diary_no: 1,
            end_diary_no: 100,
            year: 2024,
            crawl_pages: 5,
            max_retries: 3,
            request_delay_secs: 5,
            backoff: Backoff::Fixed { delay_secs: 5 },
            captcha_timeout_secs: 20,
            results_timeout_secs: 10,
            analyze_orders: true,
            output_csv: "analyzed_scraped_data.csv".to_string(),
            snapshot_dir: ".".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            browser_debug_port: None,
            chrome_path: None,
            tesseract_cmd: "tesseract".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai"
                .to_string(),
            llm_model_name: "gemini-2.0-flash".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();

        let retry_delay_secs = std::env::var("RETRY_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        let backoff = match std::env::var("RETRY_BACKOFF").ok().as_deref() {
            Some("exponential") => Backoff::Exponential {
                base_secs: retry_delay_secs,
                cap_secs: std::env::var("RETRY_BACKOFF_CAP_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60),
            },
            _ => Backoff::Fixed {
                delay_secs: retry_delay_secs,
            },
        };

        Self {
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            endpoint_url: std::env::var("ENDPOINT_URL").unwrap_or(default.endpoint_url),
            endpoint_token: std::env::var("ENDPOINT_TOKEN").unwrap_or(default.endpoint_token),
            scrape_mode: std::env::var("SCRAPE_MODE")
                .ok()
                .and_then(|v| ScrapeMode::from_str(&v))
                .unwrap_or(default.scrape_mode),
            submit_via: std::env::var("SUBMIT_VIA")
                .ok()
                .and_then(|v| SubmitVia::from_str(&v))
                .unwrap_or(default.submit_via),
            captcha_strategy: std::env::var("CAPTCHA_STRATEGY")
                .ok()
                .and_then(|v| CaptchaStrategy::from_str(&v))
                .unwrap_or(default.captcha_strategy),
            manual_captcha_fallback: std::env::var("MANUAL_CAPTCHA_FALLBACK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.manual_captcha_fallback),
            start_diary_no: std::env::var("START_DIARY_NO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.start_diary_no),
            end_diary_no: std::env::var("END_DIARY_NO")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.end_diary_no),
            year: std::env::var("DIARY_YEAR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.year),
            crawl_pages: std::env::var("CRAWL_PAGES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.crawl_pages),
            max_retries: std::env::var("MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_retries),
            request_delay_secs: std::env::var("REQUEST_DELAY_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_delay_secs),
            backoff,
            captcha_timeout_secs: std::env::var("CAPTCHA_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.captcha_timeout_secs),
            results_timeout_secs: std::env::var("RESULTS_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.results_timeout_secs),
            analyze_orders: std::env::var("ANALYZE_ORDERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.analyze_orders),
            output_csv: std::env::var("OUTPUT_CSV").unwrap_or(default.output_csv),
            snapshot_dir: std::env::var("SNAPSHOT_DIR").unwrap_or(default.snapshot_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.verbose_logging),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT")
                .ok()
                .and_then(|v| v.parse().ok()),
            chrome_path: std::env::var("CHROME_PATH").ok(),
            tesseract_cmd: std::env::var("TESSERACT_CMD").unwrap_or(default.tesseract_cmd),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL")
                .unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_mode_parsing() {
        assert_eq!(ScrapeMode::from_str("case_status"), Some(ScrapeMode::CaseStatus));
        assert_eq!(ScrapeMode::from_str("CRAWL"), Some(ScrapeMode::Crawl));
        assert_eq!(ScrapeMode::from_str("unknown"), None);
    }

    #[test]
    fn captcha_strategy_parsing() {
        assert_eq!(CaptchaStrategy::from_str("ocr"), Some(CaptchaStrategy::Ocr));
        assert_eq!(CaptchaStrategy::from_str("vision"), Some(CaptchaStrategy::Vision));
        assert_eq!(CaptchaStrategy::from_str(""), None);
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let backoff = Backoff::Fixed { delay_secs: 5 };
        assert_eq!(backoff.delay(1), Duration::from_secs(5));
        assert_eq!(backoff.delay(7), Duration::from_secs(5));
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let backoff = Backoff::Exponential {
            base_secs: 5,
            cap_secs: 60,
        };
        assert_eq!(backoff.delay(1), Duration::from_secs(5));
        assert_eq!(backoff.delay(2), Duration::from_secs(10));
        assert_eq!(backoff.delay(3), Duration::from_secs(20));
        assert_eq!(backoff.delay(10), Duration::from_secs(60));
    }
}
