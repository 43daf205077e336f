//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"导航 / 执行 JS / 限时等待"的能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::sleep;

use crate::error::{AppError, Result};

/// 条件轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 goto / eval / wait_for 能力
/// - 不认识 CaseRecord / Diary No
/// - 不处理业务流程
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 导航到指定 URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 轮询等待某个 JS 条件变真
    ///
    /// `condition_js` 必须是求值为布尔的表达式；超过 `timeout` 仍未变真
    /// 则返回 `AppError::Timeout`，`what` 用于错误信息
    pub async fn wait_for(
        &self,
        condition_js: &str,
        timeout: Duration,
        what: &str,
    ) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let JsonValue::Bool(true) = self.eval(condition_js).await? {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AppError::Timeout(format!(
                    "{}（{} 秒内未出现）",
                    what,
                    timeout.as_secs()
                )));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    /// 当前页面完整 HTML（调试快照用）
    pub async fn page_html(&self) -> Result<String> {
        self.eval_as::<String>("document.documentElement.outerHTML")
            .await
    }
}
