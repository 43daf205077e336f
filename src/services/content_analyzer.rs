//! 内容分析服务 - 业务能力层
//!
//! 只负责"生成摘要"能力。分析失败绝不向外传播：
//! 批处理不应因为一条摘要失败而中断，失败时写入固定哨兵文本。

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::llm_service::LlmService;

/// 分析失败时写入 CSV 的哨兵文本
pub const ANALYSIS_FAILED: &str = "Error occurred during content analysis";

/// 内容摘要能力
///
/// 真实实现走外部语言模型；测试中可替换为确定性桩实现
#[async_trait]
pub trait AnalyzeContent: Send + Sync {
    /// 生成摘要；任何失败都返回哨兵文本而不是错误
    async fn summarize(&self, content: &str) -> String;
}

/// 内容分析服务
///
/// 不做缓存：相同输入每次都是一轮完整的远端往返
pub struct ContentAnalyzer {
    llm: LlmService,
}

impl ContentAnalyzer {
    /// 创建新的内容分析服务
    pub fn new(config: &Config) -> Self {
        Self {
            llm: LlmService::new(config),
        }
    }
}

#[async_trait]
impl AnalyzeContent for ContentAnalyzer {
    async fn summarize(&self, content: &str) -> String {
        debug!("请求内容摘要，正文长度: {} 字符", content.len());

        let prompt = format!(
            "Analyze the following content and provide a brief summary:\n\n{}",
            content
        );
        match self
            .llm
            .send_to_llm(
                &prompt,
                Some("You are a helpful assistant that analyzes court case content."),
                None,
            )
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!("内容分析失败: {}", e);
                ANALYSIS_FAILED.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 端点不可达时必须落到哨兵文本，而不是报错中断
    #[tokio::test]
    async fn unreachable_endpoint_yields_sentinel() {
        let config = Config {
            llm_api_base_url: "http://127.0.0.1:9".to_string(),
            llm_api_key: "test-key".to_string(),
            ..Config::default()
        };
        let analyzer = ContentAnalyzer::new(&config);

        let summary = analyzer.summarize("some order text").await;
        assert_eq!(summary, ANALYSIS_FAILED);
    }
}
