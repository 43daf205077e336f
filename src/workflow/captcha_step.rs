//! 验证码环节 - 两种流程共用
//!
//! 等图片出现 → 取 data URI → 自动识别（可选人工兜底）

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;
use crate::infrastructure::JsExecutor;
use crate::models::CaptchaChallenge;
use crate::services::{read_operator_input, SolveCaptcha};

/// 验证码图片元素 ID
pub(crate) const CAPTCHA_IMAGE_ID: &str = "captcha_image";
/// 验证码输入框 ID
pub(crate) const CAPTCHA_INPUT_ID: &str = "captcha";

/// 等待验证码图片出现并取下其 data URI
pub(crate) async fn acquire_challenge(
    executor: &JsExecutor,
    timeout: Duration,
) -> Result<CaptchaChallenge> {
    executor
        .wait_for(
            &format!(
                "!!(document.getElementById('{id}') && document.getElementById('{id}').src)",
                id = CAPTCHA_IMAGE_ID
            ),
            timeout,
            "验证码图片",
        )
        .await?;

    let src: String = executor
        .eval_as(format!(
            "document.getElementById('{}').src",
            CAPTCHA_IMAGE_ID
        ))
        .await?;
    debug!("验证码图片已取得（{} 字符）", src.len());

    Ok(CaptchaChallenge::new(src))
}

/// 自动识别验证码；失败且允许人工兜底时转操作员输入
pub(crate) async fn resolve_challenge(
    solver: &dyn SolveCaptcha,
    challenge: &CaptchaChallenge,
    manual_fallback: bool,
) -> Result<String> {
    match solver.solve(challenge).await {
        Ok(answer) => Ok(answer),
        Err(e) if manual_fallback => {
            warn!("验证码自动识别失败: {}，转人工输入", e);
            read_operator_input().await
        }
        Err(e) => Err(e),
    }
}
