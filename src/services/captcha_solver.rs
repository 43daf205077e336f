//! 验证码识别服务 - 业务能力层
//!
//! 两种可互换策略：
//! 1. 本地 OCR：灰度 → 固定阈值二值化 → 纯数字识别，结果只保留数字字符
//! 2. 外部视觉模型：图片原样转发，返回文本原样使用
//!
//! 底层引擎抛出的任何错误都收拢为 Solver 错误并携带原始信息；
//! 调用方必须把识别失败当作非致命事件（跳过本次尝试或转人工）。

use async_trait::async_trait;
use image::GrayImage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{CaptchaStrategy, Config};
use crate::error::{AppError, Result};
use crate::models::CaptchaChallenge;
use crate::services::llm_service::LlmService;

/// 二值化阈值（亮度低于此值视为笔画）
const LUMA_THRESHOLD: u8 = 128;

/// 交给视觉模型的固定指令
const VISION_INSTRUCTION: &str = "what is the text in this image";

/// 验证码识别能力
///
/// 真实实现走 OCR 或外部视觉模型；测试中可替换为固定返回的桩实现
#[async_trait]
pub trait SolveCaptcha: Send + Sync {
    async fn solve(&self, challenge: &CaptchaChallenge) -> Result<String>;
}

/// 验证码识别服务
pub struct CaptchaSolver {
    strategy: CaptchaStrategy,
    tesseract_cmd: String,
    llm: LlmService,
}

impl CaptchaSolver {
    /// 创建新的验证码识别服务
    pub fn new(config: &Config) -> Self {
        Self {
            strategy: config.captcha_strategy,
            tesseract_cmd: config.tesseract_cmd.clone(),
            llm: LlmService::new(config),
        }
    }

    /// OCR 策略：二值化后交给命令行 tesseract 做纯数字识别
    async fn solve_with_ocr(&self, challenge: &CaptchaChallenge) -> Result<String> {
        let bytes = challenge.image_bytes()?;
        let img = image::load_from_memory(&bytes)?;
        let binarized = binarize(&img.to_luma8(), LUMA_THRESHOLD);

        // 引擎只认文件，经由临时 PNG 中转
        let tmp = std::env::temp_dir().join(format!("captcha_{}.png", std::process::id()));
        binarized
            .save(&tmp)
            .map_err(|e| AppError::Solver(format!("临时图片写入失败: {}", e)))?;

        let output = Command::new(&self.tesseract_cmd)
            .arg(&tmp)
            .arg("stdout")
            .args(["--psm", "8", "-c", "tessedit_char_whitelist=0123456789"])
            .output()
            .await
            .map_err(|e| AppError::Solver(format!("无法启动 {}: {}", self.tesseract_cmd, e)));
        let _ = std::fs::remove_file(&tmp);
        let output = output?;

        if !output.status.success() {
            return Err(AppError::Solver(format!(
                "OCR 进程退出异常: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        debug!("OCR 原始输出: {:?}", raw.trim());

        let digits = filter_digits(&raw);
        if digits.is_empty() {
            return Err(AppError::Solver("OCR 未识别出任何数字".to_string()));
        }
        Ok(digits)
    }

    /// 视觉模型策略：data URI 原样转发，回复裁剪空白后原样返回
    async fn solve_with_model(&self, challenge: &CaptchaChallenge) -> Result<String> {
        let imgs = vec![challenge.data_uri().to_string()];
        let text = self
            .llm
            .send_to_llm(VISION_INSTRUCTION, None, Some(&imgs))
            .await
            .map_err(|e| AppError::Solver(e.to_string()))?;

        if text.is_empty() {
            return Err(AppError::Solver("视觉模型返回为空".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl SolveCaptcha for CaptchaSolver {
    async fn solve(&self, challenge: &CaptchaChallenge) -> Result<String> {
        match self.strategy {
            CaptchaStrategy::Ocr => self.solve_with_ocr(challenge).await,
            CaptchaStrategy::Vision => self.solve_with_model(challenge).await,
        }
    }
}

/// 人工兜底：阻塞等待操作员从终端输入验证码
///
/// 只在自动识别失败且配置允许时走到这里，整个批处理会停在这一步
pub async fn read_operator_input() -> Result<String> {
    info!("⌨️ 等待人工输入验证码...");
    println!("请查看浏览器中的验证码，输入后回车：");

    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader.read_line(&mut line).await?;

    let answer = line.trim().to_string();
    if answer.is_empty() {
        return Err(AppError::Solver("人工输入为空".to_string()));
    }
    warn!("使用人工输入的验证码答案");
    Ok(answer)
}

// ========== 辅助函数 ==========

/// 按固定亮度阈值二值化
fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        px.0[0] = if px.0[0] < threshold { 0 } else { 255 };
    }
    out
}

/// 只保留识别结果中的数字字符，噪声丢弃不做纠正
fn filter_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn binarize_splits_on_threshold() {
        let img = GrayImage::from_fn(2, 2, |x, y| match (x, y) {
            (0, 0) => Luma([0u8]),
            (1, 0) => Luma([127u8]),
            (0, 1) => Luma([128u8]),
            _ => Luma([255u8]),
        });
        let out = binarize(&img, 128);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 0);
        assert_eq!(out.get_pixel(0, 1).0[0], 255);
        assert_eq!(out.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn filter_digits_strips_noise() {
        assert_eq!(filter_digits("4a2b\n"), "42");
        assert_eq!(filter_digits(" 1 2 3 "), "123");
        assert_eq!(filter_digits("abc"), "");
    }
}
