use base64::Engine;

use crate::error::{AppError, Result};

/// 一次查询期间存活的验证码挑战
///
/// 持有页面上验证码图片的 data URI，随查询尝试一起丢弃，从不落盘
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    src: String,
}

impl CaptchaChallenge {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }

    /// 原始 data URI（交给外部视觉模型时原样传递）
    pub fn data_uri(&self) -> &str {
        &self.src
    }

    /// 解码出图片字节（OCR 策略需要位图数据）
    pub fn image_bytes(&self) -> Result<Vec<u8>> {
        let (_, encoded) = self
            .src
            .split_once(',')
            .ok_or_else(|| AppError::Decode("不是 data URI 格式".to_string()))?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_data_uri_payload() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"fake png bytes");
        let challenge = CaptchaChallenge::new(format!("data:image/png;base64,{}", encoded));
        assert_eq!(challenge.image_bytes().unwrap(), b"fake png bytes");
    }

    #[test]
    fn rejects_plain_url() {
        let challenge = CaptchaChallenge::new("https://example.com/captcha.png");
        assert!(matches!(challenge.image_bytes(), Err(AppError::Decode(_))));
    }

    #[test]
    fn rejects_corrupt_base64() {
        let challenge = CaptchaChallenge::new("data:image/png;base64,@@@@");
        assert!(matches!(challenge.image_bytes(), Err(AppError::Decode(_))));
    }
}
