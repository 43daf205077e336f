use thiserror::Error;

/// 应用程序错误类型
///
/// 编排层按变体决定每个 Diary No 的去向：
/// `Session` 重建浏览器会话后重试，`Timeout` 落盘快照后跳过，其余直接跳过。
#[derive(Debug, Error)]
pub enum AppError {
    /// 验证码图片解码失败（非 data URI、base64 损坏、位图格式不支持）
    #[error("验证码图片解码失败: {0}")]
    Decode(String),

    /// 验证码识别失败（OCR 引擎或外部视觉模型），携带底层原始信息
    #[error("验证码识别失败: {0}")]
    Solver(String),

    /// 限时等待超时
    #[error("等待超时: {0}")]
    Timeout(String),

    /// 浏览器会话失效，可通过重建会话恢复
    #[error("浏览器会话失效: {0}")]
    Session(String),

    /// 内容分析失败（正常路径下由哨兵文本兜住，不应传播到编排层）
    #[error("内容分析失败: {0}")]
    Analysis(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// JSON 解析失败
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV 操作失败
    #[error("CSV 操作失败: {0}")]
    Csv(#[from] csv::Error),

    /// 文件操作失败
    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Session(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(format!("HTTP 请求超时: {}", err))
        } else {
            AppError::Session(format!("HTTP 请求失败: {}", err))
        }
    }
}

impl AppError {
    /// 是否可通过重建浏览器会话恢复
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Session(_))
    }
}

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
