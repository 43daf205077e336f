//! 案件状态数据接口 - 业务能力层
//!
//! 站点的 JSON 数据接口走 query 参数提交，额外要求页面签发的会话令牌。
//! 令牌按不透明常量对待，由配置原样传入，本服务不做任何推导。

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::CaseRecord;

/// 接口返回的外层负载；`data` 为空表示站点无此案件
#[derive(Debug, Deserialize)]
struct EndpointPayload {
    #[serde(default)]
    data: Option<EndpointCase>,
}

/// 接口返回的案件字段，缺失一律按空串处理
#[derive(Debug, Default, Deserialize)]
struct EndpointCase {
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

/// 案件状态数据接口客户端
pub struct StatusEndpoint {
    client: Client,
    endpoint_url: String,
    token: String,
}

impl StatusEndpoint {
    /// 创建新的数据接口客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.results_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.clone(),
            token: config.endpoint_token.clone(),
        })
    }

    /// 按 Diary No 查询；`Ok(None)` 表示接口明确无数据
    pub async fn fetch_case(
        &self,
        diary_no: u32,
        year: u16,
        captcha_answer: &str,
    ) -> Result<Option<CaseRecord>> {
        debug!("调用数据接口: {} (Diary {})", self.endpoint_url, diary_no);

        let response = self
            .client
            .get(&self.endpoint_url)
            .query(&[
                ("diary_no", diary_no.to_string()),
                ("diary_year", year.to_string()),
                ("captcha", captcha_answer.to_string()),
                ("token", self.token.clone()),
            ])
            .send()
            .await?;

        let payload: EndpointPayload = response.json().await?;
        Ok(record_from_payload(payload, diary_no, year))
    }
}

/// 把接口负载转换为记录；无数据返回 None
fn record_from_payload(
    payload: EndpointPayload,
    diary_no: u32,
    year: u16,
) -> Option<CaseRecord> {
    let case = payload.data?;
    Some(CaseRecord {
        diary_no,
        year,
        case_no: case.case_no,
        petitioner: case.petitioner,
        respondent: case.respondent,
        petitioner_advocate: case.petitioner_advocate,
        respondent_advocate: case.respondent_advocate,
        last_listed_on: case.last_listed_on,
        status: case.status,
        last_order: case.last_order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_payload_maps_every_field() {
        let payload: EndpointPayload = serde_json::from_str(
            r#"{
                "data": {
                    "case_no": "W.P.(C) 5/2024",
                    "petitioner": "A",
                    "respondent": "B",
                    "petitioner_advocate": "C",
                    "respondent_advocate": "D",
                    "last_listed_on": "2024-02-01",
                    "status": "Disposed",
                    "last_order": "Dismissed"
                }
            }"#,
        )
        .unwrap();

        let record = record_from_payload(payload, 5, 2024).unwrap();
        assert_eq!(record.diary_no, 5);
        assert_eq!(record.case_no, "W.P.(C) 5/2024");
        assert_eq!(record.status, "Disposed");
    }

    #[test]
    fn missing_fields_default_to_empty_strings() {
        let payload: EndpointPayload =
            serde_json::from_str(r#"{"data": {"case_no": "W.P.(C) 9/2024"}}"#).unwrap();

        let record = record_from_payload(payload, 9, 2024).unwrap();
        assert_eq!(record.case_no, "W.P.(C) 9/2024");
        assert_eq!(record.petitioner, "");
        assert_eq!(record.last_order, "");
    }

    #[test]
    fn null_data_means_not_found() {
        let payload: EndpointPayload = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(record_from_payload(payload, 1, 2024).is_none());

        let payload: EndpointPayload = serde_json::from_str(r#"{}"#).unwrap();
        assert!(record_from_payload(payload, 1, 2024).is_none());
    }
}
