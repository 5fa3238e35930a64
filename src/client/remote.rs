use super::{normalize, FetchError};
use crate::config::BackendConfig;
use crate::models::{AuditFinding, InvoiceRecord};
use bigdecimal::BigDecimal;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::str::FromStr;

const TUNNEL_WARNING_HEADER: &str = "ngrok-skip-browser-warning";
const TUNNEL_WARNING_VALUE: &str = "69420";

/// 远端工作流后端契约
///
/// 两个操作都是单次调用，这一层不做重试。
#[async_trait::async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// `GET <backend>/get-queue`
    async fn fetch_queue(&self) -> Result<Vec<InvoiceRecord>, FetchError>;

    /// `POST <backend>/process-invoice`
    async fn process_invoice(
        &self,
        invoice_id: &str,
        po_number: &str,
        amount: &BigDecimal,
    ) -> Result<AuditFinding, FetchError>;
}

/// 审核请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessInvoiceRequest<'a> {
    invoice_id: &'a str,
    po_number: &'a str,
    /// 后端按 qty 字段接收发票金额
    qty: Value,
}

/// 基于 reqwest 的 webhook 客户端
#[derive(Debug, Clone)]
pub struct HttpWorkflowBackend {
    http: reqwest::Client,
    base_url: String,
    webhook_prefix: String,
    skip_tunnel_warning: bool,
}

impl HttpWorkflowBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            webhook_prefix: normalize_prefix(&config.webhook_prefix),
            skip_tunnel_warning: config.skip_tunnel_warning,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}/{}", self.base_url, self.webhook_prefix, path)
    }

    fn decorate(&self, req: RequestBuilder) -> RequestBuilder {
        if self.skip_tunnel_warning {
            req.header(TUNNEL_WARNING_HEADER, TUNNEL_WARNING_VALUE)
        } else {
            req
        }
    }

    /// 统一检查状态码和 content-type，然后解析 JSON
    async fn read_json(resp: Response) -> Result<Value, FetchError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.contains("json") {
            return Err(FetchError::NotStructured(content_type));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| FetchError::Malformed(format!("response json decode failed: {}", e)))
    }
}

#[async_trait::async_trait]
impl WorkflowBackend for HttpWorkflowBackend {
    async fn fetch_queue(&self) -> Result<Vec<InvoiceRecord>, FetchError> {
        let url = self.endpoint("get-queue");
        tracing::debug!("GET {}", url);

        let resp = self.decorate(self.http.get(&url)).send().await?;
        let payload = Self::read_json(resp).await?;
        normalize::normalize_queue(&payload)
    }

    async fn process_invoice(
        &self,
        invoice_id: &str,
        po_number: &str,
        amount: &BigDecimal,
    ) -> Result<AuditFinding, FetchError> {
        let url = self.endpoint("process-invoice");
        tracing::debug!("POST {} invoice={} po={}", url, invoice_id, po_number);

        let body = ProcessInvoiceRequest {
            invoice_id,
            po_number,
            qty: amount_as_json(amount),
        };
        let resp = self
            .decorate(self.http.post(&url))
            .json(&body)
            .send()
            .await?;
        let payload = Self::read_json(resp).await?;
        normalize::normalize_finding(&payload)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// 金额以 JSON 数字发送，无法表示时退回字符串
fn amount_as_json(amount: &BigDecimal) -> Value {
    let text = amount.to_string();
    serde_json::Number::from_str(&text)
        .map(Value::Number)
        .unwrap_or(Value::String(text))
}
