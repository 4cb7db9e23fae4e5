use crate::config::ErpConfig;
use crate::erp::{decoder, ErpError};
use crate::models::{ReceiptQuery, ReceiptRecord};

const PREVIEW_CHARS: usize = 200;

/// ERP 条码接口客户端
///
/// 每次查询只呼叫一次, 不重试; 逾时由 [`ErpConfig::timeout_secs`] 决定。
#[derive(Debug, Clone)]
pub struct ErpClient {
    http: reqwest::Client,
    base_url: String,
}

impl ErpClient {
    pub fn new(config: &ErpConfig) -> Result<Self, ErpError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint_url(&self, query: &ReceiptQuery) -> String {
        format!("{}/{}", self.base_url, query.mode.endpoint())
    }

    /// 查询进货单据
    pub async fn fetch_receipt(&self, query: &ReceiptQuery) -> Result<ReceiptRecord, ErpError> {
        let doc_type = required("DocType", &query.doc_type)?;
        let doc_number = required("DocNumber", &query.doc_number)?;
        let doc_item = required("DocItem", &query.doc_item)?;

        let url = self.endpoint_url(query);
        tracing::info!(
            "ERP 查询 [{}] {} DocType={} DocNumber={} DocItem={}",
            query.mode.label(),
            url,
            doc_type,
            doc_number,
            doc_item
        );

        let response = self
            .http
            .get(&url)
            .query(&[
                ("DocType", doc_type),
                ("DocNumber", doc_number),
                ("DocItem", doc_item),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("API 呼叫失败: {}", e);
                ErpError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("ERP 回应 HTTP 状态 {}", status);
            return Err(ErpError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        tracing::debug!(
            "回应内容长度: {} 字元, 预览: {}",
            body.chars().count(),
            body.chars().take(PREVIEW_CHARS).collect::<String>()
        );

        decoder::decode(&body, query.mode)
    }
}

fn required<'a>(name: &str, value: &'a str) -> Result<&'a str, ErpError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ErpError::InvalidQuery(format!("{name} 不可为空")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::ReceiptMode;

    fn client() -> ErpClient {
        ErpClient::new(&AppConfig::default().erp).unwrap()
    }

    #[test]
    fn endpoint_depends_on_mode() {
        let client = client();
        let general = ReceiptQuery::new("3113", "1140421033", "0001", ReceiptMode::General);
        let subcontract = ReceiptQuery::new("5901", "1140500007", "0002", ReceiptMode::Subcontract);
        assert_eq!(
            client.endpoint_url(&general),
            "http://192.168.0.13:100/api/ErpToBarcode/getPurchaseReceipt"
        );
        assert_eq!(
            client.endpoint_url(&subcontract),
            "http://192.168.0.13:100/api/ErpToBarcode/getSubcontractReceipt"
        );
    }

    #[tokio::test]
    async fn blank_query_is_rejected_before_network() {
        let query = ReceiptQuery::new("3113", "  ", "0001", ReceiptMode::General);
        let err = client().fetch_receipt(&query).await.unwrap_err();
        assert!(matches!(err, ErpError::InvalidQuery(_)));
    }
}
