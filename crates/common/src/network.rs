use futures::{Stream, StreamExt, channel::mpsc, stream};
use reqwest::{Body, Client, Response, multipart};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::{
    filters::{FilterSet, PageCursor},
    models::{CODE_OK, ChartSeries, Envelope, RecordPage},
    upload::SelectedFile,
};

pub const DEFAULT_SERVER: &str = "http://localhost:5000";

const UPLOAD_CHUNK: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with an envelope whose code is not 200.
    #[error("{message}")]
    Application {
        code: i64,
        message: String,
        errors: Vec<String>,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("response carried no data")]
    MissingData,
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
    #[error("could not read upload: {0}")]
    File(#[from] std::io::Error),
}

impl ApiError {
    pub fn is_application(&self) -> bool {
        matches!(self, ApiError::Application { .. })
    }
}

/// Cloneable summary of an [`ApiError`], suitable for passing around in UI
/// messages.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Rejected { message: String, errors: Vec<String> },
    Unreachable(String),
}

impl From<ApiError> for Failure {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::Application {
                message, errors, ..
            } => Failure::Rejected { message, errors },
            other => Failure::Unreachable(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum UploadEvent {
    /// Percentage of the file handed to the transport so far.
    Progress(f32),
    Finished(Result<String, ApiError>),
}

#[derive(Debug, Clone)]
pub struct NetworkClient {
    client: Client,
    base_url: Url,
}

impl NetworkClient {
    pub fn new(mut base_url: Url) -> Result<Self, ApiError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: Client::builder().cookie_store(true).build()?,
            base_url,
        })
    }

    pub fn local_client() -> Result<Self, ApiError> {
        Self::new(Url::parse(DEFAULT_SERVER)?)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    pub async fn suppliers(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint("api/suppliers")?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_data(response).await
    }

    pub async fn records(
        &self,
        cursor: PageCursor,
        filters: &FilterSet,
    ) -> Result<RecordPage, ApiError> {
        let url = self.endpoint("api/data")?;
        debug!("GET {} page={} filters={:?}", url, cursor.page, filters.pairs());
        let response = self
            .client
            .get(url)
            .query(&cursor.query())
            .query(filters.pairs())
            .send()
            .await?;
        read_data(response).await
    }

    pub async fn chart_data(&self, filters: &FilterSet) -> Result<ChartSeries, ApiError> {
        let url = self.endpoint("api/chart-data")?;
        debug!("GET {} filters={:?}", url, filters.pairs());
        let response = self.client.get(url).query(filters.pairs()).send().await?;
        read_data(response).await
    }

    /// Uploads the whole file in one request and returns the server's
    /// success message.
    pub async fn upload(&self, file: &SelectedFile) -> Result<String, ApiError> {
        let url = self.endpoint("api/upload")?;
        debug!("POST {} file={}", url, file.name);
        let bytes = tokio::fs::read(&file.path).await?;
        let part = multipart::Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let response = self
            .client
            .post(url)
            .multipart(multipart::Form::new().part("file", part))
            .send()
            .await?;
        read_message(response).await
    }

    /// Same request as [`NetworkClient::upload`], but reports how much of
    /// the file has been handed to the transport while it is being sent.
    /// The stream always ends with exactly one [`UploadEvent::Finished`]
    /// among its items.
    pub fn upload_with_progress(
        &self,
        file: SelectedFile,
    ) -> impl Stream<Item = UploadEvent> + Send + 'static {
        let (progress_tx, progress_rx) = mpsc::unbounded();
        let request = send_streamed_upload(
            self.client.clone(),
            self.endpoint("api/upload"),
            file,
            progress_tx,
        );
        stream::select(
            progress_rx.map(UploadEvent::Progress),
            stream::once(request).map(UploadEvent::Finished),
        )
    }
}

async fn send_streamed_upload(
    client: Client,
    endpoint: Result<Url, ApiError>,
    file: SelectedFile,
    progress_tx: mpsc::UnboundedSender<f32>,
) -> Result<String, ApiError> {
    let url = endpoint?;
    debug!("POST {} file={} (streamed)", url, file.name);
    let bytes = tokio::fs::read(&file.path).await?;
    let length = bytes.len();
    let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();

    // The sender is released with the last chunk so the progress side of
    // the stream ends as soon as the body is out.
    let mut progress = (length > 0).then_some(progress_tx);
    let mut sent = 0usize;
    let body = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        if let Some(tx) = &progress {
            let _ = tx.unbounded_send(sent as f32 / length as f32 * 100.0);
        }
        if sent >= length {
            progress.take();
        }
        Ok::<_, std::io::Error>(chunk)
    });

    let part = multipart::Part::stream_with_length(Body::wrap_stream(body), length as u64)
        .file_name(file.name.clone())
        .mime_str(&file.mime)?;
    let response = client
        .post(url)
        .multipart(multipart::Form::new().part("file", part))
        .send()
        .await?;
    read_message(response).await
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, ApiError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    let envelope: Envelope<T> =
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { status, source })?;
    if envelope.code == CODE_OK {
        Ok(envelope)
    } else {
        warn!("server rejected request: {} {:?}", envelope.code, envelope.message);
        Err(ApiError::Application {
            code: envelope.code,
            message: envelope.message.unwrap_or_default(),
            errors: envelope.errors,
        })
    }
}

async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    read_envelope::<T>(response)
        .await?
        .data
        .ok_or(ApiError::MissingData)
}

async fn read_message(response: Response) -> Result<String, ApiError> {
    Ok(read_envelope::<serde_json::Value>(response)
        .await?
        .message
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param, query_param_is_missing},
    };

    use super::*;
    use crate::filters::FilterForm;

    async fn client_for(server: &MockServer) -> NetworkClient {
        NetworkClient::new(Url::parse(&server.uri()).unwrap()).unwrap()
    }

    fn xlsx_on_disk(len: usize) -> (tempfile::TempDir, SelectedFile) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stock.xlsx");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&vec![7u8; len])
            .unwrap();
        let file = SelectedFile::inspect(&path).unwrap();
        (dir, file)
    }

    #[test]
    fn base_url_keeps_its_path_prefix() {
        let client = NetworkClient::new(Url::parse("http://example.com/ledger").unwrap()).unwrap();
        assert_eq!(
            client.endpoint("api/data").unwrap().as_str(),
            "http://example.com/ledger/api/data"
        );
    }

    #[tokio::test]
    async fn fetches_supplier_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/suppliers"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": ["Acme", "Globex"]})),
            )
            .mount(&server)
            .await;

        let suppliers = client_for(&server).await.suppliers().await.unwrap();
        assert_eq!(suppliers, vec!["Acme", "Globex"]);
    }

    #[tokio::test]
    async fn records_request_carries_cursor_and_only_set_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .and(query_param("page", "3"))
            .and(query_param("per_page", "20"))
            .and(query_param("sku", "A1"))
            .and(query_param_is_missing("supplier"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "data": {"items": [], "page": 3, "pages": 3, "total": 41, "per_page": 20}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut cursor = PageCursor::default();
        cursor.go_to(3);
        let form = FilterForm {
            sku: " A1 ".into(),
            supplier: "  ".into(),
            ..Default::default()
        };
        let page = client_for(&server)
            .await
            .records(cursor, &form.filters())
            .await
            .unwrap();
        assert_eq!(page.page, 3);
        assert_eq!(page.total, 41);
    }

    #[tokio::test]
    async fn chart_request_uses_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chart-data"))
            .and(query_param("supplier", "Acme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "data": {"dates": ["2025-08-01", "2025-08-02"], "balances": [10.0, 12.5]}
            })))
            .mount(&server)
            .await;

        let filters = FilterSet::from_fields([("supplier", "Acme")]);
        let series = client_for(&server).await.chart_data(&filters).await.unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.balances[1], 12.5);
    }

    #[tokio::test]
    async fn non_ok_code_is_an_application_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/data"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"code": 500, "message": "query failed"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .records(PageCursor::default(), &FilterSet::default())
            .await
            .unwrap_err();
        assert!(err.is_application());
        assert_eq!(
            Failure::from(err),
            Failure::Rejected {
                message: "query failed".into(),
                errors: vec![]
            }
        );
    }

    #[tokio::test]
    async fn garbage_body_is_a_transport_class_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/suppliers"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.suppliers().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { status: 502, .. }));
        assert!(matches!(Failure::from(err), Failure::Unreachable(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = NetworkClient::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        let err = client.suppliers().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn upload_returns_validation_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400, "message": "invalid", "errors": ["row 3 bad SKU"]
            })))
            .mount(&server)
            .await;

        let (_dir, file) = xlsx_on_disk(64);
        let err = client_for(&server).await.upload(&file).await.unwrap_err();
        match err {
            ApiError::Application {
                code,
                message,
                errors,
            } => {
                assert_eq!(code, 400);
                assert_eq!(message, "invalid");
                assert_eq!(errors, vec!["row 3 bad SKU"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn streamed_upload_reports_progress_then_finishes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 200, "message": "OK"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, file) = xlsx_on_disk(UPLOAD_CHUNK * 3 + 10);
        let events: Vec<UploadEvent> = client_for(&server)
            .await
            .upload_with_progress(file)
            .collect()
            .await;

        let progress: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 4);
        assert!(progress.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(progress.last().copied(), Some(100.0));

        let finished: Vec<&Result<String, ApiError>> = events
            .iter()
            .filter_map(|e| match e {
                UploadEvent::Finished(r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].as_ref().unwrap(), "OK");
    }
}
