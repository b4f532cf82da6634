use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use comparer_logging::{cmp_debug, cmp_warn};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::pdf_scan::{linearized_page_count, page_count};
use crate::viewer::is_same_instance;
use crate::{
    ContainerId, DocumentSource, HttpSettings, ResourceTiming, TimingRecorder, Viewer,
    ViewerConfig, ViewerError, ViewerInstance,
};

/// Viewer backed by plain HTTP downloads.
///
/// Standard loading resolves after the whole file arrives. Progressive
/// loading resolves once the head of a linearized file is in and keeps
/// downloading in the background. Every request is recorded in the shared
/// [`TimingRecorder`].
pub struct HttpViewer {
    downloader: Downloader,
    head_chunk_bytes: u64,
    mounted: Mutex<HashMap<ContainerId, Arc<HttpDocument>>>,
}

impl HttpViewer {
    pub fn new(settings: &HttpSettings, timings: Arc<TimingRecorder>) -> Result<Self, ViewerError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ViewerError::Network(err.to_string()))?;
        Ok(Self {
            downloader: Downloader { client, timings },
            head_chunk_bytes: settings.head_chunk_bytes.max(1),
            mounted: Mutex::new(HashMap::new()),
        })
    }

    async fn load_full(&self, url: &str, bearer: Option<&str>) -> Result<Arc<HttpDocument>, ViewerError> {
        let body = self.downloader.fetch(url, None, bearer).await?;
        Ok(Arc::new(HttpDocument::complete(body.bytes)))
    }

    async fn load_progressive(&self, url: &str) -> Result<Arc<HttpDocument>, ViewerError> {
        let head = self
            .downloader
            .fetch(url, Some(ByteRange::First(self.head_chunk_bytes)), None)
            .await?;
        if !head.partial {
            cmp_debug!("Range request ignored for {url}; got the full document");
            return Ok(Arc::new(HttpDocument::complete(head.bytes)));
        }

        let received = head.bytes.len() as u64;
        if head.total_len.is_some_and(|total| received >= total) {
            return Ok(Arc::new(HttpDocument::complete(head.bytes)));
        }

        let announced = linearized_page_count(&head.bytes);
        let document = Arc::new(HttpDocument::partial(head.bytes, announced));
        let remainder = Some(ByteRange::From(received));

        if announced.is_none() {
            // Without a linearization dictionary nothing renders early.
            cmp_debug!("{url} is not linearized; fetching the rest before first render");
            let rest = self.downloader.fetch(url, remainder, None).await?;
            document.finish(rest);
            return Ok(document);
        }

        let downloader = self.downloader.clone();
        let background = document.clone();
        let url = url.to_string();
        let handle = tokio::spawn(async move {
            match downloader.fetch(&url, remainder, None).await {
                Ok(rest) => background.finish(rest),
                Err(err) => {
                    cmp_warn!("Background download of {url} failed: {err}");
                    background.fail(err.to_string());
                }
            }
        });
        document.set_background(handle);
        Ok(document)
    }

    async fn fetch_document(&self, config: &ViewerConfig) -> Result<Arc<HttpDocument>, ViewerError> {
        match &config.source {
            DocumentSource::Url(url) if config.allow_linearized_loading == Some(true) => {
                self.load_progressive(url).await
            }
            DocumentSource::Url(url) => self.load_full(url, None).await,
            DocumentSource::Server {
                server_url,
                document_id,
                jwt,
            } => {
                let url = format!("{server_url}api/documents/{document_id}/pdf");
                self.load_full(&url, Some(jwt)).await
            }
        }
    }

    /// Mounts `document` unless the caller gave up on it. The check runs under
    /// the mount lock so a cancelled load never displaces a newer document.
    fn mount(
        &self,
        container: ContainerId,
        document: &Arc<HttpDocument>,
        cancel: &CancellationToken,
    ) -> Result<(), ViewerError> {
        let mut mounted = self
            .mounted
            .lock()
            .map_err(|_| ViewerError::Load("viewer state poisoned".to_string()))?;
        if cancel.is_cancelled() {
            document.abort_background();
            return Err(ViewerError::Cancelled);
        }
        if let Some(previous) = mounted.insert(container, document.clone()) {
            previous.abort_background();
        }
        Ok(())
    }
}

#[async_trait]
impl Viewer for HttpViewer {
    async fn load(
        &self,
        config: &ViewerConfig,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn ViewerInstance>, ViewerError> {
        let document = tokio::select! {
            _ = cancel.cancelled() => return Err(ViewerError::Cancelled),
            document = self.fetch_document(config) => document?,
        };
        self.mount(config.container, &document, cancel)?;
        Ok(document)
    }

    async fn unload(
        &self,
        container: ContainerId,
        instance: &dyn ViewerInstance,
    ) -> Result<(), ViewerError> {
        let document = {
            let mut mounted = self
                .mounted
                .lock()
                .map_err(|_| ViewerError::Load("viewer state poisoned".to_string()))?;
            let owned = mounted
                .get(&container)
                .is_some_and(|document| is_same_instance(document, instance));
            if owned {
                mounted.remove(&container)
            } else {
                None
            }
        };
        let document = document.ok_or(ViewerError::NotLoaded(container))?;
        document.abort_background();
        Ok(())
    }
}

/// Document state shared between the viewer and its background download.
pub struct HttpDocument {
    body: Mutex<DocumentBody>,
    background: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct DocumentBody {
    bytes: Vec<u8>,
    complete: bool,
    page_count: Option<u32>,
    announced_pages: Option<u32>,
    failure: Option<String>,
}

impl HttpDocument {
    fn complete(bytes: Vec<u8>) -> Self {
        let pages = page_count(&bytes);
        Self::with_body(DocumentBody {
            bytes,
            complete: true,
            page_count: pages,
            ..DocumentBody::default()
        })
    }

    fn partial(head: Vec<u8>, announced_pages: Option<u32>) -> Self {
        Self::with_body(DocumentBody {
            bytes: head,
            announced_pages,
            ..DocumentBody::default()
        })
    }

    fn with_body(body: DocumentBody) -> Self {
        Self {
            body: Mutex::new(body),
            background: Mutex::new(None),
        }
    }

    fn finish(&self, rest: Fetched) {
        if let Ok(mut body) = self.body.lock() {
            if rest.partial {
                body.bytes.extend_from_slice(&rest.bytes);
            } else {
                body.bytes = rest.bytes;
            }
            body.complete = true;
            body.page_count = page_count(&body.bytes).or(body.announced_pages);
        }
    }

    fn fail(&self, message: String) {
        if let Ok(mut body) = self.body.lock() {
            body.failure = Some(message);
        }
    }

    fn set_background(&self, handle: JoinHandle<()>) {
        if let Ok(mut background) = self.background.lock() {
            *background = Some(handle);
        }
    }

    fn abort_background(&self) {
        if let Some(handle) = self.background.lock().ok().and_then(|mut slot| slot.take()) {
            handle.abort();
        }
    }
}

#[async_trait]
impl ViewerInstance for HttpDocument {
    async fn total_page_count(&self) -> Result<Option<u32>, ViewerError> {
        let body = self
            .body
            .lock()
            .map_err(|_| ViewerError::Load("document state poisoned".to_string()))?;
        if let Some(failure) = &body.failure {
            return Err(ViewerError::Load(failure.clone()));
        }
        Ok(if body.complete { body.page_count } else { None })
    }

    async fn current_page_index(&self) -> Result<Option<u32>, ViewerError> {
        // The first page is on screen as soon as load resolves.
        Ok(Some(0))
    }

    async fn export_pdf(&self) -> Result<Bytes, ViewerError> {
        let body = self
            .body
            .lock()
            .map_err(|_| ViewerError::Load("document state poisoned".to_string()))?;
        if body.complete {
            Ok(Bytes::copy_from_slice(&body.bytes))
        } else {
            Err(ViewerError::NotReady)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ByteRange {
    First(u64),
    From(u64),
}

impl ByteRange {
    fn header_value(self) -> String {
        match self {
            ByteRange::First(len) => format!("bytes=0-{}", len.saturating_sub(1)),
            ByteRange::From(offset) => format!("bytes={offset}-"),
        }
    }
}

struct Fetched {
    bytes: Vec<u8>,
    partial: bool,
    total_len: Option<u64>,
}

#[derive(Clone)]
struct Downloader {
    client: reqwest::Client,
    timings: Arc<TimingRecorder>,
}

impl Downloader {
    async fn fetch(
        &self,
        url: &str,
        range: Option<ByteRange>,
        bearer: Option<&str>,
    ) -> Result<Fetched, ViewerError> {
        let parsed = reqwest::Url::parse(url).map_err(|err| ViewerError::Load(err.to_string()))?;
        let request_start = self.timings.now();

        let mut request = self.client.get(parsed);
        if let Some(range) = range {
            request = request.header(RANGE, range.header_value());
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        let response_start = self.timings.now();

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::HttpStatus(status.as_u16()));
        }
        let partial = status == StatusCode::PARTIAL_CONTENT;
        let total_len = if partial {
            content_range_total(response.headers())
        } else {
            response.content_length()
        };

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            bytes.extend_from_slice(&chunk);
        }
        let response_end = self.timings.now();

        let size = bytes.len() as u64;
        self.timings.record(ResourceTiming {
            name: url.to_string(),
            start_time: request_start,
            duration: response_end.saturating_sub(request_start),
            transfer_size: size,
            encoded_body_size: size,
            decoded_body_size: size,
            request_start,
            response_start,
            response_end,
        });

        Ok(Fetched {
            bytes,
            partial,
            total_len,
        })
    }
}

/// Total length from `Content-Range: bytes 0-99/1234`.
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)?
        .to_str()
        .ok()?
        .rsplit('/')
        .next()?
        .trim()
        .parse()
        .ok()
}

fn map_reqwest_error(err: reqwest::Error) -> ViewerError {
    if err.is_timeout() {
        return ViewerError::Network(format!("timeout: {err}"));
    }
    ViewerError::Network(err.to_string())
}
