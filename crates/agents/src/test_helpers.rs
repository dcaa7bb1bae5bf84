//! Shared test doubles for the stage tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use researchflow_core::error::{ProviderError, RenderError};
use researchflow_core::message::Message;
use researchflow_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use researchflow_core::render::{ChartRenderer, DocumentWriter, ReliabilityChart, ReportDocument};
use researchflow_core::search::{SearchClient, SearchHit, SearchRequest, SearchResponse};

pub fn hit(title: &str, url: &str, score: f64) -> SearchHit {
    SearchHit {
        content: format!("Content of {title}"),
        url: url.into(),
        title: title.into(),
        score,
    }
}

pub fn response(results: Vec<SearchHit>) -> SearchResponse {
    SearchResponse {
        results,
        answer: None,
    }
}

/// A search client that plays back a script of responses.
///
/// Once the script runs out it answers with `exhausted` (an empty response
/// unless built with [`ScriptedSearchClient::failing`]).
pub struct ScriptedSearchClient {
    script: Mutex<VecDeque<Result<SearchResponse, ProviderError>>>,
    exhausted: Option<ProviderError>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearchClient {
    pub fn new(script: Vec<Result<SearchResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            exhausted: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            exhausted: Some(error),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl SearchClient for ScriptedSearchClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ProviderError> {
        self.queries.lock().unwrap().push(request.query.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(next) => next,
            None => match &self.exhausted {
                Some(error) => Err(error.clone()),
                None => Ok(SearchResponse::default()),
            },
        }
    }
}

/// A provider that returns a sequence of scripted texts and keeps every
/// request it received.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        let text = match next {
            Some(result) => result?,
            None => panic!("SequentialMockProvider: no more responses"),
        };
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

/// A chart renderer that records every chart and writes a placeholder file.
#[derive(Default)]
pub struct RecordingChartRenderer {
    pub charts: Mutex<Vec<ReliabilityChart>>,
    fail: bool,
}

impl RecordingChartRenderer {
    pub fn failing() -> Self {
        Self {
            charts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<ReliabilityChart> {
        self.charts.lock().unwrap().last().cloned()
    }
}

impl ChartRenderer for RecordingChartRenderer {
    fn render(&self, chart: &ReliabilityChart, path: &Path) -> Result<(), RenderError> {
        self.charts.lock().unwrap().push(chart.clone());
        if self.fail {
            return Err(RenderError::Chart("backend unavailable".into()));
        }
        std::fs::write(path, b"png").map_err(|e| RenderError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// A document writer that records every document and writes a placeholder
/// file.
#[derive(Default)]
pub struct RecordingDocumentWriter {
    pub documents: Mutex<Vec<ReportDocument>>,
    fail: bool,
}

impl RecordingDocumentWriter {
    pub fn failing() -> Self {
        Self {
            documents: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<ReportDocument> {
        self.documents.lock().unwrap().last().cloned()
    }
}

impl DocumentWriter for RecordingDocumentWriter {
    fn write(&self, document: &ReportDocument, path: &Path) -> Result<(), RenderError> {
        self.documents.lock().unwrap().push(document.clone());
        if self.fail {
            return Err(RenderError::Document("disk full".into()));
        }
        std::fs::write(path, b"docx").map_err(|e| RenderError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}
