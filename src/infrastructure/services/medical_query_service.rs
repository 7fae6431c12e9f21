//! Medical query orchestration: validate, search, answer, record

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use super::ai_gateway::AiGateway;
use super::search_gateway::SearchGateway;
use crate::domain::{
    DomainError, HistoryRecord, HistoryRepository, ImageAttachment, QueryMode, QueryValidator,
    Source,
};
use crate::infrastructure::observability::record_medical_query;

pub const DEFAULT_MAX_SOURCES: usize = 10;

/// A question as received from a client
#[derive(Debug, Clone)]
pub struct MedicalQuery {
    pub query: String,
    pub mode: QueryMode,
    pub include_sources: bool,
    pub image: Option<ImageAttachment>,
}

impl MedicalQuery {
    pub fn new(query: impl Into<String>, mode: QueryMode) -> Self {
        Self {
            query: query.into(),
            mode,
            include_sources: true,
            image: None,
        }
    }

    pub fn with_sources(mut self, include: bool) -> Self {
        self.include_sources = include;
        self
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// An attached image always switches to image analysis
    pub fn effective_mode(&self) -> QueryMode {
        if self.image.is_some() {
            QueryMode::Image
        } else {
            self.mode
        }
    }
}

/// The answer returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub query: String,
    pub response: String,
    pub confidence_score: f64,
    pub sources: Vec<Source>,
    pub disclaimer: String,
    pub timestamp: DateTime<Utc>,
}

/// Runs a query through validation, the gateways and history
pub struct MedicalQueryService {
    validator: QueryValidator,
    search: SearchGateway,
    ai: AiGateway,
    history: Arc<dyn HistoryRepository>,
    max_sources: usize,
}

impl MedicalQueryService {
    pub fn new(search: SearchGateway, ai: AiGateway, history: Arc<dyn HistoryRepository>) -> Self {
        Self {
            validator: QueryValidator::default(),
            search,
            ai,
            history,
            max_sources: DEFAULT_MAX_SOURCES,
        }
    }

    pub fn with_validator(mut self, validator: QueryValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    pub fn validator(&self) -> &QueryValidator {
        &self.validator
    }

    pub fn history(&self) -> &Arc<dyn HistoryRepository> {
        &self.history
    }

    /// Answers a query. Rejected queries never reach a provider.
    pub async fn answer(&self, request: MedicalQuery) -> Result<QueryAnswer, DomainError> {
        self.validator.validate(&request.query).into_result()?;

        let mode = request.effective_mode();
        info!(mode = %mode, "Processing medical query");

        let (ai_answer, sources) = match mode {
            QueryMode::Image => {
                let answer = self
                    .ai
                    .analyze_image(&request.query, request.image.as_ref())
                    .await?;
                (answer, Vec::new())
            }
            QueryMode::DeepSearch => {
                let search = self.search.search(&request.query).await;
                let answer = self
                    .ai
                    .generate(&request.query, Some(&search.context), mode)
                    .await?;
                let sources = if request.include_sources {
                    search.sources(self.max_sources)
                } else {
                    Vec::new()
                };
                (answer, sources)
            }
            QueryMode::Quick | QueryMode::Expert => {
                let answer = self.ai.generate(&request.query, None, mode).await?;
                (answer, Vec::new())
            }
        };

        let response = self.validator.wrap_response(&ai_answer.response);
        record_medical_query(mode.as_str());

        self.record_history(HistoryRecord::new(
            mode,
            &request.query,
            response.clone(),
            ai_answer.confidence_score,
            &sources,
        ));

        Ok(QueryAnswer {
            query: request.query,
            response,
            confidence_score: ai_answer.confidence_score,
            sources,
            disclaimer: self.validator.disclaimer().to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Most recent history entries, newest first
    pub async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryRecord>, DomainError> {
        self.history.recent(limit).await
    }

    fn record_history(&self, record: HistoryRecord) {
        let history = self.history.clone();

        tokio::spawn(async move {
            if let Err(e) = history.append(record).await {
                error!(
                    backend = history.backend_name(),
                    error = %e,
                    "Failed to persist medical query"
                );
            }
        });
    }
}
