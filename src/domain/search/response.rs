use serde::{Deserialize, Serialize};

/// Placeholder context used when no search context is available
pub const NO_ADDITIONAL_CONTEXT: &str = "No additional context available";

/// Results used to build the prompt context
const CONTEXT_RESULTS: usize = 5;

/// Characters of each result's content kept in the prompt context
const CONTEXT_SNIPPET_CHARS: usize = 1000;

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub score: f64,
}

/// Raw response from a search provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// Reference to a source shown alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub title: Option<String>,
    pub url: String,
    pub score: f64,
}

/// Search results formatted for prompting; this is what the search gateway caches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchContext {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub context: String,
}

impl SearchContext {
    /// Formats a provider response into prompt context
    pub fn from_response(response: SearchResponse) -> Self {
        let snippets: Vec<String> = response
            .results
            .iter()
            .take(CONTEXT_RESULTS)
            .map(|result| {
                let content: String = result
                    .content
                    .as_deref()
                    .unwrap_or("")
                    .chars()
                    .take(CONTEXT_SNIPPET_CHARS)
                    .collect();
                format!(
                    "Source: {}\n{}...",
                    result.title.as_deref().unwrap_or("Untitled"),
                    content
                )
            })
            .collect();

        let context = if snippets.is_empty() {
            NO_ADDITIONAL_CONTEXT.to_string()
        } else {
            snippets.join("\n\n")
        };

        Self {
            query: response.query,
            results: response.results,
            context,
        }
    }

    /// Context for a search that produced nothing or failed
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            context: NO_ADDITIONAL_CONTEXT.to_string(),
        }
    }

    pub fn has_context(&self) -> bool {
        self.context != NO_ADDITIONAL_CONTEXT
    }

    /// Top sources that carry a URL
    pub fn sources(&self, limit: usize) -> Vec<Source> {
        self.results
            .iter()
            .filter_map(|r| {
                r.url.as_ref().map(|url| Source {
                    title: r.title.clone(),
                    url: url.clone(),
                    score: r.score,
                })
            })
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, content: &str, url: Option<&str>) -> SearchResult {
        SearchResult {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            url: url.map(|u| u.to_string()),
            score: 0.9,
        }
    }

    #[test]
    fn test_context_from_results() {
        let response = SearchResponse {
            query: "medical information flu".to_string(),
            results: vec![
                result("Flu - CDC", "Influenza is a contagious illness", Some("https://cdc.gov/flu")),
                result("Flu - Mayo", "Symptoms include fever", Some("https://mayoclinic.org/flu")),
            ],
        };

        let context = SearchContext::from_response(response);

        assert!(context.has_context());
        assert_eq!(
            context.context,
            "Source: Flu - CDC\nInfluenza is a contagious illness...\n\nSource: Flu - Mayo\nSymptoms include fever..."
        );
    }

    #[test]
    fn test_context_uses_top_five_and_truncates() {
        let long = "x".repeat(1500);
        let results = (0..7)
            .map(|i| result(&format!("R{}", i), &long, None))
            .collect();

        let context = SearchContext::from_response(SearchResponse {
            query: "q".to_string(),
            results,
        });

        assert_eq!(context.context.matches("Source: ").count(), 5);
        assert!(!context.context.contains("R5"));
        assert!(context.context.contains(&format!("{}...", "x".repeat(1000))));
        assert!(!context.context.contains(&"x".repeat(1001)));
    }

    #[test]
    fn test_empty_results_use_placeholder() {
        let context = SearchContext::from_response(SearchResponse::default());
        assert_eq!(context.context, NO_ADDITIONAL_CONTEXT);
        assert!(!context.has_context());
    }

    #[test]
    fn test_sources_skip_results_without_url() {
        let context = SearchContext::from_response(SearchResponse {
            query: "q".to_string(),
            results: vec![
                result("a", "a", None),
                result("b", "b", Some("https://nih.gov/b")),
                result("c", "c", Some("https://who.int/c")),
            ],
        });

        let sources = context.sources(1);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://nih.gov/b");
    }
}
