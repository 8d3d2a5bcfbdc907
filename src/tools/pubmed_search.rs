use super::{Capability, Tool, ToolArgs, ToolDescriptor, ToolOutput};
use crate::config::{AgentConfig, PubMedConfig};
use crate::resilience::OperationExecutor;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: usize = 128;

/// Cached search response with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry {
    output: ToolOutput,
    inserted_at: Instant,
}

impl CacheEntry {
    fn new(output: ToolOutput) -> Self {
        Self {
            output,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > CACHE_TTL
    }
}

/// Literature search against the NCBI ESearch endpoint.
///
/// Accepts either a ready `query` term or structured
/// `journal`/`author`/`year`/`keyword` parameters, and answers with the
/// matching PMIDs. Responses are held in a bounded TTL cache keyed by the
/// effective term.
pub struct PubMedSearchTool {
    descriptor: ToolDescriptor,
    client: Client,
    base_url: String,
    api_key: Option<String>,
    default_max_results: u32,
    executor: OperationExecutor,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl PubMedSearchTool {
    pub const NAME: &'static str = "pubmed_search";

    pub fn new(pubmed: &PubMedConfig, agent: &AgentConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(pubmed.user_agent.as_str())
            .build()?;
        Ok(Self {
            descriptor: ToolDescriptor::new(Self::NAME, Capability::Search),
            client,
            base_url: pubmed.base_url.trim_end_matches('/').to_string(),
            api_key: pubmed.api_key.clone(),
            default_max_results: pubmed.max_search_results,
            executor: OperationExecutor::from_config(agent),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Build the ESearch term from the parameter map.
    ///
    /// A plain `query` wins; otherwise the structured parameters are joined
    /// into one boolean term.
    fn build_term(args: &ToolArgs) -> Option<String> {
        if let Some(query) = args.get_str("query") {
            if !query.is_empty() {
                return Some(query.to_string());
            }
        }

        let mut clauses = Vec::new();
        if let Some(journal) = args.get_str("journal") {
            clauses.push(format!("{journal}[Journal]"));
        }
        if let Some(author) = args.get_str("author") {
            clauses.push(format!("{author}[First Author]"));
        }
        match args.get("year") {
            Some(Value::String(year)) => clauses.push(format!("{year}[PDAT]")),
            Some(Value::Number(year)) => clauses.push(format!("{year}[PDAT]")),
            _ => {}
        }
        if let Some(keyword) = args.get_str("keyword") {
            clauses.push(format!("{keyword}[All Fields]"));
        }

        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    fn search_url(&self, term: &str, retmax: u32) -> Result<Url> {
        let mut url =
            Url::parse(&format!("{}/esearch.fcgi", self.base_url)).map_err(|e| Error::Parse {
                context: "esearch url".to_string(),
                message: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("db", "pubmed")
            .append_pair("retmode", "json")
            .append_pair("retmax", &retmax.to_string())
            .append_pair("term", term);
        if let Some(api_key) = &self.api_key {
            url.query_pairs_mut().append_pair("api_key", api_key);
        }
        Ok(url)
    }

    async fn fetch_pmids(&self, term: &str, retmax: u32) -> Result<ToolOutput> {
        let url = self.search_url(term, retmax)?;
        let body: Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let ids = body
            .pointer("/esearchresult/idlist")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Parse {
                context: "esearch response".to_string(),
                message: "missing esearchresult.idlist".to_string(),
            })?;
        let pmids: Vec<String> = ids
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        let count = body
            .pointer("/esearchresult/count")
            .and_then(Value::as_str)
            .and_then(|count| count.parse::<u64>().ok())
            .unwrap_or(pmids.len() as u64);

        Ok(json!({
            "pmids": pmids,
            "count": count,
        }))
    }

    async fn cached(&self, key: &str) -> Option<ToolOutput> {
        let cache = self.cache.read().await;
        cache
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.output.clone())
    }

    async fn store(&self, key: String, output: ToolOutput) {
        let mut cache = self.cache.write().await;
        cache.retain(|_, entry| !entry.is_expired());
        if cache.len() >= CACHE_CAPACITY {
            let oldest = cache
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                cache.remove(&oldest);
            }
        }
        cache.insert(key, CacheEntry::new(output));
    }
}

#[async_trait]
impl Tool for PubMedSearchTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke_async(&self, args: ToolArgs) -> Result<ToolOutput> {
        let Some(term) = Self::build_term(&args) else {
            debug!("search invoked without a query or structured parameters");
            return Ok(json!({ "pmids": [], "count": 0 }));
        };
        let retmax = args
            .get_u64("max_results")
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(self.default_max_results);

        let cache_key = format!("{term}|{retmax}");
        if let Some(hit) = self.cached(&cache_key).await {
            debug!(term = %term, "returning cached search result");
            return Ok(hit);
        }

        let output = self
            .executor
            .execute(
                || self.fetch_pmids(&term, retmax),
                args.exec_options(),
                "PubMed search",
            )
            .await?;

        let found = output
            .pointer("/pmids")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        info!(term = %term, found, "literature search finished");

        self.store(cache_key, output.clone()).await;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_query_wins_over_structured_parameters() {
        let args = ToolArgs::new()
            .with("query", "crispr AND liver")
            .with("journal", "Nature");
        assert_eq!(
            PubMedSearchTool::build_term(&args).as_deref(),
            Some("crispr AND liver")
        );
    }

    #[test]
    fn structured_parameters_join_into_one_term() {
        let args = ToolArgs::new()
            .with("journal", "Nature")
            .with("author", "Smith J")
            .with("year", 2021_u64)
            .with("keyword", "sepsis");
        let term = PubMedSearchTool::build_term(&args).unwrap();
        assert_eq!(
            term,
            "Nature[Journal] AND Smith J[First Author] AND 2021[PDAT] AND sepsis[All Fields]"
        );
    }

    #[test]
    fn no_parameters_yields_no_term() {
        assert!(PubMedSearchTool::build_term(&ToolArgs::new()).is_none());
        let blank = ToolArgs::new().with("query", "");
        assert!(PubMedSearchTool::build_term(&blank).is_none());
    }
}
