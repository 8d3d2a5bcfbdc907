use super::{Capability, Tool, ToolArgs, ToolDescriptor, ToolOutput};
use crate::config::{AgentConfig, PubMedConfig};
use crate::resilience::OperationExecutor;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

/// Article detail retrieval against the NCBI ESummary endpoint.
///
/// Takes a `pmid` and answers with a flat record of the article's metadata.
pub struct PubMedArticleTool {
    descriptor: ToolDescriptor,
    client: Client,
    base_url: String,
    api_key: Option<String>,
    executor: OperationExecutor,
}

impl PubMedArticleTool {
    pub const NAME: &'static str = "pubmed_get_article";

    pub fn new(pubmed: &PubMedConfig, agent: &AgentConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(pubmed.user_agent.as_str())
            .build()?;
        Ok(Self {
            descriptor: ToolDescriptor::new(Self::NAME, Capability::Fetch),
            client,
            base_url: pubmed.base_url.trim_end_matches('/').to_string(),
            api_key: pubmed.api_key.clone(),
            executor: OperationExecutor::from_config(agent),
        })
    }

    fn summary_url(&self, pmid: &str) -> Result<Url> {
        let mut url =
            Url::parse(&format!("{}/esummary.fcgi", self.base_url)).map_err(|e| Error::Parse {
                context: "esummary url".to_string(),
                message: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("db", "pubmed")
            .append_pair("retmode", "json")
            .append_pair("id", pmid);
        if let Some(api_key) = &self.api_key {
            url.query_pairs_mut().append_pair("api_key", api_key);
        }
        Ok(url)
    }

    async fn fetch_summary(&self, pmid: &str) -> Result<ToolOutput> {
        let url = self.summary_url(pmid)?;
        let body: Value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let record = body
            .pointer(&format!("/result/{pmid}"))
            .ok_or_else(|| Error::Parse {
                context: "esummary response".to_string(),
                message: format!("no record for PMID {pmid}"),
            })?;

        if let Some(reason) = record.get("error").and_then(Value::as_str) {
            return Err(Error::Upstream {
                service: "pubmed".to_string(),
                reason: format!("PMID {pmid}: {reason}"),
            });
        }

        Ok(Self::format_article(pmid, record))
    }

    /// Flatten an ESummary record into the tool's output shape.
    fn format_article(pmid: &str, record: &Value) -> ToolOutput {
        let authors: Vec<String> = record
            .get("authors")
            .and_then(Value::as_array)
            .map(|authors| {
                authors
                    .iter()
                    .filter_map(|author| author.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let pubdate = record.get("pubdate").and_then(Value::as_str).unwrap_or("");
        let year = pubdate
            .split_whitespace()
            .next()
            .and_then(|year| year.parse::<u32>().ok());

        json!({
            "pmid": pmid,
            "title": record.get("title").and_then(Value::as_str),
            "authors": authors,
            "journal": record.get("fulljournalname").and_then(Value::as_str),
            "year": year,
            "pubdate": pubdate,
        })
    }
}

#[async_trait]
impl Tool for PubMedArticleTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke_async(&self, args: ToolArgs) -> Result<ToolOutput> {
        let pmid = match args.get("pmid") {
            Some(Value::String(pmid)) if !pmid.is_empty() => pmid.clone(),
            // PMIDs are numeric; accept the number form callers tend to send.
            Some(Value::Number(pmid)) => pmid.to_string(),
            _ => {
                return Err(Error::InvalidInput {
                    field: "pmid".to_string(),
                    reason: "a PMID is required".to_string(),
                })
            }
        };

        debug!(pmid = %pmid, "fetching article details");
        self.executor
            .execute(
                || self.fetch_summary(&pmid),
                args.exec_options(),
                "article detail fetch",
            )
            .await
    }
}
