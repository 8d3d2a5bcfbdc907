use super::{Agent, TaskOutcome};
use crate::config::Config;
use crate::tools::{PubMedArticleTool, PubMedSearchTool, ToolArgs, ToolOutput, TranslateTool};
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Research assistant wiring the PubMed and translation tools into one agent.
pub struct PubMedAssistant {
    agent: Agent,
    max_search_results: u32,
}

impl PubMedAssistant {
    pub fn new(name: impl Into<String>, config: &Config) -> Result<Self> {
        let mut agent = Agent::new(name, &config.agent);
        agent.register_tool(Arc::new(PubMedSearchTool::new(&config.pubmed, &config.agent)?));
        agent.register_tool(Arc::new(PubMedArticleTool::new(
            &config.pubmed,
            &config.agent,
        )?));
        agent.register_tool(Arc::new(TranslateTool::new(
            &config.translation,
            &config.agent,
        )?));
        Ok(Self {
            agent,
            max_search_results: config.pubmed.max_search_results,
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    /// Search PubMed and return up to `topk` PMIDs.
    pub async fn search(&self, query: &str, topk: usize) -> Result<Vec<String>> {
        let args = ToolArgs::new()
            .with("query", query)
            .with("max_results", self.max_search_results);
        let output = self
            .agent
            .dispatch_async(PubMedSearchTool::NAME, args)
            .await?;

        let mut pmids: Vec<String> = output
            .get("pmids")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        info!(query = %query, found = pmids.len(), "search finished");
        pmids.truncate(topk);
        Ok(pmids)
    }

    /// Fetch details for a single article.
    pub async fn article_details(&self, pmid: &str) -> Result<ToolOutput> {
        self.agent
            .dispatch_async(PubMedArticleTool::NAME, ToolArgs::new().with("pmid", pmid))
            .await
    }

    /// Fetch details for many articles concurrently.
    ///
    /// Failed lookups are logged and dropped; getting fewer records than
    /// PMIDs is a partial result, not an error.
    pub async fn batch_article_details(&self, pmids: &[String]) -> Result<Vec<ToolOutput>> {
        let params: Vec<ToolArgs> = pmids
            .iter()
            .map(|pmid| ToolArgs::new().with("pmid", pmid.as_str()))
            .collect();
        self.agent.fan_out(PubMedArticleTool::NAME, params).await
    }

    /// Like [`PubMedAssistant::batch_article_details`], but reports one
    /// outcome per PMID so callers can see which inputs failed.
    pub async fn batch_article_outcomes(&self, pmids: &[String]) -> Result<Vec<TaskOutcome>> {
        let params: Vec<ToolArgs> = pmids
            .iter()
            .map(|pmid| ToolArgs::new().with("pmid", pmid.as_str()))
            .collect();
        self.agent
            .fan_out_outcomes(PubMedArticleTool::NAME, params)
            .await
    }

    /// Translate text through the configured backend.
    pub async fn translate(&self, text: &str, target_lang: Option<&str>) -> Result<ToolOutput> {
        let mut args = ToolArgs::new().with("text", text);
        if let Some(lang) = target_lang {
            args = args.with("target_lang", lang);
        }
        self.agent.dispatch_async(TranslateTool::NAME, args).await
    }
}
