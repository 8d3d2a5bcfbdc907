//! Wiremock-backed tests for the HTTP tools: response parsing, the search
//! cache, and retry behavior against a misbehaving upstream.

use pubmed_agent::{
    AgentConfig, Error, PubMedArticleTool, PubMedConfig, PubMedSearchTool, Tool, ToolArgs,
    TranslateTool, TranslationConfig,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pubmed_config(server: &MockServer) -> PubMedConfig {
    PubMedConfig {
        base_url: server.uri(),
        ..PubMedConfig::default()
    }
}

fn agent_config(max_retries: u32) -> AgentConfig {
    AgentConfig {
        timeout_secs: 5,
        max_retries,
        ..AgentConfig::default()
    }
}

fn esearch_body(ids: &[&str]) -> serde_json::Value {
    json!({
        "header": { "type": "esearch", "version": "0.3" },
        "esearchresult": {
            "count": ids.len().to_string(),
            "retmax": ids.len().to_string(),
            "idlist": ids,
        }
    })
}

#[tokio::test]
async fn search_tool_parses_the_idlist() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(&["111", "222"])))
        .expect(1)
        .mount(&server)
        .await;

    let tool = PubMedSearchTool::new(&pubmed_config(&server), &agent_config(3)).unwrap();
    let output = tool
        .invoke_async(ToolArgs::new().with("query", "sepsis"))
        .await
        .unwrap();

    assert_eq!(output["count"], 2);
    assert_eq!(output["pmids"], json!(["111", "222"]));
}

#[tokio::test]
async fn search_tool_serves_repeat_queries_from_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(&["7"])))
        .expect(1)
        .mount(&server)
        .await;

    let tool = PubMedSearchTool::new(&pubmed_config(&server), &agent_config(3)).unwrap();
    let args = ToolArgs::new().with("query", "cached term");

    let first = tool.invoke_async(args.clone()).await.unwrap();
    let second = tool.invoke_async(args).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn search_tool_retries_past_a_transient_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body(&["42"])))
        .expect(1)
        .mount(&server)
        .await;

    let tool = PubMedSearchTool::new(&pubmed_config(&server), &agent_config(3)).unwrap();
    let output = tool
        .invoke_async(ToolArgs::new().with("query", "flaky upstream"))
        .await
        .unwrap();
    assert_eq!(output["pmids"], json!(["42"]));
}

#[tokio::test]
async fn search_tool_honors_a_per_call_retry_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let tool = PubMedSearchTool::new(&pubmed_config(&server), &agent_config(3)).unwrap();
    let args = ToolArgs::new()
        .with("query", "bounded")
        .with("max_retries", 1_u64);

    let result = tool.invoke_async(args).await;
    match result {
        Err(Error::OperationFailed { attempts, .. }) => assert_eq!(attempts, 1),
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn article_tool_parses_an_esummary_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": { "type": "esummary", "version": "0.3" },
            "result": {
                "uids": ["33577", "extra"],
                "33577": {
                    "uid": "33577",
                    "title": "Antibiotic stewardship outcomes",
                    "fulljournalname": "The Lancet",
                    "pubdate": "2019 Jun 3",
                    "authors": [{ "name": "Chen L", "authtype": "Author" }],
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tool = PubMedArticleTool::new(&pubmed_config(&server), &agent_config(3)).unwrap();
    let article = tool
        .invoke_async(ToolArgs::new().with("pmid", "33577"))
        .await
        .unwrap();

    assert_eq!(article["pmid"], "33577");
    assert_eq!(article["title"], "Antibiotic stewardship outcomes");
    assert_eq!(article["journal"], "The Lancet");
    assert_eq!(article["year"], 2019);
    assert_eq!(article["authors"], json!(["Chen L"]));
}

#[tokio::test]
async fn article_tool_surfaces_upstream_record_errors_after_the_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "999": { "uid": "999", "error": "cannot get document summary" }
            }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let tool = PubMedArticleTool::new(&pubmed_config(&server), &agent_config(2)).unwrap();
    let result = tool.invoke_async(ToolArgs::new().with("pmid", "999")).await;

    match result {
        Err(Error::OperationFailed {
            operation,
            attempts,
            message,
        }) => {
            assert_eq!(operation, "article detail fetch");
            assert_eq!(attempts, 2);
            assert!(message.contains("999"));
        }
        other => panic!("expected OperationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn translate_tool_extracts_the_completion_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "  Le foie  " },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let translation = TranslationConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        ..TranslationConfig::default()
    };
    let tool = TranslateTool::new(&translation, &agent_config(3)).unwrap();
    let output = tool
        .invoke_async(
            ToolArgs::new()
                .with("text", "The liver")
                .with("target_lang", "French"),
        )
        .await
        .unwrap();

    assert_eq!(output["original_text"], "The liver");
    assert_eq!(output["translated_text"], "Le foie");
    assert_eq!(output["target_language"], "French");
}

#[tokio::test]
async fn translate_tool_reports_malformed_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let translation = TranslationConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        ..TranslationConfig::default()
    };
    let tool = TranslateTool::new(&translation, &agent_config(2)).unwrap();
    let result = tool
        .invoke_async(ToolArgs::new().with("text", "hello"))
        .await;

    assert!(matches!(result, Err(Error::OperationFailed { attempts: 2, .. })));
}
