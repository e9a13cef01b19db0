//! HTTP client for the two remote endpoints a report needs.
//!
//! * Endpoint A – MediaWiki `action=query&list=usercontribs`, paginated with
//!   an opaque `continue` object.
//! * Endpoint B – Wikimedia `metrics/pageviews/per-article`, one daily
//!   series per title.
//!
//! [`WikiApi`] is the seam the fetcher and aggregator are written against;
//! [`WikimediaClient`] is the `reqwest` implementation used in production.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use views_core::error::{Result, ViewsError};
use views_core::models::{Contribution, DailyViews, ViewWindow};
use views_core::settings::Settings;

/// Parameters copied verbatim from a response's `continue` object and sent
/// back unchanged on the next request.
pub type ContinuationToken = BTreeMap<String, String>;

/// One page of the contributions listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionsPage {
    /// Edit events on this page.
    pub contributions: Vec<Contribution>,
    /// Present while more pages remain.
    pub continuation: Option<ContinuationToken>,
}

// ── WikiApi ───────────────────────────────────────────────────────────────────

/// Remote operations the report pipeline depends on.
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Fetch one page of `user`'s contributions, resuming from
    /// `continuation` when given.
    async fn contributions_page(
        &self,
        user: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<ContributionsPage>;

    /// Fetch the daily views series for `title` over `window`.
    async fn daily_views(&self, title: &str, window: &ViewWindow) -> Result<Vec<DailyViews>>;
}

// ── ClientConfig ──────────────────────────────────────────────────────────────

/// Endpoints, query dimensions and transport limits for [`WikimediaClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// MediaWiki action API, e.g. `https://en.wikipedia.org/w/api.php`.
    pub api_url: String,
    /// Per-article pageviews base URL (no trailing path segments).
    pub metrics_url: String,
    /// Pageviews project, e.g. `en.wikipedia.org`.
    pub project: String,
    /// Access method dimension, e.g. `all-access`.
    pub access: String,
    /// Agent dimension, e.g. `all-agents` or `user`.
    pub agent: String,
    /// Sent as `User-Agent` on every request.
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build the client configuration from resolved CLI settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            metrics_url: settings.metrics_url.clone(),
            project: settings.project.clone(),
            access: settings.access.clone(),
            agent: settings.agent.clone(),
            user_agent: settings.user_agent.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Full URL of the daily series for `title` over `window`.
    pub fn pageviews_url(&self, title: &str, window: &ViewWindow) -> String {
        format!(
            "{}/{}/{}/{}/{}/daily/{}/{}",
            self.metrics_url.trim_end_matches('/'),
            self.project,
            self.access,
            self.agent,
            encode_title(title),
            window.start_param(),
            window.end_param(),
        )
    }
}

// ── WikimediaClient ───────────────────────────────────────────────────────────

/// `reqwest`-backed [`WikiApi`].
pub struct WikimediaClient {
    client: Client,
    config: ClientConfig,
}

impl WikimediaClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ViewsError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Send a GET and decode the JSON body, mapping every failure onto the
    /// matching [`ViewsError`] kind.
    async fn get_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url_for_log: &str,
    ) -> Result<T> {
        let response = request.send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewsError::HttpStatus {
                status: status.as_u16(),
                url: url_for_log.to_string(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        serde_json::from_str(&body).map_err(|e| ViewsError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl WikiApi for WikimediaClient {
    async fn contributions_page(
        &self,
        user: &str,
        continuation: Option<&ContinuationToken>,
    ) -> Result<ContributionsPage> {
        let mut params: BTreeMap<String, String> = [
            ("action", "query"),
            ("list", "usercontribs"),
            ("ucuser", user),
            ("uclimit", "max"),
            ("ucprop", "title|timestamp"),
            ("format", "json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        // Continuation keys overwrite base keys of the same name.
        if let Some(token) = continuation {
            params.extend(token.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        debug!(user, ?continuation, "requesting contributions page");

        let request = self.client.get(&self.config.api_url).query(&params);
        let payload: UserContribsResponse = self.get_json(request, &self.config.api_url).await?;
        payload.into_page()
    }

    async fn daily_views(&self, title: &str, window: &ViewWindow) -> Result<Vec<DailyViews>> {
        let url = self.config.pageviews_url(title, window);
        debug!(title, %url, "requesting daily views");

        let request = self.client.get(&url);
        let payload: PageviewsResponse = self.get_json(request, &url).await?;
        Ok(payload.items)
    }
}

// ── Title encoding ────────────────────────────────────────────────────────────

/// Turn a page title into a single URL path segment.
///
/// Spaces become underscores (the canonical MediaWiki form), then every
/// byte outside the RFC 3986 unreserved set `A-Z a-z 0-9 - . _ ~` is
/// percent-encoded, so `/`, `?` and `%` inside a title can never split or
/// terminate the path.
///
/// Sub-delimiters such as `&`, `'`, `(`, `)`, `+`, `,`, `:` and `=` are
/// escaped too, unlike a URL path-segment encoder. The escaped byte set is
/// exactly that of Python's `urllib.parse.quote(title, safe='')`.
///
/// ```
/// use views_data::client::encode_title;
///
/// assert_eq!(encode_title("Henrietta Swan Leavitt"), "Henrietta_Swan_Leavitt");
/// assert_eq!(encode_title("AC/DC"), "AC%2FDC");
/// ```
pub fn encode_title(title: &str) -> String {
    let underscored = title.replace(' ', "_");
    let mut out = String::with_capacity(underscored.len());
    for byte in underscored.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UserContribsResponse {
    #[serde(default)]
    query: Option<UserContribsQuery>,
    #[serde(default, rename = "continue")]
    continuation: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    error: Option<ApiErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct UserContribsQuery {
    #[serde(default)]
    usercontribs: Vec<Contribution>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorPayload {
    #[serde(default)]
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct PageviewsResponse {
    #[serde(default)]
    items: Vec<DailyViews>,
}

impl UserContribsResponse {
    fn into_page(self) -> Result<ContributionsPage> {
        if let Some(error) = self.error {
            return Err(ViewsError::MalformedResponse(format!(
                "API error [{}]: {}",
                error.code, error.info
            )));
        }

        let Some(query) = self.query else {
            return Err(ViewsError::MalformedResponse(
                "response has no `query` object".to_string(),
            ));
        };

        let continuation = self.continuation.map(|raw| {
            raw.into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect()
        });

        Ok(ContributionsPage {
            contributions: query.usercontribs,
            continuation,
        })
    }
}

fn transport(err: reqwest::Error) -> ViewsError {
    ViewsError::Transport(err.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use httpmock::prelude::*;
    use serde_json::json;

    fn window(start: (i32, u32), end: (i32, u32)) -> ViewWindow {
        ViewWindow {
            start: NaiveDate::from_ymd_opt(start.0, start.1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(end.0, end.1, 1).unwrap(),
        }
    }

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig {
            api_url: server.url("/w/api.php"),
            metrics_url: server.url("/metrics"),
            project: "en.wikipedia.org".to_string(),
            access: "all-access".to_string(),
            agent: "all-agents".to_string(),
            user_agent: "wikiviews-test/1.0".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    // ── encode_title ──────────────────────────────────────────────────────────

    #[test]
    fn test_encode_title_spaces_become_underscores() {
        assert_eq!(encode_title("Oleksiy Torokhtiy"), "Oleksiy_Torokhtiy");
    }

    #[test]
    fn test_encode_title_escapes_reserved() {
        assert_eq!(
            encode_title("Rust (programming language)"),
            "Rust_%28programming_language%29"
        );
        assert_eq!(encode_title("AC/DC"), "AC%2FDC");
        assert_eq!(encode_title("100%"), "100%25");
        assert_eq!(encode_title("Who?"), "Who%3F");
    }

    #[test]
    fn test_encode_title_escapes_sub_delimiters() {
        assert_eq!(
            encode_title("Tom & Jerry's: a+b=c,d"),
            "Tom_%26_Jerry%27s%3A_a%2Bb%3Dc%2Cd"
        );
    }

    #[test]
    fn test_encode_title_keeps_unreserved() {
        assert_eq!(encode_title("a-b.c_d~e"), "a-b.c_d~e");
    }

    #[test]
    fn test_encode_title_utf8_bytes() {
        assert_eq!(encode_title("Café"), "Caf%C3%A9");
    }

    // ── pageviews_url ─────────────────────────────────────────────────────────

    #[test]
    fn test_pageviews_url_layout() {
        let config = ClientConfig {
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            metrics_url: "https://wikimedia.org/api/rest_v1/metrics/pageviews/per-article/"
                .to_string(),
            project: "en.wikipedia.org".to_string(),
            access: "all-access".to_string(),
            agent: "user".to_string(),
            user_agent: "x".to_string(),
            timeout: Duration::from_secs(1),
        };
        let url = config.pageviews_url("BrowserQuest", &window((2024, 1), (2024, 7)));
        assert_eq!(
            url,
            "https://wikimedia.org/api/rest_v1/metrics/pageviews/per-article/\
             en.wikipedia.org/all-access/user/BrowserQuest/daily/20240101/20240701"
        );
    }

    // ── into_page ─────────────────────────────────────────────────────────────

    #[test]
    fn test_into_page_stringifies_continuation() {
        let raw: UserContribsResponse = serde_json::from_value(json!({
            "continue": {"uccontinue": "20240101000000|42", "continue": "-||"},
            "query": {"usercontribs": [{"title": "A", "timestamp": "2024-01-15T00:00:00Z"}]}
        }))
        .unwrap();
        let page = raw.into_page().unwrap();
        let token = page.continuation.unwrap();
        assert_eq!(token.get("uccontinue").unwrap(), "20240101000000|42");
        assert_eq!(token.get("continue").unwrap(), "-||");
        assert_eq!(page.contributions.len(), 1);
    }

    #[test]
    fn test_into_page_missing_query_is_malformed() {
        let raw: UserContribsResponse = serde_json::from_value(json!({"batchcomplete": ""})).unwrap();
        assert!(matches!(
            raw.into_page(),
            Err(ViewsError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_into_page_api_error_is_malformed() {
        let raw: UserContribsResponse = serde_json::from_value(json!({
            "error": {"code": "baduser_ucuser", "info": "Invalid value for user parameter"}
        }))
        .unwrap();
        let err = raw.into_page().unwrap_err();
        assert!(err.to_string().contains("baduser_ucuser"));
    }

    // ── WikimediaClient against a mock server ─────────────────────────────────

    #[tokio::test]
    async fn test_contributions_page_sends_query_and_user_agent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/w/api.php")
                    .query_param("list", "usercontribs")
                    .query_param("ucuser", "Ajmullen")
                    .query_param("uclimit", "max")
                    .header("user-agent", "wikiviews-test/1.0");
                then.status(200).json_body(json!({
                    "continue": {"uccontinue": "20240301|7", "continue": "-||"},
                    "query": {"usercontribs": [
                        {"userid": 1, "user": "Ajmullen", "title": "Storror", "timestamp": "2024-03-01T10:00:00Z"},
                        {"userid": 1, "user": "Ajmullen", "title": "BrowserQuest", "timestamp": "2024-02-01T10:00:00Z"}
                    ]}
                }));
            })
            .await;

        let client = WikimediaClient::new(config_for(&server)).unwrap();
        let page = client.contributions_page("Ajmullen", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(page.contributions.len(), 2);
        assert_eq!(page.contributions[1].title, "BrowserQuest");
        assert!(page.continuation.is_some());
    }

    #[tokio::test]
    async fn test_contributions_page_forwards_continuation() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/w/api.php")
                    .query_param("uccontinue", "20240301|7");
                then.status(200)
                    .json_body(json!({"query": {"usercontribs": []}}));
            })
            .await;

        let client = WikimediaClient::new(config_for(&server)).unwrap();
        let mut token = ContinuationToken::new();
        token.insert("uccontinue".to_string(), "20240301|7".to_string());
        let page = client
            .contributions_page("Ajmullen", Some(&token))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(page.contributions.is_empty());
        assert!(page.continuation.is_none());
    }

    #[tokio::test]
    async fn test_contributions_page_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/w/api.php");
                then.status(503);
            })
            .await;

        let client = WikimediaClient::new(config_for(&server)).unwrap();
        let err = client.contributions_page("Ajmullen", None).await.unwrap_err();
        assert!(matches!(err, ViewsError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_daily_views_parses_items() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path(
                    "/metrics/en.wikipedia.org/all-access/all-agents/Henrietta_Swan_Leavitt/daily/20240101/20240701",
                );
                then.status(200).json_body(json!({
                    "items": [
                        {"project": "en.wikipedia", "article": "Henrietta_Swan_Leavitt", "timestamp": "2024010100", "views": 120},
                        {"project": "en.wikipedia", "article": "Henrietta_Swan_Leavitt", "timestamp": "2024010200", "views": 80}
                    ]
                }));
            })
            .await;

        let client = WikimediaClient::new(config_for(&server)).unwrap();
        let items = client
            .daily_views("Henrietta Swan Leavitt", &window((2024, 1), (2024, 7)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].views + items[1].views, 200);
    }

    #[tokio::test]
    async fn test_daily_views_missing_items_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).json_body(json!({}));
            })
            .await;

        let client = WikimediaClient::new(config_for(&server)).unwrap();
        let items = client
            .daily_views("Storror", &window((2024, 1), (2024, 2)))
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_daily_views_not_found_is_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(404).json_body(json!({"title": "Not found."}));
            })
            .await;

        let client = WikimediaClient::new(config_for(&server)).unwrap();
        let err = client
            .daily_views("No Such Page", &window((2024, 1), (2024, 2)))
            .await
            .unwrap_err();
        match err {
            ViewsError::HttpStatus { status, url } => {
                assert_eq!(status, 404);
                assert!(url.contains("No_Such_Page"));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_daily_views_garbage_body_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body("<html>maintenance</html>");
            })
            .await;

        let client = WikimediaClient::new(config_for(&server)).unwrap();
        let err = client
            .daily_views("Storror", &window((2024, 1), (2024, 2)))
            .await
            .unwrap_err();
        assert!(matches!(err, ViewsError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = ClientConfig {
            api_url: "http://127.0.0.1:1/w/api.php".to_string(),
            metrics_url: "http://127.0.0.1:1/metrics".to_string(),
            project: "en.wikipedia.org".to_string(),
            access: "all-access".to_string(),
            agent: "all-agents".to_string(),
            user_agent: "wikiviews-test/1.0".to_string(),
            timeout: Duration::from_secs(2),
        };
        let client = WikimediaClient::new(config).unwrap();
        let err = client.contributions_page("Ajmullen", None).await.unwrap_err();
        assert!(matches!(err, ViewsError::Transport(_)));
    }
}
