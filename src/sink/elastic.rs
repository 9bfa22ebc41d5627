//! # Elasticsearch sink.
//!
//! Indexes each record into the index configured for its category:
//! ```text
//! PUT  {base}/{index}/_doc/{id}?refresh=true   (id present; id is the document key)
//! POST {base}/{index}/_doc?refresh=true        (empty id; store assigns one)
//! ```
//! The body is the record's wire form. The category tag is never stored.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tokio_util::sync::CancellationToken;

use crate::config::ElasticSettings;
use crate::error::{SinkSetupError, WriteFault};
use crate::records::{Category, LogRecord};
use crate::sink::Sink;

/// Sink writing to one Elasticsearch index per category.
pub struct ElasticSink {
    client: Client,
    base: Url,
    indices: HashMap<Category, String>,
    refresh: bool,
}

impl ElasticSink {
    /// Builds a sink from settings; categories with a blank index name are left unmapped.
    ///
    /// # Errors
    /// Fails if the base URL is invalid or the HTTP client cannot be built.
    pub fn from_settings(settings: &ElasticSettings) -> Result<Self, SinkSetupError> {
        let url = settings.base_url();
        let base = Url::parse(&url).map_err(|err| SinkSetupError::InvalidUrl {
            error: err.to_string(),
            url: url.clone(),
        })?;
        if base.cannot_be_a_base() {
            return Err(SinkSetupError::InvalidUrl {
                url,
                error: "url cannot carry a path".into(),
            });
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|err| SinkSetupError::Client {
                error: err.to_string(),
            })?;

        let indices = settings
            .indices
            .iter()
            .filter(|(_, index)| !index.trim().is_empty())
            .map(|(category, index)| (category, index.to_string()))
            .collect();

        Ok(Self {
            client,
            base,
            indices,
            refresh: settings.refresh,
        })
    }

    /// Index name for `category`, if configured.
    pub fn index_for(&self, category: Category) -> Option<&str> {
        self.indices.get(&category).map(String::as_str)
    }

    /// Request method and URL for `record` in `index`.
    fn target(&self, index: &str, id: &str) -> Result<(Method, Url), WriteFault> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| WriteFault::Transport {
                error: format!("base url {} cannot carry a path", self.base),
            })?;
            segments.pop_if_empty().push(index).push("_doc");
            if !id.is_empty() {
                segments.push(id);
            }
        }
        if self.refresh {
            url.query_pairs_mut().append_pair("refresh", "true");
        }
        let method = if id.is_empty() { Method::POST } else { Method::PUT };
        Ok((method, url))
    }

    async fn send(&self, index: &str, record: &LogRecord) -> Result<(), WriteFault> {
        let (method, url) = self.target(index, &record.id)?;
        let res = self
            .client
            .request(method, url)
            .json(record)
            .send()
            .await
            .map_err(|err| WriteFault::Transport {
                error: err.to_string(),
            })?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(WriteFault::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Sink for ElasticSink {
    async fn write(&self, ctx: CancellationToken, record: LogRecord) -> Result<(), WriteFault> {
        let category = record.category().ok_or_else(|| WriteFault::Untagged {
            id: record.id.clone(),
        })?;
        let index = self
            .index_for(category)
            .ok_or(WriteFault::UnknownIndex { category })?;

        tokio::select! {
            res = self.send(index, &record) => res,
            _ = ctx.cancelled() => Err(WriteFault::Canceled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;

    fn settings() -> ElasticSettings {
        ElasticSettings {
            host: "http://localhost".into(),
            port: 9200,
            timeout_secs: 5,
            refresh: true,
            indices: IndexSettings {
                general: "logs-general".into(),
                info: "logs-info".into(),
                warning: "logs-warning".into(),
                error: "logs-error".into(),
                debug: String::new(),
            },
        }
    }

    #[test]
    fn document_url_uses_id_as_key() {
        let sink = ElasticSink::from_settings(&settings()).unwrap();
        let (method, url) = sink.target("logs-warning", "a/b 1").unwrap();
        assert_eq!(method, Method::PUT);
        assert_eq!(
            url.as_str(),
            "http://localhost:9200/logs-warning/_doc/a%2Fb%201?refresh=true"
        );
    }

    #[test]
    fn empty_id_lets_store_assign_key() {
        let sink = ElasticSink::from_settings(&settings()).unwrap();
        let (method, url) = sink.target("logs-info", "").unwrap();
        assert_eq!(method, Method::POST);
        assert_eq!(url.as_str(), "http://localhost:9200/logs-info/_doc?refresh=true");
    }

    #[test]
    fn blank_index_is_unmapped() {
        let sink = ElasticSink::from_settings(&settings()).unwrap();
        assert_eq!(sink.index_for(Category::Error), Some("logs-error"));
        assert_eq!(sink.index_for(Category::Debug), None);
    }

    #[test]
    fn unusable_base_url_fails_setup() {
        let mut bad = settings();
        bad.host = String::new();
        let err = ElasticSink::from_settings(&bad).err().unwrap();
        assert_eq!(err.as_label(), "sink_invalid_url");

        bad.host = "localhost".into();
        let err = ElasticSink::from_settings(&bad).err().unwrap();
        assert!(matches!(err, SinkSetupError::InvalidUrl { ref url, .. } if url == "localhost:9200"));
    }

    #[tokio::test]
    async fn untagged_and_unmapped_records_are_rejected_before_io() {
        let sink = ElasticSink::from_settings(&settings()).unwrap();
        let ctx = CancellationToken::new();

        let err = sink
            .write(ctx.clone(), LogRecord::new("1", "t", "debug", "m"))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "write_untagged");

        let err = sink
            .write(
                ctx,
                LogRecord::new("1", "t", "debug", "m").with_category(Category::Debug),
            )
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "write_unknown_index");
    }
}
