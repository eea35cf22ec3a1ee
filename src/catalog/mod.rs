//! カードカタログ照合
//!
//! 抽出したフィールドから検索式を組み立て、外部カードDBに問い合わせる。
//! 検索条件が空のクエリはネットワークに出さずに Validation エラーとする。

mod pokemontcg;

pub use pokemontcg::PokemonTcgTransport;

use crate::error::{CardScanError, Result};
use async_trait::async_trait;
use card_scan_common::{build_search_expression, CardQuery, CatalogCandidate, ExtractedFields};
use tracing::{debug, info};

/// カタログへのHTTP呼び出し（`q` パラメータ1つ）
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn get(&self, q: &str) -> Result<Vec<CatalogCandidate>>;
}

/// カタログ検索クライアント
pub struct CatalogClient<T: CatalogTransport> {
    transport: T,
}

impl<T: CatalogTransport> CatalogClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 1回だけ検索する
    pub async fn search(&self, query: &CardQuery) -> Result<Vec<CatalogCandidate>> {
        let expression = build_search_expression(query).map_err(|e| match e {
            card_scan_common::Error::Validation(msg) => CardScanError::Validation(msg),
            other => CardScanError::Common(other),
        })?;

        debug!(q = %expression, "catalog search");
        let candidates = self.transport.get(&expression).await?;
        debug!(q = %expression, hits = candidates.len(), "catalog search finished");
        Ok(candidates)
    }
}

/// 2段階検索
///
/// 1. 名前 + 番号のみで検索（セット名の表記揺れによる取りこぼしを避ける）
/// 2. 0件かつセットがある場合のみ、セット条件を加えてもう1回検索
///
/// 名前も番号もない場合はセットだけで1回検索する。
pub async fn find_matches<T: CatalogTransport>(
    client: &CatalogClient<T>,
    fields: &ExtractedFields,
) -> Result<Vec<CatalogCandidate>> {
    let query = CardQuery::from_fields(fields);
    let phase1 = query.without_set();

    if phase1.is_empty() {
        return client.search(&query).await;
    }

    let candidates = client.search(&phase1).await?;
    if !candidates.is_empty() || query.set().is_none() {
        return Ok(candidates);
    }

    info!(set = query.set().unwrap_or_default(), "no match without set, retrying with set");
    client.search(&query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingTransport {
        responses: Mutex<Vec<Result<Vec<CatalogCandidate>>>>,
        requests: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new(responses: Vec<Result<Vec<CatalogCandidate>>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CatalogTransport for RecordingTransport {
        async fn get(&self, q: &str) -> Result<Vec<CatalogCandidate>> {
            self.requests.lock().unwrap().push(q.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }
    }

    fn candidate(id: &str) -> CatalogCandidate {
        CatalogCandidate {
            id: id.into(),
            name: "Pikachu".into(),
            set: "Base".into(),
            card_number: "58".into(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_search_empty_query_no_request() {
        let client = CatalogClient::new(RecordingTransport::new(vec![]));
        let result = client.search(&CardQuery::default()).await;

        assert!(matches!(result, Err(CardScanError::Validation(_))));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_search_single_request() {
        let client = CatalogClient::new(RecordingTransport::new(vec![Ok(vec![candidate("base1-58")])]));
        let query = CardQuery::new(Some("Pikachu"), None, Some("58/102"));
        let result = client.search(&query).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(client.transport().requests(), vec![r#"name:"Pikachu" number:58"#]);
    }

    #[tokio::test]
    async fn test_search_error_propagates() {
        let client = CatalogClient::new(RecordingTransport::new(vec![Err(CardScanError::Search {
            status: Some(500),
            message: "boom".into(),
        })]));
        let query = CardQuery::new(Some("Pikachu"), None, None);
        let result = client.search(&query).await;
        assert!(matches!(result, Err(CardScanError::Search { status: Some(500), .. })));
    }

    #[tokio::test]
    async fn test_find_matches_first_phase_hit() {
        let client = CatalogClient::new(RecordingTransport::new(vec![Ok(vec![candidate("base1-58")])]));
        let fields = ExtractedFields::from_parts(Some("Pikachu"), Some("Base"), Some("58/102"), None);
        let result = find_matches(&client, &fields).await.unwrap();

        assert_eq!(result.len(), 1);
        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].contains("set."));
    }

    #[tokio::test]
    async fn test_find_matches_retries_with_set() {
        let client = CatalogClient::new(RecordingTransport::new(vec![
            Ok(vec![]),
            Ok(vec![candidate("base4-87")]),
        ]));
        let fields = ExtractedFields::from_parts(Some("Pikachu"), Some("Base Set 2"), Some("58/102"), None);
        let result = find_matches(&client, &fields).await.unwrap();

        assert_eq!(result, vec![candidate("base4-87")]);
        let requests = client.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], r#"name:"Pikachu" number:58"#);
        assert_eq!(
            requests[1],
            r#"name:"Pikachu" (set.id:"Base Set 2" OR set.name:"Base Set 2") number:58"#
        );
    }

    #[tokio::test]
    async fn test_find_matches_no_retry_without_set() {
        let client = CatalogClient::new(RecordingTransport::new(vec![Ok(vec![])]));
        let fields = ExtractedFields::from_parts(Some("Pikachu"), None, Some("58/102"), None);
        let result = find_matches(&client, &fields).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_find_matches_set_only() {
        let client = CatalogClient::new(RecordingTransport::new(vec![Ok(vec![candidate("jungle-1")])]));
        let fields = ExtractedFields::from_parts(None, Some("Jungle"), None, Some("Rare"));
        let result = find_matches(&client, &fields).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(
            client.transport().requests(),
            vec![r#"(set.id:"Jungle" OR set.name:"Jungle")"#]
        );
    }

    #[tokio::test]
    async fn test_find_matches_nothing_to_search() {
        let client = CatalogClient::new(RecordingTransport::new(vec![]));
        let fields = ExtractedFields::from_parts(None, None, None, Some("Rare"));
        let result = find_matches(&client, &fields).await;

        assert!(matches!(result, Err(CardScanError::Validation(_))));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_find_matches_first_phase_error_stops() {
        let client = CatalogClient::new(RecordingTransport::new(vec![Err(CardScanError::Search {
            status: None,
            message: "timeout".into(),
        })]));
        let fields = ExtractedFields::from_parts(Some("Pikachu"), Some("Base"), None, None);
        let result = find_matches(&client, &fields).await;

        assert!(matches!(result, Err(CardScanError::Search { .. })));
        assert_eq!(client.transport().requests().len(), 1);
    }
}
