//! Shard Module Tests
//!
//! Validates document loading, query evaluation and the shard's wire handling.
//!
//! ## Test Scopes
//! - **Search**: Case-insensitive title/abstract matching, ordering, empty queries.
//! - **Snippets**: Abstract truncation at 200 characters.
//! - **Loader**: Reading collections from disk and failing on bad input.
//! - **Protocol**: JSON shape of requests and replies, served over a real socket.

#[cfg(test)]
mod tests {
    use crate::matcher::Matcher;
    use crate::server::{LineHandler, LineServer};
    use crate::shard::handlers::ShardLineHandler;
    use crate::shard::loader::{LoadError, load_documents, parse_documents};
    use crate::shard::protocol::{ShardReply, ShardRequest, ShardResults};
    use crate::shard::service::ShardSearchService;
    use crate::shard::types::{Document, ELLIPSIS, SNIPPET_MAX_CHARS, SearchHit, snippet};
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    fn sample_documents() -> Vec<Document> {
        vec![
            Document::new(
                "Quantum Needles",
                "We study sharp probes in quantum systems.",
                "quant-ph",
            ),
            Document::new(
                "Graph Partitioning at Scale",
                "Finding a needle in a haystack of vertices.",
                "cs.DS",
            ),
            Document::new(
                "Stellar Winds",
                "Mass loss of massive stars.",
                "astro-ph",
            ),
        ]
    }

    fn sample_service() -> ShardSearchService {
        ShardSearchService::with_documents("shard-test", sample_documents())
    }

    // ============================================================
    // SEARCH TESTS
    // ============================================================

    #[test]
    fn test_search_title_case_insensitive() {
        let service = ShardSearchService::with_documents(
            "shard-b",
            vec![Document::new("Quantum Needles", "", "quant-ph")],
        );

        let hits = service.search("needle");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Quantum Needles");
        assert_eq!(hits[0].label, "quant-ph");
        assert_eq!(hits[0].shard, "shard-b");
    }

    #[test]
    fn test_search_matches_title_or_abstract_in_load_order() {
        let service = sample_service();

        let hits = service.search("NEEDLE");
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();

        assert_eq!(titles, vec!["Quantum Needles", "Graph Partitioning at Scale"]);
    }

    #[test]
    fn test_search_no_match() {
        let service = sample_service();
        assert!(service.search("blockchain").is_empty());
    }

    #[test]
    fn test_search_empty_and_blank_queries() {
        let service = sample_service();
        assert!(service.search("").is_empty());
        assert!(service.search("   \t ").is_empty());
    }

    #[test]
    fn test_search_trims_query() {
        let service = sample_service();
        assert_eq!(service.search("  stellar  ").len(), 1);
    }

    #[test]
    fn test_search_query_longer_than_every_field() {
        let service = sample_service();
        let long_query = "x".repeat(500);
        assert!(service.search(&long_query).is_empty());
    }

    #[test]
    fn test_search_is_idempotent() {
        let service = sample_service();
        let first = service.search("s");
        let second = service.search("s");
        assert_eq!(first, second);
        assert_eq!(service.document_count(), 3);
    }

    #[test]
    fn test_search_on_empty_shard() {
        let service = ShardSearchService::with_documents("empty", vec![]);
        assert!(service.search("anything").is_empty());
        assert_eq!(service.document_count(), 0);
    }

    #[test]
    fn test_search_uses_injected_matcher() {
        struct CountingMatcher(AtomicUsize);

        impl Matcher for CountingMatcher {
            fn find_first(&self, _text: &str, _pattern: &str) -> Option<usize> {
                self.0.fetch_add(1, Ordering::SeqCst);
                None
            }

            fn find_all(&self, _text: &str, _pattern: &str) -> Vec<usize> {
                Vec::new()
            }
        }

        let matcher = Arc::new(CountingMatcher(AtomicUsize::new(0)));
        let service = ShardSearchService::new("counted", sample_documents(), matcher.clone());

        assert!(service.search("needle").is_empty());
        // Title and abstract are both checked when the title misses.
        assert_eq!(matcher.0.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_concurrent_searches_share_collection() {
        let service = Arc::new(sample_service());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                std::thread::spawn(move || service.search("needle").len())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 2);
        }
    }

    // ============================================================
    // SNIPPET TESTS
    // ============================================================

    #[test]
    fn test_snippet_short_abstract_unchanged() {
        assert_eq!(snippet("short abstract"), "short abstract");
    }

    #[test]
    fn test_snippet_exactly_limit_is_not_cut() {
        let text = "a".repeat(SNIPPET_MAX_CHARS);
        assert_eq!(snippet(&text), text);
    }

    #[test]
    fn test_snippet_long_abstract_is_cut_with_ellipsis() {
        let text = "b".repeat(SNIPPET_MAX_CHARS + 50);
        let cut = snippet(&text);

        assert!(cut.ends_with(ELLIPSIS));
        assert_eq!(cut.chars().count(), SNIPPET_MAX_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_snippet_counts_characters_not_bytes() {
        let text = "é".repeat(SNIPPET_MAX_CHARS + 1);
        let cut = snippet(&text);

        assert_eq!(cut, format!("{}{}", "é".repeat(SNIPPET_MAX_CHARS), ELLIPSIS));
    }

    #[test]
    fn test_hit_uses_snippet() {
        let document = Document::new("T", "c".repeat(300), "L");
        let hit = SearchHit::from_document(&document, "s1");

        assert_eq!(hit.snippet.chars().count(), SNIPPET_MAX_CHARS + ELLIPSIS.len());
        assert_eq!(hit.shard, "s1");
    }

    // ============================================================
    // LOADER TESTS
    // ============================================================

    #[test]
    fn test_parse_documents_keeps_order_and_defaults_label() {
        let json = r#"[
            {"title": "First", "abstract": "one", "label": "cs.AI"},
            {"title": "Second", "abstract": "two"}
        ]"#;

        let documents = parse_documents(json).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].title, "First");
        assert_eq!(documents[0].label, "cs.AI");
        assert_eq!(documents[1].abstract_text, "two");
        assert_eq!(documents[1].label, "");
    }

    #[test]
    fn test_parse_documents_rejects_missing_title() {
        assert!(parse_documents(r#"[{"abstract": "no title"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_load_documents_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "Quantum Needles", "abstract": "x", "label": "quant-ph"}}]"#
        )
        .unwrap();

        let documents = load_documents(file.path()).await.unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].title, "Quantum Needles");
    }

    #[tokio::test]
    async fn test_load_documents_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_documents(&dir.path().join("absent.json")).await;

        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_documents_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{{\"title\": ").unwrap();

        let result = load_documents(file.path()).await;

        match result {
            Err(LoadError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    // ============================================================
    // PROTOCOL TESTS
    // ============================================================

    #[test]
    fn test_request_wire_format() {
        let search: ShardRequest =
            serde_json::from_str(r#"{"kind":"search","query":"needle"}"#).unwrap();
        assert_eq!(
            search,
            ShardRequest::Search {
                query: "needle".to_string()
            }
        );

        let status: ShardRequest = serde_json::from_str(r#"{"kind":"status"}"#).unwrap();
        assert_eq!(status, ShardRequest::Status);
    }

    #[test]
    fn test_results_reply_wire_format() {
        let reply = sample_service().handle_request(ShardRequest::Search {
            query: "stellar".to_string(),
        });
        let json: serde_json::Value = serde_json::to_value(&reply).unwrap();

        assert_eq!(json["kind"], "results");
        assert_eq!(json["shard"], "shard-test");
        assert_eq!(json["total"], 1);
        assert_eq!(json["results"][0]["title"], "Stellar Winds");
        assert_eq!(json["results"][0]["abstract"], "Mass loss of massive stars.");
        assert_eq!(json["results"][0]["label"], "astro-ph");
        assert_eq!(json["results"][0]["shard"], "shard-test");
    }

    #[test]
    fn test_status_reply() {
        let reply = sample_service().handle_request(ShardRequest::Status);
        assert_eq!(
            reply,
            ShardReply::Status {
                shard: "shard-test".to_string(),
                documents: 3
            }
        );
    }

    #[tokio::test]
    async fn test_line_handler_rejects_malformed_request() {
        let handler = ShardLineHandler::new(Arc::new(sample_service()));

        let line = handler.handle_line("not json").await;
        let reply: ShardReply = serde_json::from_str(&line).unwrap();

        assert!(matches!(reply, ShardReply::Error { .. }));
    }

    #[tokio::test]
    async fn test_invalid_utf8_request_gets_error_reply() {
        let handler = ShardLineHandler::new(Arc::new(sample_service()));
        let server = LineServer::start("shard-test", "127.0.0.1:0".parse().unwrap(), handler)
            .await
            .unwrap();

        let stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer.write_all(b"caf\xe9\n").await.unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let reply: ShardReply = serde_json::from_str(&line).unwrap();
        assert!(matches!(reply, ShardReply::Error { .. }));

        // The connection stays usable.
        writer.write_all(b"{\"kind\":\"status\"}\n").await.unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let reply: ShardReply = serde_json::from_str(&line).unwrap();
        assert!(matches!(reply, ShardReply::Status { documents: 3, .. }));

        server.stop().await.unwrap();
    }

    #[test]
    fn test_oversized_request_reply_is_error() {
        let handler = ShardLineHandler::new(Arc::new(sample_service()));

        let reply: ShardReply = serde_json::from_str(&handler.oversized_line(64)).unwrap();

        assert_eq!(
            reply,
            ShardReply::Error {
                message: "request exceeds 64 bytes".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_shard_served_over_tcp() {
        let handler = ShardLineHandler::new(Arc::new(sample_service()));
        let server = LineServer::start("shard-test", "127.0.0.1:0".parse().unwrap(), handler)
            .await
            .unwrap();

        let stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer
            .write_all(b"{\"kind\":\"search\",\"query\":\"needle\"}\n")
            .await
            .unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let reply: ShardReply = serde_json::from_str(&line).unwrap();

        match reply {
            ShardReply::Results(ShardResults { shard, total, results }) => {
                assert_eq!(shard, "shard-test");
                assert_eq!(total, 2);
                assert_eq!(results.len(), 2);
            }
            other => panic!("unexpected reply {:?}", other),
        }

        server.stop().await.unwrap();
    }
}
