//! Search integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use kvstack_core::{KvStackConfig, equal_sets};
    use kvstack_model::{AttributeValue, Comparison, NestedMap, Predicate, StatusCode};

    use crate::{create_test_space, record, start_cluster, start_cluster_with};

    #[tokio::test]
    async fn test_should_find_stored_records_by_attribute() {
        let client = start_cluster();
        let expected = record([("v", AttributeValue::from("v1"))]);

        let outcome = client
            .search("kv", vec![Predicate::equals("v", "v1")])
            .drain()
            .await;
        assert!(outcome.is_success(), "errors: {:?}", outcome.errors);
        assert!(outcome.records.is_empty());

        client.put("kv", "key1", expected.clone()).unwrap();
        let outcome = client
            .search("kv", vec![Predicate::equals("v", "v1")])
            .drain()
            .await;
        assert!(outcome.is_success(), "errors: {:?}", outcome.errors);
        assert_eq!(outcome.records.len(), 1);
        assert!(equal_sets(&outcome.records[0].attributes, &expected));

        client.put("kv", "key2", expected.clone()).unwrap();
        let outcome = client
            .search("kv", vec![Predicate::equals("v", "v1")])
            .drain()
            .await;
        assert!(outcome.is_success(), "errors: {:?}", outcome.errors);
        assert_eq!(outcome.records.len(), 2);
        for found in &outcome.records {
            assert!(equal_sets(&found.attributes, &expected));
        }
        let keys: Vec<&str> = outcome.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["key1", "key2"]);
    }

    #[tokio::test]
    async fn test_should_report_unknown_space_on_error_stream() {
        let client = start_cluster();
        let outcome = client
            .search("missing", vec![Predicate::equals("v", "v1")])
            .drain()
            .await;

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, StatusCode::UnknownSpace);
    }

    #[tokio::test]
    async fn test_should_reject_invalid_regex() {
        let client = start_cluster();
        let space = create_test_space(&client, "regex");
        client
            .put(&space, "key1", record([("v", AttributeValue::from("v1"))]))
            .unwrap();

        let outcome = client
            .search(&space, vec![Predicate::new("v", "[", Comparison::Regex)])
            .drain()
            .await;
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, StatusCode::InvalidPredicate);

        let outcome = client
            .search(&space, vec![Predicate::new("v", 1_i64, Comparison::Regex)])
            .drain()
            .await;
        assert_eq!(outcome.errors[0].code, StatusCode::WrongType);
    }

    #[tokio::test]
    async fn test_should_match_regex_and_ordered_predicates() {
        let client = start_cluster();
        let space = create_test_space(&client, "ordered");
        client
            .put(&space, "a", record([("v", "v1".into()), ("n", 3_i64.into())]))
            .unwrap();
        client
            .put(&space, "b", record([("v", "v2".into()), ("n", 7_i64.into())]))
            .unwrap();
        client
            .put(&space, "c", record([("v", "x9".into()), ("n", 5.0_f64.into())]))
            .unwrap();

        let outcome = client
            .search(
                &space,
                vec![
                    Predicate::new("v", "^v[0-9]$", Comparison::Regex),
                    Predicate::new("n", 5_i64, Comparison::GreaterEqual),
                ],
            )
            .drain()
            .await;
        let keys: Vec<&str> = outcome.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["b"]);

        let outcome = client
            .search(&space, vec![Predicate::new("n", 5_i64, Comparison::LessEqual)])
            .drain()
            .await;
        let keys: Vec<&str> = outcome.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_should_match_sloppily_equal_values() {
        let client = start_cluster();
        let space = create_test_space(&client, "sloppy");
        client
            .put(&space, "int", record([("v", AttributeValue::from(1_i64))]))
            .unwrap();
        client
            .put(&space, "bytes", record([("v", Bytes::from_static(b"1").into())]))
            .unwrap();
        client
            .put(&space, "other", record([("v", AttributeValue::from("2"))]))
            .unwrap();

        let outcome = client
            .search(&space, vec![Predicate::equals("v", "1")])
            .drain()
            .await;
        let keys: Vec<&str> = outcome.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["bytes", "int"]);
    }

    #[tokio::test]
    async fn test_should_match_nested_map_records() {
        let client = start_cluster();
        let space = create_test_space(&client, "nested");
        let stored = NestedMap::from([(AttributeValue::from("x"), AttributeValue::from(1_i64))]);
        let other = NestedMap::from([(AttributeValue::from("x"), AttributeValue::from(2_i64))]);
        client
            .put(&space, "key1", record([("a", stored.clone().into())]))
            .unwrap();
        client
            .put(&space, "key2", record([("a", other.into())]))
            .unwrap();

        let probe = NestedMap::from([(AttributeValue::from("x"), AttributeValue::from(1.0_f64))]);
        let outcome = client
            .search(&space, vec![Predicate::equals("a", probe)])
            .drain()
            .await;

        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].key, "key1");
        assert!(equal_sets(
            &outcome.records[0].attributes,
            &record([("a", stored.into())])
        ));
    }

    #[tokio::test]
    async fn test_should_search_by_key_attribute() {
        let client = start_cluster();
        let space = create_test_space(&client, "bykey");
        client
            .put(&space, "key1", record([("v", "v1".into())]))
            .unwrap();
        client
            .put(&space, "key2", record([("v", "v1".into())]))
            .unwrap();

        let outcome = client
            .search(&space, vec![Predicate::equals("k", "key2")])
            .drain()
            .await;
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].key, "key2");
    }

    #[tokio::test]
    async fn test_should_cap_results_at_search_limit() {
        let config = KvStackConfig {
            search_limit: Some(2),
            ..KvStackConfig::default()
        };
        let client = start_cluster_with(config).unwrap();
        for key in ["a", "b", "c"] {
            client
                .put("kv", key, record([("v", "v1".into())]))
                .unwrap();
        }

        let outcome = client
            .search("kv", vec![Predicate::equals("v", "v1")])
            .drain()
            .await;
        let keys: Vec<&str> = outcome.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_should_consume_streams_independently() {
        let client = start_cluster();
        client
            .put("kv", "key1", record([("v", "v1".into())]))
            .unwrap();

        let mut stream = client.search("kv", Vec::new());
        assert!(stream.next_error().await.is_none());
        let found = stream.next_record().await.unwrap();
        assert_eq!(found.key, "key1");
        assert!(stream.next_record().await.is_none());
    }
}
