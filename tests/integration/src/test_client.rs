//! Client and space lifecycle integration tests.

#[cfg(test)]
mod tests {
    use kvstack_core::{Client, ClientError, ClusterAddr, ClusterRegistry, equal_sets};
    use kvstack_model::{AttributeValue, StatusCode};

    use crate::{TEST_HOST, create_test_space, next_port, record, start_cluster};

    #[test]
    fn test_should_fail_to_connect_without_cluster() {
        let port = next_port();
        let err = Client::connect(TEST_HOST, port).unwrap_err();
        assert!(matches!(err, ClientError::Connection { port: p, .. } if p == port));
    }

    #[test]
    fn test_should_fail_to_connect_with_invalid_address() {
        assert!(matches!(
            Client::connect("", next_port()),
            Err(ClientError::Connection { .. })
        ));
        assert!(matches!(
            Client::connect(TEST_HOST, 0),
            Err(ClientError::Connection { .. })
        ));
    }

    #[test]
    fn test_should_fail_to_connect_after_unbind() {
        let client = start_cluster();
        let addr = client.addr().clone();
        assert!(ClusterRegistry::global().unbind(&addr).is_some());

        let err = Client::connect(addr.host(), addr.port()).unwrap_err();
        assert!(err.status().is_none());
        let same = ClusterAddr::new(TEST_HOST, addr.port()).unwrap();
        assert!(ClusterRegistry::global().lookup(&same).is_none());
    }

    #[test]
    fn test_should_round_trip_records() {
        let client = start_cluster();
        let space = create_test_space(&client, "roundtrip");
        let stored = record([
            ("name", "kv".into()),
            ("count", 3_i64.into()),
            ("ratio", 0.5_f64.into()),
            ("flag", true.into()),
        ]);

        client.put(&space, "key1", stored.clone()).unwrap();
        let fetched = client.get(&space, "key1").unwrap();
        assert!(equal_sets(&fetched, &stored));

        client.del(&space, "key1").unwrap();
        assert_eq!(
            client.get(&space, "key1").unwrap_err().status(),
            Some(StatusCode::NotFound)
        );
    }

    #[test]
    fn test_should_reject_key_attribute_in_record() {
        let client = start_cluster();
        let err = client
            .put("kv", "key1", record([("k", AttributeValue::from("key1"))]))
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::DontUseKey));

        let err = client
            .put("kv", "", record([("v", AttributeValue::from("v1"))]))
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::InvalidKey));
    }

    #[test]
    fn test_should_manage_space_lifecycle() {
        let client = start_cluster();
        let space = create_test_space(&client, "lifecycle");

        let err = client.add_space(&space, "k").unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::DuplicateSpace));

        client.rm_space(&space).unwrap();
        let err = client
            .put(&space, "key1", record([("v", AttributeValue::from("v1"))]))
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::UnknownSpace));
    }
}
