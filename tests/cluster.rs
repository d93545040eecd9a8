//! End-to-end behaviour of a 4x3 cluster over real HTTP

mod common;

use common::start_cluster;
use reqwest::StatusCode;

#[tokio::test]
async fn test_a_txt_scenario() {
    let cluster = start_cluster(4, 3).await;
    let client = cluster.raw_client();

    let res = client
        .put(cluster.key_url("a.txt"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let expected: Vec<String> = cluster.group_of("a.txt").iter().map(|v| v.url.clone()).collect();
    let replicas: Vec<String> = serde_json::from_value(body["replicas"].clone()).unwrap();
    assert_eq!(replicas, expected);
    assert_eq!(
        body["id"],
        "18b7cb099a9ea3f50ba899b5ba81e0d377a5f3b16f8f6eeb8b3e58cd4692b993_a.txt"
    );

    // Every member of the group holds the same 5 bytes, nobody else does
    for volume in cluster.group_of("a.txt") {
        let res = reqwest::get(format!("{}/files/a.txt", volume.url)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.bytes().await.unwrap(), "hello");
    }
    assert_eq!(cluster.total_files(), 3);

    // Same group on every call
    client
        .put(cluster.key_url("a.txt"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(cluster.total_files(), 3);

    let res = client.get(cluster.key_url("a.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    assert!(expected.iter().any(|url| location == format!("{}/files/a.txt", url)));

    let res = client.delete(cluster.key_url("a.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(cluster.total_files(), 0);

    let res = client.get(cluster.key_url("a.txt")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_round_trip_follows_redirect() {
    let cluster = start_cluster(4, 3).await;
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

    let client = reqwest::Client::new();
    let res = client
        .put(cluster.key_url("photos/big blob.bin"))
        .body(content.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .get(cluster.key_url("photos/big blob.bin"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.content_length(), Some(content.len() as u64));
    assert_eq!(res.bytes().await.unwrap(), content);
}

#[tokio::test]
async fn test_range_read_through_redirect() {
    let cluster = start_cluster(2, 2).await;
    let client = reqwest::Client::new();
    client
        .put(cluster.key_url("r.txt"))
        .body("0123456789")
        .send()
        .await
        .unwrap();

    let res = client
        .get(cluster.key_url("r.txt"))
        .header("range", "bytes=3-6")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.bytes().await.unwrap(), "3456");
}

#[tokio::test]
async fn test_never_written_key() {
    let cluster = start_cluster(4, 3).await;
    let client = cluster.raw_client();

    let res = client.get(cluster.key_url("nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.delete(cluster.key_url("nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_key_rejected() {
    let cluster = start_cluster(4, 3).await;
    let client = cluster.raw_client();

    let url = format!("{}/", cluster.master_url);
    let res = client.put(&url).body("x").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(cluster.total_files(), 0);
}

#[tokio::test]
async fn test_overwrite_keeps_one_file_per_replica() {
    let cluster = start_cluster(4, 3).await;
    let client = reqwest::Client::new();

    for body in ["first", "second", "third version"] {
        let res = client
            .put(cluster.key_url("doc"))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }
    assert_eq!(cluster.total_files(), 3);

    let res = client.get(cluster.key_url("doc")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "third version");
}

#[tokio::test]
async fn test_verify_endpoint_reports_damage() {
    let cluster = start_cluster(4, 3).await;
    let client = reqwest::Client::new();
    for key in ["one", "two", "three"] {
        client
            .put(cluster.key_url(key))
            .body(key)
            .send()
            .await
            .unwrap();
    }

    let report = tinyblob::ops::verify_cluster(&cluster.master_url, 4)
        .await
        .unwrap();
    assert_eq!(report.total_keys, 3);
    assert!(report.is_consistent());

    // Remove one copy behind the master's back
    let victim = &cluster.group_of("two")[1];
    let res = client
        .delete(format!("{}/files/two", victim.url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let report = tinyblob::ops::verify_cluster(&cluster.master_url, 4)
        .await
        .unwrap();
    assert_eq!(report.under_replicated_keys, vec!["two".to_string()]);
    assert_eq!(report.healthy, 2);
}

#[tokio::test]
async fn test_cli_operations() {
    let cluster = start_cluster(2, 3).await;
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.bin");
    let output = dir.path().join("out.bin");
    std::fs::write(&input, b"cli payload").unwrap();

    let outcome = tinyblob::ops::put_blob(&cluster.master_url, "cli/key", &input)
        .await
        .unwrap();
    assert_eq!(outcome.replicas.len(), 3);

    let written = tinyblob::ops::get_blob(&cluster.master_url, "cli/key", &output)
        .await
        .unwrap();
    assert_eq!(written, 11);
    assert_eq!(std::fs::read(&output).unwrap(), b"cli payload");

    tinyblob::ops::delete_blob(&cluster.master_url, "cli/key")
        .await
        .unwrap();
    let err = tinyblob::ops::get_blob(&cluster.master_url, "cli/key", &output)
        .await
        .unwrap_err();
    assert!(matches!(err, tinyblob::Error::NotFound(_)));
}
