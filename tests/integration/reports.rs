use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use pcq::cli::{self, AppsecLicensesArgs, DefendersArgs, VulnDownloadArgs};

use crate::common::{config_for, mount_compute, mount_primary_login, COMPUTE_TOKEN, PRIMARY_TOKEN};

#[tokio::test]
async fn defenders_writes_full_and_kernel_csv() {
    let server = MockServer::start().await;
    mount_primary_login(&server).await;
    mount_compute(&server).await;

    let defender = |i: usize| {
        json!({
            "hostname": format!("host-{i}"),
            "connected": true,
            "systemInfo": {"kernelVersion": format!("5.{i}"), "totalDiskSpaceGB": 100}
        })
    };
    Mock::given(method("GET"))
        .and(path("/compute/api/v33.01/defenders"))
        .and(header("authorization", format!("Bearer {COMPUTE_TOKEN}").as_str()))
        .and(query_param("type", "serverLinux"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Total-count", "3")
                .set_body_json(vec![defender(0), defender(1)]),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/api/v33.01/defenders"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![defender(2)]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let args = DefendersArgs {
        defender_type: "serverLinux".to_string(),
        output: dir.path().join("filtered_output.csv"),
        kernel_output: dir.path().join("filtered_hostname_kernel.csv"),
        page_size: 2,
        max_pages: 100,
    };
    cli::defenders(&config_for(&server), args).await.unwrap();

    let full = std::fs::read_to_string(dir.path().join("filtered_output.csv")).unwrap();
    assert_eq!(
        full.lines().next().unwrap(),
        "hostname,connected,systemInfo.kernelVersion,systemInfo.totalDiskSpaceGB"
    );
    assert_eq!(full.lines().count(), 4);

    let kernel = std::fs::read_to_string(dir.path().join("filtered_hostname_kernel.csv")).unwrap();
    assert_eq!(
        kernel,
        "hostname,systemInfo.kernelVersion\nhost-0,5.0\nhost-1,5.1\nhost-2,5.2\n"
    );
}

#[tokio::test]
async fn appsec_licenses_follows_cursor_and_writes_csv() {
    let server = MockServer::start().await;
    mount_primary_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/code/api/v2/code-issues/branch_scan"))
        .and(header("authorization", PRIMARY_TOKEN))
        .and(body_partial_json(json!({
            "filters": {"checkStatus": "Error", "codeCategories": ["Licenses"]},
            "useSearchAfterPagination": true,
            "limit": 1000
        })))
        .respond_with(|req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            if body.get("searchAfter").is_none() {
                ResponseTemplate::new(200).set_body_json(json!({
                    "data": [{"resourceId": "r1", "policy": "GPL"}],
                    "hasNext": true,
                    "searchAfter": ["r1"]
                }))
            } else {
                ResponseTemplate::new(200).set_body_json(json!({
                    "data": [{"resourceId": "r2", "policy": "AGPL"}],
                    "hasNext": false
                }))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("appsec_licenses.csv");
    let args = AppsecLicensesArgs {
        output: output.clone(),
        limit: 1000,
        max_pages: 10,
    };
    cli::appsec_licenses(&config_for(&server), args).await.unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content, "resourceId,policy\nr1,GPL\nr2,AGPL\n");
}

#[tokio::test]
async fn appsec_licenses_reports_failed_login() {
    let server = MockServer::start().await;
    wiremock::Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "login_needed"})))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let args = AppsecLicensesArgs {
        output: dir.path().join("appsec_licenses.csv"),
        limit: 1000,
        max_pages: 10,
    };
    let err = cli::appsec_licenses(&config_for(&server), args)
        .await
        .unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("Unable to authenticate"), "{chain}");
    assert!(!dir.path().join("appsec_licenses.csv").exists());
}

#[tokio::test]
async fn vuln_download_saves_and_extracts_csv() {
    let server = MockServer::start().await;
    mount_primary_login(&server).await;

    let csv = b"cve,severity,asset\nCVE-2024-1,critical,host-a\n";
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(csv).unwrap();
    let gzipped = encoder.finish().unwrap();

    Mock::given(method("POST"))
        .and(path("/uve/api/v1/vulnerabilities/search/download"))
        .and(header("accept", "application/octet-stream"))
        .and(body_partial_json(json!({"query": "vulnerability where severity IN ('critical')"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(gzipped.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("list-vuln.csv.gz");
    let args = VulnDownloadArgs {
        query: None,
        output: output.clone(),
    };
    let mut input = std::io::Cursor::new("vulnerability where severity IN ('critical')\n");
    cli::vuln_download(&config_for(&server), args, &mut input)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&output).unwrap(), gzipped);
    assert_eq!(std::fs::read(dir.path().join("list-vuln.csv")).unwrap(), csv);
}
