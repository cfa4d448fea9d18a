#![cfg(feature = "cli")]

use httpmock::prelude::*;
use nyc311_etl::{CliConfig, ComplaintsPipeline, EtlEngine, EtlError, LocalStorage, OutputFormat};
use parquet::file::reader::{FileReader, SerializedFileReader};
use tempfile::TempDir;

fn cli_config(api_endpoint: String, output_path: &str, output_file: &str) -> CliConfig {
    CliConfig {
        config: None,
        api_endpoint,
        timeout_seconds: 10,
        output_path: output_path.to_string(),
        raw_file: Some("raw/nyc311.json".to_string()),
        no_raw_file: false,
        input_file: None,
        output_file: output_file.to_string(),
        format: None,
        include_borough: false,
        monitor: false,
    }
}

fn sample_dataset() -> serde_json::Value {
    serde_json::json!([
        {
            "unique_key": "59893919",
            "created_date": "2024-01-05T10:30:00.000",
            "closed_date": "2024-01-05T12:00:00.000",
            "agency": "NYPD",
            "Complaint Type": "Noise - Residential",
            "descriptor": "Loud Music/Party",
            "incident_zip": "10027",
            "borough": "MANHATTAN",
            "latitude": "40.8116",
            "longitude": "-73.9465",
            "location": {"latitude": "40.8116", "longitude": "-73.9465", "human_address": "{}"}
        },
        {
            "unique_key": "59893920",
            "created_date": "2024-01-05T11:00:00.000",
            "agency": "DOT",
            "complaint-type": "Street Condition",
            "descriptor": null,
            "incident_zip": "N/A",
            "borough": null
        },
        {
            "unique_key": "59893920",
            "created_date": "2024-01-05T11:00:00.000",
            "agency": "DOT",
            "complaint_type": "Street Condition",
            "descriptor": null,
            "incident_zip": "N/A",
            "borough": null
        }
    ])
}

#[tokio::test]
async fn test_end_to_end_etl_with_real_http() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/resource/erm2-nwe9.json");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(sample_dataset());
    });

    let config = cli_config(
        server.url("/resource/erm2-nwe9.json"),
        &output_path,
        "cleaned/nyc311.csv",
    );
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = ComplaintsPipeline::new(storage, config);

    let engine = EtlEngine::new_with_monitoring(pipeline, false);
    let outcome = engine.run().await.unwrap();

    api_mock.assert();
    assert!(outcome.output_location.ends_with("nyc311.csv"));
    assert_eq!(outcome.report.input_rows, 3);
    assert_eq!(outcome.report.duplicates_removed, 1);
    assert_eq!(outcome.report.output_rows, 2);

    // 原始 JSON 也要落地
    let raw = std::fs::read(temp_dir.path().join("raw/nyc311.json")).unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(raw, sample_dataset());

    let csv = std::fs::read_to_string(temp_dir.path().join("cleaned/nyc311.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "unique_key,created_date,closed_date,agency,complaint_type,descriptor,incident_zip,latitude,longitude"
    );
    assert_eq!(
        lines[1],
        "59893919,2024-01-05 10:30:00,2024-01-05 12:00:00,NYPD,Noise - Residential,Loud Music/Party,10027,40.8116,-73.9465"
    );
    assert_eq!(
        lines[2],
        "59893920,2024-01-05 11:00:00,,DOT,Street Condition,Not Specified,,,"
    );
    assert_eq!(lines.len(), 3);
}

#[tokio::test]
async fn test_borough_preset_keeps_and_fills_borough() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/nyc311.json");
        then.status(200).json_body(sample_dataset());
    });

    let mut config = cli_config(server.url("/nyc311.json"), &output_path, "nyc311.csv");
    config.include_borough = true;
    let pipeline = ComplaintsPipeline::new(LocalStorage::new(output_path.clone()), config);

    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    assert!(outcome.report.output_columns.contains(&"borough".to_string()));
    let mut reader = csv::Reader::from_path(temp_dir.path().join("nyc311.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    let borough = headers.iter().position(|h| h == "borough").unwrap();
    let boroughs: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[borough].to_string())
        .collect();
    assert_eq!(boroughs, vec!["MANHATTAN", "Unknown"]);
}

#[tokio::test]
async fn test_parquet_output() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/nyc311.json");
        then.status(200).json_body(sample_dataset());
    });

    let config = cli_config(server.url("/nyc311.json"), &output_path, "cleaned/nyc311.parquet");
    let pipeline = ComplaintsPipeline::new(LocalStorage::new(output_path.clone()), config);

    EtlEngine::new(pipeline).run().await.unwrap();

    let file = std::fs::File::open(temp_dir.path().join("cleaned/nyc311.parquet")).unwrap();
    let reader = SerializedFileReader::new(file).unwrap();
    let metadata = reader.metadata().file_metadata();
    assert_eq!(metadata.num_rows(), 2);
    assert_eq!(metadata.schema_descr().num_columns(), 9);
    assert_eq!(metadata.schema_descr().column(0).name(), "unique_key");
}

#[tokio::test]
async fn test_rerun_from_raw_file_without_network() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    std::fs::create_dir_all(temp_dir.path().join("raw")).unwrap();
    std::fs::write(
        temp_dir.path().join("raw/nyc311.json"),
        serde_json::to_vec(&sample_dataset()).unwrap(),
    )
    .unwrap();

    // 指向不存在的服務；有 input_file 時不應呼叫 API
    let mut config = cli_config("http://127.0.0.1:9/unreachable".to_string(), &output_path, "out.csv");
    config.input_file = Some("raw/nyc311.json".to_string());
    config.format = Some(OutputFormat::Csv);
    let pipeline = ComplaintsPipeline::new(LocalStorage::new(output_path), config);

    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(outcome.report.output_rows, 2);
    assert!(temp_dir.path().join("out.csv").exists());
}

#[tokio::test]
async fn test_api_failure_leaves_no_output() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/nyc311.json");
        then.status(503).body("Service Unavailable");
    });

    let config = cli_config(server.url("/nyc311.json"), &output_path, "nyc311.csv");
    let pipeline = ComplaintsPipeline::new(LocalStorage::new(output_path), config);

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    assert!(matches!(err, EtlError::ApiError(_)));
    assert_eq!(err.exit_code(), 2);
    assert!(!temp_dir.path().join("nyc311.csv").exists());
    assert!(!temp_dir.path().join("raw/nyc311.json").exists());
}
