use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use rajai_engine::aggregate::build_snapshot;
use rajai_engine::config::{Config, DataConfig, ServerConfig};
use rajai_engine::server::{create_server, AppState};
use rajai_engine::snapshot::SnapshotHandle;
use rajai_engine::types::{CensusRow, RawEstablishmentRecord};

fn record(bairro: &str, grupo: &str, cnae: &str, qty: &str) -> RawEstablishmentRecord {
    RawEstablishmentRecord {
        bairro: bairro.to_string(),
        classificacao_grupo: grupo.to_string(),
        classificacao_cnae: cnae.to_string(),
        quantidade: qty.to_string(),
        populacao: None,
    }
}

fn test_state() -> Arc<AppState> {
    let records = vec![
        record("Copacabana", "Ultraprocessado", "Lojas de conveniência", "10"),
        record("Copacabana", "In natura", "Feira livre", "5"),
        record("Tijuca", "In natura", "Feira livre", "3"),
    ];
    let census = vec![
        CensusRow {
            nome: "Copacabana".to_string(),
            shape_area: Some("4100000".to_string()),
            populacao: Some("150000".to_string()),
        },
        CensusRow {
            nome: "Tijuca".to_string(),
            shape_area: Some("10000000".to_string()),
            populacao: Some("160000".to_string()),
        },
    ];
    let snapshot = build_snapshot(&records, &census);
    Arc::new(AppState {
        snapshots: SnapshotHandle::new(snapshot),
        config: Config {
            data: DataConfig {
                estabelecimentos_csv: "dados/dados.csv".to_string(),
                censo_csv: "dados/Censo_2022.csv".to_string(),
            },
            server: ServerConfig::default(),
        },
    })
}

async fn get_json(uri: &str) -> Result<(StatusCode, Value)> {
    let app = create_server(test_state());
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };
    Ok((status, value))
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    let (status, body) = get_json("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    Ok(())
}

#[tokio::test]
async fn catalogo_lists_datasets_and_metrics() -> Result<()> {
    let (status, body) = get_json("/api/v1/geo/bairros/catalogo").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["datasets"].as_array().unwrap().len() >= 6);
    let metrics: Vec<&str> = body["metrics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m.as_str().unwrap())
        .collect();
    assert!(metrics.contains(&"total_ultraprocessado"));
    assert!(metrics.contains(&"densidade_total_por_10k"));
    Ok(())
}

#[tokio::test]
async fn tooltip_returns_totals_and_breakdown() -> Result<()> {
    // Path parameter goes through the normalizer
    let (status, body) = get_json("/api/v1/geo/bairros/copacabana/tooltip").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["bairro"], "COPACABANA");
    assert_eq!(body["populacao"], 150_000);
    assert_eq!(body["totais"]["total"], 15.0);
    assert_eq!(body["totais"]["total_ultraprocessado"], 10.0);
    assert_eq!(body["totais"]["densidade_total_por_10k"], 1.0);
    assert!(body["totais"]["percentil_densidade_total_por_10k"].is_number());
    let ultra = body["breakdown"]["Ultraprocessado"].as_array().unwrap();
    assert_eq!(ultra[0]["classificacao_cnae"], "Lojas de conveniência");
    assert_eq!(ultra[0]["quantidade"], 10);
    Ok(())
}

#[tokio::test]
async fn tooltip_unknown_bairro_is_404() -> Result<()> {
    let (status, _) = get_json("/api/v1/geo/bairros/atlantida/tooltip").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn choropleth_rejects_unknown_metric() -> Result<()> {
    let (status, _) = get_json("/api/v1/geo/bairros/choropleth?metric=nao_existe").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_json("/api/v1/geo/bairros/choropleth?metric=total").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["metric"], "total");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn dataset_listing_filters_and_pages() -> Result<()> {
    let (status, body) = get_json("/api/v1/dados/feiras-livres").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);

    let (_, body) = get_json("/api/v1/dados/feiras-livres?bairro=Tijuca").await?;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["bairro"], "TIJUCA");

    let (_, body) = get_json("/api/v1/dados/feiras-livres?offset=5").await?;
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let (status, _) = get_json("/api/v1/dados/tabela_errada").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn dataset_summary_sums_numeric_fields() -> Result<()> {
    let (status, body) = get_json("/api/v1/dados/feiras-livres/resumo").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["somas"]["quantidade"], 8.0);
    assert!(body["somas"]["bairro"].is_null());
    Ok(())
}

#[tokio::test]
async fn rollup_reports_group_shares() -> Result<()> {
    let (status, body) = get_json("/api/v1/geo/bairros/rollup").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 18);
    let grupos = body["grupos"].as_array().unwrap();
    let ultra = grupos
        .iter()
        .find(|g| g["grupo"] == "Ultraprocessado")
        .unwrap();
    assert_eq!(ultra["total"], 10);
    Ok(())
}
