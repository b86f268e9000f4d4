//! Example: Test Extraction Gateway
//!
//! Uploads a local document to the bucket, runs a full analysis through the
//! extraction gateway, and prints what the intake pipeline would see.
//!
//! Usage:
//!   cargo run --example test_extraction -- path/to/bank_statement.pdf
//!
//! Prerequisites:
//!   - .env file with the S3_* variables, EXTRACTION_ENDPOINT and
//!     EXTRACTION_API_TOKEN

use std::env;
use std::path::Path;
use std::sync::Arc;

use document_intake::models::extraction::FeatureType;
use document_intake::services::classifier::{self, DocumentCategory};
use document_intake::services::extraction::client::AnalysisClient;
use document_intake::services::extraction::{Extractor, PollPolicy};
use document_intake::services::statement;
use document_intake::services::storage::{DocumentStore, S3Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let path = env::args()
        .nth(1)
        .ok_or("usage: test_extraction <document>")?;
    let path = Path::new(&path);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("invalid file name")?;

    println!("🔎 Extraction Gateway Test\n");

    let category = classifier::classify(file_name);
    println!("📄 {} classified as {}", file_name, category);

    let storage = S3Store::new(
        &env::var("S3_BUCKET").expect("S3_BUCKET not set"),
        &env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string()),
        &env::var("S3_ENDPOINT").unwrap_or_default(),
        &env::var("S3_ACCESS_KEY").expect("S3_ACCESS_KEY not set"),
        &env::var("S3_SECRET_KEY").expect("S3_SECRET_KEY not set"),
    )?;
    let client = AnalysisClient::new(
        env::var("EXTRACTION_ENDPOINT").expect("EXTRACTION_ENDPOINT not set"),
        env::var("EXTRACTION_API_TOKEN").expect("EXTRACTION_API_TOKEN not set"),
    );

    let bytes = std::fs::read(path)?;
    let key = format!("uploads/connection-test/{}", file_name);
    println!("⬆️  Uploading {} bytes to {}", bytes.len(), key);
    let location = storage.upload(&key, &bytes, "application/pdf").await?;

    let features: &[FeatureType] = if category == DocumentCategory::BankStatement {
        &[FeatureType::Tables]
    } else {
        &[FeatureType::Tables, FeatureType::Forms]
    };

    println!("🔄 Running analysis ({:?})...", features);
    let extractor = Extractor::new(Arc::new(client), PollPolicy::default());
    let result = match extractor.analyze(&location, features).await {
        Ok(result) => result,
        Err(e) => {
            println!("❌ Analysis failed: {}", e);
            println!("\n🔍 Troubleshooting:");
            println!("   1. Verify EXTRACTION_ENDPOINT points at the gateway");
            println!("   2. Verify EXTRACTION_API_TOKEN is valid");
            println!("   3. Check the gateway can read the bucket");
            storage.delete(&key).await.ok();
            return Err(e.into());
        }
    };

    println!("✅ Analysis {} finished\n", result.job_id);
    println!("📊 Key/value pairs: {}", result.form_results.len());
    for (key, value) in result.form_results.iter().take(10) {
        println!("   {}: {}", key, value);
    }
    println!("📊 Tables: {}", result.table_results.len());

    if category == DocumentCategory::BankStatement {
        let rows = statement::rows_from_tables(&result.table_results);
        println!("📊 Statement rows: {}", rows.len());
        for row in rows.iter().take(10) {
            println!(
                "   {:?} | {:?} | debit {:?} | credit {:?}",
                row.text, row.description, row.debit, row.credit
            );
        }
    }

    storage.delete(&key).await?;
    println!("\n🎉 Extraction gateway is working correctly.");
    Ok(())
}
