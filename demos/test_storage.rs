//! Example: Test S3 Storage Connection
//!
//! Uploads a small object under the `uploads/` prefix and deletes it again,
//! which is all the intake service needs from the bucket.
//!
//! Usage:
//!   cargo run --example test_storage
//!
//! Prerequisites:
//!   - .env file with S3_BUCKET, S3_ACCESS_KEY, S3_SECRET_KEY
//!     (S3_REGION and S3_ENDPOINT are optional)

use document_intake::services::storage::{DocumentStore, S3Store};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    println!("🔧 S3 Connection Test\n");

    let bucket = env::var("S3_BUCKET").expect("S3_BUCKET not set");
    let region = env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string());
    let endpoint = env::var("S3_ENDPOINT").unwrap_or_default();
    let access_key = env::var("S3_ACCESS_KEY").expect("S3_ACCESS_KEY not set");
    let secret_key = env::var("S3_SECRET_KEY").expect("S3_SECRET_KEY not set");

    println!("📋 Configuration:");
    println!("   Bucket: {}", bucket);
    println!("   Region: {}", region);
    if !endpoint.is_empty() {
        println!("   Endpoint: {}", endpoint);
    }
    println!("   Access Key: {}***", &access_key[..8.min(access_key.len())]);
    println!();

    let client = S3Store::new(&bucket, &region, &endpoint, &access_key, &secret_key)?;
    println!("✅ Client initialized for {}\n", client.bucket_name());

    let test_key = "uploads/connection-test/connection-test.txt";
    let test_content = b"Hello from document-intake! This is a test file.";

    println!("⬆️  Uploading test file...");
    println!("   Key: {}", test_key);
    let location = client.upload(test_key, test_content, "text/plain").await?;
    println!("✅ Upload successful: s3://{}/{}\n", location.bucket, location.key);

    println!("🗑️  Deleting test file...");
    client.delete(test_key).await?;
    println!("✅ Delete successful\n");

    println!("🎉 Storage configuration is working correctly.");
    Ok(())
}
