//! Document intake service
//!
//! Accepts uploaded applicant documents, processes them strictly one at a
//! time through object storage, OCR analysis and PostgreSQL, and forwards
//! results to downstream webhooks with a single notification in flight.

pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod sequencer;
pub mod services;
