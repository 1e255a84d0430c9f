//! proctrack - administrative process and deadline tracker
//!
//! Registers administrative processes, materializes their document checklist
//! from a per-type template, and computes legal deadlines (calendar or
//! business days) from the registration date or from checklist completion.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod rules;
pub mod services;
