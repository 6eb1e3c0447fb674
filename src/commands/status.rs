//! Status command - reports whether the cached session would be reused

use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::fs::{SessionStore, StoreError};
use crate::token::{extract_token, inspect, TokenStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum CacheReport {
    Missing,
    Corrupt(String),
    NoToken,
    Token(TokenStatus),
}

/// Inspect the store without touching it.
pub fn describe(store: &SessionStore, now_secs: i64) -> Result<CacheReport> {
    let snapshot = match store.load() {
        Ok(snapshot) => snapshot,
        Err(StoreError::NotFound(_)) => return Ok(CacheReport::Missing),
        Err(err @ StoreError::CorruptData { .. }) => {
            return Ok(CacheReport::Corrupt(err.to_string()))
        }
        Err(err) => return Err(err.into()),
    };

    Ok(match extract_token(&snapshot) {
        Some(token) => CacheReport::Token(inspect(&token, now_secs)),
        None => CacheReport::NoToken,
    })
}

pub fn execute(store: &SessionStore) -> Result<()> {
    let path = store.path().display();

    match describe(store, Utc::now().timestamp())? {
        CacheReport::Missing => {
            println!("{} No cached session at {path}", "─".dimmed());
        }
        CacheReport::Corrupt(reason) => {
            println!("{} Cached session is unreadable: {reason}", "✗".red().bold());
        }
        CacheReport::NoToken => {
            println!("{} Cached session at {path} has no bearer token", "✗".red().bold());
        }
        CacheReport::Token(TokenStatus::Valid { exp }) => {
            println!(
                "{} Cached session at {path} is valid until {}",
                "✓".green().bold(),
                format_exp(exp)
            );
        }
        CacheReport::Token(TokenStatus::Expired { exp }) => {
            println!(
                "{} Cached session at {path} expired at {}",
                "✗".red().bold(),
                format_exp(exp)
            );
        }
        CacheReport::Token(TokenStatus::MissingExpiry) => {
            println!("{} Bearer token has no expiry claim", "✗".red().bold());
        }
        CacheReport::Token(TokenStatus::Undecodable { reason }) => {
            println!("{} Bearer token could not be decoded: {reason}", "✗".red().bold());
        }
    }

    Ok(())
}

fn format_exp(exp: f64) -> String {
    DateTime::<Utc>::from_timestamp(exp.floor() as i64, 0)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| format!("{exp} (out of range)"))
}
