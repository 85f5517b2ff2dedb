//! Shared JSON fixtures for tests across the workspace.
//!
//! `fixtures/manifest.json` names every feed fixture; a feed is a list of change
//! event batches in wire form. This crate only locates and parses files, so it
//! does not depend on the core types: callers pick the type to decode into.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    feeds: BTreeMap<String, FeedEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedEntry {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        chart: Option<String>,
    },
}

impl FeedEntry {
    fn as_path(&self) -> &str {
        match self {
            FeedEntry::Path(path) => path,
            FeedEntry::Detailed { path, .. } => path,
        }
    }

    fn chart(&self) -> Option<&str> {
        match self {
            FeedEntry::Path(_) => None,
            FeedEntry::Detailed { chart, .. } => chart.as_deref(),
        }
    }
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Change-event feeds: `{ "description": ..., "batches": [[event, ...], ...] }`.
pub mod feeds {
    use super::*;

    /// Fixture names in sorted order.
    pub fn keys() -> Vec<String> {
        MANIFEST.feeds.keys().cloned().collect()
    }

    /// Names of the fixtures tagged for `chart` ("bar", "donut", "line", "tree").
    pub fn for_chart(chart: &str) -> Vec<String> {
        MANIFEST
            .feeds
            .iter()
            .filter(|(_, e)| e.chart() == Some(chart))
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.feeds, "feed", name)?;
        read_to_string(entry.as_path())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.feeds, "feed", name)?;
        super::load_json(entry.as_path())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.feeds, "feed", name)?;
        Ok(resolve_path(entry.as_path()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_manifest_entry_parses_as_json() {
        for name in feeds::keys() {
            let value: serde_json::Value = feeds::load(&name).unwrap();
            assert!(value["batches"].is_array(), "{name} has no batches");
        }
    }

    #[test]
    fn unknown_fixture_is_an_error() {
        assert!(feeds::json("does-not-exist").is_err());
    }
}
