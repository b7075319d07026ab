//! Parses the manifest text file joining `(store_id, local_index)` to assembly names: §4.4.

use std::collections::HashMap;

use serde::Deserialize;

/// One row of the manifest, keyed by `(blob_id, blob_idx)` in [`Manifest`].
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    pub hash32: String,
    pub hash64: String,
    pub blob_id: u32,
    pub blob_idx: u32,
    pub name: String,
    /// Declared payload size, when the manifest source carries one (only the JSON fallback format
    /// does; the whitespace-delimited text format has no size column). Used by the recovery
    /// scanner's manifest-guided slicing pass (§4.7a); `None` elsewhere.
    pub size: Option<u64>,
}

/// An ordered collection of [`ManifestEntry`] rows, indexed by `(blob_id, blob_idx)`.
#[derive(Debug, Default)]
pub struct Manifest {
    entries: HashMap<(u32, u32), ManifestEntry>,
}

impl Manifest {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn get(&self, blob_id: u32, blob_idx: u32) -> Option<&ManifestEntry> {
        self.entries.get(&(blob_id, blob_idx))
    }

    fn insert(&mut self, entry: ManifestEntry) {
        self.entries.insert((entry.blob_id, entry.blob_idx), entry);
    }

    /// Returns the declared sizes for `blob_id`'s entries, in ascending `blob_idx` order, stopping
    /// at the first entry with no known size. Used by the recovery scanner's manifest-guided
    /// slicing pass (§4.7a), which needs a contiguous run of sizes to slice the raw bytes by.
    #[must_use]
    pub fn ordered_sizes(&self, blob_id: u32) -> Vec<u64> {
        let mut sizes = Vec::new();
        let mut idx = 0;
        while let Some(entry) = self.entries.get(&(blob_id, idx)) {
            match entry.size {
                Some(size) => sizes.push(size),
                None => break,
            }
            idx += 1;
        }
        sizes
    }

    /// Parses the manifest text format (whitespace-tokenized rows, or a JSON fallback) from
    /// `contents`. Per §4.4, total parse failure yields an *empty* manifest rather than an error;
    /// the caller then falls through to recovery for every store.
    #[must_use]
    pub fn parse(contents: &str) -> Self {
        let trimmed = contents.trim_start();
        if trimmed.starts_with('{') {
            return Self::parse_json(trimmed).unwrap_or_default();
        }
        Self::parse_text(contents)
    }

    fn parse_text(contents: &str) -> Self {
        let mut manifest = Self::default();
        let mut skipped_header = false;

        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if !skipped_header {
                skipped_header = true;
                let first_token = line.split_whitespace().next().unwrap_or("");
                if first_token.starts_with("Hash") {
                    continue;
                }
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 5 {
                log::warn!("skipping malformed manifest row: not enough columns");
                continue;
            }

            let (blob_id, blob_idx) = match (tokens[2].parse::<u32>(), tokens[3].parse::<u32>()) {
                (Ok(id), Ok(idx)) => (id, idx),
                _ => {
                    log::warn!("skipping malformed manifest row: blob_id/blob_idx not integers");
                    continue;
                }
            };

            manifest.insert(ManifestEntry {
                hash32: tokens[0].to_string(),
                hash64: tokens[1].to_string(),
                blob_id,
                blob_idx,
                name: tokens[4].to_string(),
                size: None,
            });
        }

        manifest
    }

    fn parse_json(contents: &str) -> Option<Self> {
        #[derive(Deserialize)]
        struct JsonAssembly {
            #[serde(rename = "Name")]
            name: String,
            #[serde(rename = "Size")]
            size: u64,
            #[serde(rename = "Hash")]
            hash: Option<String>,
        }

        #[derive(Deserialize)]
        struct JsonManifest {
            #[serde(rename = "Assemblies")]
            assemblies: Vec<JsonAssembly>,
        }

        let parsed: JsonManifest = serde_json::from_str(contents).ok()?;
        let mut manifest = Self::default();
        for (index, assembly) in parsed.assemblies.into_iter().enumerate() {
            manifest.insert(ManifestEntry {
                hash32: assembly.hash.unwrap_or_default(),
                hash64: String::new(),
                blob_id: 0,
                blob_idx: index as u32,
                name: assembly.name,
                size: Some(assembly.size),
            });
        }
        Some(manifest)
    }
}
