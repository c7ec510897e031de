// src/ingest/posting.rs
// Canonical output schema. Field names match the store columns, which follow
// the Indonesian-language schema the extraction prompt asks for.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Placeholder for "information not available". Fields are never null or
/// omitted; unknown always serializes as this exact string.
pub const SENTINEL: &str = "Tidak disebutkan";

/// Default for missing salary info, per the extraction instruction.
pub const SALARY_SENTINEL: &str = "Sesuai standar perusahaan";

/// Upper bound on `tech_stack` entries.
pub const MAX_TECH_STACK: usize = 5;

/// One normalized job posting, ready for persistence. Immutable after
/// construction; written once and never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub judul_pekerjaan: String,
    pub perusahaan: String,
    pub lokasi: String,
    pub estimasi_gaji: String,
    pub tech_stack: Vec<String>,
    pub tipe_pekerjaan: String,
    /// Attached by the pipeline after extraction, never produced by the oracle.
    pub url_sumber: String,
}

/// What the oracle reply parses into, before schema validation. All fields
/// optional so that a missing key is detected here instead of silently
/// defaulted by serde.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizedDraft {
    pub judul_pekerjaan: Option<String>,
    pub perusahaan: Option<String>,
    pub lokasi: Option<String>,
    pub estimasi_gaji: Option<String>,
    pub tech_stack: Option<Vec<String>>,
    pub tipe_pekerjaan: Option<String>,
}

impl NormalizedDraft {
    /// Validate the draft against the canonical schema and attach the source
    /// URL. A missing key is an extraction failure; a present-but-blank string
    /// degrades to the sentinel; an oversized tech stack is truncated.
    pub fn finalize(self, source_url: String) -> Result<NormalizedPosting> {
        let judul_pekerjaan = required(self.judul_pekerjaan, "judul_pekerjaan")?;
        let perusahaan = required(self.perusahaan, "perusahaan")?;
        let lokasi = required(self.lokasi, "lokasi")?;
        let tipe_pekerjaan = required(self.tipe_pekerjaan, "tipe_pekerjaan")?;

        let estimasi_gaji = match self.estimasi_gaji {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            Some(_) => SALARY_SENTINEL.to_string(),
            None => bail!("oracle reply missing key: estimasi_gaji"),
        };

        let mut tech_stack: Vec<String> = match self.tech_stack {
            Some(v) => v
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => bail!("oracle reply missing key: tech_stack"),
        };
        tech_stack.truncate(MAX_TECH_STACK);

        Ok(NormalizedPosting {
            judul_pekerjaan,
            perusahaan,
            lokasi,
            estimasi_gaji,
            tech_stack,
            tipe_pekerjaan,
            url_sumber: source_url,
        })
    }
}

fn required(field: Option<String>, key: &str) -> Result<String> {
    match field {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(_) => Ok(SENTINEL.to_string()),
        None => bail!("oracle reply missing key: {key}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> NormalizedDraft {
        NormalizedDraft {
            judul_pekerjaan: Some("Backend Engineer".into()),
            perusahaan: Some("PT Maju".into()),
            lokasi: Some("Jakarta".into()),
            estimasi_gaji: Some("Rp 15-20 juta".into()),
            tech_stack: Some(vec!["Rust".into(), "PostgreSQL".into()]),
            tipe_pekerjaan: Some("Penuh Waktu".into()),
        }
    }

    #[test]
    fn finalize_attaches_url_and_keeps_fields() {
        let p = full_draft().finalize("https://x.test/1".into()).unwrap();
        assert_eq!(p.url_sumber, "https://x.test/1");
        assert_eq!(p.judul_pekerjaan, "Backend Engineer");
        assert_eq!(p.tech_stack, vec!["Rust", "PostgreSQL"]);
    }

    #[test]
    fn missing_key_is_an_error() {
        let mut d = full_draft();
        d.lokasi = None;
        let err = d.finalize("u".into()).unwrap_err();
        assert!(err.to_string().contains("lokasi"));
    }

    #[test]
    fn blank_field_becomes_sentinel() {
        let mut d = full_draft();
        d.perusahaan = Some("   ".into());
        d.estimasi_gaji = Some("".into());
        let p = d.finalize("u".into()).unwrap();
        assert_eq!(p.perusahaan, SENTINEL);
        assert_eq!(p.estimasi_gaji, SALARY_SENTINEL);
    }

    #[test]
    fn oversized_tech_stack_is_truncated() {
        let mut d = full_draft();
        d.tech_stack = Some(
            ["a", "b", "c", "d", "e", "f", "g"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let p = d.finalize("u".into()).unwrap();
        assert_eq!(p.tech_stack.len(), MAX_TECH_STACK);
    }

    #[test]
    fn blank_tech_entries_are_dropped() {
        let mut d = full_draft();
        d.tech_stack = Some(vec!["Rust".into(), " ".into(), "Go".into()]);
        let p = d.finalize("u".into()).unwrap();
        assert_eq!(p.tech_stack, vec!["Rust", "Go"]);
    }
}
