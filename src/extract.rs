// src/extract.rs
// Extraction oracle: turns free-text job descriptions into the canonical
// Indonesian schema by prompting a generative endpoint and strictly parsing
// the reply. Every failure mode maps to one failed item, never a failed run.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::ingest::posting::NormalizedDraft;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// The whole schema contract lives in this instruction, not in per-call logic.
/// `{deskripsi}` is replaced with the sanitized posting text.
const PROMPT_TEMPLATE: &str = r#"Kamu adalah spesialis HR dan Data Engineer untuk pasar teknologi di Indonesia.
Tugasmu adalah menganalisis deskripsi pekerjaan mentah berikut dan mengekstrak informasinya menjadi format JSON murni.

Aturan wajib:
1. Output HANYA boleh berupa objek JSON yang valid tanpa markdown (```json ... ```) atau teks pengantar apapun.
2. Terjemahkan konsep atau tipe pekerjaan ke dalam bahasa Indonesia (misal: "Full-time" -> "Penuh Waktu").
3. Jika tidak ada informasi eksplisit, tulis "Tidak disebutkan".

Format JSON yang diharapkan:
{
    "judul_pekerjaan": "...",
    "perusahaan": "...",
    "lokasi": "...", (Contoh: Jakarta, Remote Indonesia, Bandung, dll)
    "estimasi_gaji": "...", (Jika ada mata uang asing, biarkan aslinya. Jika tidak ada, tulis "Sesuai standar perusahaan")
    "tech_stack": ["React", "Python", "AWS"], (Array string, maksimal 5 skill utama)
    "tipe_pekerjaan": "..."
}

Deskripsi Pekerjaan Mentah:
{deskripsi}"#;

/// Structured extraction from free text. Returns a draft; the pipeline
/// validates it and attaches the source URL.
#[async_trait::async_trait]
pub trait ExtractionOracle: Send + Sync {
    async fn extract(&self, free_text: &str) -> Result<NormalizedDraft>;
    fn name(&self) -> &str;
}

/// Gemini `generateContent` client. One request per extraction, bounded
/// timeout, low temperature for deterministic output.
pub struct GeminiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}
#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}
#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
#[derive(Deserialize)]
struct Part {
    text: String,
}

impl GeminiOracle {
    pub fn new(api_key: String, model: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(45))
            .build()
            .context("building oracle http client")?;
        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{GEMINI_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }
}

#[async_trait::async_trait]
impl ExtractionOracle for GeminiOracle {
    async fn extract(&self, free_text: &str) -> Result<NormalizedDraft> {
        let prompt = PROMPT_TEMPLATE.replace("{deskripsi}", free_text);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.1,
                "maxOutputTokens": 1024,
            },
        });

        let resp = self
            .http
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("oracle request")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("oracle endpoint returned {status}");
        }

        let reply: GenerateResponse = resp.json().await.context("oracle response body")?;
        let text = reply
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .context("oracle reply has no candidate text")?;

        parse_reply(text)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Parse a raw oracle reply into a draft. Tolerates the reply being wrapped
/// in a fenced code block despite the instruction not to.
pub fn parse_reply(text: &str) -> Result<NormalizedDraft> {
    let inner = strip_code_fences(text);
    serde_json::from_str(inner).context("oracle reply is not a valid JSON object")
}

/// Remove a surrounding ``` / ```json fence, if any. Inner content is
/// returned trimmed; an unfenced reply passes through unchanged.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches("json"),
    };
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Canned-reply oracle for tests (and offline dry runs): parses a fixed reply
/// string exactly the way the real oracle parses endpoint output.
pub struct FixedOracle {
    reply: String,
}

impl FixedOracle {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait::async_trait]
impl ExtractionOracle for FixedOracle {
    async fn extract(&self, _free_text: &str) -> Result<NormalizedDraft> {
        parse_reply(&self.reply)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
