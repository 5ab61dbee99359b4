//! File attachment intake and the delimited query-string encoding used to
//! carry an attachment through navigation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const MAX_FILES_PER_BATCH: usize = 5;
pub const MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: [&str; 4] = ["application/pdf", "text/csv", "image/png", "image/jpeg"];

const QUESTION_PREFIX: &str = "Question about ";
const ANALYZE_PREFIX: &str = "Analyze file: ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Falls back to a guess from the file extension when absent.
    #[serde(default)]
    pub mime_type: Option<String>,
    pub size_bytes: u64,
}

impl FileDescriptor {
    pub fn resolved_mime(&self) -> String {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AttachmentRejection {
    #[error("{name}: file type {mime_type} is not supported (allowed: PDF, CSV, PNG, JPEG)")]
    UnsupportedType { name: String, mime_type: String },
    #[error("{name}: file is {size_bytes} bytes; the maximum is 5 MB")]
    TooLarge { name: String, size_bytes: u64 },
    #[error("{name}: maximum files reached ({max} per upload)")]
    TooManyFiles { name: String, max: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeReport {
    pub accepted: Vec<AttachmentRef>,
    pub rejections: Vec<AttachmentRejection>,
}

impl IntakeReport {
    pub fn messages(&self) -> Vec<String> {
        self.rejections.iter().map(|r| r.to_string()).collect()
    }
}

/// Validates a batch in order. Each file is checked on its own; once
/// `MAX_FILES_PER_BATCH` files are accepted every later file is rejected.
pub fn validate_batch(files: &[FileDescriptor]) -> IntakeReport {
    let mut report = IntakeReport::default();

    for file in files {
        if report.accepted.len() >= MAX_FILES_PER_BATCH {
            report.rejections.push(AttachmentRejection::TooManyFiles {
                name: file.name.clone(),
                max: MAX_FILES_PER_BATCH,
            });
            continue;
        }

        match validate_file(file) {
            Ok(accepted) => report.accepted.push(accepted),
            Err(rejection) => report.rejections.push(rejection),
        }
    }

    if !report.rejections.is_empty() {
        tracing::info!(
            accepted = report.accepted.len(),
            rejected = report.rejections.len(),
            "attachment batch had rejections"
        );
    }

    report
}

pub fn validate_file(file: &FileDescriptor) -> Result<AttachmentRef, AttachmentRejection> {
    let mime_type = file.resolved_mime();
    if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(AttachmentRejection::UnsupportedType {
            name: file.name.clone(),
            mime_type,
        });
    }
    if file.size_bytes > MAX_FILE_SIZE_BYTES {
        return Err(AttachmentRejection::TooLarge {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
        });
    }
    Ok(AttachmentRef {
        name: file.name.clone(),
        mime_type,
    })
}

/// An attachment plus the optional question asked about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedQuery {
    pub file: AttachmentRef,
    pub question: Option<String>,
}

impl AttachedQuery {
    pub fn new(file: AttachmentRef, question: Option<&str>) -> Self {
        let question = question
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);
        Self { file, question }
    }

    /// `Question about <name>|<mime>: <question>` or `Analyze file: <name>|<mime>`.
    pub fn to_query_string(&self) -> String {
        match &self.question {
            Some(question) => format!(
                "{QUESTION_PREFIX}{}|{}: {question}",
                self.file.name, self.file.mime_type
            ),
            None => format!("{ANALYZE_PREFIX}{}|{}", self.file.name, self.file.mime_type),
        }
    }

    /// Parses either encoded form. The file name may itself contain `|`.
    pub fn parse(query: &str) -> Option<Self> {
        if let Some(caps) = question_form().captures(query) {
            return Some(Self {
                file: AttachmentRef {
                    name: caps["name"].to_string(),
                    mime_type: caps["mime"].to_string(),
                },
                question: Some(caps["question"].to_string()),
            });
        }

        let caps = analyze_form().captures(query)?;
        Some(Self {
            file: AttachmentRef {
                name: caps["name"].to_string(),
                mime_type: caps["mime"].to_string(),
            },
            question: None,
        })
    }
}

fn question_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^Question about (?P<name>.+?)\|(?P<mime>[\w.+-]+/[\w.+-]+): (?P<question>.*)$")
            .expect("question-form pattern is valid")
    })
}

fn analyze_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^Analyze file: (?P<name>.+)\|(?P<mime>[\w.+-]+/[\w.+-]+)$")
            .expect("analyze-form pattern is valid")
    })
}
