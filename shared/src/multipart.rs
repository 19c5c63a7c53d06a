//! `multipart/form-data` body assembly (RFC 7578).

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PartBody {
    Text(String),
    File {
        filename: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    name: String,
    body: PartBody,
}

/// Ordered list of named parts. A name may repeat (`images` once per file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: format!("----estate-{}", uuid::Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            body: PartBody::Text(value.into()),
        });
        self
    }

    /// Adds `value` serialized as a JSON text part.
    pub fn json<T: Serialize>(
        self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self, serde_json::Error> {
        let encoded = serde_json::to_string(value)?;
        Ok(self.text(name, encoded))
    }

    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            body: PartBody::File {
                filename: filename.into(),
                mime_type: mime_type.into(),
                bytes,
            },
        });
        self
    }

    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// First text part called `name`.
    #[must_use]
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|p| match &p.body {
            PartBody::Text(value) if p.name == name => Some(value.as_str()),
            _ => None,
        })
    }

    #[must_use]
    pub fn file_count(&self, name: &str) -> usize {
        self.parts
            .iter()
            .filter(|p| p.name == name && matches!(p.body, PartBody::File { .. }))
            .count()
    }

    #[must_use]
    pub fn into_body(self) -> Vec<u8> {
        let mut out = Vec::new();
        for part in self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part.body {
                PartBody::Text(value) => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                            escape(&part.name)
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                PartBody::File {
                    filename,
                    mime_type,
                    bytes,
                } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                            escape(&part.name),
                            escape(&filename),
                            mime_type.replace(['\r', '\n'], "")
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(&bytes);
                }
            }
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

/// Quotes and line breaks in names would end the header early.
fn escape(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
