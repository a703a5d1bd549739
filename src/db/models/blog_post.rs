//! Blog post models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::common::{new_id, timestamp};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl BlogPost {
    pub fn from_request(req: &CreatePostRequest) -> Self {
        let now = timestamp();
        Self {
            id: new_id(),
            title: req.title.trim().to_string(),
            content: req.content.clone(),
            author_id: req.author_id.clone().filter(|a| !a.is_empty()),
            published: req.published,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// First paragraph, cut to `max` characters for list views.
    pub fn excerpt(&self, max: usize) -> String {
        let first = self.content.split("\n\n").next().unwrap_or_default().trim();
        if first.chars().count() <= max {
            first.to_string()
        } else {
            let cut: String = first.chars().take(max).collect();
            format!("{}...", cut.trim_end())
        }
    }

    /// Content split into paragraphs for rendering.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.content
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub author_id: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(content: &str) -> BlogPost {
        BlogPost {
            id: "p1".to_string(),
            title: "Title".to_string(),
            content: content.to_string(),
            author_id: None,
            published: true,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_excerpt_uses_first_paragraph() {
        let p = post("Short intro.\n\nSecond paragraph.");
        assert_eq!(p.excerpt(100), "Short intro.");
    }

    #[test]
    fn test_excerpt_truncates_long_paragraph() {
        let p = post("abcdefghij klmnop");
        assert_eq!(p.excerpt(10), "abcdefghij...");
    }

    #[test]
    fn test_paragraphs_skip_blank_blocks() {
        let p = post("one\n\n\n\ntwo\n\n  ");
        assert_eq!(p.paragraphs(), vec!["one", "two"]);
    }
}
