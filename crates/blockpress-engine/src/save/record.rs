use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::FieldErrors;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
}

/// The post record handed to the save collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    /// Set once the record has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    /// Serialized document HTML.
    #[serde(default)]
    pub content: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub featured: bool,
    pub category_id: String,
    pub author_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

static SLUG_REGEX: OnceLock<Regex> = OnceLock::new();
static DATE_REGEX: OnceLock<Regex> = OnceLock::new();

fn slug_regex() -> &'static Regex {
    SLUG_REGEX.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("Invalid slug regex"))
}

fn date_regex() -> &'static Regex {
    DATE_REGEX.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("Invalid date regex")
    })
}

impl PostRecord {
    pub fn is_persisted(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Title, author and category are all filled in.
    pub fn has_required_fields(&self) -> bool {
        [&self.title, &self.author_id, &self.category_id]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// Checks every field, collecting all messages per field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut fail = |field: &str, message: &str| {
            errors
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        };

        let title = self.title.trim();
        if title.is_empty() {
            fail("title", "Title is required");
        } else if title.chars().count() > MAX_TITLE_CHARS {
            fail("title", "Title must be 200 characters or fewer");
        }

        if self.slug.is_empty() {
            fail("slug", "Slug is required");
        } else if !slug_regex().is_match(&self.slug) {
            fail(
                "slug",
                "Slug may only contain lowercase letters, numbers and single hyphens",
            );
        }

        if self.excerpt.chars().count() > MAX_EXCERPT_CHARS {
            fail("excerpt", "Excerpt must be 500 characters or fewer");
        }

        if !is_valid_date(&self.date) {
            fail("date", "Date must be a valid YYYY-MM-DD date");
        }

        if self.category_id.trim().is_empty() {
            fail("categoryId", "Category is required");
        }
        if self.author_id.trim().is_empty() {
            fail("authorId", "Author is required");
        }

        if let Some(url) = &self.image_url
            && !url.is_empty()
            && !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/'))
        {
            fail("imageUrl", "Image URL must be an absolute URL or path");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn is_valid_date(date: &str) -> bool {
    let Some(caps) = date_regex().captures(date) else {
        return false;
    };
    let parse = |i: usize| caps[i].parse::<u32>().unwrap_or(0);
    let (year, month, day) = (parse(1), parse(2), parse(3));
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days).contains(&day)
}

/// Derives a URL slug from a title: lowercase ASCII alphanumerics separated
/// by single hyphens.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c != '\'' {
            pending_hyphen = true;
        }
    }
    slug
}
