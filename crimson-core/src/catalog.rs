use serde::{Deserialize, Serialize};

/// Reference data for a title, keyed by ISBN. Copies point at this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub course: String,
    pub major: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub author_id: i64,
    pub isbn: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAuthor {
    pub isbn: String,
    pub first_name: String,
    pub last_name: String,
}
