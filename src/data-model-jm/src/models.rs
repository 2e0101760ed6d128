use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Description stored when the detail page could not be read.
pub const FALLBACK_DESCRIPTION: &str = "Descrição indisponível no momento.";

// job_posting table model (database representation)
/// A job posting scraped from the listings site.
///
/// `url` is the natural key: the store never holds two postings with the same url.
/// `enriched == true` implies `enriched_description.is_some()`.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::job_posting)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted_date_text: String,
    pub url: String,
    pub raw_description: Option<String>,
    pub enriched_description: Option<String>,
    pub enriched: bool,
    pub created_at: DateTime<Utc>,
}

impl JobPosting {
    /// True when the enrichment processor should pick this posting up.
    pub fn is_pending(&self) -> bool {
        !self.enriched && self.raw_description.is_some()
    }
}

/// Insertable form of a posting. The id and creation timestamp are assigned on construction.
#[derive(Debug, Clone, PartialEq, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::job_posting)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewJobPosting {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted_date_text: String,
    pub url: String,
    pub raw_description: Option<String>,
    pub enriched: bool,
    pub created_at: DateTime<Utc>,
}

impl NewJobPosting {
    pub fn new(
        title: String,
        company: String,
        location: String,
        posted_date_text: String,
        url: String,
        raw_description: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            company,
            location,
            posted_date_text,
            url,
            raw_description,
            enriched: false,
            created_at: Utc::now(),
        }
    }

    /// Materialize the row the store holds after inserting this value.
    pub fn into_posting(self) -> JobPosting {
        JobPosting {
            id: self.id,
            title: self.title,
            company: self.company,
            location: self.location,
            posted_date_text: self.posted_date_text,
            url: self.url,
            raw_description: self.raw_description,
            enriched_description: None,
            enriched: self.enriched,
            created_at: self.created_at,
        }
    }
}

// users table model: owned by the user-management service, read-only here.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SearchProfile {
    pub id: String,
    pub keyword: Option<String>,
    pub is_active: bool,
}

/// Substring filters for listing recent postings. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingFilter {
    pub keyword: String,
    pub location: String,
}

impl PostingFilter {
    pub fn matches(&self, posting: &JobPosting) -> bool {
        contains_ignore_case(&posting.title, &self.keyword) && contains_ignore_case(&posting.location, &self.location)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
