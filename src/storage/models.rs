use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored short-code mapping. Immutable after creation except for the
/// append-only click list.
#[derive(Debug, Clone)]
pub struct ShortUrlRecord {
    pub short_code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub clicks: Vec<ClickEvent>,
}

impl ShortUrlRecord {
    /// Active iff `now` has not passed the expiry. Expiry is evaluated
    /// lazily at read time; there is no background reaper.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    pub fn click_count(&self) -> usize {
        self.clicks.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub clicked_at: DateTime<Utc>,
    pub source: String,
}

/// Listing parameters for the stats endpoint, already normalized
/// (limit clamped, defaults applied) by the service layer.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub limit: u64,
    pub offset: u64,
    pub sort_by: SortField,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            sort_by: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    ExpiresAt,
    ShortCode,
}

impl SortField {
    /// Unrecognized values fall back to creation time, matching the
    /// lenient behavior of the stats query parameters.
    pub fn from_param(param: &str) -> Self {
        match param {
            "expiresAt" => SortField::ExpiresAt,
            "shortCode" => SortField::ShortCode,
            _ => SortField::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_param(param: &str) -> Self {
        if param == "asc" {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_is_active_boundary() {
        let now = Utc::now();
        let record = ShortUrlRecord {
            short_code: "abc1234".to_string(),
            long_url: "https://example.com".to_string(),
            created_at: now - Duration::minutes(30),
            expires_at: now,
            clicks: Vec::new(),
        };

        // Exactly at expiry still counts as active
        assert!(record.is_active(now));
        assert!(!record.is_active(now + Duration::seconds(1)));
        assert!(record.is_active(now - Duration::minutes(5)));
    }

    #[test]
    fn test_sort_param_parsing() {
        assert_eq!(SortField::from_param("createdAt"), SortField::CreatedAt);
        assert_eq!(SortField::from_param("expiresAt"), SortField::ExpiresAt);
        assert_eq!(SortField::from_param("shortCode"), SortField::ShortCode);
        assert_eq!(SortField::from_param("bogus"), SortField::CreatedAt);

        assert_eq!(SortOrder::from_param("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::from_param("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::from_param(""), SortOrder::Desc);
    }
}
