//! Common list query parameters and the `{data, page}` response envelope.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use atlas_db::listing::PageParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Case-insensitive name search.
    pub q: Option<String>,
    pub site_id: Option<i64>,
    /// Asset type filter (assets list only).
    #[serde(rename = "type")]
    pub asset_type: Option<String>,
    /// Org filter; honored only for main-tenant callers on the users list.
    pub org_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Comma-separated sort keys, `-` prefix for descending.
    pub sort: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> PageParams {
        PageParams::clamped(self.limit, self.offset)
    }

    pub fn sort(&self) -> &str {
        self.sort.as_deref().unwrap_or("")
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.trim().is_empty())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub page: Page,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, page: PageParams, total: i64) -> Self {
        ListResponse {
            data,
            page: Page {
                limit: page.limit,
                offset: page.offset,
                total,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let page = PageParams::clamped(Some(50), Some(0));
        let response = ListResponse::new(Vec::<i32>::new(), page, 0);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": [],
                "page": { "limit": 50, "offset": 0, "total": 0 }
            })
        );
    }

    #[test]
    fn query_defaults() {
        let query = ListQuery::default();
        assert_eq!(query.page(), PageParams::clamped(None, None));
        assert_eq!(query.sort(), "");
        assert_eq!(query.q(), None);
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = ListQuery {
            q: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(query.q(), None);
    }
}
