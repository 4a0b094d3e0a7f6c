//! List: page through a project's builds.

use url::form_urlencoded;

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::operation::BuildList;
use crate::requests::{builds_url, decode, ApiRequest};

/// `GET /v1/projects/{project}/builds`
///
/// Paging and filtering are sent as `pageSize`, `pageToken` and `filter`
/// query parameters. A zero page size and empty strings are left off, so the
/// service applies its defaults.
#[derive(Debug, Clone, Default)]
pub struct ListBuilds {
    page_size: u32,
    page_token: String,
    filter: String,
    list: BuildList,
}

impl ListBuilds {
    pub fn new(page_size: u32, page_token: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            page_size,
            page_token: page_token.into(),
            filter: filter.into(),
            list: BuildList::default(),
        }
    }

    fn query(&self) -> Option<String> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut any = false;
        if self.page_size > 0 {
            query.append_pair("pageSize", &self.page_size.to_string());
            any = true;
        }
        if !self.page_token.is_empty() {
            query.append_pair("pageToken", &self.page_token);
            any = true;
        }
        if !self.filter.is_empty() {
            query.append_pair("filter", &self.filter);
            any = true;
        }
        any.then(|| query.finish())
    }
}

impl ApiRequest for ListBuilds {
    type Output = BuildList;

    fn name(&self) -> &'static str {
        "list"
    }

    fn build_request(&self, endpoint: &str, project_id: &str) -> Result<HttpRequest> {
        let mut url = builds_url(endpoint, project_id);
        if let Some(query) = self.query() {
            url.push('?');
            url.push_str(&query);
        }
        Ok(HttpRequest::new(HttpMethod::Get, url))
    }

    fn parse_response(&mut self, body: &[u8]) -> Result<()> {
        self.list = decode(body)?;
        Ok(())
    }

    fn response(&self) -> &BuildList {
        &self.list
    }

    fn into_response(self) -> BuildList {
        self.list
    }
}
