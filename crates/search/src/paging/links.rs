//! Navigation links for result pages.
//!
//! Three link shapes are produced, in order of precedence:
//!
//! - **Named pages**: the provider pages by itself and exposes page ids
//!   (`?_getpages={uuid}&_pageId={id}`).
//! - **Offset**: the request URL with its paging parameters replaced
//!   (`?...&_offset=N&_count=M`).
//! - **Cursor**: a retained result set resumed by position
//!   (`?_getpages={id}&_getpagesoffset=N&_count=M`).
//!
//! The self link is always the request URL.

use url::form_urlencoded::Serializer;

use crate::paging::page::ResponseBundleRequest;
use crate::types::{BundleLinks, BundleType, PagingMode, ResponsePage};

/// Query parameter naming a retained result set.
pub const PARAM_GET_PAGES: &str = "_getpages";
/// Query parameter carrying the cursor offset.
pub const PARAM_GET_PAGES_OFFSET: &str = "_getpagesoffset";
/// Query parameter naming a provider-managed page.
pub const PARAM_PAGE_ID: &str = "_pageId";
/// Query parameter carrying the bundle type of a retained result set.
pub const PARAM_BUNDLE_TYPE: &str = "_bundletype";
/// Query parameter carrying the absolute offset.
pub const PARAM_OFFSET: &str = "_offset";
/// Query parameter carrying the page size.
pub const PARAM_COUNT: &str = "_count";

const PAGING_PARAMS: [&str; 6] = [
    PARAM_OFFSET,
    PARAM_COUNT,
    PARAM_GET_PAGES,
    PARAM_GET_PAGES_OFFSET,
    PARAM_PAGE_ID,
    PARAM_BUNDLE_TYPE,
];

/// Response-shaping parameters carried over onto cursor and named-page links.
const FORMAT_PARAMS: [&str; 4] = ["_format", "_pretty", "_elements", "_summary"];

/// Builds the self/next/previous links for an assembled page.
pub fn build_links(request: &ResponseBundleRequest, page: &ResponsePage) -> BundleLinks {
    let context = &request.context;
    let mut links = BundleLinks::new(
        context.server_base.clone(),
        request.bundle_type,
        request.link_self.clone(),
    );

    let current_page_id = request
        .provider
        .current_page_id()
        .filter(|id| !id.trim().is_empty());

    if current_page_id.is_some() {
        let uuid = request.provider.uuid().unwrap_or_default();
        if !page.is_empty() {
            links.next = request
                .provider
                .next_page_id()
                .filter(|id| !id.trim().is_empty())
                .map(|id| named_page_link(request, &uuid, &id));
        }
        links.prev = request
            .provider
            .previous_page_id()
            .filter(|id| !id.trim().is_empty())
            .map(|id| named_page_link(request, &uuid, &id));
    } else if page.mode == PagingMode::Offset {
        let offset = request.requested_page.offset.unwrap_or(0);
        if !page.is_empty() && has_more(offset, page.len(), page.num_total_results) {
            links.next = offset
                .checked_add(page.num_to_return)
                .map(|next| offset_link(request, next, page.num_to_return));
        }
        if offset > 0 {
            let prev = offset.saturating_sub(page.page_size);
            links.prev = Some(offset_link(request, prev, page.page_size));
        }
    } else if let Some(search_id) = &page.search_id {
        if !page.is_empty() {
            let offset = request.offset();
            if has_more(offset, page.num_to_return, page.num_total_results) {
                links.next = offset
                    .checked_add(page.num_to_return)
                    .map(|next| cursor_link(request, search_id, next, page.num_to_return));
            }
            if offset > 0 {
                let prev = offset.saturating_sub(page.page_size);
                links.prev = Some(cursor_link(request, search_id, prev, page.page_size));
            }
        }
    }

    tracing::trace!(
        next = ?links.next,
        prev = ?links.prev,
        "Built page links"
    );
    links
}

/// An unknown total always allows a next page.
fn has_more(offset: usize, returned: usize, total: Option<usize>) -> bool {
    total.is_none_or(|total| offset.saturating_add(returned) < total)
}

fn base(request: &ResponseBundleRequest) -> &str {
    request.context.server_base.trim_end_matches('/')
}

fn format_params(request: &ResponseBundleRequest, query: &mut Serializer<'_, String>) {
    for (name, value) in &request.context.parameters {
        if FORMAT_PARAMS.contains(&name.as_str()) {
            query.append_pair(name, value);
        }
    }
}

fn bundle_type_param(bundle_type: BundleType, query: &mut Serializer<'_, String>) {
    if bundle_type != BundleType::Searchset {
        query.append_pair(PARAM_BUNDLE_TYPE, bundle_type.as_str());
    }
}

fn offset_link(request: &ResponseBundleRequest, offset: usize, count: usize) -> String {
    let mut query = Serializer::new(String::new());
    for (name, value) in &request.context.parameters {
        if !PAGING_PARAMS.contains(&name.as_str()) {
            query.append_pair(name, value);
        }
    }
    query.append_pair(PARAM_OFFSET, &offset.to_string());
    query.append_pair(PARAM_COUNT, &count.to_string());

    let path = request.context.request_path.trim_matches('/');
    if path.is_empty() {
        format!("{}?{}", base(request), query.finish())
    } else {
        format!("{}/{}?{}", base(request), path, query.finish())
    }
}

fn cursor_link(
    request: &ResponseBundleRequest,
    search_id: &str,
    offset: usize,
    count: usize,
) -> String {
    let mut query = Serializer::new(String::new());
    query.append_pair(PARAM_GET_PAGES, search_id);
    query.append_pair(PARAM_GET_PAGES_OFFSET, &offset.to_string());
    query.append_pair(PARAM_COUNT, &count.to_string());
    format_params(request, &mut query);
    bundle_type_param(request.bundle_type, &mut query);
    format!("{}?{}", base(request), query.finish())
}

fn named_page_link(request: &ResponseBundleRequest, uuid: &str, page_id: &str) -> String {
    let mut query = Serializer::new(String::new());
    query.append_pair(PARAM_GET_PAGES, uuid);
    query.append_pair(PARAM_PAGE_ID, page_id);
    format_params(request, &mut query);
    bundle_type_param(request.bundle_type, &mut query);
    format!("{}?{}", base(request), query.finish())
}
