//! Pagination types for search results.
//!
//! This module defines the request-side paging window ([`RequestedPage`],
//! [`PageDescriptor`]), the assembled page ([`ResponsePage`]), the navigation
//! links ([`BundleLinks`]) and the FHIR Bundle they end up in ([`SearchBundle`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The explicit paging window supplied by the caller (`_offset`, `_count`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedPage {
    /// Absolute offset. Presence forces offset paging.
    pub offset: Option<usize>,

    /// Requested page size.
    pub limit: Option<usize>,
}

impl RequestedPage {
    /// Creates a requested page.
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Self {
        Self { offset, limit }
    }

    /// A window with an explicit offset.
    pub fn offset(offset: usize, limit: usize) -> Self {
        Self::new(Some(offset), Some(limit))
    }

    /// A window with only a page size.
    pub fn limit(limit: usize) -> Self {
        Self::new(None, Some(limit))
    }
}

/// Identifies one page of a (possibly server-retained) result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDescriptor {
    /// Server-retained result set identifier (cursor mode).
    pub search_id: Option<String>,

    /// A specific page within the retained result set.
    pub page_id: Option<String>,

    /// Absolute position of the first resource on the page.
    pub offset: usize,

    /// Page size, if one was requested.
    pub limit: Option<usize>,
}

impl PageDescriptor {
    /// Descriptor for a page of a retained result set.
    pub fn cursor(search_id: impl Into<String>, offset: usize, limit: Option<usize>) -> Self {
        Self {
            search_id: Some(search_id.into()),
            page_id: None,
            offset,
            limit,
        }
    }

    /// Sets the page id.
    pub fn with_page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }
}

/// The kind of bundle being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    /// Results of a search.
    #[default]
    Searchset,
    /// Results of a history interaction.
    History,
}

impl BundleType {
    /// Returns the FHIR code for this bundle type.
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleType::Searchset => "searchset",
            BundleType::History => "history",
        }
    }
}

impl fmt::Display for BundleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a result set is being paged.
///
/// Chosen once per request and never switched mid-sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagingMode {
    /// Stateless paging by absolute position (`_offset`).
    Offset,
    /// Paging through a server-retained result set (`_getpages`).
    Cursor,
}

/// One assembled page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePage {
    /// The paging mode the page was built under.
    pub mode: PagingMode,

    /// The retained result set id, when cursor paging is live.
    pub search_id: Option<String>,

    /// The resources on this page, in provider order.
    pub resources: Vec<Value>,

    /// The page size in effect.
    pub page_size: usize,

    /// How many resources were asked of the provider.
    pub num_to_return: usize,

    /// Total matches, if known.
    pub num_total_results: Option<usize>,
}

impl ResponsePage {
    /// Returns the number of resources on the page.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if the page holds no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleLinks {
    /// The server base URL the links are relative to.
    pub server_base: String,

    /// The bundle type the links navigate.
    pub bundle_type: BundleType,

    /// Link to the current page.
    pub self_link: String,

    /// Link to the next page.
    pub next: Option<String>,

    /// Link to the previous page.
    pub prev: Option<String>,
}

impl BundleLinks {
    /// Creates links with only a self link.
    pub fn new(
        server_base: impl Into<String>,
        bundle_type: BundleType,
        self_link: impl Into<String>,
    ) -> Self {
        Self {
            server_base: server_base.into(),
            bundle_type,
            self_link: self_link.into(),
            next: None,
            prev: None,
        }
    }
}

/// A FHIR Bundle for search or history results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBundle {
    /// Always "Bundle".
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    /// The result set identifier, when the provider has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The bundle type.
    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    /// Total count of matching resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,

    /// Links for pagination.
    pub link: Vec<BundleLink>,

    /// The bundle entries.
    pub entry: Vec<BundleEntry>,
}

/// A link in a FHIR Bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleLink {
    /// The relation type (self, next, previous).
    pub relation: String,

    /// The URL.
    pub url: String,
}

/// An entry in a FHIR Bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntry {
    /// The full URL of the resource.
    #[serde(rename = "fullUrl", skip_serializing_if = "Option::is_none")]
    pub full_url: Option<String>,

    /// The resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,

    /// Search information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<BundleEntrySearch>,
}

/// Search information for a bundle entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntrySearch {
    /// How this entry matched the search (match, outcome).
    pub mode: SearchEntryMode,
}

/// How a bundle entry matched the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchEntryMode {
    /// This is a match to the search parameters.
    Match,
    /// This is an OperationOutcome about the search.
    Outcome,
}

impl SearchBundle {
    /// Creates a new, empty bundle of the given type.
    pub fn new(bundle_type: BundleType) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            id: None,
            bundle_type,
            total: None,
            link: Vec::new(),
            entry: Vec::new(),
        }
    }

    /// Sets the bundle id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the total count.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    /// Adds a link.
    pub fn with_link(mut self, relation: impl Into<String>, url: impl Into<String>) -> Self {
        self.link.push(BundleLink {
            relation: relation.into(),
            url: url.into(),
        });
        self
    }

    /// Adds the self/next/previous links.
    pub fn with_links(mut self, links: &BundleLinks) -> Self {
        self = self.with_link("self", links.self_link.clone());
        if let Some(next) = &links.next {
            self = self.with_link("next", next.clone());
        }
        if let Some(prev) = &links.prev {
            self = self.with_link("previous", prev.clone());
        }
        self
    }

    /// Adds an entry.
    pub fn with_entry(mut self, entry: BundleEntry) -> Self {
        self.entry.push(entry);
        self
    }

    /// Returns the URL of the link with the given relation.
    pub fn link_url(&self, relation: &str) -> Option<&str> {
        self.link
            .iter()
            .find(|l| l.relation == relation)
            .map(|l| l.url.as_str())
    }
}

impl BundleEntry {
    /// Creates a match entry.
    pub fn match_entry(full_url: Option<String>, resource: Value) -> Self {
        Self {
            full_url,
            resource: Some(resource),
            search: Some(BundleEntrySearch {
                mode: SearchEntryMode::Match,
            }),
        }
    }

    /// Creates an outcome entry.
    pub fn outcome_entry(resource: Value) -> Self {
        Self {
            full_url: None,
            resource: Some(resource),
            search: Some(BundleEntrySearch {
                mode: SearchEntryMode::Outcome,
            }),
        }
    }
}
