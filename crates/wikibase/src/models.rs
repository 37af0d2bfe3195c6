//! Response bodies of the MediaWiki Action API (`formatversion=2`).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

/// `wbcreateclaim`
#[derive(Debug, Deserialize)]
pub(crate) struct ClaimResponse {
    pub success: Option<i64>,
    pub pageinfo: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageInfo {
    pub lastrevid: Option<i64>,
}

/// `tag`
#[derive(Debug, Deserialize)]
pub(crate) struct TagResponse {
    #[serde(default)]
    pub tag: Vec<TagResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagResult {
    pub revid: Option<i64>,
    pub status: String,
}

/// `query&prop=info`
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    pub query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryBody {
    #[serde(default)]
    pub pages: Vec<QueryPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryPage {
    pub pageid: Option<u64>,
    #[serde(default)]
    pub missing: bool,
}

/// `wbsetlabel`
#[derive(Debug, Deserialize)]
pub(crate) struct EntityEditResponse {
    pub success: Option<i64>,
    pub entity: Option<EditedEntity>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditedEntity {
    pub lastrevid: Option<i64>,
}
