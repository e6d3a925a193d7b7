use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateIssueRequest {
    pub category: String,
    pub location: String,
    pub details: String,
    pub department: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueRequest {
    pub status: String,
    #[serde(default)]
    pub resolution_details: Option<String>,
}

/// Optional filters for the issue list. Without `limit` every match is returned.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
