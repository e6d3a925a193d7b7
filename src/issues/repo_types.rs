use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Pending,
    Acknowledged,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Pending => "pending",
            IssueStatus::Acknowledged => "acknowledged",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(IssueStatus::Pending),
            "acknowledged" => Ok(IssueStatus::Acknowledged),
            "in_progress" => Ok(IssueStatus::InProgress),
            "resolved" => Ok(IssueStatus::Resolved),
            other => anyhow::bail!("unknown issue status {:?}", other),
        }
    }
}

/// Comment embedded in an issue; stored inside the issue's JSONB array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Issue row as stored.
#[derive(Debug, FromRow)]
pub struct IssueRow {
    pub id: Uuid,
    pub category: String,
    pub location: String,
    pub details: String,
    pub department: String,
    pub reported_by: Uuid,
    pub status: String,
    pub upvotes: i64,
    pub comments: Json<Vec<Comment>>,
    pub resolution_details: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub category: String,
    pub location: String,
    pub details: String,
    pub department: String,
    pub reported_by: Uuid,
    pub status: IssueStatus,
    pub upvotes: i64,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_details: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<IssueRow> for Issue {
    type Error = anyhow::Error;

    fn try_from(r: IssueRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            category: r.category,
            location: r.location,
            details: r.details,
            department: r.department,
            reported_by: r.reported_by,
            status: r.status.parse()?,
            upvotes: r.upvotes,
            comments: r.comments.0,
            resolution_details: r.resolution_details,
            created_at: r.created_at,
        })
    }
}

/// Reporter-supplied fields of a new issue.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub category: String,
    pub location: String,
    pub details: String,
    pub department: String,
    pub reported_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub status: Option<IssueStatus>,
    pub limit: Option<i64>,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub status: String,
    pub count: i64,
}
