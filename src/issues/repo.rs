use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{
    Comment, Issue, IssueFilter, IssueRow, IssueStatus, NewIssue, StatusCount,
};

#[async_trait]
pub trait IssueRepo: Send + Sync {
    async fn list(&self, filter: &IssueFilter) -> anyhow::Result<Vec<Issue>>;
    async fn create(&self, new: NewIssue) -> anyhow::Result<Issue>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Issue>>;
    /// Adds one upvote in a single atomic update. Returns whether an issue matched.
    async fn upvote(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Appends to the comment list in a single atomic update. Returns whether an issue matched.
    async fn add_comment(&self, id: Uuid, comment: Comment) -> anyhow::Result<bool>;
    async fn update_status(
        &self,
        id: Uuid,
        status: IssueStatus,
        resolution_details: Option<String>,
    ) -> anyhow::Result<Option<Issue>>;
    async fn count_by_status(&self) -> anyhow::Result<Vec<StatusCount>>;
}

const ISSUE_COLUMNS: &str = "id, category, location, details, department, reported_by, \
                             status, upvotes, comments, resolution_details, created_at";

#[derive(Clone)]
pub struct PgIssueRepo {
    db: PgPool,
}

impl PgIssueRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IssueRepo for PgIssueRepo {
    async fn list(&self, filter: &IssueFilter) -> anyhow::Result<Vec<Issue>> {
        // LIMIT NULL means no limit
        let rows = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS}
              FROM issues
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.db)
        .await
        .context("list issues")?;

        rows.into_iter().map(Issue::try_from).collect()
    }

    async fn create(&self, new: NewIssue) -> anyhow::Result<Issue> {
        let row = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            INSERT INTO issues (category, location, details, department, reported_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(&new.category)
        .bind(&new.location)
        .bind(&new.details)
        .bind(&new.department)
        .bind(new.reported_by)
        .fetch_one(&self.db)
        .await
        .context("insert issue")?;

        row.try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Issue>> {
        let row = sqlx::query_as::<_, IssueRow>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get issue")?;

        row.map(Issue::try_from).transpose()
    }

    async fn upvote(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE issues SET upvotes = upvotes + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("upvote issue")?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_comment(&self, id: Uuid, comment: Comment) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE issues SET comments = comments || $2 WHERE id = $1")
            .bind(id)
            .bind(Json(vec![comment]))
            .execute(&self.db)
            .await
            .context("append comment")?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: IssueStatus,
        resolution_details: Option<String>,
    ) -> anyhow::Result<Option<Issue>> {
        let row = sqlx::query_as::<_, IssueRow>(&format!(
            r#"
            UPDATE issues
               SET status = $2,
                   resolution_details = COALESCE($3, resolution_details)
             WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(resolution_details)
        .fetch_optional(&self.db)
        .await
        .context("update issue status")?;

        row.map(Issue::try_from).transpose()
    }

    async fn count_by_status(&self) -> anyhow::Result<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
              FROM issues
             GROUP BY status
             ORDER BY status
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("count issues by status")?;
        Ok(rows)
    }
}
