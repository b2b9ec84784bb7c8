use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use crate::{
    db::{helpers::parse_datetime, models::PendingSubmission, Database},
    models::SubmissionRequest,
};

fn row_to_pending(row: &Row) -> Result<PendingSubmission> {
    let payload: String = row.get("payload")?;
    let saved_at: String = row.get("saved_at")?;
    let request: SubmissionRequest =
        serde_json::from_str(&payload).context("failed to decode stored submission")?;

    Ok(PendingSubmission {
        session_id: row.get("session_id")?,
        participant_id: row.get("participant_id")?,
        request,
        saved_at: parse_datetime(&saved_at, "saved_at")?,
    })
}

impl Database {
    /// Stores the request; saving the same session again replaces it.
    pub async fn save_pending(
        &self,
        request: &SubmissionRequest,
        saved_at: DateTime<Utc>,
    ) -> Result<()> {
        let session_id = request.session_id().to_string();
        let participant_id = request.participant_id.clone();
        let payload = serde_json::to_string(request).context("failed to encode submission")?;

        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO pending_submissions (session_id, participant_id, payload, saved_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, participant_id, payload, saved_at.to_rfc3339()],
            )
            .with_context(|| "failed to insert pending submission")?;
            Ok(())
        })
        .await
    }

    /// Oldest first.
    pub async fn list_pending(&self) -> Result<Vec<PendingSubmission>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, participant_id, payload, saved_at
                 FROM pending_submissions
                 ORDER BY saved_at ASC",
            )?;
            let mut rows = stmt.query([])?;
            let mut pending = Vec::new();
            while let Some(row) = rows.next()? {
                pending.push(row_to_pending(row)?);
            }
            Ok(pending)
        })
        .await
    }

    pub async fn pending_count(&self) -> Result<usize> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM pending_submissions", [], |row| row.get(0))?;
            Ok(count.max(0) as usize)
        })
        .await
    }

    /// Returns whether a row was removed.
    pub async fn remove_pending(&self, session_id: &str) -> Result<bool> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let removed = conn.execute(
                "DELETE FROM pending_submissions WHERE session_id = ?1",
                params![session_id],
            )?;
            Ok(removed > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            AssessmentRecord, DecisionTaskResult, EmotionTaskResult, ReactionTaskResult,
            SessionContext,
        },
        scoring::{summarize, ScoringConfig},
    };
    use chrono::Duration;
    use tempfile::tempdir;

    fn request(context: &SessionContext) -> SubmissionRequest {
        let reaction = ReactionTaskResult {
            trials: Vec::new(),
            premature: Vec::new(),
        };
        let decision = DecisionTaskResult {
            responses: Vec::new(),
            used_fallback: true,
        };
        let emotion = EmotionTaskResult {
            trials: Vec::new(),
            correct_count: 0,
            accuracy_percent: 0.0,
        };
        let summary = summarize(&reaction, &decision, &emotion, &ScoringConfig::default());
        let record = AssessmentRecord {
            session_id: context.session_id.clone(),
            participant_id: context.participant_id.clone(),
            reaction,
            decision,
            emotion,
            summary,
            completed_at: Utc::now(),
        };
        SubmissionRequest::for_record(record, context)
    }

    #[tokio::test]
    async fn pending_submissions_survive_reopen_and_can_be_removed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("outbox.sqlite3");
        let first = SessionContext::new("anon_first0001", true);
        let second = SessionContext::new("anon_second001", false);
        let now = Utc::now();

        {
            let db = Database::new(path.clone()).unwrap();
            db.save_pending(&request(&second), now).await.unwrap();
            db.save_pending(&request(&first), now - Duration::minutes(5))
                .await
                .unwrap();
        }

        let db = Database::new(path).unwrap();
        let pending = db.list_pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].participant_id, "anon_first0001");
        assert_eq!(pending[0].request.source, "quiz");
        assert!(pending[0].request.meta.completed);
        assert!(!pending[1].request.meta.consent);

        assert!(db.remove_pending(&first.session_id).await.unwrap());
        assert!(!db.remove_pending(&first.session_id).await.unwrap());
        assert_eq!(db.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn saving_a_session_twice_keeps_one_row() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("outbox.sqlite3")).unwrap();
        let context = SessionContext::new("anon_repeat001", true);

        db.save_pending(&request(&context), Utc::now()).await.unwrap();
        db.save_pending(&request(&context), Utc::now()).await.unwrap();
        assert_eq!(db.pending_count().await.unwrap(), 1);
    }
}
