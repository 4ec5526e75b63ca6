//! Read-side queries over interviews and feedback
//!
//! Every operation is a pure projection over the document store. Absence is
//! reported as `None` or an empty `Vec`; store failures propagate unchanged.

use crate::error::Result;
use crate::storage::{DocumentStore, Query, SortDirection, FEEDBACK, INTERVIEWS};
use crate::types::{Feedback, Interview, InterviewId, UserId};
use std::sync::Arc;
use tracing::debug;

/// Default size of the cross-user interview feed
pub const DEFAULT_FEED_LIMIT: usize = 20;

/// Interview and feedback lookups for an already authenticated caller
#[derive(Clone)]
pub struct InterviewQueries {
    store: Arc<dyn DocumentStore>,
}

impl InterviewQueries {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch one interview by id
    pub async fn get_interview(&self, id: &InterviewId) -> Result<Option<Interview>> {
        debug!("Fetching interview {}", id);
        self.store
            .get(INTERVIEWS, id.as_str())
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// Feedback the user received for an interview
    ///
    /// When duplicates exist, whichever the store returns first wins.
    pub async fn get_feedback(
        &self,
        interview_id: &InterviewId,
        user_id: &UserId,
    ) -> Result<Option<Feedback>> {
        let query = Query::new()
            .where_eq("interviewId", interview_id.as_str())
            .where_eq("userId", user_id.as_str())
            .limit(1);

        self.store
            .query(FEEDBACK, &query)
            .await?
            .into_iter()
            .next()
            .map(|doc| doc.decode())
            .transpose()
    }

    /// Newest finalized interviews taken by anyone except `user_id`
    ///
    /// `limit` defaults to [`DEFAULT_FEED_LIMIT`].
    pub async fn get_other_users_finalized_interviews(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<Interview>> {
        let limit = limit.unwrap_or(DEFAULT_FEED_LIMIT);
        let query = Query::new()
            .where_eq("finalized", true)
            .where_ne("userId", user_id.as_str())
            .order_by("createdAt", SortDirection::Descending)
            .limit(limit);

        let docs = self.store.query(INTERVIEWS, &query).await?;
        debug!("Feed for {} returned {} interviews", user_id, docs.len());
        docs.into_iter().map(|doc| doc.decode()).collect()
    }

    /// Every interview owned by `user_id`, newest first, unbounded
    pub async fn get_user_interviews(&self, user_id: &UserId) -> Result<Vec<Interview>> {
        let query = Query::new()
            .where_eq("userId", user_id.as_str())
            .order_by("createdAt", SortDirection::Descending);

        self.store
            .query(INTERVIEWS, &query)
            .await?
            .into_iter()
            .map(|doc| doc.decode())
            .collect()
    }
}
