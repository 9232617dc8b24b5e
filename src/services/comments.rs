use chrono::Utc;
use uuid::Uuid;

use crate::error::{ColabError, ColabResult};
use crate::models::Comment;

/// Line comments of one document, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CommentThread {
    document_id: String,
    comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            comments: Vec::new(),
        }
    }

    /// Line numbers are not checked against the content; comments may point at stale lines.
    pub fn add(&mut self, line: u32, text: &str, user_id: &str, username: &str) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            document_id: self.document_id.clone(),
            line,
            text: text.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            timestamp: Utc::now(),
            resolved: false,
        };
        self.comments.push(comment.clone());
        comment
    }

    /// Idempotent: resolving an already resolved comment succeeds.
    pub fn resolve(&mut self, comment_id: &str) -> ColabResult<()> {
        match self.comments.iter_mut().find(|c| c.id == comment_id) {
            Some(comment) => {
                comment.resolved = true;
                Ok(())
            }
            None => Err(ColabError::NotFound(format!("Comment '{}'", comment_id))),
        }
    }

    pub fn list(&self) -> &[Comment] {
        &self.comments
    }
}
