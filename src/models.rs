use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i32;
pub type TaskId = i32;
pub type SubmissionId = i32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    // Hex encoded salted digest, see `cipher_util::gen_salted_password`.
    pub password: String,
    pub salt: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub salt: String,
}

/// What a client is allowed to see about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub points: i32,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub points: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub user_id: UserId,
    pub task_id: TaskId,
    pub code: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: UserId,
    pub task_id: TaskId,
    pub code: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
}

impl NewSubmission {
    pub fn with_id(self, id: SubmissionId) -> Submission {
        Submission {
            id,
            user_id: self.user_id,
            task_id: self.task_id,
            code: self.code,
            status: self.status,
            submitted_at: self.submitted_at,
        }
    }
}
