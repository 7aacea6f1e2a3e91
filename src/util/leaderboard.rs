use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{Submission, SubmissionStatus, Task, TaskId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    #[serde(rename = "username")]
    pub display_name: String,
    pub total_points: i64,
    #[serde(rename = "submissions")]
    pub submission_count: usize,
}

pub fn placeholder_name(user_id: UserId) -> String {
    format!("Participant {user_id}")
}

/// Ranks every user that has at least one submission for a known task.
///
/// Display names are placeholders derived from the user id; use
/// [`rank_with_names`] to show real usernames.
pub fn rank(submissions: &[Submission], tasks: &[Task]) -> Vec<LeaderboardEntry> {
    rank_with_names(submissions, tasks, |_| None)
}

/// Like [`rank`], but asks `resolve` for each user's display name and falls
/// back to the placeholder when it returns `None`.
///
/// Sorted by total points, highest first; equal totals by ascending user id.
pub fn rank_with_names<F>(
    submissions: &[Submission],
    tasks: &[Task],
    resolve: F,
) -> Vec<LeaderboardEntry>
where
    F: Fn(UserId) -> Option<String>,
{
    let points: HashMap<TaskId, i32> = tasks.iter().map(|task| (task.id, task.points)).collect();

    let mut stats: BTreeMap<UserId, LeaderboardEntry> = BTreeMap::new();
    for submission in submissions {
        // Submissions for vanished tasks are ignored.
        let Some(&task_points) = points.get(&submission.task_id) else {
            continue;
        };

        let entry = stats
            .entry(submission.user_id)
            .or_insert_with(|| LeaderboardEntry {
                user_id: submission.user_id,
                display_name: resolve(submission.user_id)
                    .unwrap_or_else(|| placeholder_name(submission.user_id)),
                total_points: 0,
                submission_count: 0,
            });

        if submission.status == SubmissionStatus::Accepted {
            entry.total_points += i64::from(task_points);
        }
        entry.submission_count += 1;
    }

    // Stable sort over id-ordered entries keeps ties by ascending user id.
    let mut board: Vec<_> = stats.into_values().collect();
    board.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    board
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: TaskId, points: i32) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: String::new(),
            points,
        }
    }

    fn sub(id: i32, user_id: UserId, task_id: TaskId, status: SubmissionStatus) -> Submission {
        Submission {
            id,
            user_id,
            task_id,
            code: String::new(),
            status,
            submitted_at: Utc::now(),
        }
    }

    use SubmissionStatus::{Accepted, Rejected};

    #[test]
    fn accepted_points_are_summed_and_all_submissions_counted() {
        let tasks = vec![task(1, 100), task(2, 150)];
        let submissions = vec![
            sub(1, 2, 1, Rejected),
            sub(2, 1, 1, Accepted),
            sub(3, 1, 2, Accepted),
        ];

        let board = rank(&submissions, &tasks);
        assert_eq!(
            board,
            vec![
                LeaderboardEntry {
                    user_id: 1,
                    display_name: "Participant 1".to_owned(),
                    total_points: 250,
                    submission_count: 2,
                },
                LeaderboardEntry {
                    user_id: 2,
                    display_name: "Participant 2".to_owned(),
                    total_points: 0,
                    submission_count: 1,
                },
            ]
        );
    }

    #[test]
    fn missing_task_is_skipped() {
        let tasks = vec![task(1, 100)];
        let submissions = vec![sub(1, 1, 99, Accepted), sub(2, 1, 1, Accepted)];

        let board = rank(&submissions, &tasks);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].total_points, 100);
        assert_eq!(board[0].submission_count, 1);

        // A user whose only submission hits a missing task is not listed.
        assert!(rank(&[sub(1, 5, 99, Accepted)], &tasks).is_empty());
    }

    #[test]
    fn ties_are_ordered_by_user_id() {
        let tasks = vec![task(1, 100)];
        let submissions = vec![
            sub(1, 9, 1, Accepted),
            sub(2, 4, 1, Accepted),
            sub(3, 7, 1, Rejected),
            sub(4, 2, 1, Rejected),
        ];

        let order: Vec<_> = rank(&submissions, &tasks)
            .into_iter()
            .map(|entry| entry.user_id)
            .collect();
        assert_eq!(order, vec![4, 9, 2, 7]);
    }

    #[test]
    fn repeated_accepts_each_score() {
        let tasks = vec![task(1, 100)];
        let submissions = vec![sub(1, 1, 1, Accepted), sub(2, 1, 1, Accepted)];
        assert_eq!(rank(&submissions, &tasks)[0].total_points, 200);
    }

    #[test]
    fn resolver_supplies_names_with_placeholder_fallback() {
        let tasks = vec![task(1, 100)];
        let submissions = vec![sub(1, 1, 1, Accepted), sub(2, 2, 1, Accepted)];

        let board = rank_with_names(&submissions, &tasks, |id| {
            (id == 1).then(|| "alice".to_owned())
        });
        assert_eq!(board[0].display_name, "alice");
        assert_eq!(board[1].display_name, "Participant 2");
    }

    #[test]
    fn empty_inputs_give_empty_board() {
        assert!(rank(&[], &[]).is_empty());
        assert!(rank(&[], &[task(1, 100)]).is_empty());
    }

    #[test]
    fn entry_serializes_with_wire_names() {
        let entry = LeaderboardEntry {
            user_id: 3,
            display_name: "carol".to_owned(),
            total_points: 150,
            submission_count: 4,
        };
        assert_eq!(
            serde_json::to_value(entry).unwrap(),
            serde_json::json!({
                "userId": 3,
                "username": "carol",
                "totalPoints": 150,
                "submissions": 4,
            })
        );
    }
}
