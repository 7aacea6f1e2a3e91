use std::collections::BTreeMap;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::*;

/// Record store shared by every request handler.
///
/// Each operation is a single step under the store's lock, so callers never
/// observe a half-written record.
pub trait Storage: Send + Sync {
    /// Random id fixed for the lifetime of the store.
    fn instance_id(&self) -> Uuid;

    fn get_user(&self, id: UserId) -> Option<User>;
    fn get_user_by_username(&self, username: &str) -> Option<User>;

    /// Inserts without checking the username. Use `create_user_if_absent`
    /// when the username must stay unique.
    fn create_user(&self, user: NewUser) -> User;

    /// Returns `None` when the username is taken.
    fn create_user_if_absent(&self, user: NewUser) -> Option<User>;

    fn get_tasks(&self) -> Vec<Task>;
    fn create_task(&self, task: NewTask) -> Task;

    /// All submissions in creation order, or only those of `user_id`.
    fn get_submissions(&self, user_id: Option<UserId>) -> Vec<Submission>;
    fn create_submission(&self, submission: NewSubmission) -> Submission;
}

struct NextIds {
    users: i32,
    tasks: i32,
    submissions: i32,
}

impl Default for NextIds {
    fn default() -> Self {
        Self {
            users: 1,
            tasks: 1,
            submissions: 1,
        }
    }
}

fn take(counter: &mut i32) -> i32 {
    let id = *counter;
    *counter += 1;
    id
}

// Ids only grow, so key order is insertion order.
#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    tasks: BTreeMap<TaskId, Task>,
    submissions: BTreeMap<SubmissionId, Submission>,
    next: NextIds,
}

impl Tables {
    fn find_user(&self, username: &str) -> Option<&User> {
        self.users.values().find(|user| user.username == username)
    }

    fn insert_user(&mut self, user: NewUser) -> User {
        let id = take(&mut self.next.users);
        let user = User {
            id,
            username: user.username,
            password: user.password,
            salt: user.salt,
        };
        self.users.insert(id, user.clone());
        user
    }
}

pub struct MemStorage {
    instance: Uuid,
    tables: RwLock<Tables>,
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            instance: Uuid::new_v4(),
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Store seeded with the two warm-up tasks every contest starts with.
    pub fn with_sample_tasks() -> Self {
        let storage = Self::new();
        for task in sample_tasks() {
            storage.create_task(task);
        }
        storage
    }
}

pub fn sample_tasks() -> Vec<NewTask> {
    vec![
        NewTask {
            title: "Array sorting".to_owned(),
            description: "Implement an algorithm that sorts an array.".to_owned(),
            points: 100,
        },
        NewTask {
            title: "Substring search".to_owned(),
            description: "Write a function that finds a substring in a string.".to_owned(),
            points: 150,
        },
    ]
}

impl Storage for MemStorage {
    fn instance_id(&self) -> Uuid {
        self.instance
    }

    fn get_user(&self, id: UserId) -> Option<User> {
        self.tables.read().users.get(&id).cloned()
    }

    fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.tables.read().find_user(username).cloned()
    }

    fn create_user(&self, user: NewUser) -> User {
        self.tables.write().insert_user(user)
    }

    fn create_user_if_absent(&self, user: NewUser) -> Option<User> {
        let mut tables = self.tables.write();
        if tables.find_user(&user.username).is_some() {
            return None;
        }
        Some(tables.insert_user(user))
    }

    fn get_tasks(&self) -> Vec<Task> {
        self.tables.read().tasks.values().cloned().collect()
    }

    fn create_task(&self, task: NewTask) -> Task {
        let mut tables = self.tables.write();
        let id = take(&mut tables.next.tasks);
        let task = Task {
            id,
            title: task.title,
            description: task.description,
            points: task.points,
        };
        tables.tasks.insert(id, task.clone());
        task
    }

    fn get_submissions(&self, user_id: Option<UserId>) -> Vec<Submission> {
        let tables = self.tables.read();
        let all = tables.submissions.values();
        match user_id {
            Some(user_id) => all.filter(|sub| sub.user_id == user_id).cloned().collect(),
            None => all.cloned().collect(),
        }
    }

    fn create_submission(&self, submission: NewSubmission) -> Submission {
        let mut tables = self.tables.write();
        let id = take(&mut tables.next.submissions);
        let submission = submission.with_id(id);
        tables.submissions.insert(id, submission.clone());
        submission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_owned(),
            password: "digest".to_owned(),
            salt: "salt".to_owned(),
        }
    }

    fn new_submission(user_id: UserId, task_id: TaskId) -> NewSubmission {
        NewSubmission {
            user_id,
            task_id,
            code: format!("// user {user_id} task {task_id}"),
            status: SubmissionStatus::Accepted,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn empty_store_has_no_users() {
        let storage = MemStorage::new();
        assert!(storage.get_user_by_username("").is_none());
        assert!(storage.get_user_by_username("alice").is_none());
        assert!(storage.get_user(1).is_none());
    }

    #[test]
    fn default_store_starts_without_tasks() {
        let storage = MemStorage::default();
        assert!(storage.get_tasks().is_empty());
        assert!(storage.get_submissions(None).is_empty());
        assert_eq!(storage.create_task(sample_tasks().remove(0)).id, 1);
    }

    #[test]
    fn user_ids_start_at_one_and_increase() {
        let storage = MemStorage::new();
        let ids: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| storage.create_user(new_user(name)).id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let bob = storage.get_user_by_username("b").unwrap();
        assert_eq!(bob.id, 2);
        assert_eq!(storage.get_user(3).unwrap().username, "c");
    }

    #[test]
    fn create_user_does_not_check_uniqueness() {
        let storage = MemStorage::new();
        let first = storage.create_user(new_user("dup"));
        let second = storage.create_user(new_user("dup"));
        assert_ne!(first.id, second.id);
        // Lookup returns the earliest match.
        assert_eq!(storage.get_user_by_username("dup").unwrap().id, first.id);
    }

    #[test]
    fn create_user_if_absent_rejects_taken_name() {
        let storage = MemStorage::new();
        assert!(storage.create_user_if_absent(new_user("alice")).is_some());
        assert!(storage.create_user_if_absent(new_user("alice")).is_none());
        assert_eq!(storage.create_user_if_absent(new_user("bob")).unwrap().id, 2);
    }

    #[test]
    fn concurrent_registration_creates_one_user() {
        let storage = Arc::new(MemStorage::new());
        let created = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let storage = Arc::clone(&storage);
                    scope.spawn(move || storage.create_user_if_absent(new_user("racer")))
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().unwrap())
                .count()
        });
        assert_eq!(created, 1);
        assert_eq!(storage.get_user(2), None);
    }

    #[test]
    fn sample_tasks_keep_insertion_order() {
        let storage = MemStorage::with_sample_tasks();
        let tasks = storage.get_tasks();
        assert_eq!(tasks.len(), 2);
        assert_eq!((tasks[0].id, tasks[0].points), (1, 100));
        assert_eq!((tasks[1].id, tasks[1].points), (2, 150));
    }

    #[test]
    fn submissions_come_back_in_creation_order() {
        let storage = MemStorage::new();
        let plan = [(1, 1), (2, 1), (1, 2), (3, 2), (1, 1)];
        let created: Vec<_> = plan
            .iter()
            .map(|&(user, task)| storage.create_submission(new_submission(user, task)))
            .collect();

        assert_eq!(storage.get_submissions(None), created);

        let ids: Vec<_> = created.iter().map(|sub| sub.id).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

        let mine = storage.get_submissions(Some(1));
        let expected: Vec<_> = created.iter().filter(|sub| sub.user_id == 1).cloned().collect();
        assert_eq!(mine, expected);
        assert_eq!(mine.len(), 3);
        assert!(storage.get_submissions(Some(42)).is_empty());
    }

    #[test]
    fn counters_are_independent_per_entity() {
        let storage = MemStorage::with_sample_tasks();
        let user = storage.create_user(new_user("alice"));
        let submission = storage.create_submission(new_submission(user.id, 2));
        assert_eq!(user.id, 1);
        assert_eq!(submission.id, 1);
        assert_eq!(storage.create_task(sample_tasks().remove(0)).id, 3);
    }
}
