// src/aggregate.rs
//
// Leaderboard aggregation: a pure fold over all persisted results, recomputed
// from scratch on every read. Nothing here is stored.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::models::quiz_result::ResultWithUser;

/// One user's derived standing across all of their results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub username: String,
    pub total_quizzes: i64,
    /// Arithmetic mean of the per-result percentages.
    pub average_score: f64,
    pub highest_score: i32,
    /// Distinct subject codes attempted, sorted.
    pub subjects: Vec<String>,
}

struct Accumulator {
    username: String,
    total_quizzes: i64,
    average_score: f64,
    highest_score: i32,
    subjects: BTreeSet<String>,
}

/// Folds every persisted result into one entry per user, in arrival order.
///
/// The mean is updated incrementally (`(avg * (n - 1) + p) / n`), which is
/// equivalent to the plain arithmetic mean and independent of fold order.
/// Users with no results never appear. Entries are sorted by average
/// descending; ties break on quiz count descending, then username ascending.
pub fn build_leaderboard(rows: &[ResultWithUser]) -> Vec<LeaderboardEntry> {
    let mut by_user: HashMap<i64, Accumulator> = HashMap::new();
    let mut first_seen: Vec<i64> = Vec::new();

    for row in rows {
        let acc = by_user.entry(row.user_id).or_insert_with(|| {
            first_seen.push(row.user_id);
            Accumulator {
                username: row.username.clone(),
                total_quizzes: 0,
                average_score: 0.0,
                highest_score: 0,
                subjects: BTreeSet::new(),
            }
        });

        acc.total_quizzes += 1;
        let n = acc.total_quizzes as f64;
        acc.average_score = (acc.average_score * (n - 1.0) + row.percentage as f64) / n;
        acc.highest_score = acc.highest_score.max(row.percentage);
        acc.subjects.insert(row.subject.clone());
    }

    let mut entries: Vec<LeaderboardEntry> = first_seen
        .into_iter()
        .filter_map(|user_id| {
            by_user.remove(&user_id).map(|acc| LeaderboardEntry {
                user_id,
                username: acc.username,
                total_quizzes: acc.total_quizzes,
                average_score: acc.average_score,
                highest_score: acc.highest_score,
                subjects: acc.subjects.into_iter().collect(),
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
            .then(b.total_quizzes.cmp(&a.total_quizzes))
            .then(a.username.cmp(&b.username))
    });

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: i64, username: &str, subject: &str, percentage: i32) -> ResultWithUser {
        ResultWithUser {
            user_id,
            username: username.to_string(),
            subject: subject.to_string(),
            difficulty: "easy".to_string(),
            score: percentage / 10,
            total_questions: 10,
            percentage,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn average_is_independent_of_fold_order() {
        let percentages = [80, 100, 60];
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        for order in orders {
            let rows: Vec<ResultWithUser> = order
                .iter()
                .map(|&i| row(1, "alice", "VU23213", percentages[i]))
                .collect();
            let entries = build_leaderboard(&rows);
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].average_score, 80.0);
        }
    }

    #[test]
    fn incremental_mean_matches_plain_mean() {
        let percentages = [0, 33, 50, 67, 70, 100, 90, 10];
        let rows: Vec<ResultWithUser> = percentages
            .iter()
            .map(|&p| row(1, "alice", "VU23215", p))
            .collect();

        let plain = percentages.iter().sum::<i32>() as f64 / percentages.len() as f64;
        let entries = build_leaderboard(&rows);
        assert!((entries[0].average_score - plain).abs() < 1e-9);
        assert_eq!(entries[0].total_quizzes, percentages.len() as i64);
    }

    #[test]
    fn higher_average_ranks_strictly_above() {
        let rows = vec![
            row(1, "alice", "VU23213", 75),
            row(2, "bob", "VU23213", 90),
        ];
        let entries = build_leaderboard(&rows);
        assert_eq!(entries[0].username, "bob");
        assert_eq!(entries[0].average_score, 90.0);
        assert_eq!(entries[1].username, "alice");
    }

    #[test]
    fn ties_break_on_quiz_count_then_username() {
        let rows = vec![
            // carol: one quiz at 80
            row(3, "carol", "VU23213", 80),
            // bob: two quizzes averaging 80
            row(2, "bob", "VU23213", 70),
            row(2, "bob", "VU23215", 90),
            // alice: one quiz at 80, ties carol on count as well
            row(1, "alice", "VU23217", 80),
        ];
        let entries = build_leaderboard(&rows);
        assert_eq!(entries[0].username, "bob");
        assert_eq!(entries[1].username, "alice");
        assert_eq!(entries[2].username, "carol");
    }

    #[test]
    fn highest_score_and_subjects_accumulate() {
        let rows = vec![
            row(1, "alice", "VU23215", 40),
            row(1, "alice", "VU23213", 95),
            row(1, "alice", "VU23213", 60),
        ];
        let entries = build_leaderboard(&rows);
        assert_eq!(entries[0].highest_score, 95);
        assert_eq!(entries[0].subjects, vec!["VU23213", "VU23215"]);
        assert_eq!(entries[0].total_quizzes, 3);
    }

    #[test]
    fn no_rows_means_no_entries() {
        assert!(build_leaderboard(&[]).is_empty());
    }
}
