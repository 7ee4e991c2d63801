//! Challenge leaderboard derivation.
//!
//! Scores are recomputed from the post set on every read; nothing here is
//! persisted.

use chrono::{DateTime, Timelike, Utc};

use super::types::{end_of_day, Challenge, ChallengeStatus, Post, UserRef};

/// One row of a challenge leaderboard.
#[derive(Debug, Clone)]
pub struct Standing {
    pub user: UserRef,
    /// Number of workouts logged inside the challenge window.
    pub score: u32,
}

/// Effective end of the challenge window. A stored end timestamp at exactly
/// midnight means "the whole last day", so it is pushed to 23:59:59.999.
pub fn effective_end(ends_at: DateTime<Utc>) -> DateTime<Utc> {
    let t = ends_at.time();
    if t.hour() == 0 && t.minute() == 0 {
        end_of_day(ends_at)
    } else {
        ends_at
    }
}

/// Score every participant by counting their posts inside the challenge
/// window, sorted descending. Ties keep participant order.
pub fn challenge_standings(challenge: &Challenge, posts: &[Post]) -> Vec<Standing> {
    let start = challenge.starts_at;
    let end = effective_end(challenge.ends_at);

    let qualifying: Vec<&Post> = posts
        .iter()
        .filter(|p| match p.created_at {
            Some(ts) => ts >= start && ts <= end,
            None => false,
        })
        .collect();

    let mut standings: Vec<Standing> = challenge
        .participants
        .iter()
        .map(|participant| Standing {
            user: participant.clone(),
            score: qualifying
                .iter()
                .filter(|p| p.author.id == participant.id)
                .count() as u32,
        })
        .collect();

    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
}

/// Winner of a concluded challenge: the top standing, or `None` while the
/// challenge is still upcoming or active, or when nobody participated.
pub fn challenge_winner(
    challenge: &Challenge,
    posts: &[Post],
    now: DateTime<Utc>,
) -> Option<Standing> {
    if challenge.status(now) != ChallengeStatus::Completed {
        return None;
    }
    challenge_standings(challenge, posts).into_iter().next()
}
