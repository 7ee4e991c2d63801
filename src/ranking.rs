//! Ranking computation.
//!
//! The ranking board is not a stored query result: points, level, and tier
//! are recomputed client-side from workout counts, then sorted and ranked.

use crate::social::types::{LeagueTier, RankedUser};

/// Experience points awarded per logged workout.
pub const XP_PER_WORKOUT: u32 = 50;
/// Points per level step.
pub const POINTS_PER_LEVEL: u32 = 500;

/// Points are a fixed function of workout count.
pub fn points_for_workouts(workout_count: u32) -> u32 {
    workout_count * XP_PER_WORKOUT
}

/// Level derived from accumulated points.
pub fn level_for_points(points: u32) -> u32 {
    points / POINTS_PER_LEVEL + 1
}

/// Sort by points descending and assign 1-based ranks. The sort is stable,
/// so ties keep their input order.
pub fn assign_ranks(mut users: Vec<RankedUser>) -> Vec<RankedUser> {
    users.sort_by(|a, b| b.points.cmp(&a.points));
    for (index, user) in users.iter_mut().enumerate() {
        user.rank = index as u32 + 1;
    }
    users
}

/// Re-rank the subset of users in one league tier. Rank is always relative
/// to the displayed scope, not global.
pub fn tier_ranking(users: &[RankedUser], tier: LeagueTier) -> Vec<RankedUser> {
    let filtered: Vec<RankedUser> = users
        .iter()
        .filter(|u| u.tier == tier)
        .cloned()
        .collect();
    assign_ranks(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user_with_points(name: &str, points: u32, tier: LeagueTier) -> RankedUser {
        RankedUser {
            id: Uuid::new_v4(),
            name: name.to_string(),
            avatar_url: None,
            points,
            rank: 0,
            level: level_for_points(points),
            tier,
            workout_count: points / XP_PER_WORKOUT,
            photo_count: 0,
            is_current_user: false,
            current_weight_kg: 0.0,
            initial_weight_kg: 0.0,
            height_cm: 0.0,
        }
    }

    #[test]
    fn points_and_level_math() {
        assert_eq!(points_for_workouts(0), 0);
        assert_eq!(points_for_workouts(9), 450);
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(499), 1);
        assert_eq!(level_for_points(500), 2);
        assert_eq!(level_for_points(2150), 5);
    }

    #[test]
    fn ranks_follow_descending_points() {
        let users = vec![
            user_with_points("c", 1620, LeagueTier::Intermediate),
            user_with_points("a", 2150, LeagueTier::Advanced),
            user_with_points("d", 1450, LeagueTier::Beginner),
            user_with_points("b", 1840, LeagueTier::Intermediate),
        ];

        let ranked = assign_ranks(users);
        let points: Vec<u32> = ranked.iter().map(|u| u.points).collect();
        let ranks: Vec<u32> = ranked.iter().map(|u| u.rank).collect();
        assert_eq!(points, [2150, 1840, 1620, 1450]);
        assert_eq!(ranks, [1, 2, 3, 4]);
    }

    #[test]
    fn ties_keep_input_order() {
        let first = user_with_points("first", 1000, LeagueTier::Beginner);
        let second = user_with_points("second", 1000, LeagueTier::Beginner);
        let first_id = first.id;

        let ranked = assign_ranks(vec![first, second]);
        assert_eq!(ranked[0].id, first_id);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn tier_ranking_is_scoped() {
        let users = assign_ranks(vec![
            user_with_points("a", 2150, LeagueTier::Advanced),
            user_with_points("b", 1840, LeagueTier::Intermediate),
            user_with_points("c", 1620, LeagueTier::Intermediate),
        ]);

        let intermediate = tier_ranking(&users, LeagueTier::Intermediate);
        assert_eq!(intermediate.len(), 2);
        // Global rank 2 becomes rank 1 inside the tier.
        assert_eq!(intermediate[0].points, 1840);
        assert_eq!(intermediate[0].rank, 1);
        assert_eq!(intermediate[1].rank, 2);
    }
}
