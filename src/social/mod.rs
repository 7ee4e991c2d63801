//! Social fitness domain: posts, rankings, friendships, and challenges.

pub mod challenges;
pub mod types;

pub use challenges::{challenge_standings, challenge_winner, Standing};
pub use types::{
    Challenge, ChallengeStatus, Comment, Intensity, LeagueTier, Post, RankedUser, UserRef,
};
