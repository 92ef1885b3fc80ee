mod config;
mod fraction;
mod majority;
mod median;
mod schulze;
mod session;

pub mod builder;
pub mod manual;

pub use num_bigint::BigInt;

pub use crate::config::*;
pub use crate::fraction::Fraction;
pub use crate::majority::{
    majority_threshold, passes, Majority, SIMPLE_MAJORITY, TWO_THIRDS_MAJORITY,
};
pub use crate::median::{tabulate_median, MedianTally, WeightedValue};
pub use crate::schulze::{
    pairwise_preferences, rank_options, strongest_paths, tabulate_schulze, SchulzeTally,
    WeightedRanking,
};
pub use crate::session::{
    merge_tallies, tabulate_session, Ballots, GroupResult, Session, SessionResult, Voting,
    VotingGroup, VotingOutcome, VotingResult,
};
