use log::{debug, info, warn};
use snafu::OptionExt;

use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::majority::{majority_threshold, passes};

/// A vote in the tally of a median voting, with the weight of its voter.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WeightedValue {
    pub voter: VoterId,
    pub value: u64,
    pub weight: u64,
    /// True if the voter did not vote and is counted as voting for 0.
    pub synthesized: bool,
}

/// The tabulated votes of a median voting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MedianTally {
    pub voting: VotingId,
    /// The requested value of the voting.
    pub ceiling: u64,
    /// The counted votes, sorted by decreasing value.
    pub votes: Vec<WeightedValue>,
    pub weight_sum: u64,
    pub majority_threshold: u64,
}

impl MedianTally {
    /// The weight of all the votes for the given value or more.
    pub fn weight_at_or_above(&self, value: u64) -> u64 {
        self.votes
            .iter()
            .take_while(|v| v.value >= value)
            .fold(0u64, |acc, v| acc.saturating_add(v.weight))
    }

    /// True if enough weight voted for the given value or more.
    pub fn accepts(&self, value: u64) -> bool {
        passes(self.weight_at_or_above(value), self.majority_threshold)
    }

    /// The highest value that gathers a majority, if any.
    ///
    /// Walking down from the highest vote, this is the first value at which the
    /// accumulated weight exceeds the majority threshold.
    pub fn median(&self) -> Option<u64> {
        let mut acc: u64 = 0;
        for v in self.votes.iter() {
            acc = acc.saturating_add(v.weight);
            if passes(acc, self.majority_threshold) {
                return Some(v.value);
            }
        }
        None
    }
}

/// Tabulates the votes of a median voting.
///
/// Arguments:
/// * `voting` the voting
/// * `voters` the voter roster of the revision the voting belongs to
/// * `votes` the votes cast for this voting
///
/// Invalid votes are not counted and reported in the returned warnings.
pub fn tabulate_median(
    voting: &MedianVoting,
    voters: &[Voter],
    votes: &[MedianVote],
) -> Result<(MedianTally, Vec<TabulationWarning>), TabulationError> {
    info!(
        "tabulate_median: voting {} ({:?}): processing {} votes, {} voters, value: {}, majority: {}",
        voting.id,
        voting.name,
        votes.len(),
        voters.len(),
        voting.value,
        voting.majority.description()
    );
    let roster: HashMap<VoterId, &Voter> = voters.iter().map(|v| (v.id, v)).collect();

    let mut warnings: Vec<TabulationWarning> = Vec::new();
    let mut counted: HashSet<VoterId> = HashSet::new();
    let mut tally: Vec<WeightedValue> = Vec::new();

    for vote in votes.iter() {
        let voter = match roster.get(&vote.voter) {
            Some(v) => v,
            None => {
                warn!(
                    "tabulate_median: voting {}: voter {} is not in the roster",
                    voting.id, vote.voter
                );
                warnings.push(TabulationWarning::UnknownVoter {
                    voting: voting.id,
                    voter: vote.voter,
                });
                continue;
            }
        };
        if vote.value > voting.value {
            warn!(
                "tabulate_median: voting {}: voter {} voted {}, more than {}",
                voting.id, vote.voter, vote.value, voting.value
            );
            warnings.push(TabulationWarning::ValueExceedsCeiling {
                voting: voting.id,
                voter: vote.voter,
                value: vote.value,
                ceiling: voting.value,
            });
            continue;
        }
        if !counted.insert(vote.voter) {
            warn!(
                "tabulate_median: voting {}: voter {} voted more than once",
                voting.id, vote.voter
            );
            warnings.push(TabulationWarning::DuplicateVote {
                voting: voting.id,
                voter: vote.voter,
            });
            continue;
        }
        tally.push(WeightedValue {
            voter: vote.voter,
            value: vote.value,
            weight: voter.weight,
            synthesized: false,
        });
    }

    // The voters that did not cast a valid vote are counted as voting for 0.
    if voting.count_all_voters {
        for voter in voters.iter() {
            if counted.insert(voter.id) {
                tally.push(WeightedValue {
                    voter: voter.id,
                    value: 0,
                    weight: voter.weight,
                    synthesized: true,
                });
            }
        }
    }

    // Stable: votes with the same value keep their order.
    tally.sort_by(|a, b| b.value.cmp(&a.value));

    let weight_sum: u64 = tally
        .iter()
        .try_fold(0u64, |acc, v| acc.checked_add(v.weight))
        .context(WeightOverflowSnafu { voting: voting.id })?;
    let threshold = majority_threshold(&voting.majority, weight_sum)?;
    debug!(
        "tabulate_median: voting {}: tally: {:?} weight_sum: {} threshold: {}",
        voting.id, tally, weight_sum, threshold
    );

    let res = MedianTally {
        voting: voting.id,
        ceiling: voting.value,
        votes: tally,
        weight_sum,
        majority_threshold: threshold,
    };
    info!(
        "tabulate_median: voting {}: weight_sum: {} threshold: {} median: {:?}",
        voting.id,
        weight_sum,
        threshold,
        res.median()
    );
    Ok((res, warnings))
}
