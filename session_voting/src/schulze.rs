//! Schulze method over weighted rankings.
//!
//! Matrices are indexed by the position of the options in the voting:
//! `d[i][j]` is the weight of the voters preferring option `i` over option `j`,
//! `p[i][j]` is the strength of the strongest path from `i` to `j`.

use log::{debug, info, warn};
use snafu::OptionExt;

use std::cmp::{max, min};
use std::collections::{HashMap, HashSet};

use crate::config::*;
use crate::majority::{majority_threshold, passes};

/// A complete, validated ranking of the options of a voting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct WeightedRanking {
    /// The sorting position of each option, in the order of the voting.
    pub positions: Vec<i64>,
    pub weight: u64,
}

/// The tabulated votes of a Schulze voting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeTally {
    pub voting: VotingId,
    /// The options in the order of the voting.
    pub options: Vec<OptionId>,
    /// Pairwise preferences.
    pub d: Vec<Vec<u64>>,
    /// Strongest paths.
    pub p: Vec<Vec<u64>>,
    /// The options from best to worst. Options in the same tier are tied.
    pub ranking: Vec<Vec<OptionId>>,
    pub weight_sum: u64,
    pub majority_threshold: u64,
}

impl SchulzeTally {
    pub fn index_of(&self, option: OptionId) -> Option<usize> {
        self.options.iter().position(|o| *o == option)
    }

    /// The options that are not beaten by any other option.
    pub fn winners(&self) -> Vec<OptionId> {
        self.ranking.first().cloned().unwrap_or_default()
    }

    /// For each option, the weight of the voters that ranked it strictly above the last option.
    ///
    /// The last option of a voting is the "No" option. The entry for the last option itself is 0.
    pub fn votes_before_last(&self) -> Vec<u64> {
        self.d
            .iter()
            .map(|row| row.last().cloned().unwrap_or(0))
            .collect()
    }

    /// Same as [SchulzeTally::votes_before_last], as a percentage of the weight sum.
    pub fn percent_before_last(&self) -> Vec<f64> {
        self.votes_before_last()
            .iter()
            .map(|w| {
                if self.weight_sum > 0 {
                    (*w as f64 / self.weight_sum as f64) * 100.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// The options that a majority of the weight ranked above the last option.
    pub fn options_passing(&self) -> Vec<OptionId> {
        let last = self.options.len().saturating_sub(1);
        self.votes_before_last()
            .iter()
            .enumerate()
            .filter(|(idx, w)| *idx != last && passes(**w, self.majority_threshold))
            .map(|(idx, _)| self.options[idx])
            .collect()
    }
}

/// Computes the pairwise preferences of the rankings.
///
/// Rankings that do not give a position to each of the `num_options` options are skipped.
/// The counts saturate at `u64::MAX`.
pub fn pairwise_preferences(rankings: &[WeightedRanking], num_options: usize) -> Vec<Vec<u64>> {
    let mut d = vec![vec![0u64; num_options]; num_options];
    for r in rankings.iter() {
        if r.positions.len() != num_options {
            warn!(
                "pairwise_preferences: skipping ranking with {} positions instead of {}",
                r.positions.len(),
                num_options
            );
            continue;
        }
        for i in 0..num_options {
            for j in 0..num_options {
                if r.positions[i] < r.positions[j] {
                    d[i][j] = d[i][j].saturating_add(r.weight);
                }
            }
        }
    }
    d
}

/// Computes the strongest paths from the pairwise preferences.
///
/// Only the winning side of each pair starts with a path. Paths are then widened
/// through each intermediate option in turn.
pub fn strongest_paths(d: &[Vec<u64>]) -> Vec<Vec<u64>> {
    let n = d.len();
    let mut p = vec![vec![0u64; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j && d[i][j] > d[j][i] {
                p[i][j] = d[i][j];
            }
        }
    }
    // For a fixed k, p[i][k] and p[k][j] are not modified by the inner loops,
    // so the update can be done in place.
    for k in 0..n {
        for i in 0..n {
            if i == k {
                continue;
            }
            for j in 0..n {
                if j == i || j == k {
                    continue;
                }
                p[i][j] = max(p[i][j], min(p[i][k], p[k][j]));
            }
        }
    }
    p
}

/// Groups the options into tiers, best first.
///
/// `i` is ranked above `j` iff `p[i][j] > p[j][i]`. Each tier contains the remaining
/// options that no remaining option beats.
pub fn rank_options(p: &[Vec<u64>]) -> Vec<Vec<usize>> {
    let mut remaining: Vec<usize> = (0..p.len()).collect();
    let mut tiers: Vec<Vec<usize>> = Vec::new();
    while !remaining.is_empty() {
        let mut tier: Vec<usize> = remaining
            .iter()
            .cloned()
            .filter(|&i| !remaining.iter().any(|&j| p[j][i] > p[i][j]))
            .collect();
        if tier.is_empty() {
            // Not reachable with strongest paths, the relation has no cycle.
            warn!("rank_options: cycle in the beat relation: {:?}", p);
            tier = remaining.clone();
        }
        remaining.retain(|i| !tier.contains(i));
        tiers.push(tier);
    }
    tiers
}

/// Checks the ballots and returns the rankings to count, along with the voters they belong to.
fn check_ballots(
    voting: &SchulzeVoting,
    roster: &HashMap<VoterId, &Voter>,
    votes: &[SchulzeVote],
) -> (Vec<(VoterId, WeightedRanking)>, Vec<TabulationWarning>) {
    // Group the entries by voter, in order of appearance.
    let mut by_voter: Vec<(VoterId, Vec<&SchulzeVote>)> = Vec::new();
    let mut voter_idx: HashMap<VoterId, usize> = HashMap::new();
    for v in votes.iter() {
        let idx = *voter_idx.entry(v.voter).or_insert_with(|| {
            by_voter.push((v.voter, Vec::new()));
            by_voter.len() - 1
        });
        by_voter[idx].1.push(v);
    }

    let mut warnings: Vec<TabulationWarning> = Vec::new();
    let mut rankings: Vec<(VoterId, WeightedRanking)> = Vec::new();
    for (voter_id, entries) in by_voter.iter() {
        let voter = match roster.get(voter_id) {
            Some(v) => v,
            None => {
                warn!(
                    "check_ballots: voting {}: voter {} is not in the roster",
                    voting.id, voter_id
                );
                warnings.push(TabulationWarning::UnknownVoter {
                    voting: voting.id,
                    voter: *voter_id,
                });
                continue;
            }
        };
        if entries.len() != voting.options.len() {
            warn!(
                "check_ballots: voting {}: voter {} ranked {} options instead of {}",
                voting.id,
                voter_id,
                entries.len(),
                voting.options.len()
            );
            warnings.push(TabulationWarning::InvalidRankingLength {
                voting: voting.id,
                voter: *voter_id,
                expected: voting.options.len(),
                got: entries.len(),
            });
            continue;
        }
        let mut valid = true;
        for (position, (entry, option)) in entries.iter().zip(voting.options.iter()).enumerate() {
            if entry.option != option.id {
                warn!(
                    "check_ballots: voting {}: voter {} ranked option {} instead of {}",
                    voting.id, voter_id, entry.option, option.id
                );
                warnings.push(TabulationWarning::UnexpectedOption {
                    voting: voting.id,
                    voter: *voter_id,
                    position,
                    expected: option.id,
                    got: entry.option,
                });
                valid = false;
            }
        }
        if valid {
            rankings.push((
                *voter_id,
                WeightedRanking {
                    positions: entries.iter().map(|e| e.sorting_position).collect(),
                    weight: voter.weight,
                },
            ));
        }
    }
    (rankings, warnings)
}

/// Tabulates the votes of a Schulze voting.
///
/// Arguments:
/// * `voting` the voting, with at least 2 options
/// * `voters` the voter roster of the revision the voting belongs to
/// * `votes` the ranking entries cast for this voting. The entries of a voter must
///   follow the order of the options of the voting.
///
/// Malformed ballots are not counted and reported in the returned warnings.
pub fn tabulate_schulze(
    voting: &SchulzeVoting,
    voters: &[Voter],
    votes: &[SchulzeVote],
) -> Result<(SchulzeTally, Vec<TabulationWarning>), TabulationError> {
    voting.check_options()?;
    info!(
        "tabulate_schulze: voting {} ({:?}): processing {} ranking entries, {} voters, {} options, majority: {}",
        voting.id,
        voting.name,
        votes.len(),
        voters.len(),
        voting.options.len(),
        voting.majority.description()
    );
    let roster: HashMap<VoterId, &Voter> = voters.iter().map(|v| (v.id, v)).collect();
    let n = voting.options.len();

    let (mut rankings, warnings) = check_ballots(voting, &roster, votes);
    debug!(
        "tabulate_schulze: voting {}: {} valid ballots",
        voting.id,
        rankings.len()
    );

    // The voters without a valid ballot are counted with all the options tied.
    if voting.count_all_voters {
        let counted: HashSet<VoterId> = rankings.iter().map(|(vid, _)| *vid).collect();
        let mut synthesized: HashSet<VoterId> = HashSet::new();
        for voter in voters.iter() {
            if !counted.contains(&voter.id) && synthesized.insert(voter.id) {
                rankings.push((
                    voter.id,
                    WeightedRanking {
                        positions: vec![0; n],
                        weight: voter.weight,
                    },
                ));
            }
        }
    }

    let rankings: Vec<WeightedRanking> = rankings.into_iter().map(|(_, r)| r).collect();
    let weight_sum: u64 = rankings
        .iter()
        .try_fold(0u64, |acc, r| acc.checked_add(r.weight))
        .context(WeightOverflowSnafu { voting: voting.id })?;
    let d = pairwise_preferences(&rankings, n);
    let p = strongest_paths(&d);
    let ranking: Vec<Vec<OptionId>> = rank_options(&p)
        .iter()
        .map(|tier| tier.iter().map(|idx| voting.options[*idx].id).collect())
        .collect();
    let threshold = majority_threshold(&voting.majority, weight_sum)?;
    debug!(
        "tabulate_schulze: voting {}: d: {:?} p: {:?}",
        voting.id, d, p
    );
    info!(
        "tabulate_schulze: voting {}: weight_sum: {} threshold: {} ranking: {:?}",
        voting.id, weight_sum, threshold, ranking
    );

    let res = SchulzeTally {
        voting: voting.id,
        options: voting.options.iter().map(|o| o.id).collect(),
        d,
        p,
        ranking,
        weight_sum,
        majority_threshold: threshold,
    };
    Ok((res, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::majority::Majority;

    fn voter(id: u64, weight: u64) -> Voter {
        Voter {
            id: VoterId(id),
            name: format!("voter {}", id),
            weight,
        }
    }

    fn voting(names: &[&str], count_all_voters: bool) -> SchulzeVoting {
        let options = names
            .iter()
            .enumerate()
            .map(|(idx, name)| SchulzeOption {
                id: OptionId(idx as u64 + 1),
                name: name.to_string(),
            })
            .collect();
        SchulzeVoting::new(
            VotingId(3),
            "Election of the treasurer",
            0,
            0,
            options,
            Majority::Simple,
            count_all_voters,
        )
        .unwrap()
    }

    /// One entry per position, options in the order of the voting.
    fn ballot(voter: u64, positions: &[i64]) -> Vec<SchulzeVote> {
        positions
            .iter()
            .enumerate()
            .map(|(idx, pos)| SchulzeVote {
                voter: VoterId(voter),
                option: OptionId(idx as u64 + 1),
                sorting_position: *pos,
            })
            .collect()
    }

    fn ranking(positions: &[i64], weight: u64) -> WeightedRanking {
        WeightedRanking {
            positions: positions.to_vec(),
            weight,
        }
    }

    #[test]
    fn pairwise_tally_is_weighted() {
        let _ = env_logger::try_init();
        let v = voting(&["X", "Y", "Z"], false);
        let voters = vec![voter(1, 2), voter(2, 3)];
        let mut votes = ballot(1, &[1, 2, 3]);
        votes.extend(ballot(2, &[2, 1, 3]));
        let (tally, warnings) = tabulate_schulze(&v, &voters, &votes).unwrap();
        assert!(warnings.is_empty());
        let (x, y, z) = (0, 1, 2);
        assert_eq!(tally.d[x][y], 2);
        assert_eq!(tally.d[y][x], 3);
        assert_eq!(tally.d[x][z], 5);
        assert_eq!(tally.d[z][x], 0);
        assert_eq!(tally.d[y][z], 5);
        assert_eq!(tally.weight_sum, 5);
        assert_eq!(tally.majority_threshold, 2);
        assert_eq!(
            tally.ranking,
            vec![vec![OptionId(2)], vec![OptionId(1)], vec![OptionId(3)]]
        );
        assert_eq!(tally.winners(), vec![OptionId(2)]);
    }

    #[test]
    fn direct_path_stronger_than_cycle() {
        // Cycle A > B > C > A, with a stronger direct edge from A to C.
        let d = vec![vec![0, 5, 10], vec![0, 0, 5], vec![5, 0, 0]];
        let p = strongest_paths(&d);
        assert_eq!(p[0][2], 10);
        assert_eq!(p[0][1], 5);
        assert_eq!(p[1][2], 5);
        // C > A loses against the direct edge and does not start a path.
        assert_eq!(p[2][0], 0);
        assert_eq!(p[1][0], 0);
        assert_eq!(rank_options(&p), vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn indirect_path_widens_weak_direct_edge() {
        let d = vec![vec![0, 8, 3], vec![2, 0, 7], vec![1, 3, 0]];
        let p = strongest_paths(&d);
        // max(direct 3, min(8, 7))
        assert_eq!(p[0][2], 7);
        assert_eq!(p[2][0], 0);
    }

    #[test]
    fn classic_cycle_is_resolved() {
        // Condorcet paradox with different margins: A>B 6:4, B>C 7:3, C>A 8:2.
        let d = vec![vec![0, 6, 2], vec![4, 0, 7], vec![8, 3, 0]];
        let p = strongest_paths(&d);
        assert_eq!(p[0][1], 6);
        assert_eq!(p[1][0], 7);
        assert_eq!(p[1][2], 7);
        assert_eq!(p[2][1], 6);
        assert_eq!(p[2][0], 8);
        assert_eq!(p[0][2], 6);
        assert_eq!(rank_options(&p), vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn equal_positions_are_indifferent() {
        let rankings = vec![ranking(&[1, 1, 2], 4), ranking(&[2, 1, 1], 1)];
        let d = pairwise_preferences(&rankings, 3);
        assert_eq!(d[0][1], 0);
        assert_eq!(d[1][0], 1);
        assert_eq!(d[0][2], 4);
        assert_eq!(d[2][0], 1);
        assert_eq!(d[1][2], 4);
        assert_eq!(d[2][1], 0);
    }

    #[test]
    fn short_ballot_is_rejected() {
        let v = voting(&["A", "B", "C"], false);
        let voters = vec![voter(1, 4), voter(2, 1)];
        let mut votes = ballot(1, &[1, 2]);
        votes.extend(ballot(2, &[1, 2, 3]));
        let (tally, warnings) = tabulate_schulze(&v, &voters, &votes).unwrap();
        assert_eq!(
            warnings,
            vec![TabulationWarning::InvalidRankingLength {
                voting: VotingId(3),
                voter: VoterId(1),
                expected: 3,
                got: 2,
            }]
        );
        assert_eq!(tally.weight_sum, 1);
        assert_eq!(tally.d[1][2], 1);
        assert_eq!(tally.d[0][1], 1);
    }

    #[test]
    fn ballot_with_wrong_option_is_rejected() {
        let v = voting(&["A", "B"], false);
        let voters = vec![voter(1, 2)];
        let votes = vec![
            SchulzeVote {
                voter: VoterId(1),
                option: OptionId(2),
                sorting_position: 1,
            },
            SchulzeVote {
                voter: VoterId(1),
                option: OptionId(1),
                sorting_position: 2,
            },
        ];
        let (tally, warnings) = tabulate_schulze(&v, &voters, &votes).unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0],
            TabulationWarning::UnexpectedOption {
                voting: VotingId(3),
                voter: VoterId(1),
                position: 0,
                expected: OptionId(1),
                got: OptionId(2),
            }
        );
        assert_eq!(tally.weight_sum, 0);
        assert_eq!(tally.ranking, vec![vec![OptionId(1), OptionId(2)]]);
    }

    #[test]
    fn absent_voters_are_tied() {
        let v = voting(&["Yes", "No"], true);
        let voters = vec![voter(1, 1), voter(2, 1), voter(3, 2), voter(4, 5)];
        let mut votes = ballot(1, &[1, 2]);
        votes.extend(ballot(2, &[1, 2]));
        votes.extend(ballot(3, &[2, 1, 3]));
        votes.extend(ballot(9, &[1, 2]));
        let (tally, warnings) = tabulate_schulze(&v, &voters, &votes).unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(tally.weight_sum, 9);
        assert_eq!(tally.majority_threshold, 4);
        assert_eq!(tally.d, vec![vec![0, 2], vec![0, 0]]);
        assert_eq!(tally.votes_before_last(), vec![2, 0]);
        assert!(tally.options_passing().is_empty());
        let percent = tally.percent_before_last();
        assert!((percent[0] - 200.0 / 9.0).abs() < 1e-9);
        assert_eq!(tally.winners(), vec![OptionId(1)]);
    }

    #[test]
    fn options_passing_against_no() {
        let v = voting(&["Alice", "Bob", "No"], false);
        let voters = vec![voter(1, 3), voter(2, 2), voter(3, 1)];
        let mut votes = ballot(1, &[1, 2, 3]);
        votes.extend(ballot(2, &[2, 3, 1]));
        votes.extend(ballot(3, &[1, 1, 2]));
        let (tally, _) = tabulate_schulze(&v, &voters, &votes).unwrap();
        assert_eq!(tally.majority_threshold, 3);
        assert_eq!(tally.votes_before_last(), vec![4, 4, 0]);
        assert_eq!(tally.options_passing(), vec![OptionId(1), OptionId(2)]);
        assert_eq!(tally.index_of(OptionId(3)), Some(2));
    }

    #[test]
    fn no_ballots_is_fully_tied() {
        let v = voting(&["A", "B", "C"], false);
        let (tally, warnings) = tabulate_schulze(&v, &[], &[]).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(tally.weight_sum, 0);
        assert_eq!(tally.majority_threshold, 0);
        assert_eq!(tally.p, vec![vec![0; 3]; 3]);
        assert_eq!(
            tally.ranking,
            vec![vec![OptionId(1), OptionId(2), OptionId(3)]]
        );
        assert_eq!(tally.percent_before_last(), vec![0.0; 3]);
    }

    #[test]
    fn too_few_options() {
        let res = SchulzeVoting::new(
            VotingId(1),
            "single",
            0,
            0,
            vec![SchulzeOption {
                id: OptionId(1),
                name: "Yes".to_string(),
            }],
            Majority::Simple,
            false,
        );
        assert!(matches!(
            res,
            Err(TabulationError::TooFewOptions { count: 1, .. })
        ));
        let mut v = voting(&["A", "B"], false);
        v.options.pop();
        assert!(matches!(
            tabulate_schulze(&v, &[], &[]),
            Err(TabulationError::TooFewOptions { .. })
        ));
    }

    #[test]
    fn duplicate_option_names() {
        let mut v = voting(&["A", "B"], false);
        v.options[1].name = "A".to_string();
        assert!(matches!(
            tabulate_schulze(&v, &[], &[]),
            Err(TabulationError::DuplicateOption { .. })
        ));
    }

    #[test]
    fn total_weight_overflow_fails() {
        let v = voting(&["A", "No"], true);
        let voters = vec![voter(1, u64::MAX), voter(2, 1)];
        assert!(matches!(
            tabulate_schulze(&v, &voters, &ballot(1, &[1, 2])),
            Err(TabulationError::WeightOverflow {
                voting: VotingId(3)
            })
        ));
    }

    #[test]
    fn pairwise_counts_saturate() {
        let d = pairwise_preferences(&[ranking(&[1, 2], u64::MAX), ranking(&[1, 2], 1)], 2);
        assert_eq!(d, vec![vec![0, u64::MAX], vec![0, 0]]);
    }

    #[test]
    fn pairwise_skips_rankings_of_the_wrong_length() {
        let rankings = [
            ranking(&[1, 2, 3], 2),
            ranking(&[2, 1], 5),
            ranking(&[3, 2, 1, 4], 7),
        ];
        let d = pairwise_preferences(&rankings, 3);
        assert_eq!(d, vec![vec![0, 2, 2], vec![0, 0, 2], vec![0, 0, 0]]);
    }

    #[test]
    fn tabulation_is_repeatable() {
        let v = voting(&["A", "B", "C", "D"], true);
        let voters: Vec<Voter> = (1..=6).map(|id| voter(id, id)).collect();
        let mut votes = Vec::new();
        votes.extend(ballot(1, &[4, 3, 2, 1]));
        votes.extend(ballot(2, &[1, 2, 3, 4]));
        votes.extend(ballot(4, &[2, 2, 1, 3]));
        votes.extend(ballot(5, &[1, 3]));
        let first = tabulate_schulze(&v, &voters, &votes).unwrap();
        let second = tabulate_schulze(&v, &voters, &votes).unwrap();
        assert_eq!(first, second);
    }
}
