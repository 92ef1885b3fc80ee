use log::{debug, info, warn};

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::*;
use crate::median::{tabulate_median, MedianTally};
use crate::schulze::{tabulate_schulze, SchulzeTally};

// ********* Session structures ***********

/// A voting instance of a session, of either kind.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Voting {
    Median(MedianVoting),
    Schulze(SchulzeVoting),
}

impl Voting {
    pub fn id(&self) -> VotingId {
        match self {
            Voting::Median(v) => v.id,
            Voting::Schulze(v) => v.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Voting::Median(v) => &v.name,
            Voting::Schulze(v) => &v.name,
        }
    }

    pub fn group_num(&self) -> u32 {
        match self {
            Voting::Median(v) => v.group_num,
            Voting::Schulze(v) => v.group_num,
        }
    }

    pub fn voting_num(&self) -> u32 {
        match self {
            Voting::Median(v) => v.voting_num,
            Voting::Schulze(v) => v.voting_num,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingGroup {
    pub group_num: u32,
    pub name: String,
}

/// The votings of one session, with the voter roster of the revision they use.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Session {
    pub name: String,
    pub revision: Option<String>,
    pub voters: Vec<Voter>,
    pub groups: Vec<VotingGroup>,
    pub votings: Vec<Voting>,
}

/// The votes cast in a session, by voting.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Ballots {
    pub median: BTreeMap<VotingId, Vec<MedianVote>>,
    pub schulze: BTreeMap<VotingId, Vec<SchulzeVote>>,
}

// ********* Results ***********

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingOutcome {
    Median(MedianTally),
    Schulze(SchulzeTally),
}

/// The tabulation of a single voting, with its position in the session.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingResult {
    pub voting: VotingId,
    pub name: String,
    pub group_num: u32,
    pub voting_num: u32,
    pub outcome: VotingOutcome,
    /// The warnings raised while tabulating this voting.
    pub warnings: Vec<TabulationWarning>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GroupResult {
    pub group_num: u32,
    pub name: String,
    /// In voting order. May be empty.
    pub votings: Vec<VotingResult>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SessionResult {
    pub name: String,
    pub groups: Vec<GroupResult>,
    /// All the warnings of the session, in group and voting order.
    pub warnings: Vec<TabulationWarning>,
}

/// Merges separately tabulated median and Schulze results.
///
/// The results are ordered by (group number, voting number). Results with the same
/// position keep their relative order, median results first. A voting id that appears
/// more than once is reported once in the returned warnings; all the results are kept.
pub fn merge_tallies(
    median: Vec<VotingResult>,
    schulze: Vec<VotingResult>,
) -> (Vec<VotingResult>, Vec<TabulationWarning>) {
    let mut merged: Vec<VotingResult> = median;
    merged.extend(schulze);
    merged.sort_by_key(|r| (r.group_num, r.voting_num));

    let mut seen: HashSet<VotingId> = HashSet::new();
    let mut reported: HashSet<VotingId> = HashSet::new();
    let mut warnings: Vec<TabulationWarning> = Vec::new();
    for r in merged.iter() {
        if !seen.insert(r.voting) && reported.insert(r.voting) {
            warn!("merge_tallies: voting id {} is not unique", r.voting);
            warnings.push(TabulationWarning::DuplicateVotingId { voting: r.voting });
        }
    }
    (merged, warnings)
}

/// Tabulates all the votings of a session.
///
/// A per-ballot anomaly never stops the tabulation of the session, it is reported in the
/// warnings of the voting and of the session. Only the errors of [TabulationError] do.
pub fn tabulate_session(
    session: &Session,
    ballots: &Ballots,
) -> Result<SessionResult, TabulationError> {
    info!(
        "tabulate_session: session {:?} revision {:?}: {} votings in {} groups, {} voters",
        session.name,
        session.revision,
        session.votings.len(),
        session.groups.len(),
        session.voters.len()
    );

    let mut median_results: Vec<VotingResult> = Vec::new();
    let mut schulze_results: Vec<VotingResult> = Vec::new();
    for voting in session.votings.iter() {
        match voting {
            Voting::Median(v) => {
                let votes: &[MedianVote] = ballots
                    .median
                    .get(&v.id)
                    .map(|x| x.as_slice())
                    .unwrap_or(&[]);
                let (tally, warnings) = tabulate_median(v, &session.voters, votes)?;
                median_results.push(VotingResult {
                    voting: v.id,
                    name: v.name.clone(),
                    group_num: v.group_num,
                    voting_num: v.voting_num,
                    outcome: VotingOutcome::Median(tally),
                    warnings,
                });
            }
            Voting::Schulze(v) => {
                let votes: &[SchulzeVote] = ballots
                    .schulze
                    .get(&v.id)
                    .map(|x| x.as_slice())
                    .unwrap_or(&[]);
                let (tally, warnings) = tabulate_schulze(v, &session.voters, votes)?;
                schulze_results.push(VotingResult {
                    voting: v.id,
                    name: v.name.clone(),
                    group_num: v.group_num,
                    voting_num: v.voting_num,
                    outcome: VotingOutcome::Schulze(tally),
                    warnings,
                });
            }
        }
    }

    let (merged, duplicate_warnings) = merge_tallies(median_results, schulze_results);

    let mut warnings: Vec<TabulationWarning> = merged
        .iter()
        .flat_map(|r| r.warnings.iter().cloned())
        .collect();
    warnings.extend(duplicate_warnings);
    warnings.extend(unknown_votings(session, ballots));

    let groups = group_results(session, merged);
    debug!(
        "tabulate_session: session {:?}: {} groups, {} warnings",
        session.name,
        groups.len(),
        warnings.len()
    );
    Ok(SessionResult {
        name: session.name.clone(),
        groups,
        warnings,
    })
}

/// The ballots addressed to votings that are not in the session, or not of the right kind.
fn unknown_votings(session: &Session, ballots: &Ballots) -> Vec<TabulationWarning> {
    let median_ids: HashSet<VotingId> = session
        .votings
        .iter()
        .filter_map(|v| match v {
            Voting::Median(m) => Some(m.id),
            Voting::Schulze(_) => None,
        })
        .collect();
    let schulze_ids: HashSet<VotingId> = session
        .votings
        .iter()
        .filter_map(|v| match v {
            Voting::Schulze(s) => Some(s.id),
            Voting::Median(_) => None,
        })
        .collect();
    let mut unknown: BTreeSet<VotingId> = BTreeSet::new();
    for id in ballots.median.keys() {
        if !median_ids.contains(id) {
            unknown.insert(*id);
        }
    }
    for id in ballots.schulze.keys() {
        if !schulze_ids.contains(id) {
            unknown.insert(*id);
        }
    }
    unknown
        .into_iter()
        .map(|voting| {
            warn!("tabulate_session: votes for unknown voting {}", voting);
            TabulationWarning::UnknownVoting { voting }
        })
        .collect()
}

/// Puts the sorted results into their groups, in group order.
///
/// Votings that refer to a group that is not declared get a group of their own, without name.
fn group_results(session: &Session, merged: Vec<VotingResult>) -> Vec<GroupResult> {
    let mut groups: BTreeMap<u32, GroupResult> = BTreeMap::new();
    for g in session.groups.iter() {
        groups.entry(g.group_num).or_insert_with(|| GroupResult {
            group_num: g.group_num,
            name: g.name.clone(),
            votings: Vec::new(),
        });
    }
    for r in merged.into_iter() {
        let group = groups.entry(r.group_num).or_insert_with(|| {
            debug!(
                "group_results: voting {} refers to undeclared group {}",
                r.voting, r.group_num
            );
            GroupResult {
                group_num: r.group_num,
                name: String::new(),
                votings: Vec::new(),
            }
        });
        group.votings.push(r);
    }
    groups.into_values().collect()
}
