// ********* Input data structures ***********

use snafu::Snafu;
use std::fmt::Display;

use crate::fraction::Fraction;
use crate::majority::Majority;

/// Opaque identity of a voter within a revision of the voter roster.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct VoterId(pub u64);

/// Identity of a voting instance. Unique across median and Schulze votings of a session.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct VotingId(pub u64);

/// Identity of an option of a Schulze voting.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct OptionId(pub u64);

impl Display for VoterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for VotingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for OptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member of the voter roster, with the number of votes this voter casts.
///
/// The weight is expected to be positive, this is checked by the callers. A voter with a
/// weight of 0 is tabulated like any other voter and adds nothing to the counts.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Voter {
    pub id: VoterId,
    pub name: String,
    pub weight: u64,
}

/// A voting on a numeric value, for example an amount of money requested.
///
/// All values are measured in the smallest unit (cents, pence, ...).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MedianVoting {
    pub id: VotingId,
    pub name: String,
    pub group_num: u32,
    pub voting_num: u32,
    /// The requested value. Votes above it are not valid.
    pub value: u64,
    pub currency: Option<String>,
    pub majority: Majority,
    /// When set, voters without a vote are counted as if they voted for 0.
    pub count_all_voters: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MedianVote {
    pub voter: VoterId,
    pub value: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeOption {
    pub id: OptionId,
    pub name: String,
}

/// A ranked voting between at least two options.
///
/// By convention the last option is the "No" option of the voting.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeVoting {
    pub id: VotingId,
    pub name: String,
    pub group_num: u32,
    pub voting_num: u32,
    pub options: Vec<SchulzeOption>,
    pub majority: Majority,
    /// When set, voters without a valid ballot are counted with all the options tied.
    pub count_all_voters: bool,
}

impl SchulzeVoting {
    /// Creates a Schulze voting, rejecting option lists that cannot be tabulated.
    pub fn new(
        id: VotingId,
        name: &str,
        group_num: u32,
        voting_num: u32,
        options: Vec<SchulzeOption>,
        majority: Majority,
        count_all_voters: bool,
    ) -> Result<SchulzeVoting, TabulationError> {
        let voting = SchulzeVoting {
            id,
            name: name.to_string(),
            group_num,
            voting_num,
            options,
            majority,
            count_all_voters,
        };
        voting.check_options()?;
        Ok(voting)
    }

    pub(crate) fn check_options(&self) -> Result<(), TabulationError> {
        snafu::ensure!(
            self.options.len() >= 2,
            TooFewOptionsSnafu {
                voting: self.id,
                count: self.options.len(),
            }
        );
        for (idx, o) in self.options.iter().enumerate() {
            let repeated = self.options[..idx]
                .iter()
                .any(|o2| o2.id == o.id || o2.name == o.name);
            snafu::ensure!(
                !repeated,
                DuplicateOptionSnafu {
                    voting: self.id,
                    option: o.name.clone(),
                }
            );
        }
        Ok(())
    }
}

/// One entry of a ranking: the position given by a voter to one option.
/// Smaller positions are preferred, equal positions mean indifference.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeVote {
    pub voter: VoterId,
    pub option: OptionId,
    pub sorting_position: i64,
}

// ******** Warnings and errors *********

/// Anomalies found while aggregating the votes.
///
/// The offending vote or ballot is not counted, the rest of the tabulation continues.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TabulationWarning {
    /// A median vote for more than the requested value.
    ValueExceedsCeiling {
        voting: VotingId,
        voter: VoterId,
        value: u64,
        ceiling: u64,
    },
    /// A Schulze ballot that does not rank every option exactly once.
    InvalidRankingLength {
        voting: VotingId,
        voter: VoterId,
        expected: usize,
        got: usize,
    },
    /// A Schulze ballot whose entries do not follow the options of the voting.
    UnexpectedOption {
        voting: VotingId,
        voter: VoterId,
        position: usize,
        expected: OptionId,
        got: OptionId,
    },
    /// A vote cast by someone who is not in the voter roster.
    UnknownVoter { voting: VotingId, voter: VoterId },
    /// More than one median vote from the same voter. Only the first one is counted.
    DuplicateVote { voting: VotingId, voter: VoterId },
    /// Votes addressed to a voting that does not exist in the session.
    UnknownVoting { voting: VotingId },
    /// The same voting id appears more than once in the session.
    DuplicateVotingId { voting: VotingId },
}

impl TabulationWarning {
    pub fn voting(&self) -> VotingId {
        match self {
            TabulationWarning::ValueExceedsCeiling { voting, .. }
            | TabulationWarning::InvalidRankingLength { voting, .. }
            | TabulationWarning::UnexpectedOption { voting, .. }
            | TabulationWarning::UnknownVoter { voting, .. }
            | TabulationWarning::DuplicateVote { voting, .. }
            | TabulationWarning::UnknownVoting { voting }
            | TabulationWarning::DuplicateVotingId { voting } => *voting,
        }
    }

    pub fn voter(&self) -> Option<VoterId> {
        match self {
            TabulationWarning::ValueExceedsCeiling { voter, .. }
            | TabulationWarning::InvalidRankingLength { voter, .. }
            | TabulationWarning::UnexpectedOption { voter, .. }
            | TabulationWarning::UnknownVoter { voter, .. }
            | TabulationWarning::DuplicateVote { voter, .. } => Some(*voter),
            TabulationWarning::UnknownVoting { .. } | TabulationWarning::DuplicateVotingId { .. } => {
                None
            }
        }
    }
}

impl Display for TabulationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabulationWarning::ValueExceedsCeiling {
                voting,
                voter,
                value,
                ceiling,
            } => write!(
                f,
                "Invalid vote for voting {}: expected value between 0 and {} but got {} from voter {}, not counted",
                voting, ceiling, value, voter
            ),
            TabulationWarning::InvalidRankingLength {
                voting,
                voter,
                expected,
                got,
            } => write!(
                f,
                "Invalid vote for voting {}: expected ranking of length {} and got length {} from voter {}, not counted",
                voting, expected, got, voter
            ),
            TabulationWarning::UnexpectedOption {
                voting,
                voter,
                position,
                expected,
                got,
            } => write!(
                f,
                "Invalid vote for voting {}: expected option {} at position {} and got option {} from voter {}, not counted",
                voting, expected, position, got, voter
            ),
            TabulationWarning::UnknownVoter { voting, voter } => write!(
                f,
                "Invalid vote for voting {}: voter {} is not in the voter roster, not counted",
                voting, voter
            ),
            TabulationWarning::DuplicateVote { voting, voter } => write!(
                f,
                "Invalid vote for voting {}: voter {} voted more than once, only the first vote is counted",
                voting, voter
            ),
            TabulationWarning::UnknownVoting { voting } => {
                write!(f, "Invalid voting with id {}: does not exist", voting)
            }
            TabulationWarning::DuplicateVotingId { voting } => write!(
                f,
                "Voting id {} appears more than once, ids of the votings are probably not unique",
                voting
            ),
        }
    }
}

/// Errors that prevent the tabulation from completing.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TabulationError {
    #[snafu(display("Fraction with a zero denominator"))]
    DivisionByZero,
    #[snafu(display("Invalid majority description {description:?}"))]
    InvalidMajoritySpecification { description: String },
    #[snafu(display("Majority {fraction} is not between 0 and 1"))]
    MajorityOutOfRange { fraction: Fraction },
    #[snafu(display("Schulze voting {voting} needs at least 2 options, got {count}"))]
    TooFewOptions { voting: VotingId, count: usize },
    #[snafu(display("Schulze voting {voting} has option {option:?} more than once"))]
    DuplicateOption { voting: VotingId, option: String },
    #[snafu(display("The total weight of the voters of voting {voting} does not fit in a vote count"))]
    WeightOverflow { voting: VotingId },
}
