use log::debug;

use std::collections::HashMap;

pub use crate::config::*;
use crate::majority::Majority;
use crate::session::{Ballots, Session, Voting, VotingGroup};

/// A builder for a session and its votes, using names instead of ids.
///
/// Ids are assigned by the builder. Votes may refer to voters or options that do not
/// exist: they get ids of their own, and are reported when the session is tabulated.
///
/// ```
/// use session_voting::builder::SessionBuilder;
/// use session_voting::{tabulate_session, Majority, TabulationError};
///
/// let mut builder = SessionBuilder::new("Plenum")?
///     .voters(&[("Anna".to_string(), 2), ("Bob".to_string(), 1)])?;
///
/// let group = builder.add_group("Finances");
/// let party = builder.add_median_voting(group, "Summer party", 50000, Some("EUR"), Majority::Simple, false)?;
/// builder.add_median_vote(party, "Anna", 30000)?;
/// builder.add_median_vote(party, "Bob", 50000)?;
///
/// let (session, ballots, _) = builder.build();
/// let result = tabulate_session(&session, &ballots)?;
/// assert!(result.warnings.is_empty());
/// # Ok::<(), TabulationError>(())
/// ```
pub struct SessionBuilder {
    pub(crate) _name: String,
    pub(crate) _revision: Option<String>,
    pub(crate) _voters: Vec<Voter>,
    pub(crate) _groups: Vec<VotingGroup>,
    pub(crate) _votings: Vec<Voting>,
    pub(crate) _ballots: Ballots,
    pub(crate) _names: NameIndex,
    // Ids of the voters not in the roster, by name.
    _unknown_voters: HashMap<String, VoterId>,
    _next_voter: u64,
    _next_voting: u64,
    _next_option: u64,
}

/// The names of everything the builder assigned an id to.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct NameIndex {
    pub voters: HashMap<VoterId, String>,
    pub votings: HashMap<VotingId, String>,
    pub options: HashMap<OptionId, String>,
}

impl NameIndex {
    pub fn voter(&self, id: VoterId) -> String {
        self.voters
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", id))
    }

    pub fn voting(&self, id: VotingId) -> String {
        self.votings
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", id))
    }

    pub fn option(&self, id: OptionId) -> String {
        self.options
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{}", id))
    }
}

impl SessionBuilder {
    pub fn new(name: &str) -> Result<SessionBuilder, TabulationError> {
        Ok(SessionBuilder {
            _name: name.to_string(),
            _revision: None,
            _voters: Vec::new(),
            _groups: Vec::new(),
            _votings: Vec::new(),
            _ballots: Ballots::default(),
            _names: NameIndex::default(),
            _unknown_voters: HashMap::new(),
            _next_voter: 1,
            _next_voting: 1,
            _next_option: 1,
        })
    }

    pub fn revision(self, revision: &str) -> Result<SessionBuilder, TabulationError> {
        Ok(SessionBuilder {
            _revision: Some(revision.to_string()),
            ..self
        })
    }

    /// Sets the voter roster: the name and the weight of each voter.
    ///
    /// If a name appears more than once, votes by that name are attributed to the first voter.
    pub fn voters(mut self, voters: &[(String, u64)]) -> Result<SessionBuilder, TabulationError> {
        let mut roster: Vec<Voter> = Vec::new();
        for (name, weight) in voters.iter() {
            let id = self.next_voter_id();
            self._names.voters.insert(id, name.clone());
            roster.push(Voter {
                id,
                name: name.clone(),
                weight: *weight,
            });
        }
        Ok(SessionBuilder {
            _voters: roster,
            ..self
        })
    }

    /// Adds a group of votings, and returns its number.
    pub fn add_group(&mut self, name: &str) -> u32 {
        let group_num = self._groups.len() as u32;
        self._groups.push(VotingGroup {
            group_num,
            name: name.to_string(),
        });
        group_num
    }

    /// Adds a median voting at the end of the given group.
    ///
    /// `value` is the requested value, in the smallest unit of the currency.
    pub fn add_median_voting(
        &mut self,
        group_num: u32,
        name: &str,
        value: u64,
        currency: Option<&str>,
        majority: Majority,
        count_all_voters: bool,
    ) -> Result<VotingId, TabulationError> {
        // Fails early on invalid majorities.
        majority.fraction()?;
        let id = self.next_voting_id(name);
        let voting_num = self.next_voting_num(group_num);
        self._votings.push(Voting::Median(MedianVoting {
            id,
            name: name.to_string(),
            group_num,
            voting_num,
            value,
            currency: currency.map(|c| c.to_string()),
            majority,
            count_all_voters,
        }));
        Ok(id)
    }

    /// Adds a Schulze voting at the end of the given group.
    ///
    /// The last option is the "No" option of the voting.
    pub fn add_schulze_voting(
        &mut self,
        group_num: u32,
        name: &str,
        options: &[String],
        majority: Majority,
        count_all_voters: bool,
    ) -> Result<VotingId, TabulationError> {
        majority.fraction()?;
        let first_option = self._next_option;
        let schulze_options: Vec<SchulzeOption> = options
            .iter()
            .enumerate()
            .map(|(idx, option_name)| SchulzeOption {
                id: OptionId(first_option + idx as u64),
                name: option_name.clone(),
            })
            .collect();
        let id = VotingId(self._next_voting);
        let voting_num = self.next_voting_num(group_num);
        let voting = SchulzeVoting::new(
            id,
            name,
            group_num,
            voting_num,
            schulze_options,
            majority,
            count_all_voters,
        )?;
        self._next_voting += 1;
        self._next_option += options.len() as u64;
        self._names.votings.insert(id, name.to_string());
        for o in voting.options.iter() {
            self._names.options.insert(o.id, o.name.clone());
        }
        self._votings.push(Voting::Schulze(voting));
        Ok(id)
    }

    /// Adds the vote of a voter for a median voting.
    pub fn add_median_vote(
        &mut self,
        voting: VotingId,
        voter: &str,
        value: u64,
    ) -> Result<(), TabulationError> {
        let voter = self.voter_id(voter);
        self._ballots
            .median
            .entry(voting)
            .or_insert_with(Vec::new)
            .push(MedianVote { voter, value });
        Ok(())
    }

    /// Adds the ranking of a voter for a Schulze voting.
    ///
    /// ranking: the options with their position, smaller positions are preferred.
    /// The entries are kept in the given order: a ballot is only counted if it lists
    /// all the options of the voting in the order of the voting.
    pub fn add_schulze_vote(
        &mut self,
        voting: VotingId,
        voter: &str,
        ranking: &[(String, i64)],
    ) -> Result<(), TabulationError> {
        let voter = self.voter_id(voter);
        let mut entries: Vec<SchulzeVote> = Vec::new();
        for (option_name, position) in ranking.iter() {
            let option = self.option_id(voting, option_name);
            entries.push(SchulzeVote {
                voter,
                option,
                sorting_position: *position,
            });
        }
        self._ballots
            .schulze
            .entry(voting)
            .or_insert_with(Vec::new)
            .extend(entries);
        Ok(())
    }

    pub fn build(self) -> (Session, Ballots, NameIndex) {
        let session = Session {
            name: self._name,
            revision: self._revision,
            voters: self._voters,
            groups: self._groups,
            votings: self._votings,
        };
        (session, self._ballots, self._names)
    }

    fn next_voter_id(&mut self) -> VoterId {
        let id = VoterId(self._next_voter);
        self._next_voter += 1;
        id
    }

    fn next_voting_id(&mut self, name: &str) -> VotingId {
        let id = VotingId(self._next_voting);
        self._next_voting += 1;
        self._names.votings.insert(id, name.to_string());
        id
    }

    fn next_voting_num(&self, group_num: u32) -> u32 {
        self._votings
            .iter()
            .filter(|v| v.group_num() == group_num)
            .count() as u32
    }

    fn voter_id(&mut self, name: &str) -> VoterId {
        if let Some(v) = self._voters.iter().find(|v| v.name == name) {
            return v.id;
        }
        if let Some(id) = self._unknown_voters.get(name) {
            return *id;
        }
        let id = self.next_voter_id();
        debug!("voter_id: voter {:?} is not in the roster, using id {}", name, id);
        self._unknown_voters.insert(name.to_string(), id);
        self._names.voters.insert(id, name.to_string());
        id
    }

    fn option_id(&mut self, voting: VotingId, name: &str) -> OptionId {
        let known = self._votings.iter().find_map(|v| match v {
            Voting::Schulze(s) if s.id == voting => {
                s.options.iter().find(|o| o.name == name).map(|o| o.id)
            }
            _ => None,
        });
        if let Some(id) = known {
            return id;
        }
        let id = OptionId(self._next_option);
        self._next_option += 1;
        debug!(
            "option_id: option {:?} is not an option of voting {}, using id {}",
            name, voting, id
        );
        self._names.options.insert(id, name.to_string());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{tabulate_session, VotingOutcome};

    fn names(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    fn builder() -> SessionBuilder {
        SessionBuilder::new("Plenum")
            .unwrap()
            .revision("WS 2023")
            .unwrap()
            .voters(&[
                ("Anna".to_string(), 3),
                ("Bob".to_string(), 2),
                ("Clara".to_string(), 1),
            ])
            .unwrap()
    }

    #[test]
    fn ids_and_numbers_are_assigned() {
        let mut b = builder();
        let g0 = b.add_group("Elections");
        let g1 = b.add_group("Finances");
        let m = b
            .add_median_voting(g1, "Party", 100, None, Majority::Simple, false)
            .unwrap();
        let s = b
            .add_schulze_voting(
                g0,
                "Treasurer",
                &names(&["Anna", "Bob", "No"]),
                Majority::Simple,
                false,
            )
            .unwrap();
        let m2 = b
            .add_median_voting(g1, "Books", 100, None, Majority::TwoThirds, true)
            .unwrap();
        assert_eq!((m, s, m2), (VotingId(1), VotingId(2), VotingId(3)));
        let (session, _, index) = b.build();
        assert_eq!(session.revision, Some("WS 2023".to_string()));
        let positions: Vec<(u32, u32)> = session
            .votings
            .iter()
            .map(|v| (v.group_num(), v.voting_num()))
            .collect();
        assert_eq!(positions, vec![(1, 0), (0, 0), (1, 1)]);
        assert_eq!(index.voting(s), "Treasurer");
        assert_eq!(index.option(OptionId(3)), "No");
        assert_eq!(index.voter(VoterId(2)), "Bob");
    }

    #[test]
    fn invalid_votings_are_rejected() {
        let mut b = builder();
        let g = b.add_group("Elections");
        assert!(matches!(
            b.add_schulze_voting(g, "Single", &names(&["Yes"]), Majority::Simple, false),
            Err(TabulationError::TooFewOptions { .. })
        ));
        assert!(matches!(
            b.add_schulze_voting(g, "Twice", &names(&["Yes", "Yes"]), Majority::Simple, false),
            Err(TabulationError::DuplicateOption { .. })
        ));
        // Failed votings do not use up ids.
        let id = b
            .add_schulze_voting(g, "Ok", &names(&["Yes", "No"]), Majority::Simple, false)
            .unwrap();
        assert_eq!(id, VotingId(1));
        let (session, _, index) = b.build();
        assert_eq!(session.votings.len(), 1);
        assert_eq!(index.option(OptionId(1)), "Yes");
    }

    #[test]
    fn unknown_names_become_warnings() {
        let mut b = builder();
        let g = b.add_group("Elections");
        let v = b
            .add_schulze_voting(g, "Motion", &names(&["Yes", "No"]), Majority::Simple, false)
            .unwrap();
        b.add_schulze_vote(v, "Anna", &[("Yes".to_string(), 1), ("No".to_string(), 2)])
            .unwrap();
        b.add_schulze_vote(v, "Bob", &[("Yes".to_string(), 1), ("Maybe".to_string(), 2)])
            .unwrap();
        b.add_schulze_vote(v, "Dave", &[("Yes".to_string(), 2), ("No".to_string(), 1)])
            .unwrap();
        b.add_schulze_vote(v, "Dave", &[]).unwrap();
        let (session, ballots, index) = b.build();
        let res = tabulate_session(&session, &ballots).unwrap();
        assert_eq!(res.warnings.len(), 2);
        match &res.warnings[0] {
            TabulationWarning::UnexpectedOption { voter, got, .. } => {
                assert_eq!(index.voter(*voter), "Bob");
                assert_eq!(index.option(*got), "Maybe");
            }
            w => panic!("unexpected warning {:?}", w),
        }
        match &res.warnings[1] {
            TabulationWarning::UnknownVoter { voter, .. } => {
                assert_eq!(index.voter(*voter), "Dave");
            }
            w => panic!("unexpected warning {:?}", w),
        }
        match &res.groups[0].votings[0].outcome {
            VotingOutcome::Schulze(t) => {
                assert_eq!(t.weight_sum, 3);
                assert_eq!(t.winners(), vec![OptionId(1)]);
            }
            o => panic!("unexpected outcome {:?}", o),
        }
    }

    #[test]
    fn median_votes_by_name() {
        let mut b = builder();
        let g = b.add_group("Finances");
        let v = b
            .add_median_voting(g, "Party", 10000, Some("EUR"), Majority::Simple, true)
            .unwrap();
        b.add_median_vote(v, "Anna", 10000).unwrap();
        b.add_median_vote(v, "Clara", 5000).unwrap();
        b.add_median_vote(VotingId(42), "Clara", 5000).unwrap();
        let (session, ballots, _) = b.build();
        let res = tabulate_session(&session, &ballots).unwrap();
        assert_eq!(
            res.warnings,
            vec![TabulationWarning::UnknownVoting {
                voting: VotingId(42)
            }]
        );
        match &res.groups[0].votings[0].outcome {
            VotingOutcome::Median(t) => {
                assert_eq!(t.weight_sum, 6);
                assert_eq!(t.majority_threshold, 3);
                assert!(!t.accepts(10000));
                assert_eq!(t.median(), Some(5000));
            }
            o => panic!("unexpected outcome {:?}", o),
        }
    }
}
