use crate::tally::*;

use serde::{Deserialize, Serialize};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoterConfig {
    pub name: String,
    pub weight: u64,
}

/// The majority of a voting: "50", "2/3" or an explicit fraction.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MajorityConfig {
    Named(String),
    Fraction { numerator: i64, denominator: i64 },
}

impl MajorityConfig {
    pub fn majority(&self, voting_name: &str) -> TallyResult<Majority> {
        match self {
            MajorityConfig::Named(description) => {
                Majority::from_description(description).context(TabulationSnafu {
                    what: format!("the majority of voting {:?}", voting_name),
                })
            }
            MajorityConfig::Fraction {
                numerator,
                denominator,
            } => {
                let f = Fraction::new(*numerator, *denominator).context(TabulationSnafu {
                    what: format!("the majority of voting {:?}", voting_name),
                })?;
                Ok(Majority::Fraction(f))
            }
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MedianVoteConfig {
    pub voter: String,
    pub value: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct MedianConfig {
    pub name: String,
    pub majority: MajorityConfig,
    #[serde(rename = "countAllVoters", default)]
    pub count_all_voters: bool,
    pub value: u64,
    pub currency: Option<String>,
    #[serde(default)]
    pub votes: Vec<MedianVoteConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SchulzeVoteConfig {
    pub voter: String,
    /// Pairs of option name and position.
    pub ranking: Vec<(String, i64)>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SchulzeConfig {
    pub name: String,
    pub majority: MajorityConfig,
    #[serde(rename = "countAllVoters", default)]
    pub count_all_voters: bool,
    pub options: Vec<String>,
    #[serde(default)]
    pub votes: Vec<SchulzeVoteConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VotingConfig {
    Median(MedianConfig),
    Schulze(SchulzeConfig),
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub votings: Vec<VotingConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    pub revision: Option<String>,
    #[serde(default)]
    pub voters: Vec<VoterConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

pub fn parse_config(contents: &str) -> TallyResult<SessionConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu {})
}

pub fn read_config(path: &str) -> TallyResult<SessionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_config(&contents)
}

pub fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_summary: read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
