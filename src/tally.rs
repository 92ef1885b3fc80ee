use log::{debug, info, warn};

use session_voting::builder::{NameIndex, SessionBuilder};
use session_voting::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_csv;

use crate::tally::config_reader::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SessionError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} of the CSV file is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Invalid weight {weight:?} on line {lineno} of the CSV file"))]
    CsvWeight {
        source: std::num::ParseIntError,
        lineno: usize,
        weight: String,
    },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Tabulation failed for {what}"))]
    Tabulation {
        source: TabulationError,
        what: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, SessionError>;

/// Builds the session described by the configuration.
///
/// The roster replaces the voters of the configuration when provided.
/// Names of voters and options that do not exist are kept, they show up as warnings
/// during the tabulation.
pub fn build_session(
    config: &SessionConfig,
    roster: Option<&[(String, u64)]>,
) -> TallyResult<(Session, Ballots, NameIndex)> {
    let voters: Vec<(String, u64)> = match roster {
        Some(r) => r.to_vec(),
        None => config
            .voters
            .iter()
            .map(|v| (v.name.clone(), v.weight))
            .collect(),
    };
    for (name, weight) in voters.iter() {
        ensure_whatever!(*weight > 0, "Voter {:?} has no weight", name);
    }

    let session_ctx = || TabulationSnafu {
        what: format!("session {:?}", config.name),
    };
    let mut builder = SessionBuilder::new(&config.name).context(session_ctx())?;
    if let Some(revision) = &config.revision {
        builder = builder.revision(revision).context(session_ctx())?;
    }
    let mut builder = builder.voters(&voters).context(session_ctx())?;

    for group in config.groups.iter() {
        let group_num = builder.add_group(&group.name);
        for voting in group.votings.iter() {
            match voting {
                VotingConfig::Median(m) => {
                    let voting_ctx = || TabulationSnafu {
                        what: format!("voting {:?}", m.name),
                    };
                    let majority = m.majority.majority(&m.name)?;
                    let id = builder
                        .add_median_voting(
                            group_num,
                            &m.name,
                            m.value,
                            m.currency.as_deref(),
                            majority,
                            m.count_all_voters,
                        )
                        .context(voting_ctx())?;
                    for vote in m.votes.iter() {
                        builder
                            .add_median_vote(id, &vote.voter, vote.value)
                            .context(voting_ctx())?;
                    }
                }
                VotingConfig::Schulze(s) => {
                    let voting_ctx = || TabulationSnafu {
                        what: format!("voting {:?}", s.name),
                    };
                    let majority = s.majority.majority(&s.name)?;
                    let id = builder
                        .add_schulze_voting(
                            group_num,
                            &s.name,
                            &s.options,
                            majority,
                            s.count_all_voters,
                        )
                        .context(voting_ctx())?;
                    for vote in s.votes.iter() {
                        builder
                            .add_schulze_vote(id, &vote.voter, &vote.ranking)
                            .context(voting_ctx())?;
                    }
                }
            }
        }
    }
    Ok(builder.build())
}

/// Renders a warning with the names of the votings, voters and options.
pub fn render_warning(w: &TabulationWarning, names: &NameIndex) -> String {
    match w {
        TabulationWarning::ValueExceedsCeiling {
            voting,
            voter,
            value,
            ceiling,
        } => format!(
            "Invalid vote for voting {:?}: expected value between 0 and {} but got {} from voter {:?}, not counted",
            names.voting(*voting),
            ceiling,
            value,
            names.voter(*voter)
        ),
        TabulationWarning::InvalidRankingLength {
            voting,
            voter,
            expected,
            got,
        } => format!(
            "Invalid vote for voting {:?}: expected ranking of length {} and got length {} from voter {:?}, not counted",
            names.voting(*voting),
            expected,
            got,
            names.voter(*voter)
        ),
        TabulationWarning::UnexpectedOption {
            voting,
            voter,
            position,
            expected,
            got,
        } => format!(
            "Invalid vote for voting {:?}: expected option {:?} at position {} and got option {:?} from voter {:?}, not counted",
            names.voting(*voting),
            names.option(*expected),
            position + 1,
            names.option(*got),
            names.voter(*voter)
        ),
        TabulationWarning::UnknownVoter { voting, voter } => format!(
            "Invalid vote for voting {:?}: voter {:?} is not in the voter roster, not counted",
            names.voting(*voting),
            names.voter(*voter)
        ),
        TabulationWarning::DuplicateVote { voting, voter } => format!(
            "Invalid vote for voting {:?}: voter {:?} voted more than once, only the first vote is counted",
            names.voting(*voting),
            names.voter(*voter)
        ),
        TabulationWarning::UnknownVoting { voting } => {
            format!("Votes for voting {} which does not exist, not counted", voting)
        }
        TabulationWarning::DuplicateVotingId { voting } => format!(
            "Voting {:?} (id {}) appears more than once",
            names.voting(*voting),
            voting
        ),
    }
}

fn median_to_json(tally: &MedianTally, names: &NameIndex) -> JSMap<String, JSValue> {
    let votes: Vec<JSValue> = tally
        .votes
        .iter()
        .map(|v| {
            json!({
                "voter": names.voter(v.voter),
                "value": v.value,
                "weight": v.weight,
                "synthesized": v.synthesized,
            })
        })
        .collect();
    let mut js: JSMap<String, JSValue> = JSMap::new();
    js.insert("type".to_string(), json!("median"));
    js.insert("value".to_string(), json!(tally.ceiling));
    js.insert("weightSum".to_string(), json!(tally.weight_sum));
    js.insert("threshold".to_string(), json!(tally.majority_threshold));
    js.insert("votes".to_string(), json!(votes));
    js.insert("median".to_string(), json!(tally.median()));
    js.insert("accepted".to_string(), json!(tally.accepts(tally.ceiling)));
    js
}

fn schulze_to_json(tally: &SchulzeTally, names: &NameIndex) -> JSMap<String, JSValue> {
    let option_names: Vec<String> = tally.options.iter().map(|o| names.option(*o)).collect();
    let ranking: Vec<Vec<String>> = tally
        .ranking
        .iter()
        .map(|tier| tier.iter().map(|o| names.option(*o)).collect())
        .collect();
    let mut before_last: Vec<JSValue> = Vec::new();
    for ((name, votes), percent) in option_names
        .iter()
        .zip(tally.votes_before_last())
        .zip(tally.percent_before_last())
    {
        before_last.push(json!({
            "option": name,
            "votes": votes,
            "percent": format!("{:.2}", percent),
        }));
    }
    let passing: Vec<String> = tally
        .options_passing()
        .iter()
        .map(|o| names.option(*o))
        .collect();
    let winners: Vec<String> = tally.winners().iter().map(|o| names.option(*o)).collect();

    let mut js: JSMap<String, JSValue> = JSMap::new();
    js.insert("type".to_string(), json!("schulze"));
    js.insert("options".to_string(), json!(option_names));
    js.insert("weightSum".to_string(), json!(tally.weight_sum));
    js.insert("threshold".to_string(), json!(tally.majority_threshold));
    js.insert("preferences".to_string(), json!(tally.d));
    js.insert("strongestPaths".to_string(), json!(tally.p));
    js.insert("ranking".to_string(), json!(ranking));
    js.insert("winners".to_string(), json!(winners));
    js.insert("votesBeforeLast".to_string(), json!(before_last));
    js.insert("passing".to_string(), json!(passing));
    js
}

pub fn build_summary_js(
    config: &SessionConfig,
    result: &SessionResult,
    names: &NameIndex,
) -> JSValue {
    let mut groups: Vec<JSValue> = Vec::new();
    for group in result.groups.iter() {
        let mut votings: Vec<JSValue> = Vec::new();
        for r in group.votings.iter() {
            let mut js = match &r.outcome {
                VotingOutcome::Median(t) => median_to_json(t, names),
                VotingOutcome::Schulze(t) => schulze_to_json(t, names),
            };
            js.insert("name".to_string(), json!(r.name));
            let warnings: Vec<String> = r
                .warnings
                .iter()
                .map(|w| render_warning(w, names))
                .collect();
            js.insert("warnings".to_string(), json!(warnings));
            votings.push(JSValue::Object(js));
        }
        groups.push(json!({"name": group.name, "votings": votings}));
    }
    let warnings: Vec<String> = result
        .warnings
        .iter()
        .map(|w| render_warning(w, names))
        .collect();
    json!({
        "session": {"name": config.name, "revision": config.revision},
        "groups": groups,
        "warnings": warnings,
    })
}

/// Tabulates a session file and returns its summary.
pub fn tabulate_config(
    config: &SessionConfig,
    roster: Option<&[(String, u64)]>,
) -> TallyResult<JSValue> {
    let (session, ballots, names) = build_session(config, roster)?;
    debug!("tabulate_config: session: {:?}", session);
    let result = tabulate_session(&session, &ballots).context(TabulationSnafu {
        what: format!("session {:?}", config.name),
    })?;
    for w in result.warnings.iter() {
        warn!("tabulate_config: {}", render_warning(w, &names));
    }
    Ok(build_summary_js(config, &result, &names))
}

pub fn run_session(
    config_path: &str,
    voters_path: &Option<String>,
    out: &Option<String>,
    check_summary_path: &Option<String>,
) -> TallyResult<()> {
    let config = read_config(config_path)?;
    info!("run_session: config: {:?}", config);

    let roster = match voters_path {
        Some(p) => Some(io_csv::read_voters(p)?),
        None => None,
    };

    let result_js = tabulate_config(&config, roster.as_deref())?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => {
            info!("run_session: writing summary to {}", path);
            fs::write(path, &pretty_js_stats).context(WritingSummarySnafu { path })?;
        }
        None => debug!("run_session: summary: {}", pretty_js_stats),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}
