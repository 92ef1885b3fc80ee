use clap::Parser;

/// This is a tabulation program for the median and Schulze votings of a session.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the session: voters, groups, votings and votes, in JSON format.
    /// For more information about the file format, read the documentation of the session_voting::manual module.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path, optional) A CSV file with the voter roster (columns name and weight). If provided,
    /// it replaces the voters listed in the session file.
    #[clap(long, value_parser)]
    pub voters: Option<String>,

    /// (file path) A reference file containing the outcome of the session in JSON format. If provided, sessionvote will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the session will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
