// Reading the voter roster from CSV files.

use std::io::Read;

use crate::tally::*;

/// Reads a roster with a header row and the columns `name` and `weight`.
pub fn read_voters(path: &str) -> TallyResult<Vec<(String, u64)>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    parse_voters(rdr)
}

pub fn parse_voters<R: Read>(rdr: csv::Reader<R>) -> TallyResult<Vec<(String, u64)>> {
    let mut res: Vec<(String, u64)> = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        // The header is on the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        debug!("parse_voters: lineno: {:?} row: {:?}", lineno, line);
        let name = line.get(0).context(CsvLineTooShortSnafu { lineno })?;
        let weight_s = line.get(1).context(CsvLineTooShortSnafu { lineno })?;
        let weight = weight_s.parse::<u64>().context(CsvWeightSnafu {
            lineno,
            weight: weight_s,
        })?;
        res.push((name.to_string(), weight));
    }
    info!("parse_voters: read {} voters", res.len());
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn roster() {
        let voters = parse_voters(reader("name,weight\nAnna, 3\nBob,1\n")).unwrap();
        assert_eq!(
            voters,
            vec![("Anna".to_string(), 3), ("Bob".to_string(), 1)]
        );
    }

    #[test]
    fn invalid_weight() {
        let res = parse_voters(reader("name,weight\nAnna,3\nBob,many\n"));
        assert!(matches!(res, Err(SessionError::CsvWeight { lineno: 3, .. })));
    }

    #[test]
    fn short_line() {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader("name,weight\nAnna\n".as_bytes());
        let res = parse_voters(rdr);
        assert!(matches!(
            res,
            Err(SessionError::CsvLineTooShort { lineno: 2 })
        ));
    }
}
