use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use tracing::debug;

use crate::error::{MutateError, Result};
use crate::record::{HEADER, Record};

/// Ordered rows of a CSV dataset with the fixed `Name,Age,City` header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load and validate the dataset stored at `path`.
    pub fn read(path: &Utf8Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| MutateError::io(path, source))?;
        Self::from_reader(path, file)
    }

    /// Decode CSV from `reader`. `path` is only used to label errors.
    pub fn from_reader<R: Read>(path: &Utf8Path, mut reader: R) -> Result<Self> {
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(|source| MutateError::io(path, source))?;
        Self::from_bytes(path, &raw)
    }

    fn from_bytes(path: &Utf8Path, raw: &[u8]) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(raw);

        let headers = rdr
            .headers()
            .map_err(|err| MutateError::from_csv(path, err))?
            .clone();
        check_header(path, &headers)?;

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row.map_err(|err| {
                let line = err.position().map(|pos| line_at(raw, pos.byte()));
                MutateError::from_csv(path, err).with_line(line)
            })?;
            let line = row.position().map(|pos| line_at(raw, pos.byte()));
            let record: Record = row
                .deserialize(Some(&headers))
                .map_err(|err| MutateError::corrupt(path, line, err.to_string()))?;
            record
                .validate()
                .map_err(|source| MutateError::corrupt(path, line, source.to_string()))?;
            records.push(record);
        }

        debug!(path = %path, rows = records.len(), "decoded dataset");
        Ok(Self { records })
    }

    /// Serialize header plus every row. Rows end with `\n`; text fields are
    /// quoted only when they contain a delimiter, quote, or newline.
    pub fn encode(&self, path: &Utf8Path) -> Result<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        wtr.write_record(HEADER)
            .map_err(|err| MutateError::from_csv(path, err))?;
        for record in &self.records {
            wtr.serialize(record)
                .map_err(|err| MutateError::from_csv(path, err))?;
        }

        wtr.into_inner()
            .map_err(|err| MutateError::io(path, err.into_error()))
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fixed-width table for terminal output.
    pub fn render_table(&self) -> String {
        let age_cells: Vec<String> = self.records.iter().map(|r| r.age.to_string()).collect();
        let index_width = self.records.len().saturating_sub(1).to_string().len();
        let name_width = column_width(HEADER[0], self.records.iter().map(|r| r.name.as_str()));
        let age_width = column_width(HEADER[1], age_cells.iter().map(String::as_str));
        let city_width = column_width(HEADER[2], self.records.iter().map(|r| r.city.as_str()));

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:index_width$}  {:<name_width$}  {:>age_width$}  {:<city_width$}",
            "", HEADER[0], HEADER[1], HEADER[2]
        );
        for (idx, (record, age)) in self.records.iter().zip(&age_cells).enumerate() {
            let _ = writeln!(
                out,
                "{:>index_width$}  {:<name_width$}  {:>age_width$}  {:<city_width$}",
                idx, record.name, age, record.city
            );
        }
        out
    }
}

fn check_header(path: &Utf8Path, headers: &csv::StringRecord) -> Result<()> {
    if headers.iter().eq(HEADER.iter().copied()) {
        return Ok(());
    }
    Err(MutateError::SchemaMismatch {
        path: path.to_owned(),
        found: headers.iter().map(str::to_owned).collect(),
    })
}

/// 1-based physical line of the row whose read began at byte `offset`.
/// The reader records the offset before skipping blank lines, so those are
/// stepped over here.
fn line_at(raw: &[u8], offset: u64) -> u64 {
    let start = usize::try_from(offset).map_or(raw.len(), |o| o.min(raw.len()));
    let blank = raw[start..]
        .iter()
        .take_while(|b| matches!(b, b'\r' | b'\n'))
        .count();
    let newlines = raw[..start + blank].iter().filter(|&&b| b == b'\n').count();
    newlines as u64 + 1
}

fn column_width<'a>(header: &str, cells: impl Iterator<Item = &'a str>) -> usize {
    cells
        .map(|cell| cell.chars().count())
        .chain(std::iter::once(header.chars().count()))
        .max()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::record::default_seed;

    fn decode(input: &str) -> Result<Dataset> {
        Dataset::from_reader(Utf8Path::new("mem.csv"), input.as_bytes())
    }

    #[test]
    fn encodes_header_and_rows_in_order() {
        let dataset = Dataset::from_records(default_seed());
        let bytes = dataset.encode(Utf8Path::new("mem.csv")).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Name,Age,City\nAlice,25,New York\nBob,30,Los Angeles\nCharlie,35,Chicago\n"
        );
    }

    #[test]
    fn empty_dataset_still_writes_header() {
        let bytes = Dataset::default().encode(Utf8Path::new("mem.csv")).unwrap();
        assert_eq!(bytes, b"Name,Age,City\n");
    }

    #[test]
    fn quotes_only_fields_that_need_it() {
        let dataset = Dataset::from_records(vec![Record::new("Doe, Jane", 41, "Washington \"DC\"")]);
        let text = String::from_utf8(dataset.encode(Utf8Path::new("mem.csv")).unwrap()).unwrap();
        assert_eq!(text, "Name,Age,City\n\"Doe, Jane\",41,\"Washington \"\"DC\"\"\"\n");

        let back = decode(&text).unwrap();
        assert_eq!(back.records(), dataset.records());
    }

    #[test]
    fn decodes_crlf_files() {
        let dataset = decode("Name,Age,City\r\nAlice,25,New York\r\n").unwrap();
        assert_eq!(dataset.records(), &[Record::new("Alice", 25, "New York")]);
    }

    #[test]
    fn header_only_file_is_an_empty_dataset() {
        let dataset = decode("Name,Age,City\n").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn reordered_columns_are_a_schema_mismatch() {
        let err = decode("Name,City,Age\nAlice,New York,25\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        match err {
            MutateError::SchemaMismatch { found, .. } => assert_eq!(found, ["Name", "City", "Age"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn extra_column_is_a_schema_mismatch() {
        let err = decode("Name,Age,City,Email\nAlice,25,NY,a@x\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn empty_file_is_a_schema_mismatch() {
        let err = decode("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn non_integer_age_is_a_corrupt_row() {
        let err = decode("Name,Age,City\nAlice,twenty,NY\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptRow);
    }

    #[test]
    fn short_row_is_a_corrupt_row() {
        let err = decode("Name,Age,City\nAlice,25\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptRow);
    }

    #[test]
    fn constraint_violation_reports_line() {
        let err = decode("Name,Age,City\nAlice,25,NY\nBob,-3,LA\n").unwrap_err();
        match err {
            MutateError::CorruptRow { line, .. } => assert_eq!(line, Some(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn corrupt_row_line_counts_quoted_newlines_and_blank_lines() {
        let input = "Name,Age,City\n\"Multi\nLine\",25,NY\n\nBob,-3,LA\n";
        let err = decode(input).unwrap_err();
        match err {
            MutateError::CorruptRow { line, .. } => assert_eq!(line, Some(5)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undecodable_age_reports_its_line() {
        let err = decode("Name,Age,City\n\nAlice,old,NY\n").unwrap_err();
        match err {
            MutateError::CorruptRow { line, .. } => assert_eq!(line, Some(3)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_row_after_blank_line_reports_its_line() {
        let err = decode("Name,Age,City\nAlice,25,NY\n\nBob,30\n").unwrap_err();
        match err {
            MutateError::CorruptRow { line, .. } => assert_eq!(line, Some(4)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn table_aligns_columns() {
        let table = Dataset::from_records(default_seed()).render_table();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "   Name     Age  City       ");
        assert_eq!(lines[1], "0  Alice     25  New York   ");
        assert_eq!(lines[3], "2  Charlie   35  Chicago    ");
    }
}
