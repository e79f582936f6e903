use csv::{Position, ReaderBuilder, StringRecord, StringRecordsIntoIter};
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::ParseError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column names of an uploaded CSV, indexed by name.
///
/// Names are trimmed and lower-cased so `Idea_Title ` and `idea_title` address
/// the same column. When a name repeats, the first column wins.
#[derive(Debug)]
pub struct Headers {
    names: Vec<String>,
    title_to_index: HashMap<String, usize>,
}

impl Headers {
    fn from_record(record: &StringRecord) -> Self {
        let names: Vec<String> = record.iter().map(normalize_header).collect();
        let mut title_to_index = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            title_to_index.entry(name.clone()).or_insert(i);
        }
        Headers {
            names,
            title_to_index,
        }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.title_to_index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn len(&self) -> usize {
        self.names.len()
    }

    fn is_blank(&self) -> bool {
        self.names.iter().all(|n| n.is_empty())
    }
}

fn normalize_header(cell: &str) -> String {
    cell.trim_start_matches('\u{FEFF}').trim().to_lowercase()
}

/// One data record keyed by column name.
///
/// Short records are padded with empty strings; fields past the last header
/// are dropped.
#[derive(Debug, Clone)]
pub struct RawRow {
    number: usize,
    headers: Rc<Headers>,
    values: Vec<String>,
}

impl RawRow {
    fn new(number: usize, headers: Rc<Headers>, record: &StringRecord) -> Self {
        let values = (0..headers.len())
            .map(|i| record.get(i).unwrap_or("").to_string())
            .collect();
        RawRow {
            number,
            headers,
            values,
        }
    }

    /// 1-based position among the data records of the file.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Raw value of `column`, or `""` when the file has no such column.
    pub fn get(&self, column: &str) -> &str {
        self.headers
            .position(column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

/// A record the CSV reader could not decode.
#[derive(Debug)]
pub struct UnreadableRow {
    pub number: usize,
    pub reason: String,
}

/// Single-pass iterator over the data records of an upload.
///
/// Row numbers count file lines after the header, so empty lines and
/// blank records the iterator skips still move later numbers along.
pub struct CsvRows<'a> {
    headers: Rc<Headers>,
    records: StringRecordsIntoIter<&'a [u8]>,
    lines: LineCounter<'a>,
    first_data_line: usize,
    row_number: usize,
}

/// Maps byte offsets of `content` to 1-based line numbers. Offsets are
/// expected in increasing order, as the reader hands them out.
struct LineCounter<'a> {
    content: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(content: &'a [u8]) -> Self {
        LineCounter {
            content,
            offset: 0,
            line: 1,
        }
    }

    /// Line of the first byte at or after `byte` that is not a line break.
    /// The reader reports a record's position before it skips empty lines.
    fn line_of(&mut self, byte: u64) -> usize {
        let mut start = (byte as usize).min(self.content.len());
        while matches!(self.content.get(start), Some(b'\r' | b'\n')) {
            start += 1;
        }
        if start < self.offset {
            self.offset = 0;
            self.line = 1;
        }
        self.line += self.content[self.offset..start]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.offset = start;
        self.line
    }
}

impl CsvRows<'_> {
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Data line of a record starting at `position`. Falls back to the next
    /// number in sequence when the reader gives no position.
    fn number_at(&mut self, position: Option<&Position>) -> usize {
        match position {
            Some(p) => {
                let line = self.lines.line_of(p.byte());
                line.saturating_sub(self.first_data_line) + 1
            }
            None => self.row_number + 1,
        }
    }
}

impl Iterator for CsvRows<'_> {
    type Item = Result<RawRow, UnreadableRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = self.records.next()?;
            let number = match &record {
                Ok(record) => self.number_at(record.position()),
                Err(e) => self.number_at(e.position()),
            };
            self.row_number = number;

            match record {
                Ok(record) => {
                    let row = RawRow::new(number, Rc::clone(&self.headers), &record);
                    if row.is_blank() {
                        debug!("Skipping blank row {}", number);
                        continue;
                    }
                    return Some(Ok(row));
                }
                Err(e) => {
                    return Some(Err(UnreadableRow {
                        number,
                        reason: e.to_string(),
                    }))
                }
            }
        }
    }
}

/// Reads the header of `content` and returns an iterator over its rows.
///
/// Quoted fields may hold commas, line breaks and doubled quotes. Only an
/// empty file or a file without a header line is an error here; problems in
/// individual records surface through the iterator.
pub fn parse_csv(content: &[u8]) -> Result<CsvRows<'_>, ParseError> {
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
    if content.iter().all(u8::is_ascii_whitespace) {
        return Err(ParseError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let headers = Headers::from_record(reader.headers()?);
    if headers.is_blank() {
        return Err(ParseError::MissingHeader);
    }
    // The line after the header, whether or not it is empty. A CRLF header
    // may stop between its `\r` and `\n`.
    let mut header_end = reader.position().byte() as usize;
    if header_end > 0
        && content.get(header_end - 1) == Some(&b'\r')
        && content.get(header_end) == Some(&b'\n')
    {
        header_end += 1;
    }
    let first_data_line = 1 + content[..header_end.min(content.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count();

    Ok(CsvRows {
        headers: Rc::new(headers),
        records: reader.into_records(),
        lines: LineCounter::new(content),
        first_data_line,
        row_number: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(content: &str) -> Vec<RawRow> {
        parse_csv(content.as_bytes())
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn quoted_fields_keep_commas_newlines_and_quotes() {
        let csv = "idea_title,idea_description\n\
                   \"Lunch, revisited\",\"Line one\nLine two with \"\"quotes\"\"\"\n";
        let rows = rows(csv);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("idea_title"), "Lunch, revisited");
        assert_eq!(
            rows[0].get("idea_description"),
            "Line one\nLine two with \"quotes\""
        );
    }

    #[test]
    fn short_rows_pad_and_long_rows_truncate() {
        let rows = rows("a,b,c\n1\n1,2,3,4,5\n");

        assert_eq!(rows[0].get("b"), "");
        assert_eq!(rows[0].get("c"), "");
        let values: Vec<_> = rows[1].iter().collect();
        assert_eq!(values, vec![("a", "1"), ("b", "2"), ("c", "3")]);
    }

    #[test]
    fn headers_are_looked_up_by_name() {
        let rows = rows(" Tags ,IDEA_TITLE\nTech,Robots\n");

        assert_eq!(rows[0].get("idea_title"), "Robots");
        assert_eq!(rows[0].get("tags"), "Tech");
        assert_eq!(rows[0].get("interviewees"), "");
    }

    #[test]
    fn blank_records_are_skipped_but_still_numbered() {
        let rows = rows("idea_title,tags\nFirst,\n,\n , \nFourth,x\n");

        let numbers: Vec<_> = rows.iter().map(RawRow::number).collect();
        assert_eq!(numbers, vec![1, 4]);
    }

    #[test]
    fn empty_lines_count_toward_row_numbers() {
        let with_comma = rows("idea_title,tags\nA,x\n,\nB,x\n,no title\n");
        let with_empty = rows("idea_title,tags\nA,x\n\nB,x\n,no title\n");

        let numbers = |rows: &[RawRow]| rows.iter().map(RawRow::number).collect::<Vec<_>>();
        assert_eq!(numbers(&with_comma), vec![1, 3, 4]);
        assert_eq!(numbers(&with_empty), vec![1, 3, 4]);

        let leading_gap = rows("idea_title\n\n\nC\n");
        assert_eq!(numbers(&leading_gap), vec![3]);
    }

    #[test]
    fn quoted_line_breaks_and_crlf_keep_numbers_on_file_lines() {
        let rows = rows("idea_title,idea_description\r\nA,\"two\r\nlines\"\r\n\r\nB,x\r\n");
        let numbers: Vec<_> = rows.iter().map(RawRow::number).collect();
        assert_eq!(numbers, vec![1, 4]);
    }

    #[test]
    fn strips_byte_order_mark_and_handles_unicode() {
        let rows = rows("\u{FEFF}idea_title\nCafé über naïve 🎙️\n");
        assert_eq!(rows[0].get("idea_title"), "Café über naïve 🎙️");
    }

    #[test]
    fn empty_input_is_fatal() {
        assert!(matches!(parse_csv(b""), Err(ParseError::Empty)));
        assert!(matches!(parse_csv(b" \r\n\n"), Err(ParseError::Empty)));
    }

    #[test]
    fn blank_header_is_fatal() {
        assert!(matches!(
            parse_csv(b" , ,\nvalue\n"),
            Err(ParseError::MissingHeader)
        ));
    }

    #[test]
    fn undecodable_record_is_reported_not_fatal() {
        let mut content = b"idea_title\nok\n".to_vec();
        content.extend_from_slice(b"bad \xFF\xFE\n");
        content.extend_from_slice(b"also ok\n");

        let results: Vec<_> = parse_csv(&content).unwrap().collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.number, 2);
        assert_eq!(results[2].as_ref().unwrap().get("idea_title"), "also ok");
    }
}
