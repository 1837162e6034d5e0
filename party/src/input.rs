//! CSV input and output: one `key[,feature...]` record per row.

use eyre::{ensure, Context, Result};
use std::{io, path::Path};

/// Keys in file order and their features, one column per feature.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub keys: Vec<String>,
    pub features: Vec<Vec<i64>>,
}

/// Parse CSV records from `reader`, skipping a header row when `has_header`.
/// Every record must carry the same number of features.
pub fn parse<R: io::Read>(reader: R, has_header: bool) -> Result<Input> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(has_header)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut input = Input::default();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("record {}", i + 1))?;
        let mut fields = record.iter();
        let key = fields.next().unwrap_or_default();
        ensure!(!key.is_empty(), "record {}: empty key", i + 1);
        if input.keys.is_empty() {
            input.features = vec![Vec::new(); record.len().saturating_sub(1)];
        }
        for (col, f) in input.features.iter_mut().zip(fields) {
            let v = f
                .parse::<i64>()
                .with_context(|| format!("record {}: bad feature {:?}", i + 1, f))?;
            col.push(v);
        }
        input.keys.push(key.to_string());
    }
    Ok(input)
}

/// Read and parse a CSV file.
pub fn read<P: AsRef<Path>>(path: P, has_header: bool) -> Result<Input> {
    let path = path.as_ref();
    let file =
        std::fs::File::open(path).with_context(|| format!("reading {}", path.display()))?;
    parse(file, has_header).with_context(|| format!("parsing {}", path.display()))
}

/// Write `rows` as CSV records.
pub fn write<W, I, R, T>(writer: W, rows: I) -> Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = T>,
    T: ToString,
{
    let mut writer = csv::WriterBuilder::new()
        .flexible(false)
        .from_writer(writer);
    for row in rows {
        writer.write_record(row.into_iter().map(|x| x.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_keys_only() {
        let input = parse("a\nb\n c \n".as_bytes(), false).unwrap();
        assert_eq!(input.keys, vec!["a", "b", "c"]);
        assert!(input.features.is_empty());
    }

    #[test]
    fn test_features_are_columns() {
        let input = parse("1,10,-1\n2, 20, -2\n".as_bytes(), false).unwrap();
        assert_eq!(input.keys, vec!["1", "2"]);
        assert_eq!(input.features, vec![vec![10, 20], vec![-1, -2]]);
    }

    #[test]
    fn test_quoted_keys() {
        let input = parse("\"acme, inc\",5\n\"x\"\"y\",6\n".as_bytes(), false).unwrap();
        assert_eq!(input.keys, vec!["acme, inc", "x\"y"]);
        assert_eq!(input.features, vec![vec![5, 6]]);
    }

    #[test]
    fn test_header_row() {
        let text = "id,spend\nk1,5\nk2,7\n";
        let input = parse(text.as_bytes(), true).unwrap();
        assert_eq!(input.keys, vec!["k1", "k2"]);
        assert_eq!(input.features, vec![vec![5, 7]]);
        assert!(parse(text.as_bytes(), false).is_err());
    }

    #[test]
    fn test_ragged_and_bad_rows() {
        assert!(parse("1,10\n2\n".as_bytes(), false).is_err());
        assert!(parse("1,x\n".as_bytes(), false).is_err());
        assert!(parse(",3\n".as_bytes(), false).is_err());
    }

    #[test]
    fn test_read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "k1,5").unwrap();
        writeln!(file, "k2,7").unwrap();
        let input = read(file.path(), false).unwrap();
        assert_eq!(input.keys, vec!["k1", "k2"]);
        assert_eq!(input.features, vec![vec![5, 7]]);
        assert!(read("/nonexistent/input.csv", false).is_err());
    }

    #[test]
    fn test_write_quotes_when_needed() {
        let mut out = Vec::new();
        write(&mut out, vec![vec!["a,b".to_string()], vec!["c".to_string()]]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"a,b\"\nc\n");
        let mut out = Vec::new();
        write(&mut out, vec![vec![1i64, -2], vec![0, 3]]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,-2\n0,3\n");
    }
}
