//! Plain text trace format.
//!
//! One record per line, e.g. `0x00400008 W`.
//! Addresses are upper case hex, zero padded to 8 digits, so at most 32 bits wide.

use crate::layout::AddressLayout;
use crate::{address, Error};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{BufRead, Write};
use std::str::FromStr;
use trace_model::{Operation, TraceRecord};

/// Widest address the text format can hold.
pub const TRACE_ADDRESS_BITS: u32 = 32;

const MAX_TRACE_ADDRESS: address = (1 << TRACE_ADDRESS_BITS) - 1;

static TRACE_LINE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*0[xX](?P<addr>[0-9a-fA-F]+)\s+(?P<op>\S+)\s*$").unwrap());

/// Writes a single trace line.
///
/// # Errors
/// `AddressTooWide` if the address needs more than 32 bits.
pub fn write_record(mut out: impl Write, record: &TraceRecord) -> Result<(), Error> {
    if record.address > MAX_TRACE_ADDRESS {
        return Err(Error::AddressTooWide {
            address: record.address,
            limit: TRACE_ADDRESS_BITS,
        });
    }
    writeln!(out, "{record}")?;
    Ok(())
}

/// Streams records into a sink.
#[derive(Debug)]
pub struct TraceWriter<W> {
    out: W,
    records: u64,
}

impl<W> TraceWriter<W>
where
    W: Write,
{
    pub fn new(out: W) -> Self {
        Self { out, records: 0 }
    }

    /// Creates a writer for addresses packed with `layout`.
    ///
    /// Layouts wider than the text format are rejected up front instead of
    /// truncating addresses in the output.
    pub fn for_layout(layout: &AddressLayout, out: W) -> Result<Self, Error> {
        let total_bits = layout.total_bits();
        if total_bits > TRACE_ADDRESS_BITS {
            return Err(Error::LayoutTooWide {
                total_bits,
                limit: TRACE_ADDRESS_BITS,
            });
        }
        Ok(Self::new(out))
    }

    pub fn write(&mut self, record: &TraceRecord) -> Result<(), Error> {
        write_record(&mut self.out, record)?;
        self.records += 1;
        Ok(())
    }

    pub fn write_all<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a TraceRecord>,
    ) -> Result<(), Error> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    /// Number of records written so far.
    #[must_use]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flushes the sink and returns the number of records written.
    pub fn finish(mut self) -> Result<u64, Error> {
        self.out.flush()?;
        Ok(self.records)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[inline]
fn bad_line(line: &str, reason: impl Into<String>) -> Error {
    Error::Parse {
        line: line.to_string(),
        reason: reason.into(),
    }
}

/// Parses a single trace line.
pub fn parse_record(line: &str) -> Result<TraceRecord, Error> {
    let captures = TRACE_LINE_REGEX
        .captures(line)
        .ok_or_else(|| bad_line(line, "expected \"0x<ADDRESS> <W|R>\""))?;

    let raw_addr = &captures["addr"];
    let address = address::from_str_radix(raw_addr, 16)
        .map_err(|err| bad_line(line, format!("bad address {raw_addr:?}: {err}")))?;

    let raw_op = &captures["op"];
    let operation = Operation::from_str(raw_op)
        .map_err(|_| bad_line(line, format!("unknown operation {raw_op:?}")))?;

    Ok(TraceRecord { address, operation })
}

/// Lazily parses all records of a trace, skipping blank lines.
pub fn read_trace(reader: impl BufRead) -> impl Iterator<Item = Result<TraceRecord, Error>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(parse_record(&line)),
        Err(err) => Some(Err(err.into())),
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_record, read_trace, write_record, TraceWriter};
    use crate::layout::AddressLayout;
    use crate::Error;
    use color_eyre::eyre;
    use similar_asserts as diff;
    use trace_model::TraceRecord;

    fn written(records: &[TraceRecord]) -> eyre::Result<String> {
        let mut writer = TraceWriter::new(std::io::Cursor::new(Vec::new()));
        writer.write_all(records)?;
        diff::assert_eq!(have: writer.records(), want: records.len() as u64);
        let buf = writer.into_inner().into_inner();
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn test_write_records() -> eyre::Result<()> {
        let have = written(&[
            TraceRecord::write(0x0000_0000),
            TraceRecord::read(0x0000_0008),
            TraceRecord::write(0x0040_0000),
            TraceRecord::read(0xFFFF_FFF8),
        ])?;
        let want = indoc::indoc! {"
            0x00000000 W
            0x00000008 R
            0x00400000 W
            0xFFFFFFF8 R
        "};
        diff::assert_eq!(have: have, want: want);
        Ok(())
    }

    #[test]
    fn test_write_rejects_wide_address() {
        let mut out = Vec::new();
        let err = write_record(&mut out, &TraceRecord::write(0x1_0000_0000)).unwrap_err();
        assert!(matches!(
            err,
            Error::AddressTooWide {
                address: 0x1_0000_0000,
                limit: 32
            }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_writer_rejects_wide_layout() -> eyre::Result<()> {
        let layout = AddressLayout::new(3, 10, 2, 1, 17)?;
        let err = TraceWriter::for_layout(&layout, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::LayoutTooWide {
                total_bits: 33,
                limit: 32
            }
        ));
        assert!(TraceWriter::for_layout(&AddressLayout::default(), Vec::new()).is_ok());
        Ok(())
    }

    #[test]
    fn test_parse_record() -> eyre::Result<()> {
        diff::assert_eq!(have: parse_record("0x00400008 W")?, want: TraceRecord::write(0x0040_0008));
        diff::assert_eq!(have: parse_record("  0xdeadbeef   R \n")?, want: TraceRecord::read(0xDEAD_BEEF));
        diff::assert_eq!(have: parse_record("0X10 R")?, want: TraceRecord::read(0x10));

        for bad in ["", "0x10", "10 W", "0x10 X", "0xZZ W", "0x10000000000000000 W"] {
            let err = parse_record(bad).unwrap_err();
            assert!(matches!(err, Error::Parse { .. }), "{bad:?}: {err:?}");
        }
        Ok(())
    }

    #[test]
    fn test_read_trace_skips_blank_lines() -> eyre::Result<()> {
        let trace = "0x00000000 W\n\n0x00000000 R\n   \n0x00000008 W\n";
        let have = read_trace(trace.as_bytes()).collect::<Result<Vec<_>, _>>()?;
        diff::assert_eq!(
            have: have,
            want: vec![
                TraceRecord::write(0),
                TraceRecord::read(0),
                TraceRecord::write(8)
            ]
        );

        let mut records = read_trace("0x0 W\nbogus\n".as_bytes());
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().unwrap().is_err());
        assert!(records.next().is_none());
        Ok(())
    }

    #[test]
    fn test_write_then_parse_trace() -> eyre::Result<()> {
        let records = vec![TraceRecord::write(0x1234_5678), TraceRecord::read(0x8)];
        let text = written(&records)?;
        let parsed = read_trace(text.as_bytes()).collect::<Result<Vec<_>, _>>()?;
        diff::assert_eq!(have: parsed, want: records);
        Ok(())
    }
}
