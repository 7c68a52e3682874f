// Writer. The inverse of the scanner: makes round-tripping checkable as
// `parse(write(rows)) == rows` under the configured dialect.

use std::io::{self, Write};

use crate::dialect::{Dialect, WriteTerminator};

/// True iff `field` needs quoting under RFC 4180: it contains the
/// delimiter, the quote character, LF, CR, or has leading/trailing
/// whitespace.
pub fn needs_quoting(field: &[u8], dialect: &Dialect) -> bool {
    if field.is_empty() {
        return false;
    }
    if field.first() == Some(&b' ') || field.first() == Some(&b'\t') {
        return true;
    }
    if field.last() == Some(&b' ') || field.last() == Some(&b'\t') {
        return true;
    }
    field.iter().any(|&b| {
        b == dialect.delimiter || b == dialect.quote || b == b'\n' || b == b'\r'
    })
}

/// Write one field, quoting it iff required and doubling any internal
/// quote bytes.
pub fn write_field<W: Write>(out: &mut W, field: &[u8], dialect: &Dialect) -> io::Result<()> {
    if needs_quoting(field, dialect) {
        out.write_all(&[dialect.quote])?;
        for &b in field {
            if b == dialect.quote {
                out.write_all(&[dialect.quote, dialect.quote])?;
            } else {
                out.write_all(&[b])?;
            }
        }
        out.write_all(&[dialect.quote])?;
    } else {
        out.write_all(field)?;
    }
    Ok(())
}

fn terminator_bytes(terminator: WriteTerminator) -> &'static [u8] {
    match terminator {
        WriteTerminator::Crlf => b"\r\n",
        WriteTerminator::Lf => b"\n",
    }
}

/// Write one row of already-raw (unquoted) field byte slices.
pub fn write_row<W: Write>(
    out: &mut W,
    fields: &[&[u8]],
    dialect: &Dialect,
    terminator: WriteTerminator,
) -> io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.write_all(&[dialect.delimiter])?;
        }
        write_field(out, field, dialect)?;
    }
    out.write_all(terminator_bytes(terminator))
}

/// Write every row in `rows`, in order.
pub fn write_rows<W: Write>(
    out: &mut W,
    rows: &[Vec<&[u8]>],
    dialect: &Dialect,
    terminator: WriteTerminator,
) -> io::Result<()> {
    for row in rows {
        write_row(out, row, dialect, terminator)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> Dialect {
        Dialect::csv()
    }

    #[test]
    fn quotes_field_containing_delimiter() {
        let mut out = Vec::new();
        write_field(&mut out, b"Doe, Jane", &dialect()).unwrap();
        assert_eq!(out, b"\"Doe, Jane\"");
    }

    #[test]
    fn doubles_internal_quotes() {
        let mut out = Vec::new();
        write_field(&mut out, b"She said \"hi\"", &dialect()).unwrap();
        assert_eq!(out, b"\"She said \"\"hi\"\"\"");
    }

    #[test]
    fn leaves_plain_fields_unquoted() {
        let mut out = Vec::new();
        write_field(&mut out, b"Alice", &dialect()).unwrap();
        assert_eq!(out, b"Alice");
    }

    #[test]
    fn quotes_leading_or_trailing_whitespace() {
        let mut out = Vec::new();
        write_field(&mut out, b" Alice", &dialect()).unwrap();
        assert_eq!(out, b"\" Alice\"");
    }

    #[test]
    fn default_terminator_is_crlf() {
        let mut out = Vec::new();
        write_row(&mut out, &[b"a", b"b"], &dialect(), WriteTerminator::Crlf).unwrap();
        assert_eq!(out, b"a,b\r\n");
    }

    #[test]
    fn overridable_to_lf() {
        let mut out = Vec::new();
        write_row(&mut out, &[b"a", b"b"], &dialect(), WriteTerminator::Lf).unwrap();
        assert_eq!(out, b"a,b\n");
    }
}
