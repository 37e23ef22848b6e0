//! Two-column CSV export of matchings and signatures.

use crate::extract::Matching;
use crate::lexi::RankSignature;
use std::io::{self, Write};

/// Writes `Resident,Hospital` rows.
///
/// Sentinel rows are written only when `include_sentinel` is set.
pub fn write_matching_csv<W: Write>(
    matching: &Matching,
    mut out: W,
    include_sentinel: bool,
) -> io::Result<()> {
    write_row(&mut out, "Resident", "Hospital")?;
    for (agent, slot) in matching.rows(include_sentinel) {
        write_row(&mut out, agent, slot)?;
    }
    out.flush()
}

/// Writes `Rank,Count` rows for ranks `1..=max_rank`, then `Total,K`.
pub fn write_signature_csv<W: Write>(signature: &RankSignature, mut out: W) -> io::Result<()> {
    write_row(&mut out, "Rank", "Count")?;
    for (rank, count) in signature.iter() {
        write_row(&mut out, &rank.to_string(), &count.to_string())?;
    }
    write_row(&mut out, "Total", &signature.total().to_string())?;
    out.flush()
}

/// Writes any serializable outcome as pretty JSON.
#[cfg(feature = "serde")]
pub fn write_json<W: Write, T: serde::Serialize>(value: &T, out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(out, value).map_err(io::Error::other)
}

fn write_row<W: Write>(out: &mut W, first: &str, second: &str) -> io::Result<()> {
    writeln!(out, "{},{}", escape(first), escape(second))
}

fn escape(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}
