//! Shareable query-string encoding of the row set

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::state::{RowSeed, RowSnapshot};

/// Characters left bare by `encodeURIComponent`, which the original share
/// links were produced with
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encode the snapshot as repeated `name=<enc>&time=<enc>` pairs
///
/// Rows with an empty (trimmed) name or duration are skipped entirely; the
/// result is empty when no row qualifies.
pub fn encode(snapshot: &[RowSnapshot]) -> String {
    let mut params = Vec::new();
    for row in snapshot {
        if row.name.trim().is_empty() || row.duration.trim().is_empty() {
            continue;
        }
        params.push(format!("name={}", utf8_percent_encode(&row.name, COMPONENT)));
        params.push(format!("time={}", utf8_percent_encode(&row.duration, COMPONENT)));
    }
    params.join("&")
}

/// Decode one query component, treating `+` as a space like URLSearchParams
fn decode_component(raw: &str) -> String {
    let plus_as_space = raw.replace('+', " ");
    percent_decode_str(&plus_as_space)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or(plus_as_space)
}

/// Decode a query string back into row seeds
///
/// All `name` values and all `time` values are collected in order of
/// appearance. The result is populated only when the two counts match and at
/// least one pair exists; anything else is `None`, and the caller must leave
/// its current rows untouched. Values come back as raw text; validation
/// happens at the start gate, not here.
pub fn decode(query: &str) -> Option<Vec<RowSeed>> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut names = Vec::new();
    let mut times = Vec::new();
    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match decode_component(key).as_str() {
            "name" => names.push(decode_component(value)),
            "time" => times.push(decode_component(value)),
            _ => {}
        }
    }
    if names.is_empty() || names.len() != times.len() {
        return None;
    }
    Some(
        names
            .into_iter()
            .zip(times)
            .map(|(name, duration)| RowSeed { name, duration })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(rows: &[(&str, &str)]) -> Vec<RowSnapshot> {
        rows.iter()
            .map(|(name, duration)| RowSnapshot {
                name: name.to_string(),
                duration: duration.to_string(),
            })
            .collect()
    }

    fn seeds(rows: &[(&str, &str)]) -> Vec<RowSeed> {
        rows.iter()
            .map(|(name, duration)| RowSeed {
                name: name.to_string(),
                duration: duration.to_string(),
            })
            .collect()
    }

    #[test]
    fn encode_emits_pairs_in_row_order() {
        let query = encode(&snap(&[("Tea", "180"), ("Eggs", "300")]));
        assert_eq!(query, "name=Tea&time=180&name=Eggs&time=300");
    }

    #[test]
    fn encode_skips_rows_with_any_empty_field() {
        let query = encode(&snap(&[("Tea", "180"), ("", "10"), ("Eggs", " ")]));
        assert_eq!(query, "name=Tea&time=180");
    }

    #[test]
    fn encode_of_nothing_is_empty() {
        assert_eq!(encode(&snap(&[("", "")])), "");
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn encode_percent_escapes_reserved_characters() {
        let query = encode(&snap(&[("Green Tea & Honey", "90")]));
        assert_eq!(query, "name=Green%20Tea%20%26%20Honey&time=90");
    }

    #[test]
    fn round_trip_is_identity_for_fully_populated_rows() {
        let rows = [("Green Tea", "180"), ("Eggs=Good", "300"), ("拉麵", "240")];
        let decoded = decode(&encode(&snap(&rows))).unwrap();
        assert_eq!(decoded, seeds(&rows));
    }

    #[test]
    fn decode_accepts_a_leading_question_mark() {
        let decoded = decode("?name=Tea&time=180").unwrap();
        assert_eq!(decoded, seeds(&[("Tea", "180")]));
    }

    #[test]
    fn decode_treats_plus_as_space() {
        let decoded = decode("name=Green+Tea&time=180").unwrap();
        assert_eq!(decoded[0].name, "Green Tea");
    }

    #[test]
    fn decode_with_mismatched_counts_is_none() {
        assert_eq!(decode("name=Tea&time=180&name=Eggs"), None);
        assert_eq!(decode("name=Tea"), None);
        assert_eq!(decode("time=180"), None);
    }

    #[test]
    fn decode_with_no_pairs_is_none() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("?"), None);
        assert_eq!(decode("foo=bar"), None);
    }

    #[test]
    fn decode_ignores_unrelated_parameters() {
        let decoded = decode("utm=x&name=Tea&theme=dark&time=180").unwrap();
        assert_eq!(decoded, seeds(&[("Tea", "180")]));
    }

    #[test]
    fn decode_keeps_interleaved_order_by_key() {
        let decoded = decode("name=A&name=B&time=1&time=2").unwrap();
        assert_eq!(decoded, seeds(&[("A", "1"), ("B", "2")]));
    }
}
