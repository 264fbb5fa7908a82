//! PGN helpers: tag stripping for the move-list display and SAN extraction
//! for the replay view.

use regex::Regex;

/// Drop bracketed tag lines (`[White "..."]`) and surrounding blank lines,
/// leaving only the movetext.
pub fn strip_tags(pgn: &str) -> String {
    pgn.lines()
        .filter(|line| {
            let line = line.trim();
            !(line.starts_with('[') && line.ends_with(']'))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
pub fn extract_moves(pgn: &str) -> Vec<String> {
    try_extract_moves(pgn).unwrap_or_default()
}

fn try_extract_moves(pgn: &str) -> Option<Vec<String>> {
    let header_re = Regex::new(r"\[[^\]]*\]").ok()?;
    let no_headers = header_re.replace_all(pgn, "");

    let comment_re = Regex::new(r"\{[^}]*\}").ok()?;
    let no_comments = comment_re.replace_all(&no_headers, "");

    let variation_re = Regex::new(r"\([^)]*\)").ok()?;
    let no_variations = variation_re.replace_all(&no_comments, "");

    let move_re =
        Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O").ok()?;

    Some(
        move_re
            .find_iter(&no_variations)
            .map(|m| m.as_str().to_string())
            .collect(),
    )
}
