//! Scrubs filesystem paths out of text before it leaves the trust boundary.

/// Marker substituted for every redacted path token.
pub const PATH_MARKER: &str = "[PATH]";

/// Replace every absolute-path-shaped token in `text` with [`PATH_MARKER`].
///
/// A path token is a maximal run of non-whitespace characters whose first
/// character is `/`. The match is deliberately coarse: URL path segments and
/// other slash-leading tokens are redacted too. Error messages and stderr
/// routinely echo home directories and internal layout, and over-redacting
/// is the safe side of that trade.
pub fn redact(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        // Copy the whitespace run, if any, then inspect the next token.
        let token_start = rest
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(rest.len());
        out.push_str(&rest[..token_start]);
        rest = &rest[token_start..];
        if rest.is_empty() {
            break;
        }

        let token_end = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        let token = &rest[..token_end];
        if token.starts_with('/') {
            out.push_str(PATH_MARKER);
        } else {
            out.push_str(token);
        }
        rest = &rest[token_end..];
    }

    out
}
