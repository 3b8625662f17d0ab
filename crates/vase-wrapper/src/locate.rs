//! Location Extractor (C4, spec.md §4.4): maps a solver query to a site
//! key by scanning textual renderings of its constraints and goal.

use std::sync::LazyLock;

use regex::Regex;
use vase_core::SiteKey;

static SITE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"loc:(\d+)(?::branch:([01]))?").expect("static pattern is valid"));

/// Scans `texts` in order for the first `loc:<N>[:branch:<B>]` match and
/// returns the corresponding site key. Returns the sentinel `loc:0` if
/// nothing matches (spec.md §4.4).
pub fn extract_site_key<S: AsRef<str>>(texts: impl Iterator<Item = S>) -> SiteKey {
    for text in texts {
        if let Some(caps) = SITE_PATTERN.captures(text.as_ref()) {
            let loc: u64 = caps[1].parse().expect("regex only captures digits");
            return match caps.get(2) {
                Some(branch) => SiteKey::from_loc_branch(loc, branch.as_str().parse().expect("regex only captures 0 or 1")),
                None => SiteKey::bare(loc),
            };
        }
    }
    SiteKey::sentinel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_branch_form() {
        let texts = ["unrelated", "tag: loc:7:branch:1 trailing"];
        assert_eq!(extract_site_key(texts.into_iter()), SiteKey::from_loc_branch(7, 1));
    }

    #[test]
    fn extracts_bare_form() {
        let texts = ["loc:42 is the site"];
        assert_eq!(extract_site_key(texts.into_iter()), SiteKey::bare(42));
    }

    #[test]
    fn falls_back_to_sentinel_when_nothing_matches() {
        let texts = ["no site tag here", "(a == b)"];
        assert_eq!(extract_site_key(texts.into_iter()), SiteKey::sentinel());
    }

    #[test]
    fn first_match_wins() {
        let texts = ["loc:1", "loc:2"];
        assert_eq!(extract_site_key(texts.into_iter()), SiteKey::bare(1));
    }

    #[test]
    fn ignores_out_of_range_branch_suffix() {
        // `loc:5:branch:9` doesn't match the optional group at all, so
        // the whole pattern still matches on the bare `loc:5` prefix.
        let texts = ["loc:5:branch:9"];
        assert_eq!(extract_site_key(texts.into_iter()), SiteKey::bare(5));
    }
}
