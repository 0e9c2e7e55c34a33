/// Score how well `pattern` matches `haystack`, or `None` if some pattern
/// character never appears in order.
///
/// Spaces on either side are skipped. Consecutive matches earn a growing
/// bonus, every skipped haystack character costs 10, a case-only match
/// costs 1 and each unmatched trailing character costs 1. Higher is better.
pub fn fuzzy_match(haystack: &str, pattern: &str) -> Option<i64> {
    let hay: Vec<char> = haystack.chars().collect();
    let pat: Vec<char> = pattern.chars().collect();
    let (mut i, mut j) = (0, 0);
    let mut score: i64 = 0;
    let mut run: i64 = 0;

    while i < hay.len() && j < pat.len() {
        while i < hay.len() && hay[i] == ' ' {
            i += 1;
        }
        while j < pat.len() && pat[j] == ' ' {
            j += 1;
        }
        let (Some(&h), Some(&p)) = (hay.get(i), pat.get(j)) else {
            break;
        };

        if h.to_ascii_lowercase() == p.to_ascii_lowercase() {
            score += run * 10 - i64::from(h != p);
            run += 1;
            j += 1;
        } else {
            score -= 10;
            run = 0;
        }
        i += 1;
    }

    if pat[j..].iter().any(|&c| c != ' ') {
        return None;
    }
    Some(score - (hay.len() - i) as i64)
}
