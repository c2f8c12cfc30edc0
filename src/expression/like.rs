//! SQL LIKE matching: `%` matches any run of characters, `_` exactly one.

pub(crate) fn like_match(value: &str, pattern: &str) -> bool {
    let text: Vec<char> = value.chars().collect();
    let pat: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    // Position of the last `%` seen and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pat.len() && (pat[p] == '_' || (pat[p] != '%' && pat[p] == text[t])) {
            t += 1;
            p += 1;
        } else if p < pat.len() && pat[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, tried)) = backtrack {
            p = star + 1;
            t = tried + 1;
            backtrack = Some((star, tried + 1));
        } else {
            return false;
        }
    }
    pat[p..].iter().all(|c| *c == '%')
}
