/// Markers removed before fuzzy comparison. Italic tags go first so the
/// punctuation pass cannot split them.
const STRIPPED_MARKERS: [&str; 9] = ["</i>", "<i>", ".", ",", "!", "-", ":", "\"", "?"];

/// Turn raw cue text into a comparison-friendly string
pub fn normalize(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in STRIPPED_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }

    cleaned.to_lowercase().trim().to_string()
}

/// Normalize the text lines of a single cue as one string
pub fn normalize_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let joined = lines
        .iter()
        .map(|line| line.as_ref())
        .collect::<Vec<_>>()
        .join(" ");

    normalize(&joined)
}
