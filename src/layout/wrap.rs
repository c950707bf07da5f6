/// Greedily wrap `text` into lines no wider than `max_width`.
///
/// `\n` always starts a new line; an empty paragraph yields an empty line. Inside a paragraph,
/// words are separated by spaces and runs of spaces collapse. A word is appended to the current
/// line while `measure("<line> <word> ")` stays within `max_width`; otherwise the line is
/// committed and the word starts the next one. A single word wider than `max_width` is emitted
/// unsplit on its own line.
pub fn wrap_lines<F>(text: &str, max_width: f32, mut measure: F) -> Vec<String>
where
    F: FnMut(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut candidate = String::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        let mut line = String::new();

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }

            candidate.clear();
            candidate.push_str(&line);
            candidate.push(' ');
            candidate.push_str(word);
            candidate.push(' ');

            if measure(&candidate) > max_width {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            } else {
                line.push(' ');
                line.push_str(word);
            }
        }

        lines.push(line);
    }

    lines
}

#[cfg(test)]
#[path = "../../tests/unit/layout/wrap.rs"]
mod tests;
