//! Recovery of a JSON value from free-form generated text.

const FENCE: &str = "```";

/// Extract the top-level JSON object or array embedded in `text`.
///
/// Strips code-fence lines and trailing fence markers until none remain,
/// starts at the first `{` (or the first `[` when there is no `{`), and ends
/// at the last point where bracket depth returns to zero. Brackets inside
/// string literals are ignored. When no balanced value is found the trimmed,
/// fence-stripped text is returned unchanged.
///
/// Never fails: decoding the result is the caller's concern.
#[must_use]
pub fn extract_json(text: &str) -> String {
    let body = strip_fences(text);

    let start = body.find('{').or_else(|| body.find('['));
    let Some(start) = start else {
        return body.to_string();
    };

    match balanced_end(&body[start..]) {
        Some(len) => body[start..start + len].to_string(),
        None => body.to_string(),
    }
}

/// The balanced array `text` opens with, once fences are stripped.
///
/// `None` when the body does not start with `[` or never closes it.
pub(crate) fn leading_array(text: &str) -> Option<&str> {
    let body = strip_fences(text);
    if !body.starts_with('[') {
        return None;
    }
    balanced_end(body).map(|len| &body[..len])
}

fn strip_fences(text: &str) -> &str {
    let mut body = text.trim();
    loop {
        let next = strip_fence_layer(body);
        if next.len() == body.len() {
            return body;
        }
        body = next;
    }
}

fn strip_fence_layer(text: &str) -> &str {
    let mut body = text;
    if body.starts_with(FENCE) {
        body = match body.find('\n') {
            Some(newline) => &body[newline + 1..],
            None => &body[FENCE.len()..],
        };
    }
    if let Some(stripped) = body.trim_end().strip_suffix(FENCE) {
        body = stripped;
    }
    body.trim()
}

/// Byte length of the prefix ending where depth last returns to zero.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(idx + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    end
}
