use regex::Regex;
use std::sync::OnceLock;

/// Returned when the model output contains no fenced code.
pub const NO_CODE_SENTINEL: &str = "No code blocks found.";

/// Outcome of scanning model output for fenced code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Every non-empty fenced segment, trimmed and joined by a blank line
    Code(String),
    /// No fenced segment with content was found
    NoCode,
    /// The scanner itself failed
    Failed(String),
}

impl Extraction {
    /// Collapses the outcome into the text that gets persisted.
    pub fn into_text(self) -> String {
        match self {
            Extraction::Code(code) => code,
            Extraction::NoCode => NO_CODE_SENTINEL.to_string(),
            Extraction::Failed(detail) => format!("Error in extracting code: {}", detail),
        }
    }
}

/// Any fence, with an optional language tag on the opening line.
fn code_fence_re() -> Result<&'static Regex, &'static regex::Error> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:[\w+#.-]*[ \t]*\r?\n)?(.*?)```"))
        .as_ref()
}

/// Scans raw model output for fenced code segments.
pub fn extract_code_blocks(output: &str) -> Extraction {
    let re = match code_fence_re() {
        Ok(re) => re,
        Err(e) => return Extraction::Failed(e.to_string()),
    };

    let blocks: Vec<&str> = re
        .captures_iter(output)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|block| !block.is_empty())
        .collect();

    if blocks.is_empty() {
        Extraction::NoCode
    } else {
        Extraction::Code(blocks.join("\n\n"))
    }
}

/// Extracts fenced code from raw model output, never failing.
///
/// Returns [`NO_CODE_SENTINEL`] when nothing is fenced.
pub fn extract_code(output: &str) -> String {
    extract_code_blocks(output).into_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_tagged_and_untagged_blocks() {
        let output = "Here you go:\n```python\nA\n```\nand also\n```\nB\n```\n";
        assert_eq!(extract_code(output), "A\n\nB");
    }

    #[test]
    fn accepts_crlf_fences() {
        assert_eq!(extract_code("```python\r\nA\r\n```"), "A");
        assert_eq!(extract_code("Sure:\r\n```\r\nB\r\n```\r\n"), "B");
    }

    #[test]
    fn returns_sentinel_without_fences() {
        assert_eq!(extract_code("print('hi')"), NO_CODE_SENTINEL);
        assert_eq!(extract_code_blocks("Error: timeout"), Extraction::NoCode);
    }

    #[test]
    fn skips_empty_blocks() {
        let output = "```js\n   \n```\n```js\nconsole.log(1);\n```";
        assert_eq!(extract_code(output), "console.log(1);");
    }

    #[test]
    fn accepts_unusual_language_tags() {
        let output = "```c++\nint main() {}\n```";
        assert_eq!(extract_code(output), "int main() {}");
    }

    #[test]
    fn extraction_is_idempotent() {
        let output = "```rust\nfn main() {}\n```\ntext\n```toml\n[package]\n```";
        assert_eq!(extract_code(output), extract_code(output));
    }
}
