//! Structural and keyword heuristics for paste content.

const SAMPLE_MAX_BYTES: usize = 64 * 1024;
const SAMPLE_MAX_LINES: usize = 512;

/// Keyword tables scored after the structural checks. A language needs at
/// least two distinct hits; the highest count wins and ties keep table order.
const SCORED: &[(&str, &[&str])] = &[
    (
        "rust",
        &[
            "fn ", "fn main", "let ", "impl ", "crate::", "pub ", "struct ", "enum ",
            "match ", "println!", "->",
        ],
    ),
    (
        "python",
        &["def ", "import ", "self", "elif ", "print(", "async def", "none"],
    ),
    (
        "go",
        &["package ", "func ", "fmt.", "defer ", ":= ", "chan ", "go func"],
    ),
    (
        "javascript",
        &["function", "const ", "=>", "console.", "document.", "export ", "require("],
    ),
    (
        "typescript",
        &["interface ", ": string", ": number", "implements ", "readonly ", "type "],
    ),
    (
        "java",
        &["public class", "import java.", "system.out", " extends ", "void main"],
    ),
    ("ruby", &["def ", "end\n", "puts ", "require '", "do |", "attr_"]),
    ("lua", &["local ", "function ", "require(", "elseif", "pairs("]),
];

/// Best-effort language tag for `content`, or `None` when nothing matches
/// with enough confidence.
pub(crate) fn detect(content: &str) -> Option<&'static str> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    let sample = utf8_prefix(trimmed, SAMPLE_MAX_BYTES);
    let lower = sample.to_ascii_lowercase();

    if let Some(lang) = shebang_interpreter(sample).and_then(language_for_interpreter) {
        return Some(lang);
    }

    let structural: [fn(&str, &str) -> Option<&'static str>; 8] = [
        json,
        markup,
        shell,
        yaml,
        toml,
        sql,
        c_family,
        css,
    ];
    for check in structural {
        if let Some(lang) = check(sample, &lower) {
            return Some(lang);
        }
    }

    if let Some(lang) = scored(&lower) {
        return Some(lang);
    }

    if markdown(sample) {
        return Some("markdown");
    }
    None
}

fn lines(sample: &str) -> impl Iterator<Item = &str> {
    sample.lines().take(SAMPLE_MAX_LINES)
}

fn json(sample: &str, _lower: &str) -> Option<&'static str> {
    if !(sample.starts_with('{') || sample.starts_with('[')) {
        return None;
    }
    if serde_json::from_str::<serde_json::Value>(sample).is_ok() {
        return Some("json");
    }
    // A truncated sample of a large document cannot parse; fall back to shape.
    let truncated = sample.len() + 4 > SAMPLE_MAX_BYTES;
    (truncated && sample.contains('"') && sample.contains(':')).then_some("json")
}

fn markup(sample: &str, lower: &str) -> Option<&'static str> {
    if lower.contains("<!doctype html") || lower.contains("<html") {
        return Some("html");
    }
    if !sample.starts_with('<') {
        return None;
    }
    let html_tags = ["<head", "<body", "<div", "<span", "<script", "<style", "<p>"]
        .iter()
        .filter(|tag| lower.contains(**tag))
        .count();
    if html_tags >= 2 {
        return Some("html");
    }
    (lower.starts_with("<?xml") || lower.contains("</")).then_some("xml")
}

fn shell(_sample: &str, lower: &str) -> Option<&'static str> {
    if !lower.contains('\n') {
        return None;
    }
    let hits = [
        lower.contains("echo ") && lower.contains('$'),
        lower.contains("\nfi"),
        lower.contains("\ndone"),
        lower.contains("if ["),
        lower.contains("; then"),
        lower.contains("case ") && lower.contains("esac"),
        lower.contains("export ") && lower.contains("=$"),
    ]
    .iter()
    .filter(|hit| **hit)
    .count();
    (hits >= 2).then_some("shell")
}

fn yaml(sample: &str, _lower: &str) -> Option<&'static str> {
    let mut pairs = 0usize;
    let mut other = 0usize;
    for line in lines(sample) {
        let t = line.trim();
        if t.is_empty() || t.starts_with('#') || t == "---" {
            continue;
        }
        let is_pair = match t.split_once(": ") {
            Some((key, _)) => is_yaml_key(key.trim_start_matches("- ")),
            None => t.ends_with(':') && is_yaml_key(&t[..t.len() - 1]),
        };
        if is_pair || (t.starts_with("- ") && !t.contains(';')) {
            pairs += 1;
        } else {
            other += 1;
        }
    }
    (pairs >= 2 && other == 0).then_some("yaml")
}

fn is_yaml_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '"' | '\''))
}

fn toml(sample: &str, _lower: &str) -> Option<&'static str> {
    let mut header = false;
    let mut assignments = 0usize;
    for line in lines(sample) {
        let t = line.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        if t.starts_with('[') && t.ends_with(']') && t.len() > 2 {
            header = true;
        } else if t.contains(" = ") && !t.contains("==") && !t.ends_with(';') {
            assignments += 1;
        }
    }
    (header && assignments >= 1).then_some("toml")
}

fn sql(sample: &str, _lower: &str) -> Option<&'static str> {
    let statement = lines(sample).any(|line| {
        let l = line.trim().to_ascii_lowercase();
        (l.starts_with("select ") && l.contains(" from "))
            || (l.starts_with("insert into ") && l.contains("values"))
            || (l.starts_with("update ") && l.contains(" set "))
            || l.starts_with("delete from ")
            || l.starts_with("create table ")
            || l.starts_with("alter table ")
            || l.starts_with("drop table ")
    });
    statement.then_some("sql")
}

fn c_family(_sample: &str, lower: &str) -> Option<&'static str> {
    if lower.contains("using namespace std")
        || lower.contains("template <")
        || lower.contains("std::cout")
        || (lower.contains("std::") && lower.contains("#include"))
    {
        return Some("cpp");
    }
    if lower.contains("#include") && (lower.contains("int main") || lower.contains("printf")) {
        return Some("c");
    }
    None
}

fn css(_sample: &str, lower: &str) -> Option<&'static str> {
    if !(lower.contains('{') && lower.contains('}') && lower.contains(':') && lower.contains(';')) {
        return None;
    }
    let properties = ["color:", "background", "margin", "padding", "font-", "display:"];
    let is_code = lower.contains("fn ") || lower.contains("function") || lower.contains("=>");
    (!is_code && properties.iter().any(|p| lower.contains(p))).then_some("css")
}

fn scored(lower: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for (lang, keywords) in SCORED {
        let hits = keywords.iter().filter(|kw| lower.contains(**kw)).count();
        if hits < 2 {
            continue;
        }
        if best.map_or(true, |(_, best_hits)| hits > best_hits) {
            best = Some((*lang, hits));
        }
    }
    best.map(|(lang, _)| lang)
}

fn markdown(sample: &str) -> bool {
    if sample.contains("```") || sample.contains("](") {
        return true;
    }
    lines(sample).any(|line| {
        let t = line.trim_start();
        let hashes = t.chars().take_while(|ch| *ch == '#').count();
        (1..=6).contains(&hashes) && t[hashes..].starts_with(' ')
    })
}

fn shebang_interpreter(sample: &str) -> Option<String> {
    let line = sample.lines().next()?.strip_prefix("#!")?.trim();
    let mut parts = line.split_whitespace();
    let mut program = basename(parts.next()?);
    if program == "env" {
        program = parts.find(|arg| !arg.starts_with('-')).map(basename)?;
    }
    (!program.is_empty()).then(|| program.to_ascii_lowercase())
}

fn language_for_interpreter(interpreter: String) -> Option<&'static str> {
    let name = interpreter.trim_end_matches(|ch: char| ch.is_ascii_digit() || ch == '.');
    match name {
        "python" | "pypy" => Some("python"),
        "node" | "nodejs" | "deno" | "bun" => Some("javascript"),
        "sh" | "bash" | "zsh" | "ksh" | "dash" | "ash" | "fish" => Some("shell"),
        "ruby" => Some("ruby"),
        "perl" => Some("perl"),
        "lua" => Some("lua"),
        "php" => Some("php"),
        _ => None,
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn utf8_prefix(content: &str, max_bytes: usize) -> &str {
    if content.len() <= max_bytes {
        return content;
    }
    let mut end = max_bytes;
    while end > 0 && !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}
