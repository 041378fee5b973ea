use super::response::{Source, SourceCitation};

const SOURCES_HEADER: &str = "\n\n---\n**Sources Consulted:**\n";
const URL_DISPLAY_LIMIT: usize = 70;
const URL_DISPLAY_KEEP: usize = 67;
const GENERIC_PREVIEW_CHARS: usize = 100;

/// Renders the trailing "Sources Consulted" block, or an empty string when
/// there is nothing to cite.
pub fn format_sources(sources: &[Source]) -> String {
    if sources.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| format!("   {}. {}", index + 1, describe(source)))
        .collect();

    format!("{}{}", SOURCES_HEADER, lines.join("\n"))
}

fn describe(source: &Source) -> String {
    match source {
        Source::Citation(citation) => {
            let display = describe_citation(citation);
            if display.is_empty() {
                generic_preview(&serde_json::to_string(citation).unwrap_or_default())
            } else {
                display
            }
        }
        Source::Text(text) => text.clone(),
        Source::Other(value) => generic_preview(&value.to_string()),
    }
}

fn describe_citation(citation: &SourceCitation) -> String {
    let mut display = String::new();

    if let Some(doc_name) = &citation.document_name {
        display.push_str(&format!("Doc: `{}`", doc_name));
    }
    // The page label always carries its leading space, even without a document name.
    if let Some(page_label) = &citation.page_label {
        display.push_str(&format!(" (Page: {})", page_label));
    }
    if let Some(url) = citation.url.as_deref().filter(|url| !url.is_empty()) {
        let rendered = if url.starts_with("http") {
            format!("[{}]({})", shorten_url(url), url)
        } else {
            format!("`{}`", url)
        };
        if !display.is_empty() {
            display.push_str(" - ");
        }
        display.push_str(&rendered);
    }

    display
}

fn shorten_url(url: &str) -> String {
    if url.chars().count() < URL_DISPLAY_LIMIT {
        url.to_string()
    } else {
        let kept: String = url.chars().take(URL_DISPLAY_KEEP).collect();
        format!("{}...", kept)
    }
}

fn generic_preview(raw: &str) -> String {
    let preview: String = raw.chars().take(GENERIC_PREVIEW_CHARS).collect();
    format!("`{}...`", preview)
}
