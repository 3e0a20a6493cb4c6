use shared::domain::StanzaEntry;

pub fn render_entry(number: usize, entry: &StanzaEntry) -> String {
    let mut out = format!("Stanza {number}\n");
    for line in entry.stanza.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    if let Some(url) = &entry.image_url {
        out.push_str(&format!("  [illustration] {url}\n"));
    }
    out
}

pub fn render_poem(poem: &[StanzaEntry]) -> String {
    if poem.is_empty() {
        return "(the poem is empty; type a line to begin)\n".to_string();
    }
    poem.iter()
        .enumerate()
        .map(|(index, entry)| render_entry(index + 1, entry))
        .collect::<Vec<_>>()
        .join("\n")
}
