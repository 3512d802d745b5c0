use std::collections::HashMap;

/// Character in a name template marking where the item's 1-based index goes.
pub const PLACEHOLDER: char = '#';

/// Template used when none is configured.
pub const DEFAULT_NAME_TEMPLATE: &str = "NFT #";

/// Description written when the configured one is blank.
pub const DEFAULT_DESCRIPTION: &str = "Generated NFT";

/// Archive of a procedural generation run.
pub const GENERATED_ARCHIVE_NAME: &str = "memories.zip";

/// Archive of a photo-edit batch over every targeted image.
pub const EDITED_ARCHIVE_NAME: &str = "memories_edited.zip";

/// Archive of a "download selected" request with more than one image.
pub const SELECTED_ARCHIVE_NAME: &str = "selected_edit.zip";

/// Item name from a template.
///
/// Every placeholder is followed by `index` (`"NFT #"` gives `"NFT #7"`); a template without one
/// gets `" #<index>"` appended and a blank template falls back to `"NFT #<index>"`.
pub fn build_name(template: &str, index: usize) -> String {
    if template.trim().is_empty() {
        return format!("NFT {PLACEHOLDER}{index}");
    }
    if template.contains(PLACEHOLDER) {
        return template.replace(PLACEHOLDER, &format!("{PLACEHOLDER}{index}"));
    }
    format!("{template} {PLACEHOLDER}{index}")
}

/// Drop the last extension of a file name.
///
/// Only a trailing `.ext` with a non-empty extension free of `.` and `/` is removed, so
/// `"a.tar.gz"` gives `"a.tar"`, `"dir.d/file"` is unchanged and `".hidden"` becomes empty.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    }
}

/// Description to write: `description` unless it is blank.
pub fn resolve_description(description: &str) -> &str {
    if description.trim().is_empty() {
        DEFAULT_DESCRIPTION
    } else {
        description
    }
}

/// Hands out unique file stems, suffixing repeats with `_2`, `_3`, ...
#[derive(Clone, Debug, Default)]
pub struct StemAllocator {
    seen: HashMap<String, usize>,
}

impl StemAllocator {
    /// Empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A stem not handed out before, based on `stem`.
    pub fn claim(&mut self, stem: &str) -> String {
        let mut n = match self.seen.get(stem) {
            None => {
                self.seen.insert(stem.to_string(), 1);
                return stem.to_string();
            }
            Some(&n) => n,
        };
        loop {
            n += 1;
            let candidate = format!("{stem}_{n}");
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(stem.to_string(), n);
                self.seen.insert(candidate.clone(), 1);
                return candidate;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/archive/naming.rs"]
mod tests;
