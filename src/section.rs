//! Section scoping: which header is currently open, and the opcodes each
//! header kind has accumulated so far.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    None,
    Master,
    Group,
    Global,
    Control,
    Region,
}

impl Section {
    /// Splits a header line into its section and whatever follows the tag.
    pub fn from_tag(line: &str) -> Option<(Section, &str)> {
        const TAGS: [(&str, Section); 5] = [
            ("<master>", Section::Master),
            ("<group>", Section::Group),
            ("<global>", Section::Global),
            ("<control>", Section::Control),
            ("<region>", Section::Region),
        ];
        TAGS.iter()
            .find(|(tag, _)| line.starts_with(tag))
            .map(|(tag, section)| (*section, line[tag.len()..].trim()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Section::None => "none",
            Section::Master => "master",
            Section::Group => "group",
            Section::Global => "global",
            Section::Control => "control",
            Section::Region => "region",
        }
    }
}

/// Raw opcodes in the order they were first assigned.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Overlay {
    entries: Vec<(String, String)>,
}

impl Overlay {
    pub fn new() -> Overlay {
        Overlay::default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `key=value` tokens of a line. Tokens without `=` are skipped, and only the
/// first `=` splits.
pub fn parse_pairs(line: &str) -> impl Iterator<Item = (&str, &str)> {
    line.split_whitespace().filter_map(|token| {
        let mut kv = token.splitn(2, '=');
        let key = kv.next()?.trim();
        let value = kv.next()?.trim();
        if key.is_empty() {
            None
        } else {
            Some((key, value))
        }
    })
}

#[derive(Debug)]
pub struct SectionTracker {
    section: Section,
    pub master: Overlay,
    pub group: Overlay,
    pub global: Overlay,
    pub control: Overlay,
}

impl Default for SectionTracker {
    fn default() -> SectionTracker {
        SectionTracker {
            section: Section::None,
            master: Overlay::new(),
            group: Overlay::new(),
            global: Overlay::new(),
            control: Overlay::new(),
        }
    }
}

impl SectionTracker {
    pub fn new() -> SectionTracker {
        SectionTracker::default()
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn enter(&mut self, section: Section) {
        debug!("<{}>", section.name());
        match section {
            Section::Master => self.master = Overlay::new(),
            Section::Group => self.group = self.master.clone(),
            Section::Global => self.global = Overlay::new(),
            Section::Control => self.control = Overlay::new(),
            Section::Region | Section::None => {}
        }
        self.section = section;
    }

    /// Stores the line's pairs in the overlay of the open section. Returns
    /// false when the open section has no overlay (region or none).
    pub fn assign(&mut self, line: &str) -> bool {
        let overlay = match self.section {
            Section::Master => &mut self.master,
            Section::Group => &mut self.group,
            Section::Global => &mut self.global,
            Section::Control => &mut self.control,
            Section::Region | Section::None => return false,
        };
        for (key, value) in parse_pairs(line) {
            overlay.set(key, value);
        }
        true
    }
}
