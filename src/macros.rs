//! `#define` handling.
//!
//! A define is a plain textual substitution. Names are matched as whole
//! tokens so `$KIT` never rewrites the front of `$KITCHEN`.

use log::debug;

#[derive(Debug, Default, Clone)]
pub struct MacroTable {
    // Definition order is the expansion order.
    defines: Vec<(String, String)>,
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl MacroTable {
    pub fn new() -> MacroTable {
        MacroTable::default()
    }

    /// Records `name`, overwriting the value of an earlier definition.
    pub fn define(&mut self, name: &str, value: &str) {
        match self.get(name) {
            Some(old) => debug!("#define {} {} (was {})", name, value, old),
            None => debug!("#define {} {}", name, value),
        }
        match self.defines.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.defines.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.defines
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.defines.len()
    }

    /// Replaces every whole-token occurrence of each known name.
    pub fn expand(&self, line: &str) -> String {
        let mut out = line.to_string();
        for (name, value) in &self.defines {
            if !name.is_empty() && out.contains(name.as_str()) {
                out = replace_token(&out, name, value);
            }
        }
        out
    }

    /// Registers a `#define <name> <value>` line. Returns false when the line
    /// does not have exactly three parts.
    pub fn define_line(&mut self, line: &str) -> bool {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return false;
        }
        self.define(parts[1], parts[2]);
        true
    }
}

fn replace_token(line: &str, name: &str, value: &str) -> String {
    // A `$` sigil already separates the name from whatever precedes it.
    let check_before = !name.starts_with('$');
    let mut out = String::with_capacity(line.len());
    let mut start = 0;
    while let Some(found) = line[start..].find(name) {
        let pos = start + found;
        let end = pos + name.len();
        // Boundaries come from the whole line, not the unscanned rest.
        let before = line[..pos].chars().next_back();
        let after = line[end..].chars().next();
        let starts_token = !check_before || !before.map_or(false, is_ident);
        let ends_token = !after.map_or(false, is_ident);
        out.push_str(&line[start..pos]);
        if starts_token && ends_token {
            out.push_str(value);
        } else {
            out.push_str(name);
        }
        start = end;
    }
    out.push_str(&line[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_whole_token() {
        let mut macros = MacroTable::new();
        macros.define("$KIT", "Rock");
        assert_eq!(macros.expand("sample=$KIT/kick.wav"), "sample=Rock/kick.wav");
        assert_eq!(macros.expand("sample=$KITCHEN/pan.wav"), "sample=$KITCHEN/pan.wav");
        assert_eq!(macros.expand("a=$KIT b=$KIT_2 c=$KIT"), "a=Rock b=$KIT_2 c=Rock");
    }

    #[test]
    fn test_expand_without_sigil() {
        let mut macros = MacroTable::new();
        macros.define("ROOT", "36");
        assert_eq!(macros.expand("key=ROOT"), "key=36");
        assert_eq!(macros.expand("sample=GROOTS.wav"), "sample=GROOTS.wav");
        assert_eq!(macros.expand("sample=ROOTS.wav"), "sample=ROOTS.wav");
        assert_eq!(macros.expand("sample=ROOTROOT.wav"), "sample=ROOTROOT.wav");
        assert_eq!(macros.expand("lo=ROOT hi=ROOT"), "lo=36 hi=36");
    }

    #[test]
    fn test_unknown_token_is_untouched() {
        let macros = MacroTable::new();
        assert_eq!(macros.expand("key=$NOTE"), "key=$NOTE");
    }

    #[test]
    fn test_redefine_overwrites() {
        let mut macros = MacroTable::new();
        macros.define("$VEL", "64");
        let first = macros.expand("hivel=$VEL");
        macros.define("$VEL", "127");
        assert_eq!(first, "hivel=64");
        assert_eq!(macros.expand("hivel=$VEL"), "hivel=127");
        assert_eq!(macros.len(), 1);
        assert_eq!(macros.get("$VEL"), Some("127"));
    }

    #[test]
    fn test_define_line() {
        let mut macros = MacroTable::new();
        assert!(macros.define_line("#define $NOTE 38"));
        assert!(!macros.define_line("#define $BROKEN"));
        assert!(!macros.define_line("#define $A b c"));
        assert_eq!(macros.get("$NOTE"), Some("38"));
        assert_eq!(macros.len(), 1);
    }
}
