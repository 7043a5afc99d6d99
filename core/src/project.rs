//! Project directory layout and recent-files lists.
//!
//! A project names a persistent directory (`prjfiles/<id>/...`) holding a
//! movie and its side files. Each category of recent file (movies, ROMs,
//! Lua scripts, ...) keeps its own most-recently-used list, stored one
//! entry per line on disk: a plain path, or — for a multi-file ROM load —
//! a small object literal describing the pack/core/system/region. No JSON
//! crate lives anywhere in this workspace's dependency tree, so that
//! object literal is a hand-rolled flat encoding rather than real JSON;
//! it accepts exactly the shape this module writes.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Where a project's files live: `prjfiles/<id>/...`.
#[derive(Clone, Debug)]
pub struct ProjectLayout {
    root: PathBuf,
    id: String,
}

impl ProjectLayout {
    /// Names the project directory `root/prjfiles/id`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self { root: root.into(), id: id.into() }
    }

    /// The project's own directory.
    #[must_use]
    pub fn dir(&self) -> PathBuf {
        self.root.join("prjfiles").join(&self.id)
    }

    /// A named file within the project directory (e.g. `"movie.lsmv"`).
    #[must_use]
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir().join(name)
    }

    /// Creates the project directory if it doesn't already exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoFailure`] on filesystem failure.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(self.dir())?;
        Ok(())
    }
}

/// A multi-file ROM load descriptor.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RomRef {
    pub pack: Option<String>,
    pub file: Option<String>,
    pub files: Vec<String>,
    pub core: Option<String>,
    pub system: Option<String>,
    pub region: Option<String>,
}

/// One entry in a recent-files list: either a plain path, or a multi-file
/// [`RomRef`] descriptor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RomEntry {
    Path(String),
    Ref(RomRef),
}

impl RomEntry {
    fn to_line(&self) -> String {
        match self {
            RomEntry::Path(path) => path.clone(),
            RomEntry::Ref(r) => encode_object(r),
        }
    }

    fn from_line(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        if trimmed.starts_with('{') {
            Ok(RomEntry::Ref(decode_object(trimmed)?))
        } else {
            Ok(RomEntry::Path(trimmed.to_string()))
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn encode_object(r: &RomRef) -> String {
    let mut fields = Vec::new();
    if let Some(pack) = &r.pack {
        fields.push(format!("\"pack\":\"{}\"", escape(pack)));
    }
    if let Some(file) = &r.file {
        fields.push(format!("\"file\":\"{}\"", escape(file)));
    }
    if !r.files.is_empty() {
        let items: Vec<String> = r.files.iter().map(|f| format!("\"{}\"", escape(f))).collect();
        fields.push(format!("\"files\":[{}]", items.join(",")));
    }
    if let Some(core) = &r.core {
        fields.push(format!("\"core\":\"{}\"", escape(core)));
    }
    if let Some(system) = &r.system {
        fields.push(format!("\"system\":\"{}\"", escape(system)));
    }
    if let Some(region) = &r.region {
        fields.push(format!("\"region\":\"{}\"", escape(region)));
    }
    format!("{{{}}}", fields.join(","))
}

/// Parses one flat `{"key":"value", "key":["a","b"]}` object literal.
///
/// Accepts only string and string-array values, no nesting — the shape
/// [`encode_object`] produces.
fn decode_object(src: &str) -> Result<RomRef> {
    let body = src
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| Error::MalformedInput("rom ref must be a brace-delimited object".into()))?;

    let mut out = RomRef::default();
    for entry in split_top_level(body) {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry
            .split_once(':')
            .ok_or_else(|| Error::MalformedInput("rom ref field missing ':'".into()))?;
        let key = key.trim().trim_matches('"');
        let value = value.trim();
        match key {
            "pack" => out.pack = Some(unescape(unquote(value)?)),
            "file" => out.file = Some(unescape(unquote(value)?)),
            "core" => out.core = Some(unescape(unquote(value)?)),
            "system" => out.system = Some(unescape(unquote(value)?)),
            "region" => out.region = Some(unescape(unquote(value)?)),
            "files" => {
                let items = value
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .ok_or_else(|| Error::MalformedInput("files must be an array".into()))?;
                for item in split_top_level(items) {
                    let item = item.trim();
                    if !item.is_empty() {
                        out.files.push(unescape(unquote(item)?));
                    }
                }
            }
            other => return Err(Error::MalformedInput(format!("unknown rom ref field '{other}'"))),
        }
    }
    Ok(out)
}

fn unquote(s: &str) -> Result<&str> {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| Error::MalformedInput("expected quoted string".into()))
}

/// Splits `s` on top-level commas, ignoring commas inside `"..."` or
/// `[...]`.
fn split_top_level(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut current = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                current.push(c);
                in_string = !in_string;
            }
            '\\' if in_string => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '[' if !in_string => {
                depth += 1;
                current.push(c);
            }
            ']' if !in_string => {
                depth -= 1;
                current.push(c);
            }
            ',' if !in_string && depth == 0 => {
                out.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// A callback fired on every mutation of a [`RecentList`].
pub type RecentHook = Box<dyn FnMut(&RomEntry)>;

/// A most-recently-used, deduplicated, capped list of recent files.
pub struct RecentList {
    entries: VecDeque<RomEntry>,
    max: usize,
    hooks: Vec<RecentHook>,
}

impl RecentList {
    /// Constructs an empty list capped at `max` entries.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { entries: VecDeque::new(), max, hooks: Vec::new() }
    }

    /// Registers a callback invoked with the touched entry on every
    /// mutation.
    pub fn on_mutate(&mut self, hook: RecentHook) {
        self.hooks.push(hook);
    }

    /// The entries, most-recently-used first.
    #[must_use]
    pub fn entries(&self) -> &VecDeque<RomEntry> {
        &self.entries
    }

    /// Records a use of `entry`: removes any existing equal entry, pushes
    /// it to the front, and truncates to the configured maximum.
    pub fn touch(&mut self, entry: RomEntry) {
        self.entries.retain(|e| e != &entry);
        self.entries.push_front(entry.clone());
        while self.entries.len() > self.max {
            self.entries.pop_back();
        }
        for hook in &mut self.hooks {
            hook(&entry);
        }
    }

    /// Drops `entry` if present.
    pub fn remove(&mut self, entry: &RomEntry) {
        self.entries.retain(|e| e != entry);
    }

    /// Serializes the list, one entry per line, most-recently-used first.
    #[must_use]
    pub fn to_lines(&self) -> String {
        self.entries.iter().map(RomEntry::to_line).collect::<Vec<_>>().join("\n")
    }

    /// Replaces the list's contents from a one-entry-per-line serialization
    /// (as produced by [`Self::to_lines`]), without firing mutation hooks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if an entry fails to parse.
    pub fn load_lines(&mut self, text: &str) -> Result<()> {
        self.entries.clear();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            self.entries.push_back(RomEntry::from_line(line)?);
        }
        while self.entries.len() > self.max {
            self.entries.pop_back();
        }
        Ok(())
    }

    /// Writes [`Self::to_lines`] to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoFailure`] on filesystem failure.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_lines())?;
        Ok(())
    }

    /// Loads a list previously written by [`Self::save_to`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::IoFailure`] on filesystem failure, or
    /// [`Error::MalformedInput`] on a malformed entry.
    pub fn load_from(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)?;
        self.load_lines(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_nests_under_prjfiles_id() {
        let layout = ProjectLayout::new("/tmp/tas", "abc123");
        assert_eq!(layout.dir(), PathBuf::from("/tmp/tas/prjfiles/abc123"));
        assert_eq!(layout.file("movie.lsmv"), PathBuf::from("/tmp/tas/prjfiles/abc123/movie.lsmv"));
    }

    #[test]
    fn plain_path_round_trips() {
        let entry = RomEntry::Path("/roms/game.gb".into());
        let line = entry.to_line();
        assert_eq!(RomEntry::from_line(&line).unwrap(), entry);
    }

    #[test]
    fn rom_ref_round_trips_through_object_literal() {
        let entry = RomEntry::Ref(RomRef {
            pack: Some("pack.zip".into()),
            file: None,
            files: vec!["a.gb".into(), "b,with,commas\".gb".into()],
            core: Some("sameboy".into()),
            system: Some("gb".into()),
            region: None,
        });
        let line = entry.to_line();
        assert!(line.starts_with('{'));
        assert_eq!(RomEntry::from_line(&line).unwrap(), entry);
    }

    #[test]
    fn touch_deduplicates_and_bubbles_to_front() {
        let mut list = RecentList::new(3);
        list.touch(RomEntry::Path("a".into()));
        list.touch(RomEntry::Path("b".into()));
        list.touch(RomEntry::Path("a".into()));
        let entries: Vec<_> = list.entries().iter().cloned().collect();
        assert_eq!(entries, vec![RomEntry::Path("a".into()), RomEntry::Path("b".into())]);
    }

    #[test]
    fn touch_caps_at_max_and_drops_oldest() {
        let mut list = RecentList::new(2);
        list.touch(RomEntry::Path("a".into()));
        list.touch(RomEntry::Path("b".into()));
        list.touch(RomEntry::Path("c".into()));
        let entries: Vec<_> = list.entries().iter().cloned().collect();
        assert_eq!(entries, vec![RomEntry::Path("c".into()), RomEntry::Path("b".into())]);
    }

    #[test]
    fn mutation_hook_fires_on_touch() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let mut list = RecentList::new(5);
        list.on_mutate(Box::new(move |entry| seen_clone.borrow_mut().push(entry.clone())));
        list.touch(RomEntry::Path("a".into()));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn lines_round_trip_mixed_entries() {
        let mut list = RecentList::new(5);
        list.touch(RomEntry::Path("/roms/a.gb".into()));
        list.touch(RomEntry::Ref(RomRef { core: Some("sameboy".into()), ..RomRef::default() }));
        let text = list.to_lines();

        let mut loaded = RecentList::new(5);
        loaded.load_lines(&text).unwrap();
        assert_eq!(loaded.entries(), list.entries());
    }

    #[test]
    fn decode_object_rejects_unknown_field() {
        assert!(decode_object("{\"bogus\":\"x\"}").is_err());
    }
}
