//! Sample records built from `<region>` blocks.

use crate::paths;
use crate::section::{parse_pairs, Overlay};
use std::path::{Path, PathBuf};

/// Opcodes a region record understands. Anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Key,
    PitchKeycenter,
    FileChannel,
    HiVel,
    SeqPosition,
    Channel,
    Instrument,
}

impl Field {
    pub fn from_opcode(key: &str) -> Option<Field> {
        match key {
            "key" => Some(Field::Key),
            "pitch_keycenter" => Some(Field::PitchKeycenter),
            "filechannel" => Some(Field::FileChannel),
            "hivel" => Some(Field::HiVel),
            "seq_position" => Some(Field::SeqPosition),
            "channel" => Some(Field::Channel),
            "instrument" => Some(Field::Instrument),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    /// As written after `sample=`, before resolution.
    pub sample: Option<String>,
    pub sample_path: PathBuf,
    pub key: Option<u8>,
    pub control: Overlay,
    pub channel: Option<String>,
    pub instrument: Option<String>,
    pub filechannel: u32,
    pub hivel: Option<u8>,
    pub seq_position: u32,
}

impl Default for SampleRecord {
    fn default() -> SampleRecord {
        SampleRecord {
            sample: None,
            sample_path: PathBuf::new(),
            key: None,
            control: Overlay::new(),
            channel: None,
            instrument: None,
            filechannel: 1,
            hivel: None,
            seq_position: 1,
        }
    }
}

/// A value that did not fit the field it was assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    pub opcode: String,
    pub value: String,
}

impl SampleRecord {
    pub fn new() -> SampleRecord {
        SampleRecord::default()
    }

    pub fn has_sample(&self) -> bool {
        self.sample.as_ref().map_or(false, |s| !s.is_empty())
    }

    pub fn set_sample(&mut self, sample: &str) {
        self.sample = Some(sample.trim().to_string());
    }

    /// Applies one opcode. Unknown opcodes are ignored and `Ok(false)` is
    /// returned; known opcodes with a bad value leave the record untouched.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool, InvalidValue> {
        let field = match Field::from_opcode(key) {
            Some(field) => field,
            None => return Ok(false),
        };
        let invalid = || InvalidValue {
            opcode: key.to_string(),
            value: value.to_string(),
        };
        match field {
            Field::Key | Field::PitchKeycenter => {
                self.key = Some(parse_note(value).ok_or_else(invalid)?)
            }
            Field::HiVel => {
                let vel = value.parse::<u8>().ok().filter(|v| *v <= 127);
                self.hivel = Some(vel.ok_or_else(invalid)?)
            }
            Field::FileChannel => self.filechannel = value.parse().map_err(|_| invalid())?,
            Field::SeqPosition => self.seq_position = value.parse().map_err(|_| invalid())?,
            Field::Channel => self.channel = Some(value.to_string()),
            Field::Instrument => self.instrument = Some(value.to_string()),
        }
        Ok(true)
    }

    /// Applies every pair of a region-local line, collecting the bad values.
    pub fn assign(&mut self, line: &str) -> Vec<InvalidValue> {
        let mut invalid = vec![];
        for (key, value) in parse_pairs(line) {
            if key == "sample" {
                self.set_sample(value);
            } else if let Err(e) = self.set(key, value) {
                invalid.push(e);
            }
        }
        invalid
    }

    /// Copies the allow-listed opcodes of each overlay onto the record, later
    /// overlays winning. `pitch_keycenter` only counts inside a region, and bad
    /// values are skipped here since [`check_overlay_pair`] reported them.
    pub fn inherit(&mut self, overlays: &[&Overlay]) {
        for overlay in overlays {
            for (key, value) in overlay.iter() {
                if Field::from_opcode(key) == Some(Field::PitchKeycenter) {
                    continue;
                }
                self.set(key, value).ok();
            }
        }
    }

    pub fn resolve(&mut self, default_path: &Path) {
        if let Some(sample) = &self.sample {
            self.sample_path = paths::resolve_sample_path(default_path, sample);
        }
    }

    /// Fills in `channel` and `instrument` from the sample path layout
    /// `<a>/<kit>/<channel>/<instrument>_<variant>...`.
    pub fn derive_names(&mut self) -> Result<(), ShortPath> {
        let sample = match &self.sample {
            Some(sample) => paths::normalize_path(sample),
            None => return Ok(()),
        };
        let (channel, instrument) = derive_names(&sample)?;
        self.channel = Some(channel);
        self.instrument = Some(instrument);
        Ok(())
    }

    /// Name used in the kit when the path heuristic did not produce one.
    pub fn display_name(&self) -> String {
        if let Some(instrument) = &self.instrument {
            return instrument.clone();
        }
        self.sample_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Problem with a pair stored in a master, global or group overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayProblem {
    RegionOnly(String),
    Invalid(InvalidValue),
}

pub fn check_overlay_pair(key: &str, value: &str) -> Option<OverlayProblem> {
    if key == "sample" || Field::from_opcode(key) == Some(Field::PitchKeycenter) {
        return Some(OverlayProblem::RegionOnly(key.to_string()));
    }
    match SampleRecord::new().set(key, value) {
        Ok(_) => None,
        Err(e) => Some(OverlayProblem::Invalid(e)),
    }
}

/// Splits the value of `sample=` from opcodes that follow it on the same line.
/// The value runs up to the first whitespace-separated `name=` token, so paths
/// containing spaces survive.
pub fn split_sample(value: &str) -> (&str, &str) {
    let mut after_space = false;
    for (ix, c) in value.char_indices() {
        if after_space && !c.is_whitespace() && starts_opcode(&value[ix..]) {
            return (value[..ix].trim(), &value[ix..]);
        }
        after_space = c.is_whitespace();
    }
    (value.trim(), "")
}

fn starts_opcode(s: &str) -> bool {
    let name_len = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or_else(|| s.len());
    name_len > 0 && s[name_len..].starts_with('=')
}

/// A sample path with too few `/` segments to name channel and instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortPath {
    pub path: String,
    pub segments: usize,
}

pub const NAME_SEGMENTS: usize = 4;

pub fn derive_names(sample: &str) -> Result<(String, String), ShortPath> {
    let elements: Vec<&str> = sample.split('/').collect();
    if elements.len() < NAME_SEGMENTS {
        return Err(ShortPath {
            path: sample.to_string(),
            segments: elements.len(),
        });
    }
    let channel = elements[2].to_string();
    let tokens: Vec<&str> = sample.split('_').collect();
    let instrument = match tokens.iter().position(|t| *t == elements[3]) {
        Some(pos) if pos + 1 < tokens.len() => format!("{} {}", elements[3], tokens[pos + 1]),
        _ => elements[3].to_string(),
    };
    Ok((channel, instrument))
}

/// MIDI note from a number or an SFZ note name (`c4` is 60).
pub fn parse_note(s: &str) -> Option<u8> {
    if let Ok(n) = s.parse::<u8>() {
        return if n <= 127 { Some(n) } else { None };
    }

    let s = s.to_lowercase();
    let mut chars = s.chars().peekable();
    let base = match chars.next()? {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    };
    let modifier = match chars.peek() {
        Some('#') => {
            chars.next();
            1
        }
        Some('b') => {
            chars.next();
            -1
        }
        _ => 0,
    };
    let octave: i32 = chars.collect::<String>().parse().ok()?;
    let midi = (octave + 1) * 12 + base + modifier;
    if (0..=127).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}
