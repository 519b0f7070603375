use crate::paths;
use crate::region::SampleRecord;
use log::debug;
use std::collections::HashSet;

/// Every instrument row spans the full velocity range.
pub const VELOCITY_RANGE: (u8, u8) = (1, 127);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRow {
    pub index: usize,
    pub name: String,
    pub file: String,
    pub note: Option<u8>,
    pub channel: Option<String>,
    pub lovel: u8,
    pub hivel: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteMapping {
    pub note: u8,
    pub instrument: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kit {
    pub name: String,
    pub channels: Vec<String>,
    pub instruments: Vec<InstrumentRow>,
    pub note_map: Vec<NoteMapping>,
}

impl Kit {
    pub fn from_samples(name: &str, samples: &[SampleRecord]) -> Kit {
        Kit {
            name: name.to_string(),
            channels: channels(samples),
            instruments: instrument_rows(samples),
            note_map: note_map(samples),
        }
    }
}

/// Distinct `(note, instrument)` pairs in first-seen order.
pub fn note_map(samples: &[SampleRecord]) -> Vec<NoteMapping> {
    let pairs = samples.iter().filter_map(|sample| match sample.key {
        Some(note) => Some((note, sample.display_name())),
        None => {
            debug!("{} has no note, leaving it out of the midimap", sample.sample_path.display());
            None
        }
    });
    dedup_pairs(pairs)
}

pub fn dedup_pairs<I>(pairs: I) -> Vec<NoteMapping>
where
    I: IntoIterator<Item = (u8, String)>,
{
    let mut taken = HashSet::new();
    let mut maps = vec![];
    for (note, instrument) in pairs {
        let mapping = NoteMapping { note, instrument };
        if taken.insert(mapping.clone()) {
            maps.push(mapping);
        }
    }
    maps
}

/// Distinct channel names in first-seen order.
pub fn channels(samples: &[SampleRecord]) -> Vec<String> {
    let mut taken = HashSet::new();
    samples
        .iter()
        .filter_map(|s| s.channel.clone())
        .filter(|c| taken.insert(c.clone()))
        .collect()
}

pub fn instrument_rows(samples: &[SampleRecord]) -> Vec<InstrumentRow> {
    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| InstrumentRow {
            index,
            name: sample.display_name(),
            file: paths::display_path(&sample.sample_path),
            note: sample.key,
            channel: sample.channel.clone(),
            lovel: VELOCITY_RANGE.0,
            hivel: VELOCITY_RANGE.1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample(
        path: &str,
        key: Option<u8>,
        channel: Option<&str>,
        instrument: &str,
    ) -> SampleRecord {
        SampleRecord {
            sample: Some(path.to_string()),
            sample_path: PathBuf::from(path),
            key,
            channel: channel.map(|c| c.to_string()),
            instrument: Some(instrument.to_string()),
            ..SampleRecord::default()
        }
    }

    #[test]
    fn test_dedup_pairs() {
        let pairs = vec![
            (60, "kick".to_string()),
            (62, "snare".to_string()),
            (60, "kick".to_string()),
        ];
        let expected = vec![
            NoteMapping {
                note: 60,
                instrument: "kick".to_string(),
            },
            NoteMapping {
                note: 62,
                instrument: "snare".to_string(),
            },
        ];
        assert_eq!(dedup_pairs(pairs), expected);
    }

    #[test]
    fn test_note_map_skips_missing_notes() {
        let samples = vec![
            sample("k/a.wav", Some(36), None, "Kick"),
            sample("k/b.wav", None, None, "Kick"),
            sample("k/c.wav", Some(36), None, "Kick"),
            sample("k/d.wav", Some(36), None, "Kick Sub"),
        ];
        let maps: Vec<_> = note_map(&samples)
            .into_iter()
            .map(|m| (m.note, m.instrument))
            .collect();
        assert_eq!(maps, vec![(36, "Kick".to_string()), (36, "Kick Sub".to_string())]);
    }

    #[test]
    fn test_channels_first_seen() {
        let samples = vec![
            sample("a.wav", Some(38), Some("Snare"), "Snare"),
            sample("b.wav", Some(36), Some("Kick"), "Kick"),
            sample("c.wav", Some(38), Some("Snare"), "Snare"),
            sample("d.wav", Some(42), None, "Hat"),
        ];
        assert_eq!(channels(&samples), vec!["Snare", "Kick"]);
    }

    #[test]
    fn test_instrument_rows() {
        let mut no_name = sample("kits/rock/ride.wav", Some(51), None, "");
        no_name.instrument = None;
        let samples = vec![
            sample("kits/rock/kick.wav", Some(36), Some("Kick"), "Kick In"),
            no_name,
        ];
        let kit = Kit::from_samples("Rock", &samples);
        assert_eq!(kit.name, "Rock");
        assert_eq!(kit.instruments.len(), 2);
        assert_eq!(
            kit.instruments[0],
            InstrumentRow {
                index: 0,
                name: "Kick In".to_string(),
                file: "kits/rock/kick.wav".to_string(),
                note: Some(36),
                channel: Some("Kick".to_string()),
                lovel: 1,
                hivel: 127,
            }
        );
        assert_eq!(kit.instruments[1].index, 1);
        assert_eq!(kit.instruments[1].name, "ride");
    }
}
