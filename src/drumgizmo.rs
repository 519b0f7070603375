//! DrumGizmo XML output: the drumkit document and its midimap.

use crate::error::{Error, Result};
use crate::kit::Kit;
use log::{debug, info};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use xmlwriter::{Indent, Options, XmlWriter};

const DRUMKIT_VERSION: &str = "2.0";

fn writer() -> XmlWriter {
    let mut w = XmlWriter::new(Options {
        use_single_quote: false,
        indent: Indent::Spaces(1),
        attributes_indent: Indent::None,
    });
    w.write_declaration();
    w
}

pub fn drumkit_xml(kit: &Kit) -> String {
    let mut w = writer();
    w.start_element("drumkit");
    w.write_attribute("name", &kit.name);
    w.write_attribute("version", DRUMKIT_VERSION);

    w.start_element("metadata");
    w.start_element("title");
    w.write_text(&kit.name);
    w.end_element();
    w.start_element("description");
    w.write_text("Converted from SFZ");
    w.end_element();
    w.end_element();

    w.start_element("channels");
    for channel in &kit.channels {
        w.start_element("channel");
        w.write_attribute("name", channel);
        w.end_element();
    }
    w.end_element();

    w.start_element("instruments");
    for row in &kit.instruments {
        debug!("instrument {}: {} -> {}", row.index, row.name, row.file);
        w.start_element("instrument");
        w.write_attribute("name", &row.name);
        w.write_attribute("file", &row.file);
        if let Some(note) = row.note {
            w.write_attribute("note", &note);
        }
        w.write_attribute("lovel", &row.lovel);
        w.write_attribute("hivel", &row.hivel);
        if let Some(channel) = &row.channel {
            w.write_attribute("channel", channel);
        }
        w.end_element();
    }
    w.end_element();

    w.end_document()
}

pub fn midimap_xml(kit: &Kit) -> String {
    let mut w = writer();
    w.start_element("midimap");
    for map in &kit.note_map {
        w.start_element("map");
        w.write_attribute("note", &map.note);
        w.write_attribute("instr", &map.instrument);
        w.end_element();
    }
    w.end_document()
}

/// `kit.xml` gets its midimap next to it as `kit.xml_midimap`.
pub fn midimap_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push("_midimap");
    PathBuf::from(name)
}

pub fn save_kit(kit: &Kit, output: &Path) -> Result<()> {
    if let Some(dir) = output.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
    }
    let midimap = midimap_path(output);
    fs::write(&midimap, midimap_xml(kit)).map_err(|e| Error::io(&midimap, e))?;
    info!("Wrote midimap {}", midimap.display());
    fs::write(output, drumkit_xml(kit)).map_err(|e| Error::io(output, e))?;
    info!("Wrote drumkit {}", output.display());
    Ok(())
}
