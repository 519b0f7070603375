use clap::{crate_version, App, Arg, ArgMatches};
use log::{error, info, warn, LevelFilter};
use std::path::{Path, PathBuf};
use std::process;

mod drumgizmo;
mod error;
mod kit;
mod macros;
mod paths;
mod region;
mod section;
mod sfz;

use error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Config {
    input: PathBuf,
    output: PathBuf,
    name: String,
}

impl Config {
    fn from_matches(matches: &ArgMatches) -> Config {
        let input = PathBuf::from(matches.value_of_os("input").unwrap_or_default());
        let output = PathBuf::from(matches.value_of_os("output").unwrap_or_default());
        let name = match matches.value_of("name") {
            Some(name) => name.to_string(),
            None => kit_name(&input),
        };
        Config {
            input,
            output,
            name,
        }
    }

    fn base_dir(&self) -> &Path {
        self.input.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn kit_name(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "drumkit".to_string())
}

fn app() -> App<'static, 'static> {
    App::new("sfz-drumgizmo")
        .version(crate_version!())
        .about("Converts an SFZ drum instrument into a DrumGizmo drumkit and midimap")
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .value_name("SFZ")
                .help("SFZ file to convert")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("XML")
                .help("DrumGizmo drumkit file to write; the midimap goes to <XML>_midimap")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("name")
                .short("n")
                .long("name")
                .value_name("NAME")
                .help("Kit name, defaults to the SFZ file name")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("More logging, repeat for trace output"),
        )
}

fn init_logger(verbosity: u64) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match verbosity {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}

fn convert(config: &Config) -> Result<()> {
    if !config.input.is_file() {
        return Err(Error::InputNotFound(config.input.clone()));
    }
    info!("Converting {}", config.input.display());
    let parsed = sfz::parse(&config.input, config.base_dir())?;
    if !parsed.diagnostics.is_empty() {
        warn!("{} problems found while parsing, see above", parsed.diagnostics.len());
    }
    let kit = kit::Kit::from_samples(&config.name, &parsed.samples);
    info!(
        "Kit {}: {} channels, {} instruments, {} note mappings",
        kit.name,
        kit.channels.len(),
        kit.instruments.len(),
        kit.note_map.len()
    );
    drumgizmo::save_kit(&kit, &config.output)
}

fn main() {
    let matches = app().get_matches();
    init_logger(matches.occurrences_of("verbose"));
    let config = Config::from_matches(&matches);
    if let Err(e) = convert(&config) {
        error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_config() {
        let matches = app().get_matches_from(vec![
            "sfz-drumgizmo",
            "--input",
            "kits/Rock.sfz",
            "-o",
            "out.xml",
        ]);
        let config = Config::from_matches(&matches);
        assert_eq!(config.input, PathBuf::from("kits/Rock.sfz"));
        assert_eq!(config.output, PathBuf::from("out.xml"));
        assert_eq!(config.name, "Rock");
        assert_eq!(config.base_dir(), Path::new("kits"));
    }

    #[test]
    fn test_required_args() {
        assert!(app().get_matches_from_safe(vec!["sfz-drumgizmo", "--input", "a.sfz"]).is_err());
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            input: dir.path().join("missing.sfz"),
            output: dir.path().join("kit.xml"),
            name: "kit".to_string(),
        };
        assert!(matches!(convert(&config), Err(Error::InputNotFound(_))));
        assert!(!config.output.exists());
    }

    #[test]
    fn test_convert() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::write(
            base.join("kit.sfz"),
            "\
#define $KIT Rock
default_path=samples
#include \"kick.sfz\"
<group> hivel=100
<region>
sample=../$KIT/Snare/Snare/Kit_Snare_Top_01.wav
key=38

<region>
sample=../$KIT/Snare/Snare/Kit_Snare_Top_02.wav
key=38

",
        )
        .unwrap();
        fs::write(
            base.join("kick.sfz"),
            "<region> sample=../Rock/Kick/Kick/Kit_Kick_In_01.wav key=36\n\n",
        )
        .unwrap();

        let config = Config {
            input: base.join("kit.sfz"),
            output: base.join("out/kit.xml"),
            name: "Rock".to_string(),
        };
        convert(&config).unwrap();

        let drumkit = fs::read_to_string(base.join("out/kit.xml")).unwrap();
        let midimap = fs::read_to_string(base.join("out/kit.xml_midimap")).unwrap();
        assert_eq!(drumkit.matches("<instrument ").count(), 3);
        assert_eq!(drumkit.matches("<channel ").count(), 2);
        assert!(drumkit.find("name=\"Kick\"").unwrap() < drumkit.find("name=\"Snare\"").unwrap());
        assert_eq!(midimap.matches("<map ").count(), 2);
        assert!(midimap.contains("<map note=\"36\" instr=\"Kick In\"/>"));
        assert!(midimap.contains("<map note=\"38\" instr=\"Snare Top\"/>"));
    }
}
