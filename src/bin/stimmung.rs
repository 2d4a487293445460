//! stimmung command-line front end
//!
//! Usage:
//!   stimmung list                              - List the temperament catalogue
//!   stimmung show werckmeister3 --root D       - Deviations and reference pitches
//!   stimmung chart                             - Circle-of-fifths series for all temperaments
//!   stimmung play fugue.mid -t kirnberger3     - Play through the default audio device
//!   stimmung render fugue.mid out.wav -t just  - Render offline to a WAV file

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use stimmung::{
    fifths_order, parse_pitch_class, pitch_class_name, Error, Note, ParsedMidiFile, Result,
    SharedTemperament, TemperamentRegistry,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// The conventional chart start: E flat, three fifths below C.
const DEFAULT_CHART_START: i32 = -3;

#[derive(Parser)]
#[command(name = "stimmung", version, about = "Historical temperaments on a MIDI organ")]
struct Cli {
    /// Temperament catalogue (.json or .toml) instead of the bundled one
    #[arg(short, long, global = true)]
    catalogue: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the temperaments in the catalogue
    List,
    /// Show one temperament in detail
    Show {
        /// Temperament identifier
        id: String,

        #[command(flatten)]
        tuning: TuningArgs,

        /// First key of the circle of fifths (C = 0, G = 1, F = -1)
        #[arg(short, long, default_value_t = DEFAULT_CHART_START, allow_hyphen_values = true)]
        start: i32,
    },
    /// Print every temperament along the circle of fifths
    Chart {
        /// First key of the circle of fifths (C = 0, G = 1, F = -1)
        #[arg(short, long, default_value_t = DEFAULT_CHART_START, allow_hyphen_values = true)]
        start: i32,
    },
    /// Play a MIDI file through the audio device
    Play {
        midi: PathBuf,

        /// Temperament identifier
        #[arg(short, long, default_value = "equal")]
        temperament: String,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Output sample rate [default: the device's own rate]
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Output device index (see `stimmung devices`)
        #[arg(long)]
        device: Option<usize>,
    },
    /// Render a MIDI file to a 16-bit stereo WAV file
    Render {
        midi: PathBuf,
        output: PathBuf,

        /// Temperament identifier
        #[arg(short, long, default_value = "equal")]
        temperament: String,

        #[command(flatten)]
        tuning: TuningArgs,

        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
    },
    /// List audio output devices
    Devices,
}

#[derive(Args)]
struct TuningArgs {
    /// Re-centre a shiftable temperament on this key (name or 0-11)
    #[arg(short, long)]
    root: Option<String>,

    /// Detune everything by this many cents
    #[arg(short, long, default_value_t = 0.0, allow_hyphen_values = true)]
    pitchbend: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let registry = load_registry(cli.catalogue.as_deref())?;

    match cli.command {
        Commands::List => list(&registry),
        Commands::Show { id, tuning, start } => show(&registry, &id, &tuning, start),
        Commands::Chart { start } => chart(&registry, start),
        Commands::Play {
            midi,
            temperament,
            tuning,
            sample_rate,
            device,
        } => play(&registry, &midi, &temperament, &tuning, sample_rate, device),
        Commands::Render {
            midi,
            output,
            temperament,
            tuning,
            sample_rate,
        } => {
            let temperament = tuned(&registry, &temperament, &tuning)?;
            let midi_file = Arc::new(ParsedMidiFile::load(&midi)?);
            let summary = stimmung::render_to_wav(midi_file, temperament, sample_rate, &output)?;
            println!(
                "{}: {:.2}s, peak {:.3}",
                output.display(),
                summary.duration_seconds(),
                summary.peak
            );
            Ok(())
        }
        Commands::Devices => devices(),
    }
}

fn load_registry(path: Option<&Path>) -> Result<TemperamentRegistry> {
    let registry = match path {
        Some(path) => TemperamentRegistry::load(path)?,
        None => TemperamentRegistry::defaults()?,
    };
    Ok(registry)
}

/// Look up `id` and apply the root and pitchbend flags to the shared handle.
fn tuned(registry: &TemperamentRegistry, id: &str, args: &TuningArgs) -> Result<SharedTemperament> {
    let temperament = registry.get(id)?;

    {
        let mut temperament = temperament.write();
        if let Some(root) = &args.root {
            let pitch_class = parse_pitch_class(root)
                .ok_or_else(|| Error::InvalidArgument(format!("unknown key '{}'", root)))?;
            if !temperament.is_shiftable() {
                warn!("'{}' cannot be shifted, ignoring --root", id);
            }
            temperament.shift_to(pitch_class as i32);
        }
        temperament.set_pitchbend(args.pitchbend);
    }

    Ok(temperament)
}

fn key_name(pitch_class: Option<u8>) -> &'static str {
    pitch_class.and_then(pitch_class_name).unwrap_or("-")
}

fn list(registry: &TemperamentRegistry) -> Result<()> {
    println!("{:<16} {:<24} {:<10} ROOT", "ID", "NAME", "SHIFTABLE");
    for (id, temperament) in registry.iter() {
        let temperament = temperament.read();
        println!(
            "{:<16} {:<24} {:<10} {}",
            id,
            temperament.name(),
            if temperament.is_shiftable() { "yes" } else { "no" },
            key_name(temperament.current_root_note())
        );
    }
    Ok(())
}

fn show(registry: &TemperamentRegistry, id: &str, args: &TuningArgs, start: i32) -> Result<()> {
    let temperament = tuned(registry, id, args)?;
    let temperament = temperament.read();

    println!("{} ({})", temperament.name(), temperament.identifier());
    match temperament.current_root_note() {
        Some(root) => println!("  root:          {} (shiftable)", key_name(Some(root))),
        None => println!("  root:          fixed"),
    }
    println!("  concert pitch: {:.2} Hz", temperament.concert_pitch_hz());
    println!("  pitchbend:     {:+.1} cents", temperament.pitchbend_cents());

    println!("  deviations (cents):");
    for (pitch_class, deviation) in temperament.active_deviations().iter().enumerate() {
        println!("    {:<4} {:+7.2}", key_name(Some(pitch_class as u8)), deviation);
    }

    println!("  circle of fifths:");
    for (pitch_class, deviation) in fifths_order(start).iter().zip(temperament.circle_of_fifths(start)) {
        println!("    {:<4} {:+7.2}", key_name(Some(*pitch_class)), deviation);
    }

    for note in [Note::MIDDLE_C, Note::CONCERT_A] {
        println!("  {:<4} = {:.3} Hz", note.to_string(), temperament.frequency_for(note));
    }
    Ok(())
}

fn chart(registry: &TemperamentRegistry, start: i32) -> Result<()> {
    print!("{:<24}", "");
    for pitch_class in fifths_order(start) {
        print!("{:>7}", key_name(Some(pitch_class)));
    }
    println!();

    for series in registry.chart_series(start) {
        print!("{:<24}", series.name);
        for value in series.values {
            print!("{:>7.1}", value);
        }
        println!();
    }
    Ok(())
}

#[cfg(feature = "cpal")]
fn play(
    registry: &TemperamentRegistry,
    midi: &Path,
    id: &str,
    args: &TuningArgs,
    sample_rate: Option<u32>,
    device: Option<usize>,
) -> Result<()> {
    use stimmung::{CpalOutput, PlaybackController};

    let temperament = tuned(registry, id, args)?;
    let midi_file = Arc::new(ParsedMidiFile::load(midi)?);

    let output = match device {
        Some(index) => CpalOutput::with_device(index),
        None => CpalOutput::new(),
    };
    let sample_rate = match sample_rate {
        Some(rate) => rate,
        None => output.default_sample_rate()?,
    };
    let mut player = PlaybackController::builder()
        .sample_rate(sample_rate)
        .output(output)
        .on_state_change(|source, state| info!("{}: {:?}", source, state))
        .build()?;

    player.play(midi.display().to_string(), midi_file, temperament)?;
    if let Some(session) = player.session() {
        let midi_file = session.midi_file();
        info!(
            "{} notes, {:.1}s at {} Hz",
            midi_file.note_count(),
            midi_file.duration_seconds(),
            sample_rate
        );
    }
    while player.is_playing() {
        player.process_events();
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    Ok(())
}

#[cfg(not(feature = "cpal"))]
fn play(
    _registry: &TemperamentRegistry,
    _midi: &Path,
    _id: &str,
    _args: &TuningArgs,
    _sample_rate: Option<u32>,
    _device: Option<usize>,
) -> Result<()> {
    Err(Error::InvalidArgument(
        "built without audio output (feature `cpal`)".to_string(),
    ))
}

#[cfg(feature = "cpal")]
fn devices() -> Result<()> {
    for device in stimmung::CpalOutput::list_output_devices()? {
        println!("{}", device);
    }
    Ok(())
}

#[cfg(not(feature = "cpal"))]
fn devices() -> Result<()> {
    Err(Error::InvalidArgument(
        "built without audio output (feature `cpal`)".to_string(),
    ))
}
