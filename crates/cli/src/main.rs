//! CLI tool for analyzing text and exporting it as slide decks.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use slide_core::style::{list_languages, list_themes, list_tones};
use slide_core::{
    AnalysisHints, DeckEncoder, EngineConfig, ExportFormat, ExportRequest, Language, PdfConfig,
    Pipeline, Tone,
};
use slide_pdf::{PdfEncoder, UnicodeFont};
use slide_pptx::PptxEncoder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Turn plain text into PowerPoint or PDF slide decks.
#[derive(Parser, Debug)]
#[command(name = "slide-export")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze text and print the detected language, tone, theme and
    /// proposed slides
    Analyze {
        /// Input text file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Language to assume when the text is inconclusive
        #[arg(long)]
        language: Option<String>,

        /// Tone to assume when the text shows no tone signals
        #[arg(long)]
        tone: Option<String>,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Export text file(s) as decks
    Export {
        /// Input text file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Output format: pptx or pdf
        #[arg(short, long, default_value = "pptx")]
        format: ExportFormat,

        #[arg(short, long, default_value = "professional")]
        theme: String,

        #[arg(long, default_value = "formal")]
        tone: String,

        #[arg(short, long, default_value = "en")]
        language: String,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Creation time recorded in the document (RFC 3339). Without it
        /// documents carry no date and output is reproducible.
        #[arg(long)]
        timestamp: Option<String>,

        /// TrueType font for PDF text outside Latin-1, such as Hindi.
        /// Overrides `pdf.unicode_font` from the config file.
        #[arg(long)]
        unicode_font: Option<PathBuf>,
    },

    /// List themes with their colors
    Themes {
        #[arg(long)]
        json: bool,
    },

    /// List tones
    Tones,

    /// List languages
    Languages,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = load_config(args.config.as_deref())?;
    let pipeline = Pipeline::new(config);

    match &args.command {
        Command::Analyze {
            input,
            language,
            tone,
            json,
        } => {
            let hints = parse_hints(language.as_deref(), tone.as_deref())?;
            for input_path in input {
                let text = read_input(input_path)?;
                let result = pipeline
                    .analyze(&text, &hints)
                    .with_context(|| format!("Failed to analyze {}", input_path.display()))?;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                    continue;
                }

                println!("{}", input_path.display());
                println!("  language: {}", result.detected_language);
                println!("  tone:     {}", result.detected_tone);
                match result.detected_theme {
                    Some(theme) => println!("  theme:    {}", theme),
                    None => println!("  theme:    (no suggestion)"),
                }
                for (i, slide) in result.proposed_slides.iter().enumerate() {
                    let kinds: Vec<String> =
                        slide.blocks.iter().map(|b| b.kind().to_string()).collect();
                    println!("  slide {}: {}", i + 1, kinds.join(", "));
                }
            }
        }
        Command::Export {
            input,
            format,
            theme,
            tone,
            language,
            output,
            timestamp,
            unicode_font,
        } => {
            let created = timestamp.as_deref().map(parse_timestamp).transpose()?;
            let encoder: Box<dyn DeckEncoder> = match format {
                ExportFormat::Pptx => Box::new(PptxEncoder::new()),
                ExportFormat::Pdf => Box::new(pdf_encoder(
                    &pipeline.config().pdf,
                    unicode_font.as_deref(),
                )?),
            };

            // Inputs are independent, so they are exported in parallel.
            let results: Vec<(&PathBuf, Result<PathBuf>)> = input
                .par_iter()
                .map(|input_path| {
                    let result = export_file(
                        &pipeline,
                        encoder.as_ref(),
                        input_path,
                        ExportOptions {
                            theme,
                            tone,
                            language,
                            created,
                            output_dir: output.as_deref(),
                        },
                    );
                    (input_path, result)
                })
                .collect();

            let mut failed = 0;
            for (input_path, result) in results {
                match result {
                    Ok(output_path) => {
                        if args.verbose {
                            eprintln!("Written to: {}", output_path.display());
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        eprintln!("Error processing {}: {:#}", input_path.display(), e);
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{} of {} inputs failed", failed, input.len());
            }
        }
        Command::Themes { json } => {
            let themes = list_themes();
            if *json {
                println!("{}", serde_json::to_string_pretty(&themes)?);
            } else {
                for theme in themes {
                    println!("{:<14}{} {}", theme.id, theme.colors[0], theme.colors[1]);
                }
            }
        }
        Command::Tones => list_tones().iter().for_each(|t| println!("{}", t)),
        Command::Languages => list_languages().iter().for_each(|l| println!("{}", l)),
    }

    Ok(())
}

/// Per-request settings shared by every input of one export run.
#[derive(Debug, Clone, Copy)]
struct ExportOptions<'a> {
    theme: &'a str,
    tone: &'a str,
    language: &'a str,
    created: Option<DateTime<Utc>>,
    output_dir: Option<&'a Path>,
}

/// Export a single text file and return where it was written.
fn export_file(
    pipeline: &Pipeline,
    encoder: &dyn DeckEncoder,
    input_path: &Path,
    options: ExportOptions<'_>,
) -> Result<PathBuf> {
    let text = read_input(input_path)?;

    let mut request = ExportRequest::new(&text, options.theme, options.tone, options.language);
    if let Some(created) = options.created {
        request = request.with_created(created);
    }

    let artifact = pipeline.export(&request, encoder)?;
    log::debug!(
        "{}: {} ({} bytes, suggested name {})",
        input_path.display(),
        artifact.mime_type(),
        artifact.bytes().len(),
        artifact.filename()
    );

    let output_path = get_output_path(input_path, options.output_dir, encoder.format())?;
    write_output(&output_path, artifact.bytes())?;
    Ok(output_path)
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            EngineConfig::from_toml_str(&content)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

/// PDF encoder, loading the Unicode font named by `font` or the config.
fn pdf_encoder(config: &PdfConfig, font: Option<&Path>) -> Result<PdfEncoder> {
    let encoder = PdfEncoder::new(config.clone());
    match font.or(config.unicode_font.as_deref()) {
        Some(path) => {
            let font = UnicodeFont::open(path)
                .with_context(|| format!("Failed to load font {}", path.display()))?;
            log::debug!("Using {} for Unicode text", font.name());
            Ok(encoder.with_unicode_font(font))
        }
        None => Ok(encoder),
    }
}

fn parse_hints(language: Option<&str>, tone: Option<&str>) -> Result<AnalysisHints> {
    let mut hints = AnalysisHints::default();
    if let Some(language) = language {
        hints = hints.with_language(language.parse::<Language>()?);
    }
    if let Some(tone) = tone {
        hints = hints.with_tone(tone.parse::<Tone>()?);
    }
    Ok(hints)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid timestamp '{}', expected RFC 3339", value))?;
    Ok(parsed.with_timezone(&Utc))
}

fn read_input(input_path: &Path) -> Result<String> {
    std::fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))
}

/// Determine the output path for a processed file.
fn get_output_path(
    input_path: &Path,
    output_dir: Option<&Path>,
    format: ExportFormat,
) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let output_filename = format!("{}.{}", stem, format.extension());

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_export_args() {
        let args = Args::try_parse_from([
            "slide-export",
            "export",
            "notes.txt",
            "--format",
            "pdf",
            "--theme",
            "medical",
            "--timestamp",
            "2024-05-01T12:00:00Z",
        ])
        .unwrap();
        match args.command {
            Command::Export {
                format,
                theme,
                timestamp,
                ..
            } => {
                assert_eq!(format, ExportFormat::Pdf);
                assert_eq!(theme, "medical");
                let created = parse_timestamp(timestamp.as_deref().unwrap()).unwrap();
                assert_eq!(created.to_rfc3339(), "2024-05-01T12:00:00+00:00");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_output_path() {
        let path = get_output_path(Path::new("talks/intro.txt"), None, ExportFormat::Pptx).unwrap();
        assert_eq!(path, PathBuf::from("talks/intro.pptx"));
    }

    #[test]
    fn test_unicode_font_must_load() {
        let config = PdfConfig {
            unicode_font: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..PdfConfig::default()
        };
        let err = pdf_encoder(&config, None).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/font.ttf"));
        assert!(pdf_encoder(&PdfConfig::default(), None).is_ok());

        let args = Args::try_parse_from([
            "slide-export",
            "export",
            "notes.txt",
            "--unicode-font",
            "fonts/hindi.ttf",
        ])
        .unwrap();
        match args.command {
            Command::Export { unicode_font, .. } => {
                assert_eq!(unicode_font, Some(PathBuf::from("fonts/hindi.ttf")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_hints_rejected() {
        assert!(parse_hints(Some("fr"), None).is_err());
        let hints = parse_hints(Some("hi"), Some("humorous")).unwrap();
        assert_eq!(hints.language_hint, Some(Language::Hi));
        assert_eq!(hints.tone_hint, Some(Tone::Humorous));
    }

    #[test]
    fn test_export_file_writes_artifact() {
        let dir = std::env::temp_dir().join(format!("slide-export-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("agenda.txt");
        std::fs::write(&input, "# Agenda\n- Welcome\n- Review").unwrap();

        let output = export_file(
            &Pipeline::default(),
            &PdfEncoder::default(),
            &input,
            ExportOptions {
                theme: "minimalist",
                tone: "casual",
                language: "en",
                created: None,
                output_dir: None,
            },
        )
        .unwrap();
        assert_eq!(output, dir.join("agenda.pdf"));
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF-1.7"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
