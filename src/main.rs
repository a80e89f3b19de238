use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};
use colored::*;
use ignore::WalkBuilder;

use mdnorm_lib::config::{self, Config};
use mdnorm_lib::exit_codes::exit;
use mdnorm_lib::renumber::renumber_ordered_lists;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Files or directories to normalize. Use "-" to read from stdin and
    /// write the result to stdout.
    #[arg(required = false)]
    paths: Vec<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Report files that are not normalized without rewriting them
    #[arg(long, default_value = "false")]
    check: bool,

    /// Print the normalized content to stdout instead of rewriting in place
    /// (single file only)
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Language token for fence openers without one (overrides config)
    #[arg(long)]
    fence_language: Option<String>,

    /// Derive anchor slugs from document headings in addition to the
    /// configured mapping
    #[arg(long, default_value = "false")]
    auto_anchors: bool,

    /// Renumber ordered lists starting at the given value
    #[arg(long, value_name = "N")]
    renumber_from: Option<u64>,

    /// Show detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode
    #[arg(short, long)]
    quiet: bool,

    /// Command to run
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init,
}

/// Per-file result, aggregated into the summary and the exit code.
#[derive(Debug, Default, Clone, Copy)]
struct FileOutcome {
    changed: bool,
    failed: bool,
}

/// Apply the full configured transformation to one buffer.
fn transform(content: &str, config: &Config, cli: &Cli) -> String {
    // --auto-anchors derives slugs from the document itself; explicit
    // mapping entries win over derived ones.
    let mut effective = config.clone();
    if cli.auto_anchors {
        for (title, slug) in mdnorm_lib::derive_anchor_map(content) {
            effective.anchors.entry(title).or_insert(slug);
        }
    }
    let mut result = mdnorm_lib::normalize_document(content, &effective);
    if let Some(start) = cli.renumber_from {
        result = renumber_ordered_lists(&result, start);
    }
    result
}

// Process file operation
fn process_file(file_path: &str, config: &Config, cli: &Cli) -> FileOutcome {
    let start = Instant::now();

    let content = match fs::read_to_string(file_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{} Failed to read {}: {}", "Error:".red().bold(), file_path, e);
            return FileOutcome {
                changed: false,
                failed: true,
            };
        }
    };

    let output = transform(&content, config, cli);

    if cli.stdout {
        print!("{output}");
        return FileOutcome {
            changed: output != content,
            failed: false,
        };
    }

    if output == content {
        if cli.verbose && !cli.quiet {
            println!("Already normalized: {file_path}");
        }
        return FileOutcome::default();
    }

    if cli.check {
        if !cli.quiet {
            println!("{} {}", "Would rewrite:".yellow().bold(), file_path);
        }
        return FileOutcome {
            changed: true,
            failed: false,
        };
    }

    if let Err(e) = fs::write(file_path, &output) {
        eprintln!("{} Failed to write {}: {}", "Error:".red().bold(), file_path, e);
        return FileOutcome {
            changed: true,
            failed: true,
        };
    }
    log::debug!("rewrote {} in {:?}", file_path, start.elapsed());
    if cli.verbose && !cli.quiet {
        println!("Rewrote: {file_path}");
    }
    FileOutcome {
        changed: true,
        failed: false,
    }
}

#[cfg(feature = "parallel")]
fn process_files(files: &[String], config: &Config, cli: &Cli) -> Vec<FileOutcome> {
    use rayon::prelude::*;
    files
        .par_iter()
        .map(|path| process_file(path, config, cli))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn process_files(files: &[String], config: &Config, cli: &Cli) -> Vec<FileOutcome> {
    files
        .iter()
        .map(|path| process_file(path, config, cli))
        .collect()
}

/// Collect markdown files from the given paths. Directories are walked with
/// gitignore support; only `.md`/`.markdown` files are kept.
fn find_markdown_files(paths: &[String]) -> (Vec<String>, bool) {
    let mut files = Vec::new();
    let mut failed = false;

    for path in paths {
        let target = Path::new(path);
        if target.is_file() {
            files.push(path.clone());
            continue;
        }
        if !target.is_dir() {
            eprintln!(
                "{} No such file or directory: {}",
                "Error:".red().bold(),
                path
            );
            failed = true;
            continue;
        }

        let mut builder = WalkBuilder::new(target);
        builder.hidden(true).require_git(false);
        for entry in builder.build() {
            match entry {
                Ok(entry) if entry.path().is_file() => {
                    files.push(entry.path().to_string_lossy().to_string());
                }
                Ok(_) => {}
                Err(err) => eprintln!("Error walking directory: {err}"),
            }
        }
    }

    files.sort();
    files.dedup();
    files.retain(|path| {
        Path::new(path)
            .extension()
            .is_some_and(|ext| ext == "md" || ext == "markdown")
    });
    (files, failed)
}

// Function to print the run summary
fn print_results(cli: &Cli, changed: usize, total: usize, duration_ms: u64) {
    if cli.quiet || cli.stdout {
        return;
    }

    let file_text = if total == 1 { "file" } else { "files" };

    if changed == 0 {
        println!(
            "\n{} {} {} already normalized ({}ms)",
            "Success:".green().bold(),
            total,
            file_text,
            duration_ms
        );
    } else if cli.check {
        println!(
            "\n{} {}/{} {} not normalized ({}ms)",
            "Check:".yellow().bold(),
            changed,
            total,
            file_text,
            duration_ms
        );
        println!("Run without `--check` to rewrite them");
    } else {
        println!(
            "\n{} Rewrote {}/{} {} ({}ms)",
            "Fixed:".green().bold(),
            changed,
            total,
            file_text,
            duration_ms
        );
    }
}

/// Normalize stdin to stdout. In check mode nothing is rewritten and the
/// exit code reports whether the input was already normalized.
fn process_stdin(config: &Config, cli: &Cli) -> ! {
    let mut content = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut content) {
        eprintln!("{} Failed to read stdin: {}", "Error:".red().bold(), e);
        exit::tool_error();
    }

    let output = transform(&content, config, cli);
    if cli.check {
        if output == content {
            exit::success();
        }
        if !cli.quiet {
            println!("{} <stdin>", "Would rewrite:".yellow().bold());
        }
        exit::not_normalized();
    }

    print!("{output}");
    io::stdout().flush().unwrap();
    exit::success();
}

fn run_init(cli: &Cli) -> ! {
    if Path::new(config::DEFAULT_CONFIG_FILE).exists() {
        eprintln!(
            "{} {} already exists",
            "Error:".red().bold(),
            config::DEFAULT_CONFIG_FILE
        );
        exit::tool_error();
    }
    match fs::write(config::DEFAULT_CONFIG_FILE, config::default_config_template()) {
        Ok(()) => {
            if !cli.quiet {
                println!(
                    "Created default configuration file: {}",
                    config::DEFAULT_CONFIG_FILE
                );
            }
            exit::success();
        }
        Err(e) => {
            eprintln!(
                "{} Failed to create config file: {}",
                "Error:".red().bold(),
                e
            );
            exit::tool_error();
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, mdnorm_lib::ConfigError> {
    match cli.config.as_deref() {
        Some(path) => Config::load(Path::new(path)),
        None => Config::discover(),
    }
}

/// CLI flags override file configuration.
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(language) = &cli.fence_language {
        config.normalize.default_fence_language = language.clone();
    }
    config
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(Commands::Init) = cli.command {
        run_init(&cli);
    }

    if cli.paths.is_empty() {
        eprintln!(
            "{} No files or directories specified. Provide at least one path, or \"-\" for stdin.",
            "Error:".red().bold()
        );
        exit::tool_error();
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            exit::tool_error();
        }
    };
    let config = apply_overrides(config, &cli);

    if cli.paths.len() == 1 && cli.paths[0] == "-" {
        process_stdin(&config, &cli);
    }

    let (files, collect_failed) = find_markdown_files(&cli.paths);
    if files.is_empty() {
        if collect_failed {
            exit::tool_error();
        }
        if !cli.quiet {
            println!("No markdown files found to process.");
        }
        exit::success();
    }
    if cli.stdout && files.len() > 1 {
        eprintln!(
            "{} --stdout requires a single input file",
            "Error:".red().bold()
        );
        exit::tool_error();
    }

    let start_time = Instant::now();
    let outcomes = process_files(&files, &config, &cli);
    let duration = start_time.elapsed();
    let duration_ms = duration.as_secs() * 1000 + u64::from(duration.subsec_millis());

    let changed = outcomes.iter().filter(|outcome| outcome.changed).count();
    let failed = collect_failed || outcomes.iter().any(|outcome| outcome.failed);

    print_results(&cli, changed, files.len(), duration_ms);

    if failed {
        exit::tool_error();
    }
    if cli.check && changed > 0 {
        exit::not_normalized();
    }
    exit::success();
}
