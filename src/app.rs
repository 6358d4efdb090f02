use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::runner::{self, Options, Runner, WordlistSource};

fn print_banner() {
    eprintln!("{}", "-".repeat(50));
    eprintln!(
        "dirscan v{} - Fast HTTP directory brute-forcer",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("{}", "-".repeat(50));
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

// headings in the order they are printed; clap's own -h/-V land in "Options"
const HELP_SECTIONS: [&str; 5] = ["Input", "Performance", "HTTP", "Output", "Options"];

fn flag_column(arg: &clap::Arg) -> String {
    let short = arg.get_short().map(|c| format!("-{c}"));
    let long = arg.get_long().map(|l| format!("--{l}"));
    let mut column = short.into_iter().chain(long).collect::<Vec<_>>().join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map_or("VALUE", |name| name.as_str());
        column.push_str(&format!(" <{value}>"));
    }
    column
}

fn help_text(arg: &clap::Arg) -> String {
    arg.get_help()
        .map(|h| h.to_string().trim().to_string())
        .unwrap_or_default()
}

fn render_custom_help() -> String {
    let mut cmd = CliArgs::command();
    cmd.build();
    let mut out = String::new();
    let rule = "-".repeat(50);

    out.push_str(&rule);
    out.push('\n');
    out.push_str(cmd.get_name());
    if let Some(version) = cmd.get_version() {
        out.push(' ');
        out.push_str(version);
    }
    if let Some(about) = cmd.get_about() {
        out.push_str(" - ");
        out.push_str(&about.to_string());
    }
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    out.push_str("Usage: ");
    out.push_str(cmd.get_name());
    out.push_str(" [OPTIONS]\n\n");

    let visible: Vec<&clap::Arg> = cmd.get_arguments().filter(|a| !a.is_hide_set()).collect();
    for heading in HELP_SECTIONS {
        let in_section: Vec<&&clap::Arg> = visible
            .iter()
            .filter(|a| a.get_help_heading().unwrap_or("Options") == heading)
            .collect();
        if in_section.is_empty() {
            continue;
        }

        out.push_str(heading);
        out.push_str(":\n");
        for arg in in_section {
            out.push_str(&format!("  {:<28} {}\n", flag_column(arg), help_text(arg)));
        }
        out.push('\n');
    }

    if let Some(long_about) = cmd.get_long_about() {
        let text = long_about.to_string();
        if let Some((_, examples)) = text.split_once("Examples:") {
            out.push_str("Examples:");
            out.push_str(examples);
            out.push('\n');
        }
    }
    out.push_str(&rule);
    out.push('\n');

    out
}

// what the cli should do once arguments and config are merged
#[derive(Debug)]
pub(crate) enum Plan {
    Usage,
    Scan { options: Options, verbose: u8 },
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn build_plan(args: CliArgs, cfg: ConfigFile) -> Result<Plan, String> {
    let url = non_empty(args.url.clone()).or_else(|| non_empty(cfg.url));
    let url_file = non_empty(args.url_file.clone()).or_else(|| non_empty(cfg.url_file));
    let wordlist = non_empty(args.wordlist.clone()).or_else(|| non_empty(cfg.wordlist));

    // missing inputs print usage before any flag value is looked at
    if (url.is_none() && url_file.is_none()) || wordlist.is_none() {
        return Ok(Plan::Usage);
    }

    validation::validate(&args)?;

    let workers = args.threads.or(cfg.threads).unwrap_or(runner::DEFAULT_WORKERS);
    let timeout_seconds = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(runner::DEFAULT_TIMEOUT_SECONDS);

    let defaults = Options::default();
    let options = Options {
        urls: url.into_iter().collect(),
        url_file,
        wordlist: wordlist.map(WordlistSource::FilePath),
        workers,
        timeout_seconds,
        user_agent: non_empty(args.user_agent)
            .or_else(|| non_empty(cfg.user_agent))
            .unwrap_or(defaults.user_agent),
        fetch_title: !(args.no_title || cfg.no_title.unwrap_or(false)),
        color: !(args.no_color || cfg.no_color.unwrap_or(false)),
        progress: args.progress || cfg.progress.unwrap_or(false),
    };

    Ok(Plan::Scan {
        options,
        verbose: args.verbose,
    })
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "dirscan=warn",
        1 => "dirscan=info",
        _ => "dirscan=debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run_async(options: Options) -> Result<(), String> {
    print_banner();
    if let Some(url) = options.urls.first() {
        format_kv_line("URL", url);
    }
    if let Some(path) = options.url_file.as_deref() {
        format_kv_line("URL file", path);
    }
    if let Some(WordlistSource::FilePath(path)) = options.wordlist.as_ref() {
        format_kv_line("Wordlist", path);
    }
    format_kv_line("Threads", &options.workers.to_string());
    format_kv_line("Timeout", &format!("{}s", options.timeout_seconds));
    eprintln!();

    let runner = Runner::new(options).map_err(|e| e.to_string())?;
    let result = runner.run().await.map_err(|e| e.to_string())?;

    eprintln!();
    eprintln!(
        ":: Completed :: {} findings, {} probes failed, scan took {}s ::",
        result.findings.len(),
        result.probes_failed,
        result.elapsed.as_secs()
    );
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path))?,
        None => ConfigFile::default(),
    };

    let (options, verbose) = match build_plan(args, cfg)? {
        Plan::Usage => {
            print!("{}", render_custom_help());
            return Ok(());
        }
        Plan::Scan { options, verbose } => (options, verbose),
    };

    init_logging(verbose);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(options))
}
