use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dirscan",
    version,
    about = "Fast HTTP directory brute-forcer",
    long_about = "Dirscan probes every wordlist entry against every target URL and reports each path that does not answer 404.\n\nExamples:\n  Scan single URL: dirscan -u http://example.com -w paths.txt\n  Scan URL list: dirscan -U urls.txt -w paths.txt -t 20"
)]
pub struct CliArgs {
    #[arg(
        short = 'u',
        long = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Target URL."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'U',
        long = "url-file",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load target URLs from a file (one per line)."
    )]
    pub url_file: Option<String>,

    #[arg(
        short = 'w',
        long = "wordlist",
        value_name = "FILE",
        help_heading = "Input",
        help = "Directory wordlist file (one path per line)."
    )]
    pub wordlist: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to a YAML config file."
    )]
    pub config: Option<String>,

    #[arg(
        short = 't',
        long = "threads",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of concurrent workers (default 10)."
    )]
    pub threads: Option<usize>,

    #[arg(
        short = 'T',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds (default 10)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'A',
        long = "user-agent",
        value_name = "UA",
        help_heading = "HTTP",
        help = "User-Agent header sent with every request."
    )]
    pub user_agent: Option<String>,

    #[arg(
        short = 'N',
        long = "no-title",
        help_heading = "Output",
        help = "Only report status codes, do not download bodies for titles."
    )]
    pub no_title: bool,

    #[arg(
        short = 'n',
        long = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'p',
        long = "progress",
        help_heading = "Output",
        help = "Show a progress bar on stderr."
    )]
    pub progress: bool,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,
}
