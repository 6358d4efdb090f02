use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err("invalid threads, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected at least 1 second".to_string());
        }
    }
    if let Some(ua) = args.user_agent.as_deref() {
        if ua.trim().is_empty() {
            return Err("invalid user-agent, expected a non-empty value".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn zero_threads_rejected() {
        let args = CliArgs::parse_from(["dirscan", "-u", "http://a.com", "-w", "w.txt", "-t", "0"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let args = CliArgs::parse_from(["dirscan", "-u", "http://a.com", "-w", "w.txt", "-T", "0"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn defaults_pass() {
        let args = CliArgs::parse_from(["dirscan", "-u", "http://a.com", "-w", "w.txt"]);
        assert!(validate(&args).is_ok());
    }
}
