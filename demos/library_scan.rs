use dirscan::runner::{Options, Runner, WordlistSource};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(Options {
        urls: vec!["https://example.com/".to_string()],
        wordlist: Some(WordlistSource::Inline(vec![
            "admin".to_string(),
            "login".to_string(),
            "backup".to_string(),
        ])),
        workers: 4,
        timeout_seconds: 5,
        ..Options::default()
    })?;
    let result = runner.run().await?;

    println!("Probes: {}", result.probes_sent);
    println!("Findings: {}", result.findings.len());
    for f in result.findings.iter() {
        println!("{} {:?} {}", f.status, f.class, f.url);
    }

    Ok(())
}
