//! Headless mode for the stories client.
//!
//! Reads `#commands` from stdin, one per line, and prints the tagged
//! responses. Designed for scripts and automated testing.

use std::io::{self, BufRead, Write};

use stories_core::{HeadlessStories, StorySession};

/// Run the line protocol until `#quit` or end of input.
pub async fn run_headless(session: StorySession) -> io::Result<()> {
    let mut driver = HeadlessStories::new(session);
    let mut stdout = io::stdout();

    println!("=== Stories Headless Mode ===");
    println!(
        "{} stories in the feed, {} unviewed",
        driver.session().stories().len(),
        driver.session().feed().unviewed_count()
    );
    println!();
    println!("Commands:");
    for line in HeadlessStories::help() {
        println!("  {line}");
    }
    println!();
    stdout.flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let output = driver.execute(&line).await;
        for out in &output.lines {
            println!("{out}");
        }
        stdout.flush()?;

        if output.quit {
            break;
        }
    }

    Ok(())
}
