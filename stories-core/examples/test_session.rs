//! Walk through a story session end to end on a manual clock.

use std::sync::Arc;

use chrono::{Duration, Utc};
use stories_core::{
    ManualClock, MemoryRepository, PlaybackEvent, SessionConfig, StoryRequest, StorySession,
    TickOutcome,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Testing Stories Core ===\n");

    // Test 1: Open a session on an empty store
    println!("1. Opening session...");
    let clock = ManualClock::new(Utc::now());
    let mut session = StorySession::with_parts(
        Arc::new(MemoryRepository::new()),
        Arc::new(clock.clone()),
        SessionConfig::new(),
    )
    .await;
    println!("   Feed seeded with {} stories", session.stories().len());

    // Test 2: Share a story
    println!("\n2. Sharing a text story...");
    let story = session
        .create_story(StoryRequest::text("Hello from the terminal"))
        .await?;
    println!(
        "   Created {} story, {}",
        story.kind(),
        story.format_remaining(session.feed().now())
    );

    // Test 3: Watch the whole feed
    println!("\n3. Watching the feed...");
    session.open_viewer(0).await?;
    let mut ticks = 0;
    while let Some((outcome, events)) = session.tick_active().await {
        ticks += 1;
        for event in events {
            if let PlaybackEvent::Advanced { from, to } = event {
                println!("   Advanced {from} -> {to} after {ticks} ticks");
            }
        }
        if outcome == TickOutcome::Finished {
            break;
        }
    }
    println!(
        "   Finished after {ticks} ticks, {} unviewed",
        session.feed().unviewed_count()
    );

    // Test 4: Let everything expire
    println!("\n4. Advancing the clock two days...");
    clock.advance(Duration::hours(48));
    session.refresh().await;
    println!("   Feed now holds {} stories", session.stories().len());

    println!("\n=== All tests passed! ===");
    Ok(())
}
