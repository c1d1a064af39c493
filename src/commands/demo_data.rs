//! Demo data command - seed sample items for trying out search and feedback

use anyhow::Result;
use chrono::Utc;

use recall::config::Config;

const SAMPLE_SUMMARIES: &[(&str, &str, &str, &str)] = &[
    (
        "s001",
        "user1",
        "User wants to book a hotel room in downtown for weekend",
        "Business travel booking request",
    ),
    (
        "s002",
        "user1",
        "User needs flight information from NYC to LA",
        "Flight information inquiry",
    ),
    (
        "s003",
        "user2",
        "User asking about restaurant reservations for anniversary dinner",
        "Restaurant reservation request",
    ),
    (
        "s004",
        "user3",
        "User wants to cancel existing hotel booking",
        "Hotel cancellation request",
    ),
    (
        "s005",
        "user2",
        "User needs help with travel insurance options",
        "Travel insurance inquiry",
    ),
    (
        "s006",
        "user4",
        "User looking for car rental near airport",
        "Car rental request",
    ),
    (
        "s007",
        "user1",
        "User wants to upgrade flight seat to business class",
        "Flight upgrade request",
    ),
    (
        "s008",
        "user3",
        "User asking about pet-friendly hotel options",
        "Pet-friendly accommodation inquiry",
    ),
    (
        "s009",
        "user5",
        "User needs train schedule information",
        "Train schedule inquiry",
    ),
    (
        "s010",
        "user2",
        "User wants to book spa appointment at hotel",
        "Hotel spa booking request",
    ),
];

const SAMPLE_TASKS: &[(&str, &str, &str, &str)] = &[
    (
        "t001",
        "s001",
        "user1",
        "Find available hotel rooms in downtown area for weekend dates",
    ),
    (
        "t002",
        "s002",
        "user1",
        "Check flight schedules and prices from NYC to LA",
    ),
    (
        "t003",
        "s003",
        "user2",
        "Search for Italian restaurants with availability for anniversary",
    ),
    (
        "t004",
        "s004",
        "user3",
        "Process hotel booking cancellation and refund",
    ),
    (
        "t005",
        "s005",
        "user2",
        "Research travel insurance providers and coverage options",
    ),
    (
        "t006",
        "s006",
        "user4",
        "Find car rental companies near airport with good rates",
    ),
    (
        "t007",
        "s007",
        "user1",
        "Check availability and cost for flight seat upgrade",
    ),
    (
        "t008",
        "s008",
        "user3",
        "Locate pet-friendly hotels with appropriate amenities",
    ),
    (
        "t009",
        "s009",
        "user5",
        "Provide train schedule and booking information",
    ),
    (
        "t010",
        "s010",
        "user2",
        "Book spa services at user's hotel location",
    ),
];

const SAMPLE_RESPONSES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "r001",
        "t001",
        "user1",
        "I found 5 available hotels in downtown. The Grand Plaza has rooms starting at $200/night.",
        "helpful",
    ),
    (
        "r002",
        "t002",
        "user1",
        "Here are 3 direct flights from NYC to LA: American Airlines at 9am ($450), Delta at 2pm ($480), United at 6pm ($420).",
        "informative",
    ),
    (
        "r003",
        "t003",
        "user2",
        "I found La Bella Vista restaurant with availability for your anniversary. They have a romantic table for two at 7pm.",
        "warm",
    ),
    (
        "r004",
        "t004",
        "user3",
        "Your hotel booking has been successfully cancelled. The full refund of $350 will be processed within 3-5 business days.",
        "professional",
    ),
    (
        "r005",
        "t005",
        "user2",
        "I recommend checking World Nomads or Allianz for comprehensive travel insurance. Both offer good coverage for international trips.",
        "helpful",
    ),
];

pub fn execute(config: &Config) -> Result<()> {
    let db = super::open_database(config)?;
    let now = Utc::now().to_rfc3339();

    for (summary_id, user_id, message_text, summary_text) in SAMPLE_SUMMARIES {
        db.execute(
            "INSERT OR REPLACE INTO summaries (summary_id, user_id, message_text, summary_text, timestamp)
             VALUES (?, ?, ?, ?, ?)",
            &[summary_id, user_id, message_text, summary_text, &now],
        )?;
    }

    for (task_id, summary_id, user_id, task_text) in SAMPLE_TASKS {
        db.execute(
            "INSERT OR REPLACE INTO tasks (task_id, summary_id, user_id, task_text, priority, timestamp)
             VALUES (?, ?, ?, ?, 'medium', ?)",
            &[task_id, summary_id, user_id, task_text, &now],
        )?;
    }

    for (response_id, task_id, user_id, response_text, tone) in SAMPLE_RESPONSES {
        db.execute(
            "INSERT OR REPLACE INTO responses (response_id, task_id, user_id, response_text, tone, status, timestamp)
             VALUES (?, ?, ?, ?, ?, 'ok', ?)",
            &[response_id, task_id, user_id, response_text, tone, &now],
        )?;
    }

    println!("✅ Generated demo data:");
    println!("   {} summaries", SAMPLE_SUMMARIES.len());
    println!("   {} tasks", SAMPLE_TASKS.len());
    println!("   {} responses", SAMPLE_RESPONSES.len());
    println!();
    println!("Run `recall reindex` to build embeddings for them.");
    Ok(())
}
