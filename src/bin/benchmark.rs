use chrono::{Duration as ChronoDuration, Utc};
use colored::*;
use governor::{Quota, RateLimiter};
use hdrhistogram::Histogram;
use reqwest::Client;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use uuid::Uuid;

const DURATION_SECS: u64 = 20;
const BASE_URL: &str = "http://localhost:3000";

struct Target {
    name: &'static str,
    url: String,
    member_id: Option<String>,
}

#[tokio::main]
async fn main() {
    println!("{}", "🚀 Starting Benchmark Suite".bold().green());
    println!("Target URL: {}", BASE_URL);

    let client = Client::builder()
        .pool_max_idle_per_host(1000)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    if client.get(format!("{}/health", BASE_URL)).send().await.is_err() {
        eprintln!("{}", "❌ Server is NOT reachable at localhost:3000. Please start it first.".red().bold());
        return;
    }

    println!("\n{}", "⚙️  Setting up benchmark data...".yellow());
    let admin_id = setup_admin(&client).await;
    let event_id = setup_event(&client, &admin_id).await;
    let member_id = setup_member(&client, &admin_id).await;
    rsvp(&client, &member_id, &event_id).await;

    println!("{}", "✅ Data created successfully.".green());
    println!("   Admin ID:  {}", admin_id);
    println!("   Event ID:  {}", event_id);

    let targets = vec![
        Target {
            name: "Health Check (Public)",
            url: format!("{}/health", BASE_URL),
            member_id: None,
        },
        Target {
            name: "Get Event Details (Public Read)",
            url: format!("{}/api/v1/events/{}", BASE_URL, event_id),
            member_id: None,
        },
        Target {
            name: "Event Roster (Admin Read)",
            url: format!("{}/api/v1/events/{}/rsvps", BASE_URL, event_id),
            member_id: Some(admin_id.clone()),
        },
        Target {
            name: "My RSVPs (Member Read)",
            url: format!("{}/api/v1/me/rsvps", BASE_URL),
            member_id: Some(member_id.clone()),
        },
    ];

    let rps_stages = vec![10, 50, 200, 1000];

    for target in targets {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking Endpoint: {}", target.name.cyan().bold());
        println!("URL: {}", target.url);
        println!("{}", "=".repeat(60));

        println!("{:<10} | {:<15} | {:<15} | {:<15}", "RPS", "Mean (ms)", "P99 (ms)", "Success Rate");
        println!("{:-<10}-+-{:-<15}-+-{:-<15}-+-{:-<15}", "", "", "", "");

        for &rps in &rps_stages {
            run_stage(&client, &target, rps).await;
        }
    }
}

async fn setup_admin(client: &Client) -> String {
    // first member in an empty database becomes admin; fall back to creating
    // a regular member through an existing admin if the database is seeded
    let email = format!("bench-admin-{}@example.com", Uuid::new_v4());
    let res = client.post(format!("{}/api/v1/members", BASE_URL))
        .json(&json!({
            "name": "Benchmark Admin",
            "email": email
        }))
        .send()
        .await
        .expect("Failed to send member create request");

    if !res.status().is_success() {
        panic!("Failed to create admin member: status {} (is the database empty?)", res.status());
    }

    let body: Value = res.json().await.expect("Failed to parse member response");
    body["id"].as_str().expect("No member id").to_string()
}

async fn setup_member(client: &Client, admin_id: &str) -> String {
    let email = format!("bench-member-{}@example.com", Uuid::new_v4());
    let res = client.post(format!("{}/api/v1/members", BASE_URL))
        .header("X-Member-Id", admin_id)
        .json(&json!({
            "name": "Benchmark Member",
            "email": email,
            "role": "MEMBER"
        }))
        .send()
        .await
        .expect("Failed to create member");

    if !res.status().is_success() {
        panic!("Failed to create member: status {}", res.status());
    }

    let body: Value = res.json().await.unwrap();
    body["id"].as_str().expect("No member id").to_string()
}

async fn setup_event(client: &Client, admin_id: &str) -> String {
    let event_payload = json!({
        "title": "Benchmark Service",
        "description": "Load testing",
        "location": "Main Hall",
        "start_time": (Utc::now() + ChronoDuration::days(7)).to_rfc3339(),
        "end_time": (Utc::now() + ChronoDuration::days(7) + ChronoDuration::hours(2)).to_rfc3339(),
        "max_capacity": null
    });

    let res = client.post(format!("{}/api/v1/events", BASE_URL))
        .header("X-Member-Id", admin_id)
        .json(&event_payload)
        .send()
        .await
        .expect("Failed to create event");

    if !res.status().is_success() {
        let status = res.status();
        let txt = res.text().await.unwrap_or_default();
        panic!("Failed to create event data. Status: {}. Body: {}", status, txt);
    }

    let body: Value = res.json().await.unwrap();
    body["id"].as_str().expect("No event id").to_string()
}

async fn rsvp(client: &Client, member_id: &str, event_id: &str) {
    let res = client.post(format!("{}/api/v1/events/{}/rsvp", BASE_URL, event_id))
        .header("X-Member-Id", member_id)
        .send()
        .await
        .expect("Failed to RSVP");

    if !res.status().is_success() {
        panic!("Failed to RSVP during setup: status {}", res.status());
    }
}

async fn run_stage(client: &Client, target: &Target, rps: u32) {
    let limiter = Arc::new(RateLimiter::direct(
        Quota::per_second(NonZeroU32::new(rps).unwrap())
    ));

    let (tx, mut rx) = mpsc::channel(50000);
    let start_time = Instant::now();
    let duration = Duration::from_secs(DURATION_SECS);

    loop {
        if start_time.elapsed() > duration {
            break;
        }

        if limiter.check().is_ok() {
            let client = client.clone();
            let url = target.url.clone();
            let member_id = target.member_id.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let req_start = Instant::now();
                let mut req = client.get(&url);
                if let Some(id) = member_id {
                    req = req.header("X-Member-Id", id);
                }
                let res = req.send().await;
                let latency = req_start.elapsed();

                let success = match res {
                    Ok(r) => r.status().is_success(),
                    Err(_) => false,
                };

                let _ = tx.send((latency, success)).await;
            });
        } else {
            tokio::task::yield_now().await;
        }
    }

    drop(tx);

    let mut histogram = Histogram::<u64>::new(3).unwrap();
    let mut successes = 0;
    let mut total = 0;

    while let Some((latency, success)) = rx.recv().await {
        total += 1;
        if success { successes += 1; }
        histogram.record(latency.as_micros() as u64).unwrap();
    }

    let mean_ms = histogram.mean() / 1000.0;
    let p99_ms = histogram.value_at_quantile(0.99) as f64 / 1000.0;
    let success_rate = if total > 0 { (successes as f64 / total as f64) * 100.0 } else { 0.0 };

    println!(
        "{:<10} | {:<15.2} | {:<15.2} | {:<14.1}%",
        rps,
        mean_ms,
        p99_ms,
        success_rate
    );

    tokio::time::sleep(Duration::from_millis(500)).await;
}
