//! Load test for the vortex server.
//!
//! Spawns multiple fake WebSocket clients that:
//! - Connect to the server
//! - Periodically launch a circle
//! - Receive and count drawChange / gemsChange broadcasts
//!
//! Usage: cargo run --bin loadtest -- [OPTIONS]
//!
//! Options:
//!   --clients N      Number of clients to spawn (default: 100)
//!   --duration S     Test duration in seconds (default: 30)
//!   --launch-rate R  Launches per second per client (default: 0.5)
//!   --url URL        Server URL (default: ws://127.0.0.1:3000/ws)

use futures_util::{SinkExt, StreamExt};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use vortex_shared::{ClientMsg, LaunchRequest, ServerMsg};

// === Metrics ===

#[derive(Default)]
struct Metrics {
    connected: AtomicU64,
    messages_received: AtomicU64,
    draw_changes_received: AtomicU64,
    gems_changes_received: AtomicU64,
    dismissals_received: AtomicU64,
    launches_sent: AtomicU64,
    errors: AtomicU64,
    total_circles_seen: AtomicU64,
    latency_sum_ms: AtomicU64,
    latency_count: AtomicU64,
}

// === Client task ===

async fn run_client(
    client_id: u32,
    url: String,
    launch_rate: f64,
    duration: Duration,
    metrics: Arc<Metrics>,
) {
    let connect_start = Instant::now();

    let (mut ws, _) = match connect_async(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            if client_id < 5 {
                eprintln!("Client {} failed to connect: {}", client_id, e);
            }
            metrics.errors.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    metrics
        .latency_sum_ms
        .fetch_add(connect_start.elapsed().as_millis() as u64, Ordering::Relaxed);
    metrics.latency_count.fetch_add(1, Ordering::Relaxed);
    metrics.connected.fetch_add(1, Ordering::Relaxed);

    // Wait for welcome message before doing anything else
    let got_welcome = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                if let Ok(ServerMsg::Welcome(_)) = serde_json::from_str::<ServerMsg>(&text) {
                    return true;
                }
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    if !got_welcome {
        if client_id < 3 {
            eprintln!("Client {} failed to get welcome", client_id);
        }
        metrics.errors.fetch_add(1, Ordering::Relaxed);
        metrics.connected.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    let launch_interval = if launch_rate > 0.0 {
        Duration::from_secs_f64(1.0 / launch_rate)
    } else {
        Duration::from_secs(3600) // Effectively never
    };

    let mut launch_timer = tokio::time::interval(launch_interval);
    launch_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let test_end = Instant::now() + duration;
    let mut rng = ChaCha8Rng::seed_from_u64(client_id as u64 * 12345 + 67890);
    let color = format!("#{:06x}", rng.gen_range(0..0xFFFFFFu32));

    loop {
        if Instant::now() >= test_end {
            break;
        }

        tokio::select! {
            _ = launch_timer.tick() => {
                let msg = ClientMsg::AddCircle(LaunchRequest {
                    x: rng.gen_range(0.0..500.0),
                    y: rng.gen_range(0.0..500.0),
                    vx: rng.gen_range(-3.0..3.0),
                    vy: rng.gen_range(-3.0..3.0),
                    radius: rng.gen_range(2.0..6.0),
                    color: color.clone(),
                });
                let Ok(json) = serde_json::to_string(&msg) else {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                };
                if ws.send(Message::Text(json.into())).await.is_ok() {
                    metrics.launches_sent.fetch_add(1, Ordering::Relaxed);
                } else {
                    metrics.errors.fetch_add(1, Ordering::Relaxed);
                    break;
                }
            }

            msg = ws.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        metrics.messages_received.fetch_add(1, Ordering::Relaxed);
                        match serde_json::from_str::<ServerMsg>(&text) {
                            Ok(ServerMsg::DrawChange { circles }) => {
                                metrics.draw_changes_received.fetch_add(1, Ordering::Relaxed);
                                metrics.total_circles_seen.fetch_add(circles.len() as u64, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::GemsChange { .. }) => {
                                metrics.gems_changes_received.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::BallDismissed { .. }) => {
                                metrics.dismissals_received.fetch_add(1, Ordering::Relaxed);
                            }
                            Ok(ServerMsg::Error(e)) => {
                                if client_id < 3 {
                                    eprintln!("Client {} got error: {}", client_id, e.message);
                                }
                                metrics.errors.fetch_add(1, Ordering::Relaxed);
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        if client_id < 3 {
                            eprintln!("Client {} error: {}", client_id, e);
                        }
                        metrics.errors.fetch_add(1, Ordering::Relaxed);
                        break;
                    }
                    Some(_) => {}
                }
            }
        }
    }

    let _ = ws.close(None).await;
    metrics.connected.fetch_sub(1, Ordering::Relaxed);
}

// === Main ===

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut num_clients: u32 = 100;
    let mut duration_secs: u64 = 30;
    let mut launch_rate: f64 = 0.5;
    let mut url = "ws://127.0.0.1:3000/ws".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" => {
                i += 1;
                num_clients = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(100);
            }
            "--duration" => {
                i += 1;
                duration_secs = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(30);
            }
            "--launch-rate" => {
                i += 1;
                launch_rate = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(0.5);
            }
            "--url" => {
                i += 1;
                url = args.get(i).cloned().unwrap_or(url);
            }
            _ => {}
        }
        i += 1;
    }

    println!("=== Vortex Server Load Test ===");
    println!("Clients: {}", num_clients);
    println!("Duration: {}s", duration_secs);
    println!("Launch rate: {}/s per client", launch_rate);
    println!("URL: {}", url);
    println!();

    let metrics = Arc::new(Metrics::default());
    let duration = Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(num_clients as usize);
    let spawn_start = Instant::now();

    for client_id in 0..num_clients {
        let url = url.clone();
        let metrics = Arc::clone(&metrics);

        handles.push(tokio::spawn(async move {
            run_client(client_id, url, launch_rate, duration, metrics).await;
        }));

        // Stagger spawns slightly to avoid thundering herd
        if client_id % 50 == 49 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    println!("All clients spawned in {:?}", spawn_start.elapsed());
    println!();

    let metrics_clone = Arc::clone(&metrics);
    let stats_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        let start = Instant::now();

        loop {
            interval.tick().await;
            let elapsed = start.elapsed().as_secs();
            if elapsed >= duration_secs + 5 {
                break;
            }
            println!(
                "[{:3}s] connected={}, msgs={}, draw_changes={}, gems_changes={}, launches={}, errors={}",
                elapsed,
                metrics_clone.connected.load(Ordering::Relaxed),
                metrics_clone.messages_received.load(Ordering::Relaxed),
                metrics_clone.draw_changes_received.load(Ordering::Relaxed),
                metrics_clone.gems_changes_received.load(Ordering::Relaxed),
                metrics_clone.launches_sent.load(Ordering::Relaxed),
                metrics_clone.errors.load(Ordering::Relaxed),
            );
        }
    });

    for handle in handles {
        let _ = handle.await;
    }
    stats_handle.abort();

    println!();
    println!("=== Final Results ===");
    let msgs = metrics.messages_received.load(Ordering::Relaxed);
    let draw_changes = metrics.draw_changes_received.load(Ordering::Relaxed);
    let circles = metrics.total_circles_seen.load(Ordering::Relaxed);
    let latency_sum = metrics.latency_sum_ms.load(Ordering::Relaxed);
    let latency_count = metrics.latency_count.load(Ordering::Relaxed);

    println!("Total messages received: {}", msgs);
    println!("Total drawChange messages: {}", draw_changes);
    println!(
        "Total gemsChange messages: {}",
        metrics.gems_changes_received.load(Ordering::Relaxed)
    );
    println!(
        "Total ballDismissed messages: {}",
        metrics.dismissals_received.load(Ordering::Relaxed)
    );
    println!(
        "Total addCircle sent: {}",
        metrics.launches_sent.load(Ordering::Relaxed)
    );
    println!("Total errors: {}", metrics.errors.load(Ordering::Relaxed));
    if draw_changes > 0 {
        println!("Average circles in play: {}", circles / draw_changes);
    }
    if latency_count > 0 {
        println!("Average connect latency: {}ms", latency_sum / latency_count);
    }

    // Velocity integration broadcasts every 20 ms while anything is in play.
    let expected = duration_secs as f64 * 50.0;
    let per_client = draw_changes as f64 / num_clients.max(1) as f64;
    println!();
    println!("Messages/sec (total): {:.0}", msgs as f64 / duration_secs.max(1) as f64);
    println!("drawChange per client: {:.1} (at most ~{:.0})", per_client, expected);
}
