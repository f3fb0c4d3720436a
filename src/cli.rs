// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for capture operations
//!
//! This module provides command-line functionality for:
//! - Taking photos
//! - Recording videos
//! - Walking through an offline capture and sync

use asset_capture::notifications::TracingSink;
use asset_capture::storage::save_artifact;
use asset_capture::{
    AssetCaptureApp, CameraMode, Config, Submission, SyncEvent, UploadLedger, VirtualCamera,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn build_app(mut config: Config, offline: bool) -> AssetCaptureApp {
    config.start_offline |= offline;
    AssetCaptureApp::new(
        config,
        Arc::new(VirtualCamera::default()),
        Arc::new(TracingSink),
    )
}

async fn save_submission(
    app: &AssetCaptureApp,
    submission: &Submission,
    output: Option<PathBuf>,
) -> CliResult {
    let output_dir = output.unwrap_or_else(|| app.config().output_dir());
    let path = save_artifact(&submission.artifact, &output_dir).await?;

    println!("Saved: {}", path.display());
    println!("Upload: {}", serde_json::to_string(&submission.item)?);
    Ok(())
}

fn print_ledger(ledger: &UploadLedger) {
    println!(
        "Queued: {}, confirmed: {}",
        ledger.queue_len(),
        ledger.confirmed_len()
    );
}

/// Take a photo with the virtual camera
pub async fn take_photo(config: Config, output: Option<PathBuf>, offline: bool) -> CliResult {
    let app = build_app(config, offline);
    let surface = app.capture_surface(CameraMode::Photo);

    println!("{}...", surface.title());
    surface.show().await?;

    let submission = surface
        .capture_photo()
        .await?
        .ok_or("Capture was interrupted")?;
    save_submission(&app, &submission, output).await?;
    print_ledger(app.ledger());

    surface.dismiss();
    Ok(())
}

/// Record a video with the virtual camera
pub async fn record_video(
    config: Config,
    duration: u64,
    output: Option<PathBuf>,
    offline: bool,
) -> CliResult {
    let app = build_app(config, offline);
    let surface = app.capture_surface(CameraMode::Video);

    surface.show().await?;

    println!();
    println!("Recording... (press Ctrl+C to stop early)");
    surface.start_recording()?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    println!();

    let submission = surface
        .stop_recording()
        .await
        .ok_or("Recording ended without a video")?;
    save_submission(&app, &submission, output).await?;
    print_ledger(app.ledger());

    surface.dismiss();
    Ok(())
}

/// Capture `items` photos offline, then go online and wait for the sync
pub async fn sync_demo(config: Config, items: usize) -> CliResult {
    let app = build_app(config, true);
    let mut events = app.sync().subscribe();

    let surface = app.capture_surface(CameraMode::Photo);
    surface.show().await?;
    for _ in 0..items {
        if let Some(submission) = surface.capture_photo().await? {
            println!(
                "Captured {} ({} bytes), status {}",
                submission.item.label,
                submission.artifact.len(),
                submission.item.status
            );
        }
    }
    surface.dismiss();
    print_ledger(app.ledger());

    if app.ledger().queue_len() == 0 {
        println!("Nothing to sync");
        return Ok(());
    }

    println!("Going online...");
    app.set_online(true);

    loop {
        match events.recv().await? {
            SyncEvent::Started { count } => println!("Syncing {} item(s)...", count),
            SyncEvent::Completed { count, ids } => {
                println!("Synced {} item(s): {:?}", count, ids);
                break;
            }
        }
    }

    print_ledger(app.ledger());
    println!("{}", app.ledger().export_json()?);
    Ok(())
}
