// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::time::Duration;

use anyhow::Result;

use rstab::{
    read_beats_file, AnalysisEvent, BeatsWatcher, EditorConfig, FileAdapter, Instrument,
    NeckLayout, NoteFile, TabEditor,
};

fn print_usage() {
    println!("rstab - Beat-synchronized tablature editing engine");
    println!();
    println!("Usage: rstab [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --beats <FILE>   Parse a beats file and print the grid summary");
    println!("  --notes <FILE>   Print the contents of a note file");
    println!("  --watch <FILE>   Watch a beats file and report rewrites");
    println!("  --demo <DIR>     Run a scripted editing session, saving into DIR");
    println!("  --help           Show this help message");
}

fn show_beats(path: &str) -> Result<()> {
    let beats = read_beats_file(path)?;
    let downbeats = beats.iter().filter(|b| b.is_downbeat()).count();
    println!("{}: {} beats, {} downbeats", path, beats.len(), downbeats);
    if let (Some(first), Some(last)) = (beats.first(), beats.last()) {
        println!("  first beat at {:.3}s, last at {:.3}s", first.start, last.start);
    }
    for beat in beats.iter().take(8) {
        println!("  {:8.3}s  beat {}", beat.start, beat.beat_num);
    }
    if beats.len() > 8 {
        println!("  ... {} more", beats.len() - 8);
    }
    Ok(())
}

fn show_notes(path: &str) -> Result<()> {
    let bytes = std::fs::read(path)?;
    let mut doc: NoteFile = serde_json::from_slice(&bytes)?;
    doc.migrate();
    println!("{}: {} notes (version {})", path, doc.notes.len(), doc.version);
    for note in &doc.notes {
        println!(
            "  string {} fret {:2}  {:8.3}s..{:.3}s",
            note.string, note.fret, note.start_time, note.end_time
        );
    }
    Ok(())
}

fn watch_beats(path: &str) -> Result<()> {
    let config = EditorConfig::default();
    let watcher = BeatsWatcher::new(path, Some(config.watch_debounce_ms))?;
    println!("Watching {:?} (press Ctrl+C to stop)...", watcher.watched_path());

    loop {
        match watcher.recv() {
            Some(AnalysisEvent::BeatsChanged(beats)) => {
                println!("beats file rewritten: {} beats", beats.len());
            }
            Some(AnalysisEvent::Error(msg)) => {
                eprintln!("watch error: {}", msg);
            }
            None => break,
        }
    }
    Ok(())
}

/// Drive the editor through a short scripted session and leave the
/// resulting note files in `dir`.
async fn run_demo(dir: &str) -> Result<()> {
    use crossterm::event::KeyModifiers;
    use rstab::{Beat, Direction, EditAction};

    std::fs::create_dir_all(dir)?;
    let adapter = std::sync::Arc::new(FileAdapter::new(dir));

    let config = EditorConfig::default();
    let layout = NeckLayout::for_instrument(Instrument::LeadGuitar, &config, 1000.0, 4.0);
    let mut editor = TabEditor::new(Instrument::LeadGuitar, 0, layout);
    editor.set_adapter(adapter);
    editor.open_take(Instrument::LeadGuitar, 0)?;
    editor.rebuild_grid((0..8u32).map(|i| Beat::new(i as f64 * 0.5, i % 4 + 1)).collect());
    editor.focus_gained();

    // Click two notes in, fret them, then copy the pair three beats later
    editor.click_at(130.0, 10.0, KeyModifiers::NONE); // ~0.52s snaps to beat 1
    editor.click_at(260.0, 50.0, KeyModifiers::NONE); // ~1.04s snaps to beat 2
    editor.apply(EditAction::SelectAll);
    editor.apply(EditAction::SetFret(3));
    editor.apply(EditAction::Copy);
    editor.apply(EditAction::MoveCursor(Direction::Right));
    editor.apply(EditAction::MoveCursor(Direction::Right));
    editor.apply(EditAction::MoveCursor(Direction::Right));
    editor.apply(EditAction::Paste);

    println!("demo take now holds {} notes:", editor.notes().len());
    for note in editor.notes() {
        println!(
            "  string {} fret {:2} at {:.3}s",
            note.string, note.fret, note.start_time
        );
    }

    // Give the background writer a moment to land the final snapshot
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("note files written under {}", dir);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("rstab - Beat-synchronized tablature editing engine");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--beats" => {
            if args.len() < 3 {
                eprintln!("Error: --beats requires a file path");
                std::process::exit(1);
            }
            show_beats(&args[2])?;
        }
        "--notes" => {
            if args.len() < 3 {
                eprintln!("Error: --notes requires a file path");
                std::process::exit(1);
            }
            show_notes(&args[2])?;
        }
        "--watch" => {
            if args.len() < 3 {
                eprintln!("Error: --watch requires a file path");
                std::process::exit(1);
            }
            watch_beats(&args[2])?;
        }
        "--demo" => {
            if args.len() < 3 {
                eprintln!("Error: --demo requires an output directory");
                std::process::exit(1);
            }
            run_demo(&args[2]).await?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
