use ringbuf::traits::Consumer;
use std::io::BufRead;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;
use tempo_stack::library::find_stack;
use tempo_stack::messaging::NotificationConsumer;
use tempo_stack::{
    AppConfig, AudioClickEmitter, FileStackRepository, Notifier, PlaybackSnapshot,
    PlaybackStatus, SequencingEngine, SilentEmitter, StackRepository, TempoStack,
    create_notification_channel, create_snapshot_channel, simulate,
};

// Snapshots arrive at most once per beat plus transitions
const SNAPSHOT_RINGBUFFER_CAPACITY: usize = 64;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

const USAGE: &str = "\
Usage: tempo_stack <command>

Commands:
  list                    Show saved stacks
  play [name|number]      Play a stack (p = pause, r = resume, q = stop)
  preview [name|number]   Print the beat timeline without playing";

enum KeyCommand {
    Pause,
    Resume,
    Quit,
}

fn main() {
    println!("=== Tempo Stack ===");
    println!("Version {}\n", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load();
    let (notification_tx, mut notification_rx) =
        create_notification_channel(config.notification_capacity);
    let notifier = Notifier::new(Arc::new(Mutex::new(notification_tx)));

    let repository =
        FileStackRepository::open_with_notifier(&config.stacks_path, notifier.clone());
    drain_notifications(&mut notification_rx);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");
    let query = args.get(1).map(String::as_str);

    match command {
        "list" => list_stacks(&repository),
        "play" | "preview" => {
            let Some(stack) = select_stack(&repository, query) else {
                eprintln!("ERROR: no stack matches {:?}", query.unwrap_or(""));
                std::process::exit(1);
            };
            if command == "play" {
                play(&config, &stack, notifier, &mut notification_rx);
            } else {
                preview(&stack);
            }
        }
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => {
            eprintln!("Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn select_stack(repository: &FileStackRepository, query: Option<&str>) -> Option<TempoStack> {
    match query {
        Some(query) => find_stack(repository, query),
        None => repository.list().into_iter().next(),
    }
}

fn list_stacks(repository: &FileStackRepository) {
    let stacks = repository.list();
    if stacks.is_empty() {
        println!("No stacks in {}", repository.path().display());
        return;
    }
    for (i, stack) in stacks.iter().enumerate() {
        println!(
            "{:>3}. {} - {} segments, {} beats, {:.1}s",
            i + 1,
            stack.name,
            stack.len(),
            stack.total_beats(),
            stack.total_duration_seconds()
        );
        for segment in &stack.items {
            println!("       {}", segment);
        }
    }
}

fn preview(stack: &TempoStack) {
    match simulate(stack) {
        Ok(events) => {
            println!("{} ({} beats)", stack.name, events.len());
            for event in events {
                println!(
                    "  {:>8.3}s  segment {} beat {:>3}  {} BPM  {}",
                    event.offset.as_secs_f64(),
                    event.segment_index + 1,
                    event.beat_in_segment + 1,
                    event.bpm,
                    if event.click.is_accent() { "ACCENT" } else { "tick" }
                );
            }
        }
        Err(e) => eprintln!("ERROR: {}", e),
    }
}

fn play(
    config: &AppConfig,
    stack: &TempoStack,
    notifier: Notifier,
    notification_rx: &mut NotificationConsumer,
) {
    let engine = if config.audio_enabled {
        match AudioClickEmitter::open(config.click_volume) {
            Ok(emitter) => {
                let info = emitter.info();
                println!(
                    "Click output: {} ({} Hz, {} channels)",
                    info.device_name, info.sample_rate, info.channels
                );
                SequencingEngine::with_emitter(emitter)
            }
            Err(e) => {
                eprintln!("Audio unavailable ({}), playing silently", e);
                SequencingEngine::with_emitter(SilentEmitter)
            }
        }
    } else {
        SequencingEngine::with_emitter(SilentEmitter)
    };
    engine.set_notifier(notifier);

    let (snapshot_tx, mut snapshot_rx) = create_snapshot_channel(SNAPSHOT_RINGBUFFER_CAPACITY);
    engine.subscribe(snapshot_tx);

    if let Err(e) = engine.start(stack) {
        eprintln!("ERROR: {}", e);
        return;
    }

    let keys = spawn_key_reader();

    loop {
        while let Some(snapshot) = snapshot_rx.try_pop() {
            print_snapshot(&snapshot);
        }
        drain_notifications(notification_rx);

        match keys.try_recv() {
            Ok(KeyCommand::Pause) => {
                if let Err(e) = engine.pause() {
                    eprintln!("{}", e);
                }
            }
            Ok(KeyCommand::Resume) => {
                if let Err(e) = engine.resume() {
                    eprintln!("{}", e);
                }
            }
            Ok(KeyCommand::Quit) => engine.stop(),
            Err(_) => {}
        }

        if engine.status() == PlaybackStatus::Stopped {
            while let Some(snapshot) = snapshot_rx.try_pop() {
                print_snapshot(&snapshot);
            }
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }
    drain_notifications(notification_rx);
    println!("Done.");
}

fn spawn_key_reader() -> mpsc::Receiver<KeyCommand> {
    let (tx, rx) = mpsc::channel();
    // Detached: it blocks on stdin until the process exits
    let spawned = thread::Builder::new()
        .name("key-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let command = match line.trim() {
                    "p" => KeyCommand::Pause,
                    "r" => KeyCommand::Resume,
                    "q" => KeyCommand::Quit,
                    _ => continue,
                };
                if tx.send(command).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        eprintln!("Keyboard control unavailable: {}", e);
    }
    rx
}

fn print_snapshot(snapshot: &PlaybackSnapshot) {
    match snapshot.status {
        PlaybackStatus::Stopped => println!("[stopped]"),
        status => println!(
            "[{}] {} segment {}/{} @ {} BPM  beat {} ({} left)  measure {} ({} left)",
            status,
            snapshot.stack_name.as_deref().unwrap_or("-"),
            snapshot.segment_index + 1,
            snapshot.segment_count,
            snapshot.bpm.unwrap_or_default(),
            snapshot.current_beat,
            snapshot.remaining_beats,
            snapshot.current_measure,
            snapshot.remaining_measures
        ),
    }
}

fn drain_notifications(rx: &mut NotificationConsumer) {
    while let Some(notification) = rx.try_pop() {
        eprintln!("{}", notification);
    }
}
