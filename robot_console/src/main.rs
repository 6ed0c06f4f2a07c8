//! # Robot console
//!
//! Interactive command-line client for the controller. Connects to the
//! command server, prints every line the controller sends, and pushes typed
//! commands down the link. `--demo` replays a fixed demonstration sequence
//! instead of reading from the prompt.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use color_eyre::{eyre::WrapErr, Report};
use comms_if::cmd::Cmd;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;
use structopt::StructOpt;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const PROMPT: &str = "epuck $ ";
const HISTORY_PATH: &str = ".robot_console_history";

/// Demonstration sequence replayed by `--demo`: command, description, and the
/// pause in seconds after sending it.
const DEMO_SEQUENCE: &[(&str, &str, u64)] = &[
    ("status", "Checking the initial position", 1),
    ("forward 8", "Moving forward", 3),
    ("turn_left 4", "Turning left", 3),
    ("forward 6", "Moving forward again", 3),
    ("turn_right 4", "Turning right", 3),
    ("forward 5", "Final forward movement", 3),
    ("stop", "Stopping the robot", 1),
    ("status", "Final position", 1),
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(StructOpt)]
#[structopt(
    name = "robot_console",
    about = "Interactive console for the E-Puck controller"
)]
struct Opts {
    /// Address of the controller's command server
    #[structopt(short, long, default_value = "localhost:9999")]
    addr: String,

    /// Replay the demonstration sequence instead of reading from the prompt
    #[structopt(long)]
    demo: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn main() -> Result<(), Report> {
    let opts = Opts::from_args();

    let stream = TcpStream::connect(&opts.addr)
        .wrap_err_with(|| format!("Could not connect to the controller at {}", opts.addr))?;

    println!("Connected to {}", opts.addr);

    // Print every controller line as it arrives
    let read_stream = stream
        .try_clone()
        .wrap_err("Could not clone the connection")?;
    thread::spawn(move || receive_thread(read_stream));

    let result = if opts.demo {
        demo_mode(&stream)
    } else {
        interactive_mode(&stream)
    };

    // Give the receiver a moment to print any final responses
    thread::sleep(Duration::from_millis(500));

    result
}

/// Print lines from the controller until the connection drops.
fn receive_thread(stream: TcpStream) {
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        match line {
            Ok(l) => println!("< {}", l),
            Err(_) => break,
        }
    }

    println!("Connection closed by the controller");
}

/// Send a single command line to the controller.
fn send_command(mut stream: &TcpStream, command: &str) -> Result<(), Report> {
    stream
        .write_all(format!("{}\n", command).as_bytes())
        .wrap_err("Could not send the command")?;
    stream.flush().wrap_err("Could not send the command")?;

    Ok(())
}

/// Read commands from the prompt and push them to the controller.
fn interactive_mode(stream: &TcpStream) -> Result<(), Report> {
    let mut rl = DefaultEditor::new()?;
    if rl.load_history(HISTORY_PATH).is_err() {
        println!("No history detected");
    }

    loop {
        let readline = rl.readline(PROMPT);
        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                rl.add_history_entry(line.as_str()).ok();

                if line.eq_ignore_ascii_case("help") {
                    print_help();
                    continue;
                }

                // Catch malformed commands locally before they go out
                if let Err(e) = Cmd::from_line(&line) {
                    println!("Invalid command: {}", e);
                    continue;
                }

                send_command(stream, &line)?;

                if line.eq_ignore_ascii_case("quit") {
                    break;
                }

                // Small pause so responses interleave cleanly with the prompt
                thread::sleep(Duration::from_millis(100));
            }
            Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                println!("Unhandled Error: {:?}", err);
                break;
            }
        }
    }

    rl.save_history(HISTORY_PATH).ok();

    Ok(())
}

/// Replay the demonstration sequence.
fn demo_mode(stream: &TcpStream) -> Result<(), Report> {
    println!("Running the demonstration sequence");

    for (command, description, pause_s) in DEMO_SEQUENCE {
        println!("\n{}", description);
        println!("> {}", command);

        send_command(stream, command)?;

        thread::sleep(Duration::from_secs(*pause_s));
    }

    println!("\nDemonstration complete");

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  <n>F;<n>B;<n>L;<n>R - movement batch, e.g. 10F;5R");
    println!("  forward [n]         - move forward (default 5)");
    println!("  turn_left [n]       - turn left 90° then move (default 3)");
    println!("  turn_right [n]      - turn right 90° then move (default 3)");
    println!("  stop                - stop the robot");
    println!("  status              - show position and wheel speeds");
    println!("  quit                - shut the controller down and exit");
}
