use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{debug, warn};

use crate::mpris::ControlCmd;

pub const HELP: &str = "commands: play, pause, toggle, next, prev, goto N, seek [+|-]SECONDS, \
shuffle on|off, status, interrupt, duck, quit";

/// Parse one console line.
pub fn parse_command(line: &str) -> Result<ControlCmd, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_string());
    };
    let arg = words.next();
    if words.next().is_some() {
        return Err(format!("too many arguments to `{verb}`"));
    }

    let cmd = match (verb.to_ascii_lowercase().as_str(), arg) {
        ("play", None) => ControlCmd::Play,
        ("pause", None) => ControlCmd::Pause,
        ("toggle", None) => ControlCmd::PlayPause,
        ("next", None) => ControlCmd::Next,
        ("prev" | "previous", None) => ControlCmd::Prev,
        ("status", None) => ControlCmd::Status,
        ("interrupt", None) => ControlCmd::Interrupt,
        ("duck", None) => ControlCmd::Duck,
        ("quit" | "exit", None) => ControlCmd::Quit,
        ("goto", Some(n)) => match n.parse::<usize>() {
            Ok(n) if n >= 1 => ControlCmd::PlayAt(n - 1),
            _ => return Err(format!("`goto` wants a track number from 1, got `{n}`")),
        },
        ("seek", Some(s)) => parse_seek(s)?,
        ("shuffle", Some("on")) => ControlCmd::Shuffle(true),
        ("shuffle", Some("off")) => ControlCmd::Shuffle(false),
        _ => return Err(format!("unknown command `{}`", line.trim())),
    };
    Ok(cmd)
}

fn parse_seek(arg: &str) -> Result<ControlCmd, String> {
    let bad = || format!("`seek` wants seconds, got `{arg}`");
    if let Some(rest) = arg.strip_prefix('+') {
        let secs: f64 = rest.parse().map_err(|_| bad())?;
        return Ok(ControlCmd::SeekBy((secs * 1_000.0) as i64));
    }
    if let Some(rest) = arg.strip_prefix('-') {
        let secs: f64 = rest.parse().map_err(|_| bad())?;
        return Ok(ControlCmd::SeekBy(-(secs * 1_000.0) as i64));
    }
    let secs: f64 = arg.parse().map_err(|_| bad())?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(bad());
    }
    Ok(ControlCmd::SeekTo((secs * 1_000.0) as u64))
}

/// Read commands from stdin on a background thread until EOF.
pub fn spawn_console(tx: Sender<ControlCmd>) {
    let spawned = thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(cmd) => {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    Err(msg) => eprintln!("{msg}\n{HELP}"),
                }
            }
            debug!("console input closed");
        });
    if let Err(e) = spawned {
        warn!("failed to spawn console thread: {e}");
    }
}
