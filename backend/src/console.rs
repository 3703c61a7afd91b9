//! Interactive menu for running a party from a terminal.
//!
//! Generic over the reader and writer so the loop can be scripted in tests.

use std::io::{self, BufRead, Write};

use rand::Rng;
use santa_core::{GameError, Party, Score};

const MENU: &str = "
--- Secret Santa ---
1. Add participant
2. Remove participant
3. List participants
4. Run the Secret Santa draw
5. Record a completed challenge
6. Show leaderboard
7. Reveal my Secret Santa
8. Set challenge deadline
9. Show challenge deadline
0. Quit
--------------------";

pub fn run<R, W, G>(party: &mut Party, mut input: R, output: &mut W, rng: &mut G) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    loop {
        writeln!(output, "{MENU}")?;
        let Some(choice) = prompt(&mut input, output, "Choose an option: ")? else {
            break;
        };

        match choice.as_str() {
            "1" => {
                let Some(name) = prompt(&mut input, output, "Name to add: ")? else {
                    break;
                };
                match party.add_participant(&name) {
                    Ok(name) => {
                        log::info!("[ROSTER] added {name}");
                        writeln!(output, "'{name}' joined the party.")?;
                    }
                    Err(err) => report(output, &err)?,
                }
            }
            "2" => {
                let Some(name) = prompt(&mut input, output, "Name to remove: ")? else {
                    break;
                };
                match party.remove_participant(&name) {
                    Ok(name) => {
                        log::info!("[ROSTER] removed {name}");
                        writeln!(output, "'{name}' left the party.")?;
                    }
                    Err(err) => report(output, &err)?,
                }
            }
            "3" => list_participants(party, output)?,
            "4" => match party.draw(rng) {
                Ok(()) => {
                    log::info!("[DRAW] completed for {} participants", party.participants().len());
                    writeln!(
                        output,
                        "Secret Santa draw completed! Use option 7 to reveal pairs one at a time."
                    )?;
                }
                Err(err) => {
                    log::warn!("[DRAW] failed: {err}");
                    report(output, &err)?;
                }
            },
            "5" => {
                let Some(name) = prompt(&mut input, output, "Who completed the challenge? ")? else {
                    break;
                };
                let Some(points) = prompt(
                    &mut input,
                    output,
                    "How many points is it worth? (Enter for 1) ",
                )?
                else {
                    break;
                };
                record_challenge(party, output, &name, &points)?;
            }
            "6" => show_leaderboard(party, output)?,
            "7" => {
                let Some(name) = prompt(&mut input, output, "Your name: ")? else {
                    break;
                };
                match party.reveal(&name) {
                    Ok(receiver) => writeln!(output, "{} gives a gift to {receiver}.", name.trim())?,
                    Err(err) => report(output, &err)?,
                }
            }
            "8" => {
                let Some(text) = prompt(
                    &mut input,
                    output,
                    "Deadline (YYYY-MM-DD HH:MM or YYYY-MM-DDTHH:MM): ",
                )?
                else {
                    break;
                };
                match party.set_deadline(&text) {
                    Ok(deadline) => {
                        let shown = santa_core::format_deadline(deadline);
                        log::info!("[DEADLINE] set to {shown}");
                        writeln!(output, "Challenge deadline set to {shown}.")?;
                    }
                    Err(err) => report(output, &err)?,
                }
            }
            "9" => {
                let status = party.deadline_status();
                match status.deadline {
                    Some(deadline) if status.passed => {
                        writeln!(output, "Deadline {deadline} has passed.")?
                    }
                    Some(deadline) => writeln!(output, "Challenges close at {deadline}.")?,
                    None => writeln!(output, "No challenge deadline set.")?,
                }
            }
            "0" => {
                writeln!(output, "Goodbye, see you next party!")?;
                return Ok(());
            }
            _ => writeln!(output, "Unknown option, please try again.")?,
        }
    }

    writeln!(output)?;
    Ok(())
}

/// Prints `label` and reads one trimmed line; `None` at end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    write!(output, "{label}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn report<W: Write>(output: &mut W, err: &GameError) -> io::Result<()> {
    writeln!(output, "Error: {err}.")
}

fn list_participants<W: Write>(party: &Party, output: &mut W) -> io::Result<()> {
    if party.participants().is_empty() {
        return writeln!(output, "No participants yet.");
    }
    writeln!(output, "--- Participants ---")?;
    for name in party.participants() {
        writeln!(output, "{name}")?;
    }
    Ok(())
}

fn record_challenge<W: Write>(
    party: &mut Party,
    output: &mut W,
    name: &str,
    points: &str,
) -> io::Result<()> {
    let points: Score = if points.is_empty() {
        1
    } else {
        match points.parse() {
            Ok(points) => points,
            Err(_) => return writeln!(output, "Points must be a whole number."),
        }
    };

    match party.record_challenge(name, points) {
        Ok(score) => {
            log::info!("[CHALLENGE] {} +{points} -> {score}", name.trim());
            writeln!(output, "'{}' completed a challenge! Score: {score}", name.trim())
        }
        Err(err) => report(output, &err),
    }
}

fn show_leaderboard<W: Write>(party: &Party, output: &mut W) -> io::Result<()> {
    let board = party.leaderboard();
    if board.is_empty() {
        return writeln!(output, "The leaderboard is empty.");
    }
    writeln!(output, "--- Leaderboard ---")?;
    for (rank, entry) in board.iter().enumerate() {
        writeln!(output, "{}. {}: {} points", rank + 1, entry.name, entry.score)?;
    }
    Ok(())
}
