//! Minimal line-oriented console front-end for the wizard model.
//!
//! Renders the current step as text and maps input lines onto wizard key
//! events: empty line = Enter, `n`/`p` = coarse navigation, a number
//! moves the cursor and toggles that option, `q` aborts. Free text on
//! text questions is typed in wholesale.

use std::io::{BufRead, Write};

use devex_core::setup::config::{QuestionKind, StepBody};
use devex_core::setup::error::SetupError;
use devex_core::wizard::model::{WizardEvent, WizardKey, WizardModel};

fn render(model: &WizardModel) {
    let Some(step) = model.current_step() else {
        return;
    };
    let (position, total) = model.progress();
    println!();
    println!("== {} ({}/{}) ==", step.title, position + 1, total);
    if !step.description.is_empty() {
        println!("{}", step.description);
    }

    match &step.body {
        StepBody::Info => {
            if step.id == "system-overview" {
                let state = model.executor().state();
                println!(
                    "Detected: {} {} on {} ({})",
                    state.system.os, state.system.distribution, state.system.desktop,
                    state.system.arch
                );
            }
            for error in model.errors().snapshot() {
                println!("  ! {}", error);
            }
            println!("[Enter] continue   [p] back   [q] quit");
        }
        StepBody::Question(question) => {
            if !question.prompt.is_empty() {
                println!("{}", model.executor().interpolate(&question.prompt));
            }
            match question.kind {
                QuestionKind::Text => {
                    println!("Current: '{}'", model.text_value());
                    println!("Type a value and press Enter.");
                }
                QuestionKind::Bool => {
                    println!("[space] toggle, [Enter] confirm");
                }
                _ => {
                    for (index, option) in model.options().iter().enumerate() {
                        let marker = if model.is_selected(index) { "x" } else { " " };
                        let cursor = if index == model.cursor { ">" } else { " " };
                        if option.description.is_empty() {
                            println!("{}[{}] {} {}", cursor, marker, index, option.label());
                        } else {
                            println!(
                                "{}[{}] {} {} - {}",
                                cursor,
                                marker,
                                index,
                                option.label(),
                                option.description
                            );
                        }
                    }
                    println!("[number] toggle   [Enter] confirm   [n] next   [p] back   [q] quit");
                }
            }
        }
        StepBody::Action(_) => {}
    }
}

fn is_text_question(model: &WizardModel) -> bool {
    matches!(
        model.current_step().and_then(|s| s.question()).map(|q| q.kind),
        Some(QuestionKind::Text)
    )
}

/// Feed one input line to the model. Returns the resulting event.
fn apply_line(model: &mut WizardModel, line: &str) -> Result<WizardEvent, SetupError> {
    let trimmed = line.trim();

    if is_text_question(model) {
        return match trimmed {
            "" => model.handle_key(WizardKey::Enter),
            "p" => model.handle_key(WizardKey::Prev),
            _ => {
                // Replace the buffer with the typed value, then commit.
                while !model.text_value().is_empty() {
                    model.handle_key(WizardKey::Backspace)?;
                }
                for c in trimmed.chars() {
                    model.handle_key(WizardKey::Char(c))?;
                }
                model.handle_key(WizardKey::Enter)
            }
        };
    }

    match trimmed {
        "" => model.handle_key(WizardKey::Enter),
        "n" => model.handle_key(WizardKey::Next),
        "p" => model.handle_key(WizardKey::Prev),
        _ => {
            if let Ok(index) = trimmed.parse::<usize>() {
                while model.cursor > index {
                    model.handle_key(WizardKey::Up)?;
                }
                while model.cursor < index && model.cursor + 1 < model.options().len() {
                    model.handle_key(WizardKey::Down)?;
                }
                return model.handle_key(WizardKey::Space);
            }
            Ok(WizardEvent::Stay)
        }
    }
}

/// Drive the wizard until the user reaches the installation phase.
/// Returns false when the user quit instead.
pub fn run_interactive(model: &mut WizardModel) -> Result<bool, SetupError> {
    if let Some(banner) = model.banner() {
        println!("{}", banner);
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        // Stop as soon as the cursor reaches an action step; the install
        // runner takes over from there.
        match model.current_step() {
            None => return Ok(true),
            Some(step) if step.action().is_some() => return Ok(true),
            _ => {}
        }
        render(model);
        print!("> ");
        let _ = std::io::stdout().flush();

        let Some(Ok(line)) = lines.next() else {
            // EOF behaves like quitting.
            return Ok(false);
        };
        if line.trim() == "q" {
            return Ok(false);
        }
        match apply_line(model, &line)? {
            WizardEvent::Invalid(message) => println!("  ! {}", message),
            WizardEvent::Completed => return Ok(true),
            _ => {}
        }
    }
}
