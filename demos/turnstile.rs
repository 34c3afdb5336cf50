//! Turnstile Machine
//!
//! This example drives a coin-operated turnstile from several producer
//! threads while a worker thread evaluates the transitions.
//!
//! Key concepts:
//! - Guards that update a shared context
//! - Producers feeding the machine through `EventSender`
//! - Exit state ending the worker loop
//! - History recorded by an observer
//!
//! Run with: cargo run --example turnstile

use stateline::{HistoryRecorder, Machine};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Input {
    Coin,
    Push,
    Shutdown,
}

#[derive(Default)]
struct Turnstile {
    coins: AtomicU32,
    passages: AtomicU32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Turnstile Machine ===\n");

    let context = Arc::new(Turnstile::default());
    let recorder = Arc::new(HistoryRecorder::new());
    let mut machine = Machine::<Input, Turnstile>::builder()
        .context(Arc::clone(&context))
        .name("turnstile")
        .observer(Arc::clone(&recorder))
        .build()?;

    let locked = machine.create_state("locked")?;
    let unlocked = machine.create_state("unlocked")?;
    let closed = machine.create_state("closed")?;

    machine.add_rule(locked, unlocked, |input, ctx: &Turnstile| {
        if *input != Input::Coin {
            return false;
        }
        ctx.coins.fetch_add(1, Ordering::SeqCst);
        true
    })?;
    machine.add_rule(locked, closed, |input, _| *input == Input::Shutdown)?;
    machine.add_rule(unlocked, locked, |input, ctx: &Turnstile| {
        if *input != Input::Push {
            return false;
        }
        ctx.passages.fetch_add(1, Ordering::SeqCst);
        true
    })?;

    machine.run(locked, Some(closed))?;

    let riders: Vec<_> = (0..3)
        .map(|_| {
            let sender = machine.sender();
            thread::spawn(move || {
                for _ in 0..4 {
                    sender.push(Input::Coin);
                    sender.push(Input::Push);
                    thread::sleep(Duration::from_millis(2));
                }
            })
        })
        .collect();
    for rider in riders {
        rider.join().map_err(|_| "rider thread panicked")?;
    }

    machine.push(Input::Shutdown);
    machine.wait()?;

    println!("\nFinal state: {:?}", machine.current_state_name());
    println!("Coins accepted: {}", context.coins.load(Ordering::SeqCst));
    println!("Passages: {}", context.passages.load(Ordering::SeqCst));
    println!("Steps: {}", recorder.history().len());
    println!("\nSnapshot:\n{}", machine.snapshot().to_json()?);

    println!("\n=== Example Complete ===");
    Ok(())
}
