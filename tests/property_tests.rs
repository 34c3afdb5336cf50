//! Property-based tests for the engine.
//!
//! These tests use proptest to verify ordering and determinism hold across
//! many randomly generated graphs and event streams.

use parking_lot::Mutex;
use proptest::prelude::*;
use stateline::{CancelPolicy, EventChannel, HistoryRecorder, Machine, Received};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Default)]
struct Context {
    evaluations: AtomicU64,
    seen: Mutex<Vec<(usize, usize)>>,
}

/// Edge description: from state, to state, the event value that fires it.
type Edge = (usize, usize, u8);

prop_compose! {
    fn arbitrary_graph()(states in 1..6usize)(
        edges in prop::collection::vec((0..states, 0..states, 0..4u8), 0..16),
        states in Just(states)
    ) -> (usize, Vec<Edge>) {
        (states, edges)
    }
}

fn build(states: usize, edges: &[Edge]) -> (Machine<u8, Context>, Arc<HistoryRecorder>) {
    let recorder = Arc::new(HistoryRecorder::new());
    let mut machine = Machine::<u8, Context>::builder()
        .context(Arc::new(Context::default()))
        .observer(Arc::clone(&recorder))
        .build()
        .unwrap();

    let ids: Vec<_> = (0..states)
        .map(|n| machine.create_state(format!("s{n}")).unwrap())
        .collect();
    for &(from, to, trigger) in edges {
        machine
            .add_rule(ids[from], ids[to], move |e, ctx: &Context| {
                ctx.evaluations.fetch_add(1, Ordering::SeqCst);
                *e == trigger
            })
            .unwrap();
    }
    machine.set_start_state(ids[0]).unwrap();
    (machine, recorder)
}

/// Straight-line model of the engine: first matching edge, else stay.
fn expected_path(edges: &[Edge], events: &[u8]) -> Vec<String> {
    let mut current = 0;
    let mut path = vec!["s0".to_string()];
    for event in events {
        if let Some(&(_, to, _)) = edges
            .iter()
            .find(|(from, _, trigger)| *from == current && trigger == event)
        {
            current = to;
        }
        path.push(format!("s{current}"));
    }
    path
}

proptest! {
    #[test]
    fn sync_runs_are_deterministic(
        (states, edges) in arbitrary_graph(),
        events in prop::collection::vec(0..5u8, 0..32)
    ) {
        let (mut first, first_trace) = build(states, &edges);
        let (mut second, second_trace) = build(states, &edges);

        for &event in &events {
            first.on_event(event).unwrap();
            second.on_event(event).unwrap();
        }

        prop_assert_eq!(first_trace.path(), second_trace.path());
        prop_assert_eq!(first.steps(), events.len() as u64);
    }

    #[test]
    fn first_matching_edge_wins(
        (states, edges) in arbitrary_graph(),
        events in prop::collection::vec(0..5u8, 0..32)
    ) {
        let (mut machine, recorder) = build(states, &edges);

        for &event in &events {
            machine.on_event(event).unwrap();
        }

        prop_assert_eq!(recorder.path(), expected_path(&edges, &events));
    }

    #[test]
    fn unmatched_events_self_loop(
        states in 1..6usize,
        events in prop::collection::vec(0..255u8, 1..16)
    ) {
        let (mut machine, recorder) = build(states, &[]);

        for &event in &events {
            let before = machine.current_state();
            let after = machine.on_event(event).unwrap();
            prop_assert_eq!(before, Some(after));
        }

        prop_assert_eq!(recorder.history().len(), events.len());
        prop_assert!(recorder.history().transitions().iter().all(|t| t.is_self_loop()));
    }

    #[test]
    fn per_producer_order_is_preserved(
        producers in 1..5usize,
        per_producer in 1..64usize
    ) {
        let mut machine = Machine::<(usize, usize), Context>::builder()
            .context(Arc::new(Context::default()))
            .cancel_policy(CancelPolicy::Drain)
            .build()
            .unwrap();
        let sink = machine.create_state("sink").unwrap();
        machine
            .add_rule(sink, sink, |event, ctx: &Context| {
                ctx.seen.lock().push(*event);
                true
            })
            .unwrap();
        machine.run(sink, None).unwrap();

        let handles: Vec<_> = (0..producers)
            .map(|producer| {
                let sender = machine.sender();
                thread::spawn(move || {
                    for seq in 0..per_producer {
                        sender.push((producer, seq));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        machine.stop();
        machine.wait().unwrap();

        let seen = machine.context().seen.lock().clone();
        prop_assert_eq!(seen.len(), producers * per_producer);
        for producer in 0..producers {
            let order: Vec<usize> = seen
                .iter()
                .filter(|(p, _)| *p == producer)
                .map(|(_, seq)| *seq)
                .collect();
            prop_assert_eq!(order, (0..per_producer).collect::<Vec<_>>());
        }
    }

    #[test]
    fn channel_preserves_push_order(values in prop::collection::vec(any::<i64>(), 0..64)) {
        let channel = EventChannel::new();
        for &value in &values {
            channel.push(value);
        }
        channel.cancel();

        let mut received = Vec::new();
        let drained = EventChannel::with_policy(CancelPolicy::Drain);
        for value in values.iter().copied() {
            drained.push(value);
        }
        drained.cancel();
        while let Received::Value(value) = drained.receive() {
            received.push(value);
        }

        prop_assert_eq!(channel.receive(), Received::Cancelled);
        prop_assert_eq!(received, values);
    }
}
