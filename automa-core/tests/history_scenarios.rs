use std::cell::{Cell, RefCell};
use std::rc::Rc;

use automa_core::{Action, History, HistoryConfig, HistoryError};

/// Payload that remembers which instance it is and how often it was touched.
#[derive(Debug, Default)]
struct Probe {
    tag: &'static str,
    forward_calls: u32,
    backward_calls: u32,
}

type Log = Rc<RefCell<Vec<String>>>;

fn probe_action(tag: &'static str, log: &Log) -> Action<(), Probe> {
    let fwd_log = log.clone();
    let back_log = log.clone();
    Action::new(
        tag,
        format!("Probe {tag}"),
        move |_: &mut (), data: &mut Probe| {
            data.forward_calls += 1;
            fwd_log.borrow_mut().push(format!("{}.forward", data.tag));
            Ok(())
        },
        move |_: &mut (), data: &mut Probe| {
            data.backward_calls += 1;
            back_log.borrow_mut().push(format!("{}.backward", data.tag));
            Ok(())
        },
        Probe {
            tag,
            ..Default::default()
        },
    )
}

fn counting_listener(history: &mut History<(), Probe>) -> Rc<Cell<u32>> {
    let calls = Rc::new(Cell::new(0));
    let seen = calls.clone();
    history.on_change(move || seen.set(seen.get() + 1));
    calls
}

#[test]
fn push_runs_forward_once_with_supplied_data() {
    let log = Log::default();
    let mut history = History::default();

    history.push(probe_action("A", &log), &mut ()).unwrap();

    assert_eq!(*log.borrow(), ["A.forward"]);
    assert_eq!(history.len(), 1);
    assert_eq!(history.stack_location(), 0);
    let data = history.stack()[0].data();
    assert_eq!(data.tag, "A");
    assert_eq!(data.forward_calls, 1);
    assert_eq!(data.backward_calls, 0);
}

#[test]
fn undo_runs_backward_and_empties_cursor() {
    let log = Log::default();
    let mut history = History::default();

    history.push(probe_action("A", &log), &mut ()).unwrap();
    assert!(history.undo(&mut ()).unwrap());

    assert_eq!(*log.borrow(), ["A.forward", "A.backward"]);
    assert_eq!(history.stack()[0].data().backward_calls, 1);
    assert_eq!(history.stack_location(), -1);
}

#[test]
fn redo_runs_forward_a_second_time() {
    let log = Log::default();
    let mut history = History::default();

    history.push(probe_action("A", &log), &mut ()).unwrap();
    history.undo(&mut ()).unwrap();
    assert!(history.redo(&mut ()).unwrap());

    assert_eq!(history.stack()[0].data().forward_calls, 2);
    assert_eq!(history.stack_location(), 0);
}

#[test]
fn push_after_undo_drops_redo_tail() {
    let log = Log::default();
    let mut history = History::default();

    history.push(probe_action("A", &log), &mut ()).unwrap();
    history.undo(&mut ()).unwrap();
    history.push(probe_action("B", &log), &mut ()).unwrap();

    assert!(!history.redo(&mut ()).unwrap());
    let tags: Vec<&str> = history.stack().iter().map(|a| a.data().tag).collect();
    assert_eq!(tags, ["B"]);
    assert_eq!(history.stack_location(), 0);
}

#[test]
fn boundary_operations_are_noops() {
    let log = Log::default();
    let mut history = History::default();

    assert!(!history.undo(&mut ()).unwrap());
    assert_eq!(history.stack_location(), -1);

    history.push(probe_action("A", &log), &mut ()).unwrap();
    assert!(!history.redo(&mut ()).unwrap());
    assert_eq!(history.stack_location(), 0);

    assert_eq!(*log.borrow(), ["A.forward"]);
}

#[test]
fn two_actions_full_cycle() {
    let log = Log::default();
    let mut history = History::default();

    history.push(probe_action("A", &log), &mut ()).unwrap();
    history.push(probe_action("B", &log), &mut ()).unwrap();
    history.undo(&mut ()).unwrap();
    history.undo(&mut ()).unwrap();
    history.redo(&mut ()).unwrap();
    history.redo(&mut ()).unwrap();

    assert_eq!(history.stack_location(), 1);
    let tags: Vec<&str> = history.stack().iter().map(|a| a.data().tag).collect();
    assert_eq!(tags, ["A", "B"]);
    for action in history.stack() {
        assert_eq!(action.data().forward_calls, 2);
        assert_eq!(action.data().backward_calls, 1);
    }
    assert_eq!(
        *log.borrow(),
        [
            "A.forward",
            "B.forward",
            "B.backward",
            "A.backward",
            "A.forward",
            "B.forward"
        ]
    );
}

#[test]
fn listeners_fire_once_per_mutation() {
    let log = Log::default();
    let mut history = History::default();
    let first = counting_listener(&mut history);
    let second = counting_listener(&mut history);

    history.push(probe_action("A", &log), &mut ()).unwrap();
    history.undo(&mut ()).unwrap();
    history.redo(&mut ()).unwrap();

    assert_eq!(first.get(), 3);
    assert_eq!(second.get(), 3);
}

#[test]
fn late_listener_is_not_called_retroactively() {
    let log = Log::default();
    let mut history = History::default();
    history.push(probe_action("A", &log), &mut ()).unwrap();
    history.push(probe_action("B", &log), &mut ()).unwrap();

    let late = counting_listener(&mut history);
    assert_eq!(late.get(), 0);

    history.undo(&mut ()).unwrap();
    assert_eq!(late.get(), 1);
}

#[test]
fn noop_does_not_notify_by_default() {
    let mut history = History::default();
    let calls = counting_listener(&mut history);

    history.undo(&mut ()).unwrap();
    history.redo(&mut ()).unwrap();

    assert_eq!(calls.get(), 0);
}

#[test]
fn noop_notifies_when_configured() {
    let mut history = History::new(HistoryConfig {
        notify_on_noop: true,
    });
    let calls = counting_listener(&mut history);

    assert!(!history.undo(&mut ()).unwrap());
    assert!(!history.redo(&mut ()).unwrap());

    assert_eq!(calls.get(), 2);
    assert_eq!(history.stack_location(), -1);
}

#[test]
fn listener_observes_updated_location() {
    let mut history: History<Vec<u32>, u32> = History::default();
    let observed = Rc::new(Cell::new(0usize));
    let seen = observed.clone();
    // Listeners take no arguments; they read shared state the effects update.
    let doc_len = Rc::new(Cell::new(0usize));
    let shared = doc_len.clone();
    history.on_change(move || seen.set(shared.get()));

    let push_value = |value: u32, len: Rc<Cell<usize>>| {
        let undo_len = len.clone();
        Action::new(
            "Append",
            "Append a value",
            move |doc: &mut Vec<u32>, v: &mut u32| {
                doc.push(*v);
                len.set(doc.len());
                Ok(())
            },
            move |doc: &mut Vec<u32>, _: &mut u32| {
                doc.pop();
                undo_len.set(doc.len());
                Ok(())
            },
            value,
        )
    };

    let mut doc = Vec::new();
    history.push(push_value(7, doc_len.clone()), &mut doc).unwrap();
    history.push(push_value(8, doc_len.clone()), &mut doc).unwrap();
    assert_eq!(observed.get(), 2);
    history.undo(&mut doc).unwrap();
    assert_eq!(observed.get(), 1);
    assert_eq!(doc, [7]);
}

fn flaky_action(fail_backward: Rc<Cell<bool>>, fail_forward: Rc<Cell<bool>>) -> Action<i32, ()> {
    Action::new(
        "Flaky",
        "Effects fail on demand",
        move |total: &mut i32, _: &mut ()| {
            if fail_forward.get() {
                anyhow::bail!("forward failed");
            }
            *total += 1;
            Ok(())
        },
        move |total: &mut i32, _: &mut ()| {
            if fail_backward.get() {
                anyhow::bail!("backward failed");
            }
            *total -= 1;
            Ok(())
        },
        (),
    )
}

#[test]
fn failed_undo_leaves_cursor_in_place() {
    let fail_backward = Rc::new(Cell::new(false));
    let fail_forward = Rc::new(Cell::new(false));
    let mut history = History::default();
    let notified = Rc::new(Cell::new(0));
    let seen = notified.clone();
    history.on_change(move || seen.set(seen.get() + 1));
    let mut total = 0;

    history
        .push(
            flaky_action(fail_backward.clone(), fail_forward.clone()),
            &mut total,
        )
        .unwrap();
    fail_backward.set(true);

    let err = history.undo(&mut total).unwrap_err();
    assert!(matches!(err, HistoryError::Backward { .. }));
    assert_eq!(err.to_string(), "backward effect of `Flaky` failed");
    assert_eq!(
        std::error::Error::source(&err).map(|e| e.to_string()),
        Some("backward failed".to_string())
    );
    assert_eq!(history.stack_location(), 0);
    assert_eq!(total, 1);
    assert_eq!(notified.get(), 1);

    fail_backward.set(false);
    assert!(history.undo(&mut total).unwrap());
    assert_eq!(total, 0);
}

#[test]
fn failed_redo_leaves_cursor_in_place() {
    let fail_backward = Rc::new(Cell::new(false));
    let fail_forward = Rc::new(Cell::new(false));
    let mut history = History::default();
    let mut total = 0;

    history
        .push(
            flaky_action(fail_backward.clone(), fail_forward.clone()),
            &mut total,
        )
        .unwrap();
    history.undo(&mut total).unwrap();
    fail_forward.set(true);

    let err = history.redo(&mut total).unwrap_err();
    assert!(matches!(err, HistoryError::Forward { .. }));
    assert_eq!(history.stack_location(), -1);
    assert!(history.can_redo());
    assert_eq!(total, 0);
}

#[test]
fn failed_push_is_not_recorded() {
    let fail_backward = Rc::new(Cell::new(false));
    let fail_forward = Rc::new(Cell::new(true));
    let mut history = History::default();
    let notified = Rc::new(Cell::new(0));
    let seen = notified.clone();
    history.on_change(move || seen.set(seen.get() + 1));
    let mut total = 0;

    let result = history.push(flaky_action(fail_backward, fail_forward), &mut total);

    assert!(result.is_err());
    assert!(history.is_empty());
    assert_eq!(history.stack_location(), -1);
    assert_eq!(notified.get(), 0);
}
