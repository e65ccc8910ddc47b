//! End-to-end tests: console lines through the registry to triggers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::unbounded;
use nyacore_servermon::triggers::FnTask;
use nyacore_servermon::{
    classify, Action, MonitorConfig, NotificationKind, ServerMonitor, TaskContext, TaskError,
    TriggerConfig, TriggerKind,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_alice_session() {
    init_logging();

    let lines = [
        "[INFO] Alice[/1.2.3.4] logged in",
        "[INFO] <Alice> hello",
        "[INFO] Alice left the game",
    ];

    let monitor = ServerMonitor::new(MonitorConfig::default()).unwrap();
    let added = monitor.observe(NotificationKind::Added);
    let removed = monitor.observe(NotificationKind::Removed);

    let actions: Vec<Action> = lines.iter().map(|l| monitor.process_line(l)).collect();
    assert_eq!(
        actions,
        vec![
            Action::Join {
                name: "Alice".into(),
                address: "1.2.3.4".into()
            },
            Action::Chat {
                name: "Alice".into(),
                message: "hello".into()
            },
            Action::Leave {
                name: "Alice".into()
            },
        ]
    );

    let a = added.try_recv().unwrap();
    let r = removed.try_recv().unwrap();
    assert_eq!(a.player_name(), "Alice");
    assert_eq!(r.player_name(), "Alice");
    assert!(a.sequence < r.sequence);
    assert!(added.try_recv().is_err());
    assert!(removed.try_recv().is_err());
    assert_eq!(monitor.registry().count(), 0);
}

#[test]
fn test_unrecognized_lines_change_nothing() {
    init_logging();

    let monitor = ServerMonitor::new(MonitorConfig::default()).unwrap();
    let observers: Vec<_> = NotificationKind::ALL
        .iter()
        .map(|kind| monitor.observe(*kind))
        .collect();

    for i in 0..500 {
        let line = format!("[INFO] Preparing spawn area: {}%", i % 100);
        assert_eq!(monitor.process_line(&line), Action::Unrecognized);
    }

    assert_eq!(monitor.registry().count(), 0);
    assert_eq!(monitor.lines_processed(), 500);
    for rx in observers {
        assert!(rx.try_recv().is_err());
    }
    let stats = monitor.registry().stats();
    assert_eq!(stats.suppressed_joins + stats.suppressed_leaves + stats.rejected, 0);
}

#[test]
fn test_classification_is_independent_of_history() {
    let chat = "[12:00:00] [Server thread/INFO]: <Bob> brb";
    let expected = classify(chat);
    for noise in [
        "[INFO] Bob[/10.0.0.2] logged in",
        "garbage \u{0}\u{1}",
        "[INFO] Bob left the game",
    ] {
        let _ = classify(noise);
        assert_eq!(classify(chat), expected);
    }
}

#[test]
fn test_config_file_drives_triggers() {
    init_logging();

    let config = MonitorConfig::from_toml(
        r#"
        [[triggers]]
        name = "welcome"
        kind = "player_joined"
        command = "say Welcome {player}!"

        [[triggers]]
        name = "crowd"
        kind = "player_count"
        parameters = ">= 2"
        command = "say {count} players online"

        [[triggers]]
        name = "goodbye"
        kind = "player_left"
        command = "say Bye {player}"
        enabled = false
        "#,
    )
    .unwrap();

    let (sink, commands) = unbounded();
    let monitor = ServerMonitor::with_command_sink(config, sink).unwrap();
    assert_eq!(
        monitor.triggers().enabled_names(),
        vec!["crowd".to_string(), "welcome".to_string()]
    );

    monitor.process_line("[INFO] Alice[/1.2.3.4] logged in");
    monitor.process_line("[INFO] Bob[/5.6.7.8] logged in");
    monitor.process_line("[INFO] Bob left the game");

    let mut received = Vec::new();
    while let Ok(cmd) = commands.recv_timeout(Duration::from_millis(500)) {
        received.push(cmd);
    }
    received.sort();
    assert_eq!(
        received,
        vec![
            "say 2 players online".to_string(),
            "say Welcome Alice!".to_string(),
            "say Welcome Bob!".to_string(),
        ]
    );
}

#[test]
fn test_feedback_loop_is_bounded() {
    init_logging();

    let config = MonitorConfig::default()
        .with_trigger(TriggerConfig::new("welcome", TriggerKind::PlayerJoined));
    let monitor = Arc::new(ServerMonitor::new(config).unwrap());
    let added = monitor.observe(NotificationKind::Added);

    // A handler that answers every join by feeding the server a new join line
    let m = Arc::clone(&monitor);
    let echoes = Arc::new(AtomicUsize::new(0));
    let e = Arc::clone(&echoes);
    monitor.bus().subscribe(NotificationKind::Added, move |_| {
        let count = e.fetch_add(1, Ordering::SeqCst);
        m.process_line(&format!("[INFO] Clone{}[/0.0.0.0] logged in", count));
    });

    monitor.process_line("[INFO] Alice[/1.2.3.4] logged in");

    let depth = nyacore_servermon::core::DEFAULT_MAX_DISPATCH_DEPTH;
    let players = monitor.registry().count();
    assert_eq!(players, depth);
    assert_eq!(echoes.load(Ordering::SeqCst), depth);
    // Every committed join was announced and fired the trigger once
    assert_eq!(added.try_iter().count(), players);
    assert_eq!(
        monitor.triggers().get("welcome").unwrap().fire_count(),
        players as u64
    );
    assert_eq!(monitor.bus().suppressed_dispatches(), 0);
    assert_eq!(monitor.registry().stats().feedback_loops, 1);
}

#[test]
fn test_concurrent_joins_fire_exactly_once() {
    init_logging();

    let config = MonitorConfig::default()
        .with_trigger(TriggerConfig::new("welcome", TriggerKind::PlayerJoined));
    let monitor = Arc::new(ServerMonitor::new(config).unwrap());
    let added = monitor.observe(NotificationKind::Added);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let monitor = Arc::clone(&monitor);
            // Every thread joins the same 50 players
            thread::spawn(move || {
                for i in 0..50 {
                    monitor.process_line(&format!("[INFO] Player{}[/10.0.0.{}] logged in", i, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(monitor.registry().count(), 50);
    assert_eq!(added.try_iter().count(), 50);
    assert_eq!(monitor.registry().stats().suppressed_joins, 350);
    assert_eq!(monitor.triggers().get("welcome").unwrap().fire_count(), 50);
}

#[test]
fn test_task_failure_is_isolated() {
    init_logging();

    let monitor = ServerMonitor::new(MonitorConfig::default()).unwrap();
    let (tx, rx) = unbounded();

    let failing = Arc::new(FnTask::new("explode", |_: &TaskContext| -> Result<(), TaskError> {
        panic!("task blew up")
    }));
    let recording = Arc::new(FnTask::new("record", move |ctx: &TaskContext| {
        tx.send(ctx.notification.player_name().to_string())
            .map_err(|e| TaskError::Failed(e.to_string()))
    }));

    monitor
        .triggers()
        .configure(&TriggerConfig::new("boom", TriggerKind::PlayerJoined), failing)
        .unwrap();
    monitor
        .triggers()
        .configure(&TriggerConfig::new("record", TriggerKind::PlayerJoined), recording)
        .unwrap();

    monitor.process_line("[INFO] Alice[/1.2.3.4] logged in");
    monitor.process_line("[INFO] Bob[/1.2.3.5] logged in");

    let mut names = vec![
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
    ];
    names.sort();
    assert_eq!(names, vec!["Alice".to_string(), "Bob".to_string()]);

    assert!(monitor.triggers().get("boom").unwrap().is_enabled());
    assert_eq!(monitor.registry().count(), 2);
}
