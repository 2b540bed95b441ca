use serial_test::serial;
use std::sync::{Arc, Once};
use verbosity::broadcast::BroadcastHub;
use verbosity::channel::Universal;
use verbosity::logger;
use verbosity::registry::ChannelRegistry;
use verbosity::sink::{LogSink, TracingSink};
use verbosity::Verbosity;

static INIT: Once = Once::new();

fn ensure_logger_init() {
    INIT.call_once(|| {
        let _ = logger::init_logger();
    });
}

#[test]
#[serial]
fn test_logger_initialization() {
    let result = logger::init_logger();
    assert!(result.is_ok(), "Logger initialization should succeed");
}

#[test]
#[serial]
fn test_logger_multiple_initialization() {
    ensure_logger_init();

    let result1 = logger::init_logger();
    let result2 = logger::init_logger_with_filter("warn");

    assert!(result1.is_ok(), "Second logger init should succeed");
    assert!(result2.is_ok(), "Init with filter after init should not panic");
}

#[test]
#[serial]
fn test_log_macros_with_formatting() {
    ensure_logger_init();

    let identity = "universal";
    let mask = 0x42u32;
    verbosity::logger::log::info!("Toggled {} to {:#x}", identity, mask);
    verbosity::logger::log::warn!("Preference store failed on {}", "ppref_universal");
    verbosity::logger::log::debug!(identity, mask, "Registered channel set");
}

#[test]
#[serial]
fn test_tracing_sink_writes_with_and_without_target() {
    ensure_logger_init();

    let sink = TracingSink;
    sink.write("(1)      <b>engine</b> started", None);
    sink.write("(2)   Player:hero    <b>input</b> jump", Some("Player:hero"));
}

#[test]
#[serial]
fn test_emitter_through_tracing_sink_from_threads() {
    ensure_logger_init();

    let registry = Arc::new(ChannelRegistry::in_memory());
    registry.register_set::<Universal>();
    registry.toggle_set::<Universal>(Universal::ENGINE);
    let verbose = Arc::new(Verbosity::new(
        registry,
        Arc::new(BroadcastHub::new()),
        Arc::new(TracingSink),
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let verbose = Arc::clone(&verbose);
            std::thread::spawn(move || {
                let mut emitted = 0;
                for j in 0..10 {
                    if verbose.universal(Universal::ENGINE, &format!("thread {} iteration {}", i, j)) {
                        emitted += 1;
                    }
                    // Disabled channel
                    assert!(!verbose.universal(Universal::AUDIO, "suppressed"));
                }
                emitted
            })
        })
        .collect();

    let total: usize = handles
        .into_iter()
        .map(|h| h.join().expect("Thread should complete successfully"))
        .sum();
    assert_eq!(total, 40);
}
