use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use verbosity::broadcast::BroadcastHub;
use verbosity::channel::{ChannelFlag, ChannelSetDescriptor, Host, Universal};
use verbosity::registry::ChannelRegistry;
use verbosity::sink::{LogSink, MemorySink};
use verbosity::stamp::{ColorMarkup, FrameCounter, LogContext, Target, VerbLevel, Verbose};
use verbosity::Verbosity;

/// Counts writes without keeping them
#[derive(Default)]
struct CountingSink {
    writes: AtomicUsize,
}

impl LogSink for CountingSink {
    fn write(&self, _message: &str, _target: Option<&str>) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    registry: Arc<ChannelRegistry>,
    hub: Arc<BroadcastHub>,
    sink: Arc<MemorySink>,
    verbose: Verbosity,
}

fn harness() -> Harness {
    let registry = Arc::new(ChannelRegistry::in_memory());
    registry.register_set::<Universal>();
    registry.register_set::<Host>();
    let hub = Arc::new(BroadcastHub::new());
    let sink = Arc::new(MemorySink::new());
    let verbose = Verbosity::new(Arc::clone(&registry), Arc::clone(&hub), sink.clone());
    Harness {
        registry,
        hub,
        sink,
        verbose,
    }
}

fn count_broadcasts(hub: &BroadcastHub, category: &str) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    hub.subscribe(category, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[test]
fn test_disabled_channel_writes_and_broadcasts_nothing() {
    let h = harness();
    let broadcasts = count_broadcasts(&h.hub, "universal");

    let emitted = h.verbose.log("universal", Universal::AUDIO, "footstep", None, None);

    assert!(!emitted);
    assert!(h.sink.is_empty());
    assert_eq!(broadcasts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_enabled_channel_writes_and_broadcasts_once() {
    let h = harness();
    let broadcasts = count_broadcasts(&h.hub, "universal");
    h.registry.toggle("universal", Universal::AUDIO | Universal::UI);

    let emitted = h.verbose.log("universal", Universal::AUDIO, "footstep X", None, None);

    assert!(emitted);
    assert_eq!(broadcasts.load(Ordering::SeqCst), 1);
    let lines = h.sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].message.contains("footstep X"));
    assert!(lines[0].message.contains("<b>audio</b>"));
    assert_eq!(lines[0].target, None);
}

#[test]
fn test_custom_sink_sees_exactly_one_write() {
    let registry = Arc::new(ChannelRegistry::in_memory());
    registry.register_set::<Universal>();
    let sink = Arc::new(CountingSink::default());
    let verbose = Verbosity::new(Arc::clone(&registry), Arc::new(BroadcastHub::new()), sink.clone());

    assert!(!verbose.universal(Universal::LOADING, "loaded level"));
    assert_eq!(sink.writes.load(Ordering::SeqCst), 0);

    registry.toggle_set::<Universal>(Universal::LOADING);
    assert!(verbose.universal(Universal::LOADING, "loaded level"));
    assert_eq!(sink.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_none_flag_always_emits() {
    let h = harness();
    assert!(h.verbose.log("universal", ChannelFlag::NONE, "always", None, None));
    assert_eq!(h.sink.len(), 1);
}

#[test]
fn test_replace_semantics_reach_the_emitter() {
    let h = harness();
    h.registry.toggle_set::<Host>(Host::CANVAS);
    assert!(h.verbose.host(Host::CANVAS, "canvas rebuilt"));

    h.registry.toggle_set::<Host>(Host::ADDRESSABLES);
    assert!(!h.verbose.host(Host::CANVAS, "canvas rebuilt"));
    assert!(h.verbose.host(Host::ADDRESSABLES, "bundle loaded"));
    assert_eq!(h.sink.len(), 2);
}

#[test]
fn test_color_hint_wraps_flag_name() {
    let h = harness();
    h.registry.toggle_set::<Universal>(Universal::SHADER);
    h.verbose
        .log_set::<Universal>(Universal::SHADER, "compiled", None, Some("ec3ef2"));

    let line = &h.sink.lines()[0].message;
    assert!(line.contains("<b><color=#ec3ef2>shader</color></b> compiled"), "{}", line);
}

#[test]
fn test_invalid_color_hint_still_emits_uncolored() {
    let h = harness();
    h.registry.toggle_set::<Universal>(Universal::SHADER);
    assert!(h
        .verbose
        .log_set::<Universal>(Universal::SHADER, "compiled", None, Some("not-a-color")));

    let line = &h.sink.lines()[0].message;
    assert!(!line.contains("<color="));
    assert!(line.contains("<b>shader</b>"));
}

#[test]
fn test_context_descriptor_in_stamp_and_target() {
    let h = harness();
    h.registry.toggle_set::<Universal>(Universal::INPUT);
    let player = Target::new("Player").named("hero");

    h.verbose
        .log_set::<Universal>(Universal::INPUT, "jump pressed", Some(&player as &dyn LogContext), None);

    let lines = h.sink.lines();
    assert!(lines[0].message.contains("Player:hero"));
    assert_eq!(lines[0].target.as_deref(), Some("Player:hero"));
}

#[test]
fn test_unnamed_identity_uses_hex_label() {
    let h = harness();
    h.registry.toggle("net", ChannelFlag::bit(5));
    h.verbose.log("net", ChannelFlag::bit(5), "packet", None, None);
    assert!(h.sink.lines()[0].message.contains("<b>0x20</b>"));
}

#[test]
fn test_runtime_descriptor_names_flags() {
    let h = harness();
    h.registry.register(
        ChannelSetDescriptor::new("audio-ui")
            .with_flag("audio", ChannelFlag::bit(0))
            .with_flag("ui", ChannelFlag::bit(1)),
    );
    h.registry.toggle("audio-ui", ChannelFlag::bit(1));
    h.verbose.log("audio-ui", ChannelFlag::bit(1), "button", None, None);
    assert!(h.sink.lines()[0].message.contains("<b>ui</b>"));
}

#[test]
fn test_convenience_logs_ignore_toggles() {
    let h = harness();
    h.registry.clear_all();

    let categories = ["app", "flow", "issue", "input"];
    let counters: Vec<_> = categories
        .iter()
        .map(|c| count_broadcasts(&h.hub, c))
        .collect();

    h.verbose.app("boot", "started");
    h.verbose.flow("menu", "entered");
    h.verbose.issue("save", "failed");
    h.verbose.input("pad", "connected");

    assert_eq!(h.sink.len(), 4);
    for counter in &counters {
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    let lines = h.sink.lines();
    assert!(lines[0].message.contains("<color=#3e83f2>app.boot</color>"));
    assert!(lines[1].message.contains("<color=#7df27f>flow.menu</color>"));
    assert!(lines[2].message.contains("<color=#f23e3e>issue.save</color>"));
    assert!(lines[3].message.contains("<color=#ec3ef2>input.pad</color>"));
    assert!(lines[0].message.ends_with("started"));
}

#[test]
fn test_broadcast_carries_formatted_line() {
    let h = harness();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&seen);
    h.hub.subscribe("issue", move |msg| recorder.lock().unwrap().push(msg.to_string()));

    h.verbose.issue("disk", "X");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("X"));
    assert_eq!(seen[0], h.sink.lines()[0].message);
}

#[test]
fn test_gate_disables_everything() {
    let h = harness();
    let broadcasts = count_broadcasts(&h.hub, "app");
    h.registry.toggle_set::<Universal>(Universal::ALL);
    h.verbose.set_enabled(false);

    assert!(!h.verbose.universal(Universal::ENGINE, "hidden"));
    h.verbose.app("boot", "hidden");

    assert!(h.sink.is_empty());
    assert_eq!(broadcasts.load(Ordering::SeqCst), 0);

    h.verbose.set_enabled(true);
    assert!(h.verbose.universal(Universal::ENGINE, "visible"));
}

#[test]
fn test_frame_counter_stamp() {
    let registry = Arc::new(ChannelRegistry::in_memory());
    let sink = Arc::new(MemorySink::new());
    let frames = Arc::new(FrameCounter::new());
    let verbose = Verbosity::new(registry, Arc::new(BroadcastHub::new()), sink.clone())
        .with_tick_source(frames.clone())
        .with_markup(ColorMarkup::Plain);

    for _ in 0..5 {
        frames.advance();
    }
    verbose.flow("level", "loaded");

    let line = &sink.lines()[0].message;
    assert!(line.starts_with("(5)"), "{}", line);
    assert!(line.contains(" flow.level "));
}

#[test]
fn test_panicking_subscriber_does_not_block_emit() {
    let h = harness();
    h.hub.subscribe("app", |_| panic!("listener failure"));
    let after = count_broadcasts(&h.hub, "app");

    h.verbose.app("boot", "still delivered");

    assert_eq!(h.sink.len(), 1);
    assert_eq!(after.load(Ordering::SeqCst), 1);
}

struct Spawner {
    level: VerbLevel,
}

impl Verbose for Spawner {
    fn verb_level(&self) -> VerbLevel {
        self.level
    }

    fn stamp(&self) -> String {
        format!("[spawner:{:?}]", self.level)
    }
}

#[test]
fn test_log_verbose_respects_object_level() {
    let h = harness();
    let broadcasts = count_broadcasts(&h.hub, "spawn");
    let spawner = Spawner { level: VerbLevel::Verbose };

    assert!(h.verbose.log_verbose(&spawner, VerbLevel::Verbose, "spawn", "wave 3"));
    assert!(!h.verbose.log_verbose(&spawner, VerbLevel::Deep, "spawn", "slot 12 picked"));

    assert_eq!(broadcasts.load(Ordering::SeqCst), 1);
    let lines = h.sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].message.contains("[spawner:Verbose]"));
    assert!(lines[0].message.ends_with("wave 3"));

    h.verbose.set_enabled(false);
    assert!(!h.verbose.log_verbose(&spawner, VerbLevel::None, "spawn", "hidden"));
    assert_eq!(h.sink.len(), 1);
}
