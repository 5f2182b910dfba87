use anyhow::Result;
use rune_config::RuneConfig;
use rune_timing::{
    Animation, AnimationTarget, Color, EasingFunction, FromToAnimation, KeyFrame,
    KeyFrameAnimation, KeyTime, ManualTickSource, MemoryStore, PropertyId, PropertyStore,
    RepeatBehavior, SystemTickSource, TargetId, TickSource, Ticks, TimeManager, Timeline,
    ValueKind,
};
use tracing_subscriber::EnvFilter;

const CARD: TargetId = TargetId(1);
const OPACITY: PropertyId = PropertyId(0);
const OFFSET_X: PropertyId = PropertyId(1);
const BACKGROUND: PropertyId = PropertyId(2);

fn scene() -> MemoryStore {
    let mut store = MemoryStore::new();
    store.register(CARD, OPACITY, 0.0);
    store.register(CARD, OFFSET_X, -40.0);
    store.register(CARD, BACKGROUND, Color::BLACK);
    store
}

/// Fade the card in, slide it into place, and pulse its background.
fn storyboard() -> Timeline {
    let fade = Animation::from_to(
        FromToAnimation::new(ValueKind::Double)
            .to(1.0)
            .easing(EasingFunction::EaseOut),
    )
    .with_target(AnimationTarget::new(CARD, OPACITY));

    let slide = Animation::key_frames(
        KeyFrameAnimation::new(ValueKind::Double)
            .frame(KeyFrame::linear(KeyTime::percent(0.7), 6.0))
            .frame(KeyFrame::linear(KeyTime::percent(1.0), 0.0)),
    )
    .with_target(AnimationTarget::new(CARD, OFFSET_X));

    let pulse = Animation::from_to(
        FromToAnimation::new(ValueKind::Color).to(Color::rgba(0.2, 0.4, 0.9, 1.0)),
    )
    .with_target(AnimationTarget::new(CARD, BACKGROUND));

    Timeline::parallel()
        .named("card-intro")
        .child(Timeline::animation(fade).named("fade").duration_millis(400))
        .child(
            Timeline::animation(slide)
                .named("slide")
                .begin_millis(100)
                .duration_millis(600),
        )
        .child(
            Timeline::animation(pulse)
                .named("pulse")
                .duration_millis(250)
                .auto_reverse(true)
                .repeat(RepeatBehavior::Count(2.0)),
        )
}

fn main() -> Result<()> {
    let config = RuneConfig::load();

    let filter =
        EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let manual = config.timing.manual_time_source.then(ManualTickSource::new);
    let manual_clock = manual.as_ref().map(|source| source.clock());
    let source: Box<dyn TickSource> = match manual {
        Some(source) => Box::new(source),
        None => Box::new(SystemTickSource::new()),
    };

    let mut manager = TimeManager::from_config(&config, source);
    let mut store = scene();

    let board = manager.begin_storyboard(storyboard(), &store)?;
    manager.on_event(Some(board), |event, _| {
        if event.is_completed() {
            tracing::info!(clock = event.name(), "storyboard completed");
        }
    });
    manager.start();

    let interval = manager.source().interval();
    let run_for = Ticks::from_millis(i64::try_from(config.demo.duration_ms)?);
    let started = manager.source().now();

    while manager.source().now() - started < run_for {
        if let Some(report) = manager.pump(&mut store) {
            for failure in &report.write_failures {
                tracing::warn!(error = %failure.error, "write failed");
            }
            for event in manager.drain_events() {
                tracing::trace!(?event, "clock event");
            }
            tracing::info!(
                time = %report.time,
                opacity = ?store.read_value(CARD, OPACITY)?.as_f64(),
                offset_x = ?store.read_value(CARD, OFFSET_X)?.as_f64(),
                background = ?store.read_value(CARD, BACKGROUND)?.as_color(),
                "tick"
            );
        }
        match &manual_clock {
            Some(clock) => clock.advance(interval),
            None => {
                if let Some(wait) = manager.source().time_until_next_tick() {
                    std::thread::sleep(wait.to_std());
                }
            }
        }
    }

    manager.stop();
    tracing::info!(writes = store.writes().len(), "demo finished");
    println!("{}", manager.dump_clocks());
    Ok(())
}
