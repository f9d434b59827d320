//! Effect engine: time-driven color generators.
//!
//! Variants and their tick behaviour:
//!   Static    → fixed color, never ticks
//!   Breathing → intensity triangle wave 0.1 ↔ 1.0, ±0.02 per tick (every speed/50 ms)
//!   Rainbow   → hue +1 per tick, full saturation/value (every speed/360 ms)
//!   Wave      → blend color1 ↔ color2, ±0.01 per tick (every speed/100 ms)
//!   Reactive  → jumps to full color on trigger, decays −0.02 per tick
//!               (every duration/50 ms) and stops ticking at zero
//!
//! An effect is Stopped until `start()`. Ticking is driven from outside via
//! `advance(elapsed)`; each effect owns a [`Ticker`] that turns elapsed time
//! into a number of ticks. Color changes are pushed to a single listener
//! registered with `on_color_changed`, suppressed when the color is unchanged.

use crate::color::{self, Color};
use serde_json::Value;
use std::time::Duration;

/// Free-form effect parameters, as stored in profiles and passed to backends.
pub type EffectParams = serde_json::Map<String, Value>;

/// Receives every new color published by an effect.
pub type ColorListener = Box<dyn FnMut(Color) + Send>;

const DEFAULT_SPEED_MS: u64 = 2000;
const DEFAULT_REACTIVE_DURATION_MS: u64 = 500;

/// Upper bound on ticks replayed by a single `advance` call. Time beyond this
/// is dropped so a stalled loop does not spin catching up.
const MAX_CATCH_UP_TICKS: u32 = 1000;

// Phase counters in integer steps, so the bounds are hit exactly.
const BREATHING_MIN_LEVEL: u8 = 5; // 0.1
const BREATHING_MAX_LEVEL: u8 = 50; // 1.0
const BREATHING_STEPS: f64 = 50.0; // 0.02 per step
const WAVE_STEPS: u8 = 100; // 0.01 per step
const REACTIVE_STEPS: u8 = 50; // 0.02 per step

/// The five effect variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Static,
    Breathing,
    Rainbow,
    Wave,
    Reactive,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Static,
        EffectKind::Breathing,
        EffectKind::Rainbow,
        EffectKind::Wave,
        EffectKind::Reactive,
    ];

    /// Parse an effect name. Trims whitespace, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Some(EffectKind::Static),
            "breathing" => Some(EffectKind::Breathing),
            "rainbow" => Some(EffectKind::Rainbow),
            "wave" => Some(EffectKind::Wave),
            "reactive" => Some(EffectKind::Reactive),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Static => "Static",
            EffectKind::Breathing => "Breathing",
            EffectKind::Rainbow => "Rainbow",
            EffectKind::Wave => "Wave",
            EffectKind::Reactive => "Reactive",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical effect names in display order.
pub fn available_effects() -> Vec<&'static str> {
    EffectKind::ALL.iter().map(|k| k.name()).collect()
}

// ── Ticker ──────────────────────────────────────────────────────────

/// Repeating schedule owned by one effect. Accumulates elapsed time and
/// reports how many whole intervals have passed.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    elapsed: Duration,
    running: bool,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.elapsed = Duration::ZERO;
    }

    /// Idempotent; drops any partially elapsed interval.
    pub fn stop(&mut self) {
        self.running = false;
        self.elapsed = Duration::ZERO;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval. Takes effect for the tick currently in progress.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval.max(Duration::from_millis(1));
    }

    /// Feed elapsed time; returns the number of ticks due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if !self.running {
            return 0;
        }
        self.elapsed += elapsed;
        let due = self.elapsed.as_nanos() / self.interval.as_nanos();
        if due > u128::from(MAX_CATCH_UP_TICKS) {
            log::debug!("Ticker fell {due} ticks behind, dropping backlog");
            self.elapsed = Duration::ZERO;
            return MAX_CATCH_UP_TICKS;
        }
        let due = due as u32;
        self.elapsed -= self.interval * due;
        due
    }
}

// ── Variants ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct StaticState {
    color: Color,
}

#[derive(Debug, Clone)]
struct BreathingState {
    color: Color,
    speed_ms: u64,
    level: u8,
    rising: bool,
}

impl BreathingState {
    fn step(&mut self) {
        if self.rising {
            self.level += 1;
            if self.level >= BREATHING_MAX_LEVEL {
                self.level = BREATHING_MAX_LEVEL;
                self.rising = false;
            }
        } else {
            self.level -= 1;
            if self.level <= BREATHING_MIN_LEVEL {
                self.level = BREATHING_MIN_LEVEL;
                self.rising = true;
            }
        }
    }

    fn intensity(&self) -> f64 {
        f64::from(self.level) / BREATHING_STEPS
    }

    /// Scaling every channel by the same factor scales HSV value while
    /// keeping hue and saturation.
    fn color(&self) -> Color {
        let k = self.intensity();
        let scale = |c: u8| (f64::from(c) * k).round() as i64;
        Color::clamped(scale(self.color.r), scale(self.color.g), scale(self.color.b))
    }
}

#[derive(Debug, Clone)]
struct RainbowState {
    speed_ms: u64,
    hue: u16,
}

#[derive(Debug, Clone)]
struct WaveState {
    color1: Color,
    color2: Color,
    speed_ms: u64,
    position: u8,
    forward: bool,
}

impl WaveState {
    fn step(&mut self) {
        if self.forward {
            self.position += 1;
            if self.position >= WAVE_STEPS {
                self.position = WAVE_STEPS;
                self.forward = false;
            }
        } else {
            self.position -= 1;
            if self.position == 0 {
                self.forward = true;
            }
        }
    }

    fn position(&self) -> f64 {
        f64::from(self.position) / f64::from(WAVE_STEPS)
    }
}

#[derive(Debug, Clone)]
struct ReactiveState {
    color: Color,
    base_color: Color,
    duration_ms: u64,
    level: u8,
}

impl ReactiveState {
    fn intensity(&self) -> f64 {
        f64::from(self.level) / f64::from(REACTIVE_STEPS)
    }
}

#[derive(Debug, Clone)]
enum Variant {
    Static(StaticState),
    Breathing(BreathingState),
    Rainbow(RainbowState),
    Wave(WaveState),
    Reactive(ReactiveState),
}

impl Variant {
    fn new(kind: EffectKind) -> Self {
        match kind {
            EffectKind::Static => Variant::Static(StaticState { color: Color::WHITE }),
            EffectKind::Breathing => Variant::Breathing(BreathingState {
                color: Color::WHITE,
                speed_ms: DEFAULT_SPEED_MS,
                level: BREATHING_MIN_LEVEL,
                rising: true,
            }),
            EffectKind::Rainbow => Variant::Rainbow(RainbowState {
                speed_ms: DEFAULT_SPEED_MS,
                hue: 0,
            }),
            EffectKind::Wave => Variant::Wave(WaveState {
                color1: Color::BLUE,
                color2: Color::CYAN,
                speed_ms: DEFAULT_SPEED_MS,
                position: 0,
                forward: true,
            }),
            EffectKind::Reactive => Variant::Reactive(ReactiveState {
                color: Color::WHITE,
                base_color: Color::BLACK,
                duration_ms: DEFAULT_REACTIVE_DURATION_MS,
                level: 0,
            }),
        }
    }

    fn kind(&self) -> EffectKind {
        match self {
            Variant::Static(_) => EffectKind::Static,
            Variant::Breathing(_) => EffectKind::Breathing,
            Variant::Rainbow(_) => EffectKind::Rainbow,
            Variant::Wave(_) => EffectKind::Wave,
            Variant::Reactive(_) => EffectKind::Reactive,
        }
    }

    /// Apply the keys this variant understands; everything else is ignored.
    fn apply(&mut self, params: &EffectParams) {
        match self {
            Variant::Static(s) => {
                if let Some(c) = param_color(params, "color") {
                    s.color = c;
                }
            }
            Variant::Breathing(s) => {
                if let Some(c) = param_color(params, "color") {
                    s.color = c;
                }
                if let Some(ms) = param_millis(params, "speed") {
                    s.speed_ms = ms;
                }
            }
            Variant::Rainbow(s) => {
                if let Some(ms) = param_millis(params, "speed") {
                    s.speed_ms = ms;
                }
            }
            Variant::Wave(s) => {
                if let Some(c) = param_color(params, "color1") {
                    s.color1 = c;
                }
                if let Some(c) = param_color(params, "color2") {
                    s.color2 = c;
                }
                if let Some(ms) = param_millis(params, "speed") {
                    s.speed_ms = ms;
                }
            }
            Variant::Reactive(s) => {
                if let Some(c) = param_color(params, "color") {
                    s.color = c;
                }
                if let Some(c) = param_color(params, "baseColor") {
                    s.base_color = c;
                }
                if let Some(ms) = param_millis(params, "duration") {
                    s.duration_ms = ms;
                }
            }
        }
    }

    /// Tick interval, or None for variants that never tick.
    fn interval(&self) -> Option<Duration> {
        let ms = match self {
            Variant::Static(_) => return None,
            Variant::Breathing(s) => s.speed_ms / 50,
            Variant::Rainbow(s) => s.speed_ms / 360,
            Variant::Wave(s) => s.speed_ms / 100,
            Variant::Reactive(s) => s.duration_ms / 50,
        };
        Some(Duration::from_millis(ms.max(1)))
    }

    fn reset(&mut self) {
        match self {
            Variant::Static(_) => {}
            Variant::Breathing(s) => {
                s.level = BREATHING_MIN_LEVEL;
                s.rising = true;
            }
            Variant::Rainbow(s) => s.hue = 0,
            Variant::Wave(s) => {
                s.position = 0;
                s.forward = true;
            }
            Variant::Reactive(s) => s.level = 0,
        }
    }

    /// Advance one tick. Returns false when the variant wants ticking to stop.
    fn step(&mut self) -> bool {
        match self {
            Variant::Static(_) => false,
            Variant::Breathing(s) => {
                s.step();
                true
            }
            Variant::Rainbow(s) => {
                s.hue = (s.hue + 1) % 360;
                true
            }
            Variant::Wave(s) => {
                s.step();
                true
            }
            Variant::Reactive(s) => {
                s.level = s.level.saturating_sub(1);
                s.level > 0
            }
        }
    }

    fn color(&self) -> Color {
        match self {
            Variant::Static(s) => s.color,
            Variant::Breathing(s) => s.color(),
            Variant::Rainbow(s) => Color::from_hsv(s.hue, 255, 255),
            Variant::Wave(s) => color::interpolate(s.color1, s.color2, s.position()),
            Variant::Reactive(s) => color::interpolate(s.base_color, s.color, s.intensity()),
        }
    }
}

/// Observable phase of an effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    /// Static has no phase.
    None,
    /// Breathing or Reactive intensity in [0.0, 1.0].
    Intensity(f64),
    /// Rainbow hue in [0, 359].
    Hue(u16),
    /// Wave blend position in [0.0, 1.0].
    Position(f64),
}

// ── Effect ──────────────────────────────────────────────────────────

/// A single effect instance with its lifecycle and listener.
pub struct Effect {
    variant: Variant,
    parameters: EffectParams,
    active: bool,
    ticker: Ticker,
    published: Option<Color>,
    listener: Option<ColorListener>,
}

impl Effect {
    /// Construct an un-started effect of the given kind with default parameters.
    pub fn new(kind: EffectKind) -> Self {
        let variant = Variant::new(kind);
        let interval = variant.interval().unwrap_or(Duration::from_millis(1));
        Self {
            variant,
            parameters: EffectParams::new(),
            active: false,
            ticker: Ticker::new(interval),
            published: None,
            listener: None,
        }
    }

    /// Factory: construct the variant named `name` and apply `params`.
    /// Unknown names fall back to Static (logged); callers that want to
    /// reject them check [`EffectKind::parse`] first.
    pub fn create(name: &str, params: &EffectParams) -> Self {
        let kind = EffectKind::parse(name).unwrap_or_else(|| {
            log::warn!("Unknown effect '{name}', falling back to Static");
            EffectKind::Static
        });
        Self::with_kind(kind, params)
    }

    pub fn with_kind(kind: EffectKind, params: &EffectParams) -> Self {
        let mut effect = Self::new(kind);
        effect.set_parameters(params);
        effect
    }

    /// Static effect wrapping `color`.
    pub fn static_color(color: Color) -> Self {
        let mut params = EffectParams::new();
        params.insert("color".into(), color_value(color));
        Self::with_kind(EffectKind::Static, &params)
    }

    pub fn kind(&self) -> EffectKind {
        self.variant.kind()
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Parameters applied so far (merged across `set_parameters` calls).
    pub fn parameters(&self) -> &EffectParams {
        &self.parameters
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True while the effect's schedule is running.
    pub fn is_ticking(&self) -> bool {
        self.active && self.ticker.is_running()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.variant.interval()
    }

    pub fn current_color(&self) -> Color {
        self.variant.color()
    }

    pub fn phase(&self) -> Phase {
        match &self.variant {
            Variant::Static(_) => Phase::None,
            Variant::Breathing(s) => Phase::Intensity(s.intensity()),
            Variant::Rainbow(s) => Phase::Hue(s.hue),
            Variant::Wave(s) => Phase::Position(s.position()),
            Variant::Reactive(s) => Phase::Intensity(s.intensity()),
        }
    }

    /// Register the color listener, replacing any previous one.
    pub fn on_color_changed(&mut self, listener: impl FnMut(Color) + Send + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Merge `params` into the effect. A running effect picks up a new
    /// interval immediately; Static publishes a new color at once.
    pub fn set_parameters(&mut self, params: &EffectParams) {
        for (k, v) in params {
            self.parameters.insert(k.clone(), v.clone());
        }
        self.variant.apply(params);
        if let Some(interval) = self.variant.interval() {
            self.ticker.set_interval(interval);
        }
        if self.active || self.kind() == EffectKind::Static {
            self.publish();
        }
    }

    /// Stopped → Running. Resets phase and publishes the initial color.
    /// Reactive does not tick until triggered.
    pub fn start(&mut self) {
        self.begin();
        self.publish();
    }

    /// Running with fresh phase and no color published yet.
    fn begin(&mut self) {
        self.active = true;
        self.variant.reset();
        self.published = None;
        match self.variant.interval() {
            Some(interval) if self.kind() != EffectKind::Reactive => {
                self.ticker.set_interval(interval);
                self.ticker.start();
            }
            Some(interval) => self.ticker.set_interval(interval),
            None => {}
        }
    }

    /// Running → Stopped. Idempotent.
    pub fn stop(&mut self) {
        self.active = false;
        self.ticker.stop();
    }

    /// Fire a Reactive effect: intensity jumps to 1.0 and decay ticking
    /// begins, starting the effect first if needed. Returns false (and does
    /// nothing) for other variants.
    pub fn trigger(&mut self) -> bool {
        if self.kind() != EffectKind::Reactive {
            return false;
        }
        // A stopped effect goes straight to full intensity, skipping its base color
        if !self.active {
            self.begin();
        }
        if let Variant::Reactive(s) = &mut self.variant {
            s.level = REACTIVE_STEPS;
        }
        self.publish();
        if !self.ticker.is_running() {
            self.ticker.start();
        }
        true
    }

    /// Feed elapsed time and run every tick that became due.
    pub fn advance(&mut self, elapsed: Duration) {
        if !self.active {
            return;
        }
        let due = self.ticker.advance(elapsed);
        for _ in 0..due {
            let keep_ticking = self.variant.step();
            self.publish();
            if !keep_ticking {
                self.ticker.stop();
                break;
            }
        }
    }

    fn publish(&mut self) {
        let color = self.variant.color();
        if self.published == Some(color) {
            return;
        }
        self.published = Some(color);
        if let Some(listener) = self.listener.as_mut() {
            listener(color);
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("kind", &self.kind())
            .field("active", &self.active)
            .field("ticking", &self.is_ticking())
            .field("color", &self.current_color())
            .finish()
    }
}

// ── Parameter helpers ───────────────────────────────────────────────

/// JSON form of a color inside effect parameters.
pub fn color_value(color: Color) -> Value {
    serde_json::json!({ "r": color.r, "g": color.g, "b": color.b })
}

/// Read a color parameter: `{r,g,b}` object, `#rrggbb` string or palette name.
pub fn param_color(params: &EffectParams, key: &str) -> Option<Color> {
    match params.get(key)? {
        v @ Value::Object(_) => serde_json::from_value(v.clone()).ok(),
        Value::String(s) => Color::parse_hex(s).or_else(|| Color::lookup(s)),
        _ => None,
    }
}

/// Read a non-negative millisecond parameter from an integer, float or
/// numeric string.
fn param_millis(params: &EffectParams, key: &str) -> Option<u64> {
    let raw = match params.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(raw.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn params(v: Value) -> EffectParams {
        v.as_object().cloned().unwrap_or_default()
    }

    fn recorder(effect: &mut Effect) -> Arc<Mutex<Vec<Color>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        effect.on_color_changed(move |c| sink.lock().unwrap().push(c));
        seen
    }

    #[test]
    fn parse_names() {
        assert_eq!(EffectKind::parse("Breathing"), Some(EffectKind::Breathing));
        assert_eq!(EffectKind::parse("  rainbow\n"), Some(EffectKind::Rainbow));
        assert_eq!(EffectKind::parse("WAVE"), Some(EffectKind::Wave));
        assert_eq!(EffectKind::parse("Strobe"), None);
        assert_eq!(available_effects(), vec!["Static", "Breathing", "Rainbow", "Wave", "Reactive"]);
    }

    #[test]
    fn unknown_name_falls_back_to_static() {
        let e = Effect::create("Disco", &params(json!({ "color": "#102030" })));
        assert_eq!(e.kind(), EffectKind::Static);
        assert_eq!(e.current_color(), Color::new(0x10, 0x20, 0x30));
    }

    #[test]
    fn factory_returns_unstarted_effect() {
        let e = Effect::create("Rainbow", &EffectParams::new());
        assert!(!e.is_active());
        assert!(!e.is_ticking());
    }

    #[test]
    fn intervals_follow_speed() {
        let b = Effect::create("Breathing", &params(json!({ "speed": 1500 })));
        assert_eq!(b.interval(), Some(Duration::from_millis(30)));
        let r = Effect::create("Rainbow", &params(json!({ "speed": 3600 })));
        assert_eq!(r.interval(), Some(Duration::from_millis(10)));
        let w = Effect::create("Wave", &EffectParams::new());
        assert_eq!(w.interval(), Some(Duration::from_millis(20)));
        let re = Effect::create("Reactive", &params(json!({ "duration": 1000 })));
        assert_eq!(re.interval(), Some(Duration::from_millis(20)));
        // Tiny speeds still tick at 1 ms
        let fast = Effect::create("Rainbow", &params(json!({ "speed": 5 })));
        assert_eq!(fast.interval(), Some(Duration::from_millis(1)));
        assert_eq!(Effect::create("Static", &EffectParams::new()).interval(), None);
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let e = Effect::create("Rainbow", &params(json!({ "color": "#ff0000", "bogus": true })));
        assert_eq!(e.interval(), Some(Duration::from_millis(5)));
        assert_eq!(e.parameters().len(), 2);
    }

    #[test]
    fn static_publishes_on_parameter_change() {
        let mut e = Effect::static_color(Color::RED);
        let seen = recorder(&mut e);
        e.set_parameters(&params(json!({ "color": { "r": 0, "g": 0, "b": 255 } })));
        e.set_parameters(&params(json!({ "color": "Blue" })));
        // Second update is the same color and is suppressed
        assert_eq!(*seen.lock().unwrap(), vec![Color::BLUE]);
    }

    #[test]
    fn breathing_stays_in_bounds() {
        let mut e =
            Effect::create("Breathing", &params(json!({ "color": "#ff8000", "speed": 500 })));
        e.start();
        assert_eq!(e.phase(), Phase::Intensity(0.1));
        for _ in 0..500 {
            e.advance(Duration::from_millis(10));
            match e.phase() {
                Phase::Intensity(i) => assert!((0.1..=1.0).contains(&i), "intensity {i}"),
                other => panic!("unexpected phase {other:?}"),
            }
        }
    }

    #[test]
    fn breathing_reverses_at_peak() {
        let mut e = Effect::create("Breathing", &params(json!({ "color": "White", "speed": 500 })));
        e.start();
        // 45 ticks from 0.1 reaches 1.0
        e.advance(Duration::from_millis(45 * 10));
        assert_eq!(e.phase(), Phase::Intensity(1.0));
        assert_eq!(e.current_color(), Color::WHITE);
        e.advance(Duration::from_millis(10));
        assert_eq!(e.phase(), Phase::Intensity(0.98));
    }

    #[test]
    fn breathing_keeps_hue() {
        let mut e = Effect::create("Breathing", &params(json!({ "color": "#ff0000" })));
        e.start();
        let c = e.current_color();
        assert_eq!((c.r, c.g, c.b), (26, 0, 0));
        assert_eq!(c.hue(), 0);
    }

    #[test]
    fn rainbow_hue_wraps() {
        let mut e = Effect::create("Rainbow", &params(json!({ "speed": 360 })));
        e.start();
        assert_eq!(e.current_color(), Color::RED);
        e.advance(Duration::from_millis(120));
        assert_eq!(e.phase(), Phase::Hue(120));
        assert_eq!(e.current_color(), Color::new(0, 255, 0));
        e.advance(Duration::from_millis(240));
        assert_eq!(e.phase(), Phase::Hue(0));
        for _ in 0..1000 {
            e.advance(Duration::from_millis(1));
            let Phase::Hue(h) = e.phase() else { panic!("not a hue") };
            assert!(h < 360);
        }
    }

    #[test]
    fn wave_oscillates_between_colors() {
        let mut e = Effect::create(
            "Wave",
            &params(json!({ "color1": "Black", "color2": "White", "speed": 100 })),
        );
        e.start();
        assert_eq!(e.current_color(), Color::BLACK);
        e.advance(Duration::from_millis(100));
        assert_eq!(e.phase(), Phase::Position(1.0));
        assert_eq!(e.current_color(), Color::WHITE);
        e.advance(Duration::from_millis(100));
        assert_eq!(e.phase(), Phase::Position(0.0));
        for _ in 0..350 {
            e.advance(Duration::from_millis(1));
            let Phase::Position(p) = e.phase() else { panic!("not a position") };
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn reactive_trigger_and_decay() {
        let mut e = Effect::create(
            "Reactive",
            &params(json!({ "color": "White", "baseColor": "Black", "duration": 500 })),
        );
        let seen = recorder(&mut e);
        // trigger() starts a stopped effect
        assert!(e.trigger());
        assert!(e.is_active());
        assert_eq!(e.phase(), Phase::Intensity(1.0));
        assert_eq!(e.current_color(), Color::WHITE);
        assert!(e.is_ticking());

        // 50 ticks at 10 ms decay to exactly zero
        e.advance(Duration::from_millis(500));
        assert_eq!(e.phase(), Phase::Intensity(0.0));
        assert_eq!(e.current_color(), Color::BLACK);
        assert!(!e.is_ticking());
        assert!(e.is_active());

        let count = seen.lock().unwrap().len();
        e.advance(Duration::from_secs(5));
        assert_eq!(seen.lock().unwrap().len(), count);

        // Re-trigger restarts the decay
        e.trigger();
        assert!(e.is_ticking());
        assert_eq!(e.current_color(), Color::WHITE);
    }

    #[test]
    fn trigger_from_stopped_skips_base_color() {
        let mut e = Effect::create(
            "Reactive",
            &params(json!({ "color": "White", "baseColor": "Black" })),
        );
        let seen = recorder(&mut e);
        assert!(e.trigger());
        assert_eq!(*seen.lock().unwrap(), vec![Color::WHITE]);
    }

    #[test]
    fn reactive_start_does_not_tick() {
        let mut e = Effect::create("Reactive", &EffectParams::new());
        e.start();
        assert!(e.is_active());
        assert!(!e.is_ticking());
        assert_eq!(e.current_color(), Color::BLACK);
    }

    #[test]
    fn trigger_ignored_for_other_variants() {
        let mut e = Effect::create("Wave", &EffectParams::new());
        assert!(!e.trigger());
        assert!(!e.is_active());
    }

    #[test]
    fn stop_is_idempotent_and_silences() {
        let mut e = Effect::create("Rainbow", &params(json!({ "speed": 360 })));
        let seen = recorder(&mut e);
        e.start();
        e.advance(Duration::from_millis(3));
        e.stop();
        e.stop();
        let count = seen.lock().unwrap().len();
        e.advance(Duration::from_secs(1));
        assert_eq!(seen.lock().unwrap().len(), count);
        assert!(!e.is_active());
    }

    #[test]
    fn speed_change_mid_run_retimes() {
        let mut e = Effect::create("Rainbow", &params(json!({ "speed": 3600 })));
        e.start();
        e.set_parameters(&params(json!({ "speed": 360 })));
        assert_eq!(e.interval(), Some(Duration::from_millis(1)));
        e.advance(Duration::from_millis(10));
        assert_eq!(e.phase(), Phase::Hue(10));
    }

    #[test]
    fn ticker_caps_backlog() {
        let mut t = Ticker::new(Duration::from_millis(1));
        assert_eq!(t.advance(Duration::from_millis(5)), 0);
        t.start();
        assert_eq!(t.advance(Duration::from_micros(2500)), 2);
        assert_eq!(t.advance(Duration::from_micros(500)), 1);
        assert_eq!(t.advance(Duration::from_secs(60)), MAX_CATCH_UP_TICKS);
        assert_eq!(t.advance(Duration::ZERO), 0);
    }
}
