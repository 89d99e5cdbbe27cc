//! End-to-end binding tests over derived observable objects.
//!
//! Exercises every nullability pairing for several base types, the option
//! flags, boolean negation, and binding chains.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;
use propbind::{
    BindError, BindOptions, Observable, Property, PropertyChangedSignal, bind_property,
    handle_on_property_changed,
};
use propbind_macros::Observable;

/// A point in time whose default is the earliest representable instant,
/// giving date-valued properties a well-defined null-to-default coercion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Timestamp(NaiveDateTime);

impl Default for Timestamp {
    fn default() -> Self {
        Self(NaiveDateTime::MIN)
    }
}

fn sample_timestamp() -> Timestamp {
    Timestamp(
        chrono::NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
    )
}

#[derive(Observable, Default)]
struct Sensor {
    number: Property<i32>,
    optional_number: Property<Option<i32>>,
    label: Property<String>,
    optional_label: Property<Option<String>>,
    stamp: Property<Timestamp>,
    optional_stamp: Property<Option<Timestamp>>,
    flag: Property<bool>,
    optional_flag: Property<Option<bool>>,
    property_changed: PropertyChangedSignal,
}

#[derive(Observable, Default)]
struct Display {
    number: Property<i32>,
    optional_number: Property<Option<i32>>,
    label: Property<String>,
    optional_label: Property<Option<String>>,
    stamp: Property<Timestamp>,
    optional_stamp: Property<Option<Timestamp>>,
    flag: Property<bool>,
    optional_flag: Property<Option<bool>>,
    property_changed: PropertyChangedSignal,
}

fn fixtures() -> (Arc<Sensor>, Arc<Display>) {
    (Arc::new(Sensor::default()), Arc::new(Display::default()))
}

#[test]
fn test_same_shape_value_follows_source() {
    let (sensor, display) = fixtures();

    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::number_ref(&display),
        BindOptions::empty(),
    )
    .unwrap();

    sensor.set_number(17);
    assert_eq!(display.number(), 17);

    sensor.set_number(-3);
    assert_eq!(display.number(), -3);
}

#[test]
fn test_nullable_to_nullable_transfers_null_verbatim() {
    let (sensor, display) = fixtures();
    display.set_optional_number(Some(1));

    bind_property(
        &*sensor,
        Sensor::optional_number_ref(&sensor),
        Display::optional_number_ref(&display),
        BindOptions::empty(),
    )
    .unwrap();

    sensor.set_optional_number(Some(8));
    assert_eq!(display.optional_number(), Some(8));

    sensor.set_optional_number(None);
    assert_eq!(display.optional_number(), None);
}

#[test]
fn test_non_nullable_to_nullable_wraps_the_value() {
    let (sensor, display) = fixtures();

    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::optional_number_ref(&display),
        BindOptions::empty(),
    )
    .unwrap();

    sensor.set_number(5);
    assert_eq!(display.optional_number(), Some(5));
}

#[test]
fn test_null_coerces_to_default_per_base_type() {
    let (sensor, display) = fixtures();
    sensor.set_optional_number(Some(9));
    sensor.set_optional_label(Some("live".to_string()));
    sensor.set_optional_stamp(Some(sample_timestamp()));
    sensor.set_optional_flag(Some(true));

    bind_property(
        &*sensor,
        Sensor::optional_number_ref(&sensor),
        Display::number_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();
    bind_property(
        &*sensor,
        Sensor::optional_label_ref(&sensor),
        Display::label_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();
    bind_property(
        &*sensor,
        Sensor::optional_stamp_ref(&sensor),
        Display::stamp_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();
    bind_property(
        &*sensor,
        Sensor::optional_flag_ref(&sensor),
        Display::flag_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();

    assert_eq!(display.number(), 9);
    assert_eq!(display.label(), "live");
    assert_eq!(display.stamp(), sample_timestamp());
    assert_eq!(display.flag(), true);

    sensor.set_optional_number(None);
    sensor.set_optional_label(None);
    sensor.set_optional_stamp(None);
    sensor.set_optional_flag(None);

    assert_eq!(display.number(), 0);
    assert_eq!(display.label(), "");
    assert_eq!(display.stamp(), Timestamp(NaiveDateTime::MIN));
    assert_eq!(display.flag(), false);
}

#[test]
fn test_suppress_null_to_default_keeps_target_value() {
    let (sensor, display) = fixtures();
    sensor.set_optional_label(Some("live".to_string()));

    bind_property(
        &*sensor,
        Sensor::optional_label_ref(&sensor),
        Display::label_ref(&display),
        BindOptions::INITIALISE_TARGET | BindOptions::SUPPRESS_NULL_TO_DEFAULT,
    )
    .unwrap();
    assert_eq!(display.label(), "live");

    sensor.set_optional_label(None);
    assert_eq!(display.label(), "live");

    sensor.set_optional_label(Some("back".to_string()));
    assert_eq!(display.label(), "back");
}

#[test]
fn test_suppress_flag_is_ignored_for_nullable_targets() {
    let (sensor, display) = fixtures();
    display.set_optional_stamp(Some(sample_timestamp()));

    bind_property(
        &*sensor,
        Sensor::optional_stamp_ref(&sensor),
        Display::optional_stamp_ref(&display),
        BindOptions::SUPPRESS_NULL_TO_DEFAULT,
    )
    .unwrap();

    // Go through a non-null value first so the transition to null notifies.
    sensor.set_optional_stamp(Some(sample_timestamp()));
    sensor.set_optional_stamp(None);
    assert_eq!(display.optional_stamp(), None);
}

#[test]
fn test_initialise_target_copies_current_value_once() {
    let (sensor, display) = fixtures();
    sensor.set_number(42);

    let notifications = Arc::new(AtomicUsize::new(0));
    let notifications_clone = notifications.clone();
    display.property_changed().connect(move |_| {
        notifications_clone.fetch_add(1, Ordering::SeqCst);
    });

    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::number_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();

    assert_eq!(display.number(), 42);
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
}

#[test]
fn test_without_initialise_target_waits_for_first_change() {
    let (sensor, display) = fixtures();
    sensor.set_number(42);
    display.set_number(7);

    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::number_ref(&display),
        BindOptions::empty(),
    )
    .unwrap();
    assert_eq!(display.number(), 7);

    sensor.set_number(43);
    assert_eq!(display.number(), 43);
}

#[test]
fn test_negated_flag_inverts_on_every_transfer() {
    let (sensor, display) = fixtures();

    bind_property(
        &*sensor,
        Sensor::flag_ref(&sensor),
        !Display::flag_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();
    assert_eq!(display.flag(), true);

    sensor.set_flag(true);
    assert_eq!(display.flag(), false);

    sensor.set_flag(false);
    assert_eq!(display.flag(), true);
}

#[test]
fn test_null_negated_source_yields_true() {
    let (sensor, display) = fixtures();

    bind_property(
        &*sensor,
        Sensor::optional_flag_ref(&sensor),
        !Display::flag_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();
    // Null resolves to false before negation.
    assert_eq!(display.flag(), true);

    sensor.set_optional_flag(Some(true));
    assert_eq!(display.flag(), false);

    sensor.set_optional_flag(None);
    assert_eq!(display.flag(), true);
}

#[test]
fn test_negated_nullable_target_always_receives_a_value() {
    let (sensor, display) = fixtures();
    display.set_optional_flag(None);

    bind_property(
        &*sensor,
        Sensor::optional_flag_ref(&sensor),
        !Display::optional_flag_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap();
    assert_eq!(display.optional_flag(), Some(true));

    sensor.set_optional_flag(Some(true));
    assert_eq!(display.optional_flag(), Some(false));
}

#[test]
fn test_suppressed_null_skips_negation_on_non_nullable_target() {
    let (sensor, display) = fixtures();
    sensor.set_optional_flag(Some(true));

    bind_property(
        &*sensor,
        Sensor::optional_flag_ref(&sensor),
        !Display::flag_ref(&display),
        BindOptions::INITIALISE_TARGET | BindOptions::SUPPRESS_NULL_TO_DEFAULT,
    )
    .unwrap();
    assert_eq!(display.flag(), false);

    // A suppressed null transfer never runs, so the target is not flipped
    // to the negated-null value.
    sensor.set_optional_flag(None);
    assert_eq!(display.flag(), false);

    sensor.set_optional_flag(Some(false));
    assert_eq!(display.flag(), true);
}

#[test]
fn test_negated_null_yields_true_on_nullable_target_despite_suppress() {
    let (sensor, display) = fixtures();

    bind_property(
        &*sensor,
        Sensor::optional_flag_ref(&sensor),
        !Display::optional_flag_ref(&display),
        BindOptions::INITIALISE_TARGET | BindOptions::SUPPRESS_NULL_TO_DEFAULT,
    )
    .unwrap();
    // Same-shape transfer; suppression only ever applies to non-nullable
    // targets, so null resolves to false and negates to true.
    assert_eq!(display.optional_flag(), Some(true));

    sensor.set_optional_flag(Some(true));
    assert_eq!(display.optional_flag(), Some(false));

    sensor.set_optional_flag(None);
    assert_eq!(display.optional_flag(), Some(true));
}

#[test]
fn test_negating_a_non_boolean_source_fails() {
    let (sensor, display) = fixtures();

    let err = bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        !Display::number_ref(&display),
        BindOptions::empty(),
    )
    .unwrap_err();
    assert!(matches!(err, BindError::InvalidNegation { .. }));
}

#[test]
fn test_incompatible_base_types_fail_even_with_initialise() {
    let (sensor, display) = fixtures();
    sensor.set_number(3);

    let err = bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::label_ref(&display),
        BindOptions::INITIALISE_TARGET,
    )
    .unwrap_err();
    assert!(matches!(err, BindError::IncompatibleTypes { .. }));

    // Nothing was installed and no initial transfer ran.
    assert_eq!(display.label(), "");
    assert_eq!(sensor.property_changed().connection_count(), 0);
}

#[test]
fn test_nullability_never_makes_types_incompatible() {
    let (sensor, display) = fixtures();

    let err = bind_property(
        &*sensor,
        Sensor::optional_number_ref(&sensor),
        Display::label_ref(&display),
        BindOptions::empty(),
    )
    .unwrap_err();
    // Base types differ (i32 vs String); the nullable wrapper is not what
    // gets compared.
    assert!(matches!(err, BindError::IncompatibleTypes { .. }));

    bind_property(
        &*sensor,
        Sensor::optional_number_ref(&sensor),
        Display::number_ref(&display),
        BindOptions::empty(),
    )
    .unwrap();
}

#[test]
fn test_unrelated_property_changes_do_not_transfer() {
    let (sensor, display) = fixtures();

    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::number_ref(&display),
        BindOptions::empty(),
    )
    .unwrap();

    sensor.set_label("other".to_string());
    sensor.set_flag(true);
    assert_eq!(display.number(), 0);

    sensor.set_number(2);
    assert_eq!(display.number(), 2);
}

#[test]
fn test_one_source_property_can_feed_several_targets() {
    let (sensor, first) = fixtures();
    let second = Arc::new(Display::default());

    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::number_ref(&first),
        BindOptions::empty(),
    )
    .unwrap();
    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::optional_number_ref(&second),
        BindOptions::empty(),
    )
    .unwrap();

    sensor.set_number(11);
    assert_eq!(first.number(), 11);
    assert_eq!(second.optional_number(), Some(11));
}

#[test]
fn test_bindings_chain_through_notifying_targets() {
    let (sensor, middle) = fixtures();
    let end = Arc::new(Display::default());

    bind_property(
        &*sensor,
        Sensor::number_ref(&sensor),
        Display::number_ref(&middle),
        BindOptions::empty(),
    )
    .unwrap();
    // The generated target setter notifies, so a binding rooted at the
    // middle object continues the chain on the same call stack.
    bind_property(
        &*middle,
        Display::number_ref(&middle),
        Display::number_ref(&end),
        BindOptions::empty(),
    )
    .unwrap();

    sensor.set_number(23);
    assert_eq!(middle.number(), 23);
    assert_eq!(end.number(), 23);
}

#[test]
fn test_handler_runs_for_its_property_only() {
    let (sensor, _) = fixtures();
    let calls = Arc::new(AtomicUsize::new(0));

    let calls_clone = calls.clone();
    handle_on_property_changed(&sensor, Sensor::NUMBER, move |sensor: &Sensor| {
        assert!(sensor.number() != 0);
        calls_clone.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    sensor.set_number(6);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sensor.set_label("noise".to_string());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
