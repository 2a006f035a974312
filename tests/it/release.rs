use draggy::host::Dom;
use draggy::{DragState, NoticeKind, Options, Point};
use draggy::options::ReleaseValue;

use crate::helpers::*;

fn release_after(ms: f64) -> Options {
    Options {
        pin: Some(0.0.into()),
        release: Some(ReleaseValue::Millis(ms)),
        ..Default::default()
    }
}

/// Press at (50, 50), hold for one sample, then flick to `to` and sample once.
fn flick(fx: &Fixture, d: &mut draggy::Draggable<draggy::headless::HeadlessDom>, to: (f64, f64)) {
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    run_for(d, &fx.dom, 20.0, 20.0);
    d.handle(&moved(fx.dom.root(), to.0, to.1));
    run_for(d, &fx.dom, 20.0, 20.0);
}

#[test]
fn slow_release_goes_straight_to_idle() {
    let fx = board_with_card();
    let mut d = fx.draggable(release_after(200.0));
    let seen = record(&mut d);

    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    run_for(&mut d, &fx.dom, 200.0, 20.0);
    assert!(d.params().kinetics.velocity <= 1.0);

    d.handle(&up(fx.card, 50.0, 50.0));
    assert_eq!(d.state(), DragState::Idle);
    assert!(!seen.borrow().contains(&NoticeKind::Release));
    assert_eq!(fx.dom.transition(fx.card), None);
}

#[test]
fn fast_release_glides_then_stops_after_duration() {
    let fx = board_with_card();
    let mut d = fx.draggable(release_after(300.0));
    let seen = record(&mut d);

    flick(&fx, &mut d, (150.0, 50.0));
    assert_eq!(d.x(), 100.0);
    // 0.6 * 2000 * 100 / 21
    let v = d.params().kinetics.velocity;
    assert!((v - 120_000.0 / 21.0).abs() < 1e-6);
    assert_eq!(d.params().kinetics.angle, 0.0);

    d.handle(&up(fx.dom.root(), 150.0, 50.0));
    assert_eq!(d.state(), DragState::Release);
    assert_eq!(
        fx.dom.transition(fx.card).as_deref(),
        Some("300ms ease-out transform")
    );
    // travel is clamped by the board
    assert_eq!(d.x(), 400.0);

    fx.dom.advance(299.0);
    d.poll_timers();
    assert_eq!(d.state(), DragState::Release);

    fx.dom.advance(1.0);
    assert_eq!(d.poll_timers(), 1);
    assert_eq!(d.state(), DragState::Idle);
    assert_eq!(fx.dom.transition(fx.card), None);
    assert!(!d.pending_timers());

    let seen = seen.borrow();
    let tail = &seen[seen.len() - 3..];
    assert_eq!(
        tail,
        [NoticeKind::DragEnd, NoticeKind::Release, NoticeKind::Idle]
    );
}

#[test]
fn release_travel_follows_angle_and_cap() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        max_velocity: Some(10.0),
        ..release_after(100.0)
    });

    flick(&fx, &mut d, (50.0, 150.0));
    assert_eq!((d.x(), d.y()), (0.0, 100.0));
    let angle = d.params().kinetics.angle;
    assert!((angle - 0.4 * std::f64::consts::PI).abs() < 1e-9);

    d.handle(&up(fx.dom.root(), 50.0, 150.0));
    assert_eq!(d.state(), DragState::Release);
    // 10 * (cos 0.4π, sin 0.4π) = (3.09, 9.51)
    assert_eq!((d.x(), d.y()), (3.0, 110.0));
}

#[test]
fn without_release_a_moving_drop_stays_put() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        pin: Some(0.0.into()),
        ..Default::default()
    });
    let seen = record(&mut d);

    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    assert!(!d.pending_timers());
    for step in 1..=10 {
        fx.dom.advance(20.0);
        d.poll_timers();
        d.handle(&moved(fx.dom.root(), 50.0 + 5.0 * step as f64, 50.0));
    }
    assert_eq!(d.x(), 50.0);
    assert_eq!(d.params().kinetics.velocity, 0.0);

    d.handle(&up(fx.dom.root(), 100.0, 50.0));
    assert_eq!(d.state(), DragState::Idle);
    assert_eq!((d.x(), d.y()), (50.0, 0.0));
    assert!(!seen.borrow().contains(&NoticeKind::Release));
    assert_eq!(fx.dom.transition(fx.card), None);
    assert!(!d.pending_timers());
}

#[test]
fn disabling_release_mid_drag_drops_in_place() {
    let fx = board_with_card();
    let mut d = fx.draggable(release_after(300.0));
    flick(&fx, &mut d, (150.0, 50.0));
    assert!(d.params().kinetics.is_fast());

    d.set_release(None);
    d.handle(&up(fx.dom.root(), 150.0, 50.0));
    assert_eq!(d.state(), DragState::Idle);
    assert_eq!(d.x(), 100.0);
}

#[test]
fn external_stop_ends_release_and_cancels_timer() {
    let fx = board_with_card();
    let mut d = fx.draggable(release_after(500.0));
    flick(&fx, &mut d, (150.0, 50.0));
    d.handle(&up(fx.dom.root(), 150.0, 50.0));
    assert_eq!(d.state(), DragState::Release);
    assert!(d.pending_timers());

    assert!(d.stop());
    assert_eq!(d.state(), DragState::Idle);
    assert!(!d.pending_timers());

    fx.dom.advance(1000.0);
    assert_eq!(d.poll_timers(), 0);
}

#[test]
fn stop_is_ignored_outside_release() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options::default());
    assert!(!d.stop());
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    assert!(!d.stop());
    assert_eq!(d.state(), DragState::Drag);
}

#[test]
fn tracking_samples_every_interval_while_dragging() {
    let fx = board_with_card();
    let mut d = fx.draggable(release_after(300.0));
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    assert_eq!(d.next_timer_due(), Some(20.0));

    fx.dom.advance(20.0);
    assert_eq!(d.poll_timers(), 1);
    assert_eq!(d.next_timer_due(), Some(40.0));
    assert_eq!(d.params().kinetics.frame, Point::new(50.0, 50.0));

    d.handle(&up(fx.card, 50.0, 50.0));
    assert!(!d.pending_timers());
}

#[test]
fn pointer_down_is_ignored_while_releasing() {
    let fx = board_with_card();
    let mut d = fx.draggable(release_after(300.0));
    flick(&fx, &mut d, (150.0, 50.0));
    d.handle(&up(fx.dom.root(), 150.0, 50.0));
    assert!(!d.handle(&down_at(fx.card, (10.0, 10.0), (10.0, 10.0))));
    assert_eq!(d.state(), DragState::Release);
}

#[test]
fn leaving_the_page_while_fast_releases() {
    let fx = board_with_card();
    let mut d = fx.draggable(release_after(300.0));
    flick(&fx, &mut d, (150.0, 50.0));
    assert!(d.handle(&left(fx.dom.root(), 150.0, 50.0)));
    assert_eq!(d.state(), DragState::Release);
    assert_eq!(
        fx.dom.dispatched().last().map(|(_, n)| n.as_str()),
        Some("dragend")
    );
}
