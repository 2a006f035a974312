use draggy::geometry::Sides;
use draggy::headless::HeadlessDom;
use draggy::host::{Dom, Layout, Styles};
use draggy::{Axis, DragState, Draggable, NoticeKind, Options, Point, Rect, RepeatValue};

use crate::helpers::*;

fn pinned_zero() -> Options {
    Options {
        pin: Some(0.0.into()),
        ..Default::default()
    }
}

#[test]
fn zero_threshold_drags_on_pointer_down() {
    let fx = board_with_card();
    let mut d = fx.draggable(pinned_zero());
    let seen = record(&mut d);

    assert!(d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0))));
    assert_eq!(d.state(), DragState::Drag);
    assert_eq!((d.x(), d.y()), (0.0, 0.0));

    assert!(d.handle(&moved(fx.dom.root(), 60.0, 60.0)));
    assert_eq!((d.x(), d.y()), (10.0, 10.0));
    assert_eq!(fx.dom.transform(fx.card), "translate3d(10px, 10px, 0)");

    assert_eq!(
        *seen.borrow(),
        vec![
            NoticeKind::Threshold,
            NoticeKind::DragStart,
            NoticeKind::Drag,
            NoticeKind::Drag,
            NoticeKind::Drag,
        ]
    );
    let names: Vec<String> = fx.dom.dispatched().into_iter().map(|(_, n)| n).collect();
    assert_eq!(names, vec!["dragstart", "drag", "drag", "drag"]);
}

#[test]
fn threshold_holds_until_exceeded() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        threshold: Some(10.0.into()),
        ..pinned_zero()
    });

    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    assert_eq!(d.state(), DragState::Threshold);

    d.handle(&moved(fx.card, 54.0, 53.0));
    assert_eq!(d.state(), DragState::Threshold);
    assert_eq!((d.x(), d.y()), (0.0, 0.0));

    // crossing the dead zone restarts the session at the current point
    d.handle(&moved(fx.card, 57.0, 50.0));
    assert_eq!(d.state(), DragState::Drag);
    assert_eq!(d.params().init_client, Point::new(57.0, 50.0));
    assert_eq!((d.x(), d.y()), (0.0, 0.0));

    d.handle(&moved(fx.card, 67.0, 50.0));
    assert_eq!((d.x(), d.y()), (10.0, 0.0));
}

#[test]
fn per_axis_threshold() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        threshold: Some([20.0, 4.0].into()),
        ..pinned_zero()
    });
    assert_eq!(d.threshold(), [-10.0, -2.0, 10.0, 2.0]);

    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    d.handle(&moved(fx.card, 59.0, 51.0));
    assert_eq!(d.state(), DragState::Threshold);
    d.handle(&moved(fx.card, 50.0, 53.0));
    assert_eq!(d.state(), DragState::Drag);
}

#[test]
fn release_inside_threshold_goes_back_to_idle() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        threshold: Some(10.0.into()),
        ..Default::default()
    });
    let seen = record(&mut d);

    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    d.handle(&moved(fx.card, 52.0, 52.0));
    assert!(d.handle(&up(fx.card, 52.0, 52.0)));

    assert_eq!(d.state(), DragState::Idle);
    assert_eq!((d.x(), d.y()), (0.0, 0.0));
    assert_eq!(*seen.borrow(), vec![NoticeKind::Threshold, NoticeKind::Idle]);
    assert!(fx.dom.dispatched().is_empty());
}

#[test]
fn idle_ignores_everything_but_pointer_down() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options::default());
    assert!(!d.handle(&moved(fx.card, 10.0, 10.0)));
    assert!(!d.handle(&up(fx.card, 10.0, 10.0)));
    // a press outside the element does not start a session
    assert!(!d.handle(&down(fx.board, 300.0, 300.0)));
    assert_eq!(d.state(), DragState::Idle);
}

#[test]
fn position_is_clamped_to_the_board() {
    let fx = board_with_card();
    // default pin keeps the whole card inside
    let mut d = fx.draggable(Options::default());
    assert_eq!(d.pin(), [0.0, 0.0, 100.0, 100.0]);
    let l = d.limits();
    assert_eq!((l.left, l.top, l.right, l.bottom), (0.0, 0.0, 300.0, 300.0));

    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    d.handle(&moved(fx.card, 500.0, -50.0));
    assert_eq!((d.x(), d.y()), (300.0, 0.0));

    // values already inside stay put
    d.set_position(120.0, 80.0);
    assert_eq!((d.x(), d.y()), (120.0, 80.0));
}

#[test]
fn container_offset_and_padding() {
    let dom = std::rc::Rc::new(HeadlessDom::default());
    let board = dom.add(dom.root(), "board", Rect::new(100.0, 100.0, 400.0, 400.0));
    dom.set_padding(board, Sides::uniform(10.0));
    let card = dom.add(board, "card", Rect::new(150.0, 150.0, 50.0, 50.0));
    let mut d = Draggable::new(dom.clone(), card, Options::default()).unwrap();

    let l = d.limits();
    assert_eq!((l.left, l.top, l.right, l.bottom), (-40.0, -40.0, 290.0, 290.0));
    assert_eq!(d.params().container_offset, Point::new(100.0, 100.0));
    assert_eq!(d.params().init_offset, Point::new(50.0, 50.0));

    d.handle(&down_at(card, (160.0, 160.0), (10.0, 10.0)));
    assert_eq!((d.x(), d.y()), (0.0, 0.0));
    d.handle(&moved(card, 0.0, 0.0));
    assert_eq!((d.x(), d.y()), (-40.0, -40.0));
    assert_eq!(dom.transform(card), "translate3d(-40px, -40px, 0)");
}

#[test]
fn existing_translation_is_kept() {
    let fx = board_with_card();
    fx.dom.set_transform(fx.card, "translate3d(30px, 20px, 0)");
    let mut d = fx.draggable(Options::default());
    assert_eq!((d.x(), d.y()), (30.0, 20.0));
    assert_eq!(d.params().init_offset, Point::ZERO);

    d.handle(&down_at(fx.card, (80.0, 70.0), (50.0, 50.0)));
    assert_eq!((d.x(), d.y()), (30.0, 20.0));
    d.handle(&moved(fx.card, 90.0, 75.0));
    assert_eq!((d.x(), d.y()), (40.0, 25.0));
    assert_eq!(fx.dom.offsets(fx.card).left, 40.0);
}

#[test]
fn page_scroll_is_added() {
    let dom = std::rc::Rc::new(HeadlessDom::default());
    let board = dom.add(dom.root(), "board", Rect::new(0.0, 0.0, 400.0, 1000.0));
    let card = dom.add(board, "card", Rect::new(0.0, 200.0, 100.0, 100.0));
    dom.scroll_to(Point::new(0.0, 100.0));
    let mut d = Draggable::new(dom.clone(), card, Options::default()).unwrap();

    // card is at client y 100..200
    d.handle(&down_at(card, (50.0, 150.0), (50.0, 50.0)));
    assert_eq!(d.y(), 0.0);
    d.handle(&moved(card, 50.0, 170.0));
    assert_eq!(d.y(), 20.0);
}

#[test]
fn touch_points_drive_the_drag() {
    let fx = board_with_card();
    let mut d = fx.draggable(pinned_zero());

    let start = down(fx.card, 0.0, 0.0).with_touches(vec![Point::new(50.0, 50.0)]);
    d.handle(&start);
    // grab offset comes from the element box when there is no mouse offset
    assert_eq!(d.params().inner_offset, Point::new(50.0, 50.0));

    let drag = moved(fx.card, 0.0, 0.0).with_touches(vec![Point::new(70.0, 60.0)]);
    d.handle(&drag);
    assert_eq!((d.x(), d.y()), (20.0, 10.0));
}

#[test]
fn axis_x_locks_vertical_movement() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        axis: Some(Axis::X),
        ..pinned_zero()
    });
    d.set_y(50.0);
    assert_eq!(d.y(), 0.0);

    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    d.handle(&moved(fx.card, 60.0, 80.0));
    assert_eq!((d.x(), d.y()), (10.0, 0.0));
}

#[test]
fn sniper_mode_slows_movement_without_jumps() {
    let fx = board_with_card();
    let mut d = fx.draggable(pinned_zero());
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));

    d.handle(&moved_sniping(fx.card, 150.0, 50.0));
    assert_eq!(d.x(), 15.0);

    d.handle(&moved(fx.card, 160.0, 50.0));
    assert_eq!(d.x(), 25.0);

    d.set_sniper(false);
    d.handle(&moved_sniping(fx.card, 170.0, 50.0));
    assert_eq!(d.x(), 35.0);
}

#[test]
fn positions_round_to_precision() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        precision: Some(5.0),
        ..pinned_zero()
    });
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    d.handle(&moved(fx.card, 62.0, 50.0));
    assert_eq!(d.x(), 10.0);
    d.handle(&moved(fx.card, 63.0, 50.0));
    assert_eq!(d.x(), 15.0);
}

#[test]
fn repeating_axis_wraps_inside_limits() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        repeat: Some(RepeatValue::Name("x".into())),
        ..pinned_zero()
    });
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    d.handle(&moved(fx.card, 500.0, 600.0));
    assert_eq!(d.x(), 50.0);
    assert_eq!(d.y(), 400.0);
}

#[test]
fn selection_is_disabled_while_dragging() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options::default());
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    assert!(!fx.dom.is_selectable(fx.card));
    assert!(!fx.dom.is_selectable(fx.dom.root()));

    d.handle(&up(fx.card, 50.0, 50.0));
    assert!(fx.dom.is_selectable(fx.card));
    assert!(fx.dom.is_selectable(fx.dom.root()));
}

#[test]
fn leaving_during_threshold_returns_to_idle() {
    let fx = board_with_card();
    let mut d = fx.draggable(Options {
        threshold: Some(10.0.into()),
        ..Default::default()
    });
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    assert_eq!(d.state(), DragState::Threshold);

    assert!(d.handle(&left(fx.dom.root(), 52.0, 50.0)));
    assert_eq!(d.state(), DragState::Idle);
    assert!(fx.dom.dispatched().is_empty());
    assert!(fx.dom.is_selectable(fx.dom.root()));
}

#[test]
fn leaving_during_drag_ends_it() {
    let fx = board_with_card();
    let mut d = fx.draggable(pinned_zero());
    let seen = record(&mut d);
    d.handle(&down_at(fx.card, (50.0, 50.0), (50.0, 50.0)));
    d.handle(&moved(fx.card, 80.0, 50.0));

    assert!(d.handle(&left(fx.dom.root(), 80.0, 50.0)));
    assert_eq!(d.state(), DragState::Idle);
    assert_eq!(d.x(), 30.0);
    assert_eq!(
        fx.dom.dispatched().last().map(|(_, n)| n.as_str()),
        Some("dragend")
    );
    let seen = seen.borrow();
    assert_eq!(seen[seen.len() - 2..], [NoticeKind::DragEnd, NoticeKind::Idle]);
}

#[test]
fn threshold_is_read_once_per_press() {
    let fx = board_with_card();
    let mut d = fx.draggable(pinned_zero());
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let c = calls.clone();
    // empty on the first read only
    d.set_threshold_fn(move || {
        c.set(c.get() + 1);
        if c.get() == 1 { [0.0; 4] } else { [-10.0, -10.0, 10.0, 10.0] }
    });

    d.handle(&down_at(fx.card, (60.0, 70.0), (50.0, 50.0)));
    assert_eq!(calls.get(), 1);
    assert_eq!(d.state(), DragState::Drag);
    assert_eq!((d.x(), d.y()), (10.0, 20.0));
    let names: Vec<String> = fx.dom.dispatched().into_iter().map(|(_, n)| n).collect();
    assert_eq!(names, vec!["dragstart", "drag", "drag"]);
}
