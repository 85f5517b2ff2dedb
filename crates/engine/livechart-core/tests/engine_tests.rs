use livechart_core::{
    chart::{Chart, Mark, Scene},
    charts::{BarChart, DonutChart, TreeChart},
    error::LayoutError,
    geometry::{Geometry, Rgba},
    ids::{EdgeKey, Key, MarkKey},
    inputs::{Command, Message},
    outputs::{ChannelName, CoreEvent, Outputs},
    record::{Record, Snapshot},
    render::{ElementKind, MemoryTarget},
    transition::{PhaseTiming, Status, Timing},
    ChangeEvent, ChangeLog, EngineError, HierarchyFault,
};

const FRAME_MS: f32 = 16.0;

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn rec(key: &str) -> MarkKey {
    MarkKey::Record(Key::from(key))
}

fn bar(key: &str, name: &str, amount: f64) -> Record {
    Record::new(key).with("name", name).with("amount", amount)
}

fn expense(key: &str, name: &str, cost: f64) -> Record {
    Record::new(key).with("name", name).with("cost", cost)
}

fn employee(name: &str, parent: Option<&str>, department: &str) -> Record {
    Record::new(name)
        .with("parent", parent)
        .with("department", department)
}

fn has_event(out: &Outputs, pred: impl Fn(&CoreEvent) -> bool) -> bool {
    out.events.iter().any(pred)
}

fn attr(target: &MemoryTarget, engine: &livechart_core::Engine, key: &str, name: &str) -> f32 {
    let handle = engine.element(&rec(key)).expect("element").handle;
    target
        .get(handle)
        .and_then(|el| el.attrs.number(name))
        .unwrap_or_else(|| panic!("{key} has no numeric {name}"))
}

#[test]
fn bars_enter_then_one_exits_and_is_destroyed() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(BarChart::default());
    let mut target = MemoryTarget::new();

    log.apply_batch([
        ChangeEvent::added(bar("1", "veg", 10.0)),
        ChangeEvent::added(bar("2", "fruit", 30.0)),
    ]);
    let report = engine.update(log.snapshot(), &mut target).unwrap();
    assert_eq!(report.nodes.enter, vec![Key::from("1"), Key::from("2")]);
    assert!(report.nodes.update.is_empty() && report.nodes.exit.is_empty());
    assert_eq!(target.count_kind(ElementKind::Rect), 2);

    // Bars start flat on the baseline.
    approx(attr(&target, &engine, "1", "height"), 0.0, 1e-4);

    let out = engine.settle(FRAME_MS, 200, &mut target);
    assert!(has_event(&out, |e| matches!(e, CoreEvent::Entered { key } if *key == rec("1"))));
    assert!(has_event(&out, |e| matches!(e, CoreEvent::Entered { key } if *key == rec("2"))));
    // 10 and 30 against a max of 30 on a 390px plot.
    approx(attr(&target, &engine, "1", "height"), 130.0, 1e-3);
    approx(attr(&target, &engine, "2", "height"), 390.0, 1e-3);
    let y2 = attr(&target, &engine, "2", "y");

    log.apply(ChangeEvent::removed("1")).unwrap();
    let report = engine.update(log.snapshot(), &mut target).unwrap();
    assert_eq!(report.nodes.exit, vec![Key::from("1")]);
    assert_eq!(report.nodes.update, vec![Key::from("2")]);
    assert_eq!(engine.element(&rec("1")).unwrap().status, Status::Exiting);

    let out = engine.settle(FRAME_MS, 200, &mut target);
    assert!(has_event(&out, |e| matches!(e, CoreEvent::Exited { key } if *key == rec("1"))));
    assert!(engine.element(&rec("1")).is_none());
    assert_eq!(target.count_kind(ElementKind::Rect), 1);

    let two = engine.element(&rec("2")).unwrap();
    assert_eq!(two.status, Status::Present);
    approx(attr(&target, &engine, "2", "height"), 390.0, 1e-3);
    approx(attr(&target, &engine, "2", "y"), y2, 1e-3);
}

#[test]
fn superseding_starts_from_last_rendered_value() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(DonutChart::default());
    let mut target = MemoryTarget::new();

    log.apply_batch([
        ChangeEvent::added(expense("a", "rent", 10.0)),
        ChangeEvent::added(expense("b", "food", 10.0)),
    ]);
    engine.update(log.snapshot(), &mut target).unwrap();
    for _ in 0..20 {
        engine.tick(FRAME_MS / 1000.0, &mut target);
    }
    let mid = engine.element(&rec("a")).unwrap().geometry.current().clone();
    assert!(engine.element(&rec("a")).unwrap().geometry.in_flight());

    log.apply(ChangeEvent::modified(expense("a", "rent", 30.0))).unwrap();
    engine.update(log.snapshot(), &mut target).unwrap();
    let el = engine.element(&rec("a")).unwrap();
    let tween = el.geometry.tween().expect("new tween");
    assert_eq!(tween.from, mid);
    assert_eq!(tween.elapsed_ms, 0.0);

    let out = engine.tick(FRAME_MS / 1000.0, &mut target).clone();
    assert!(has_event(&out, |e| matches!(
        e,
        CoreEvent::Superseded { key, channel: ChannelName::Geometry, progress }
            if *key == rec("a") && *progress > 0.0 && *progress < 1.0
    )));

    engine.settle(FRAME_MS, 200, &mut target);
    match engine.element(&rec("a")).unwrap().geometry.current() {
        Geometry::Arc { end_angle, .. } => approx(*end_angle, std::f32::consts::TAU * 0.75, 1e-4),
        other => panic!("unexpected geometry {other:?}"),
    }
}

#[test]
fn layout_failure_leaves_target_untouched() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(TreeChart::default());
    let mut target = MemoryTarget::new();

    log.apply_batch([
        ChangeEvent::added(employee("CEO", None, "exec")),
        ChangeEvent::added(employee("VP", Some("CEO"), "sales")),
    ]);
    engine.update(log.snapshot(), &mut target).unwrap();
    engine.settle(FRAME_MS, 200, &mut target);

    let before: Vec<_> = target.elements().map(|(h, e)| (h, e.clone())).collect();
    let ops_before = target.ops().len();
    let cycle = engine.cycle();

    log.apply(ChangeEvent::added(employee("Intern", Some("Ghost"), "sales")))
        .unwrap();
    let err = engine.update(log.snapshot(), &mut target).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Layout(LayoutError::MalformedHierarchy(HierarchyFault::Orphan { .. }))
    ));
    assert_eq!(engine.cycle(), cycle);

    let out = engine.tick(FRAME_MS / 1000.0, &mut target).clone();
    assert!(out.is_empty());
    let after: Vec<_> = target.elements().map(|(h, e)| (h, e.clone())).collect();
    assert_eq!(before, after);
    assert_eq!(target.ops().len(), ops_before);
}

#[test]
fn reparenting_exits_old_edge_and_enters_new_one() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(TreeChart::default());
    let mut target = MemoryTarget::new();

    log.apply_batch([
        ChangeEvent::added(employee("CEO", None, "exec")),
        ChangeEvent::added(employee("VP", Some("CEO"), "sales")),
        ChangeEvent::added(employee("CTO", Some("CEO"), "tech")),
        ChangeEvent::added(employee("Mgr", Some("VP"), "sales")),
    ]);
    let report = engine.update(log.snapshot(), &mut target).unwrap();
    assert_eq!(report.links.enter.len(), 3);
    engine.settle(FRAME_MS, 300, &mut target);
    let mgr_handle = engine.element(&rec("Mgr")).unwrap().handle;

    log.apply(ChangeEvent::modified(employee("Mgr", Some("CTO"), "tech")))
        .unwrap();
    let report = engine.update(log.snapshot(), &mut target).unwrap();
    assert_eq!(report.links.exit, vec![EdgeKey::new("VP", "Mgr")]);
    assert_eq!(report.links.enter, vec![EdgeKey::new("CTO", "Mgr")]);
    assert!(report.nodes.enter.is_empty() && report.nodes.exit.is_empty());
    assert!(report.nodes.update.contains(&Key::from("Mgr")));

    engine.settle(FRAME_MS, 300, &mut target);
    assert_eq!(engine.element(&rec("Mgr")).unwrap().handle, mgr_handle);
    assert!(engine
        .element(&MarkKey::Link(EdgeKey::new("VP", "Mgr")))
        .is_none());
    assert!(engine
        .element(&MarkKey::Link(EdgeKey::new("CTO", "Mgr")))
        .is_some());
}

#[test]
fn hover_supersedes_only_the_fill_channel() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(DonutChart::default());
    let mut target = MemoryTarget::new();

    log.apply_batch([
        ChangeEvent::added(expense("a", "rent", 10.0)),
        ChangeEvent::added(expense("b", "food", 10.0)),
    ]);
    engine.update(log.snapshot(), &mut target).unwrap();
    engine.settle(FRAME_MS, 200, &mut target);
    let base_fill = engine.element(&rec("a")).unwrap().mark.fill;

    let cmds = engine
        .dispatch(
            Message::PointerEnter { key: rec("a") },
            log.snapshot(),
            &mut target,
        )
        .unwrap();
    assert!(cmds.is_empty());
    assert!(engine.guide("tip:name").is_some());
    {
        let el = engine.element(&rec("a")).unwrap();
        assert!(!el.geometry.in_flight());
        assert_eq!(el.fill.as_ref().unwrap().target(), &Rgba::WHITE);
    }
    for _ in 0..5 {
        engine.tick(FRAME_MS / 1000.0, &mut target);
    }

    // A data update mid-hover retargets geometry but leaves the fill tween running.
    log.apply(ChangeEvent::modified(expense("a", "rent", 30.0))).unwrap();
    engine.update(log.snapshot(), &mut target).unwrap();
    let el = engine.element(&rec("a")).unwrap();
    assert!(el.geometry.in_flight());
    let fill = el.fill.as_ref().unwrap();
    approx(fill.tween().unwrap().elapsed_ms, 5.0 * FRAME_MS, 1e-3);
    let out = engine.tick(FRAME_MS / 1000.0, &mut target).clone();
    assert!(!has_event(&out, |e| matches!(
        e,
        CoreEvent::Superseded { channel: ChannelName::Fill, .. }
    )));

    engine
        .dispatch(
            Message::PointerLeave { key: rec("a") },
            log.snapshot(),
            &mut target,
        )
        .unwrap();
    assert!(engine.guide("tip:name").is_none());
    engine.settle(FRAME_MS, 200, &mut target);
    let el = engine.element(&rec("a")).unwrap();
    assert_eq!(Some(*el.fill.as_ref().unwrap().current()), base_fill);
}

#[test]
fn click_on_slice_requests_removal() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(DonutChart::default());
    let mut target = MemoryTarget::new();
    log.apply(ChangeEvent::added(expense("a", "rent", 10.0))).unwrap();
    engine.update(log.snapshot(), &mut target).unwrap();

    let cmds = engine
        .dispatch(Message::Click { key: rec("a") }, log.snapshot(), &mut target)
        .unwrap();
    assert_eq!(cmds, vec![Command::Remove(Key::from("a"))]);
    let none = engine
        .dispatch(Message::Click { key: rec("zz") }, log.snapshot(), &mut target)
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn key_returning_while_exiting_is_revived_in_place() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(BarChart::default());
    let mut target = MemoryTarget::new();

    log.apply_batch([
        ChangeEvent::added(bar("1", "veg", 10.0)),
        ChangeEvent::added(bar("2", "fruit", 30.0)),
    ]);
    engine.update(log.snapshot(), &mut target).unwrap();
    engine.settle(FRAME_MS, 200, &mut target);
    let handle = engine.element(&rec("1")).unwrap().handle;

    log.apply(ChangeEvent::removed("1")).unwrap();
    engine.update(log.snapshot(), &mut target).unwrap();
    for _ in 0..6 {
        engine.tick(FRAME_MS / 1000.0, &mut target);
    }
    let shrinking = attr(&target, &engine, "1", "height");
    assert!(shrinking > 0.0 && shrinking < 130.0);

    log.apply(ChangeEvent::added(bar("1", "veg", 10.0))).unwrap();
    let report = engine.update(log.snapshot(), &mut target).unwrap();
    assert_eq!(report.nodes.enter, vec![Key::from("1")]);
    let el = engine.element(&rec("1")).unwrap();
    assert_eq!(el.status, Status::Entering);
    assert_eq!(el.handle, handle);
    match &el.geometry.tween().unwrap().from {
        Geometry::Bar { height, .. } => approx(*height, shrinking, 1e-3),
        other => panic!("unexpected geometry {other:?}"),
    }

    let out = engine.settle(FRAME_MS, 200, &mut target);
    assert!(!has_event(&out, |e| matches!(e, CoreEvent::Exited { .. })));
    assert_eq!(target.count_kind(ElementKind::Rect), 2);
    approx(attr(&target, &engine, "1", "height"), 130.0, 1e-3);
}

/// Draws each record as a bar or a point depending on its `shape` field.
struct ShapeShifter;

impl Chart for ShapeShifter {
    fn name(&self) -> &'static str {
        "shape-shifter"
    }

    fn layout(&mut self, snapshot: &Snapshot) -> Result<Scene, LayoutError> {
        let mut scene = Scene::default();
        for r in snapshot {
            let geometry = match r.require_text("shape")? {
                "point" => Geometry::Point {
                    cx: 5.0,
                    cy: 5.0,
                    r: 3.0,
                },
                _ => Geometry::Bar {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                },
            };
            scene
                .marks
                .push(Mark::new(r.key.clone(), ElementKind::Path, geometry));
        }
        Ok(scene)
    }

    fn timing(&self, _mark: &Mark) -> Timing {
        Timing {
            enter: PhaseTiming::IMMEDIATE,
            update: PhaseTiming::ms(100),
            exit: PhaseTiming::IMMEDIATE,
        }
    }

    fn enter_from(&self, mark: &Mark) -> Geometry {
        mark.geometry.clone()
    }

    fn exit_to(&self, _key: &MarkKey, current: &Geometry) -> Geometry {
        current.clone()
    }
}

#[test]
fn interpolation_mismatch_fails_only_that_key() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(ShapeShifter);
    let mut target = MemoryTarget::new();

    log.apply_batch([
        ChangeEvent::added(Record::new("a").with("shape", "bar")),
        ChangeEvent::added(Record::new("b").with("shape", "bar")),
    ]);
    engine.update(log.snapshot(), &mut target).unwrap();
    engine.settle(FRAME_MS, 10, &mut target);

    log.apply_batch([
        ChangeEvent::modified(Record::new("a").with("shape", "point")),
        ChangeEvent::modified(Record::new("b").with("shape", "bar")),
    ]);
    engine.update(log.snapshot(), &mut target).unwrap();
    let out = engine.tick(FRAME_MS / 1000.0, &mut target).clone();
    assert!(has_event(&out, |e| matches!(
        e,
        CoreEvent::TransitionFailed { key, .. } if *key == rec("a")
    )));
    assert!(!has_event(&out, |e| matches!(
        e,
        CoreEvent::TransitionFailed { key, .. } if *key == rec("b")
    )));
    assert_eq!(attr(&target, &engine, "a", "r"), 3.0);
    assert_eq!(engine.element(&rec("a")).unwrap().status, Status::Present);
}

#[test]
fn update_with_unchanged_snapshot_is_idempotent() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(BarChart::default());
    let mut target = MemoryTarget::new();
    log.apply(ChangeEvent::added(bar("1", "veg", 10.0))).unwrap();
    engine.update(log.snapshot(), &mut target).unwrap();
    engine.settle(FRAME_MS, 200, &mut target);

    let report = engine.update(log.snapshot(), &mut target).unwrap();
    assert!(report.nodes.enter.is_empty() && report.nodes.exit.is_empty());
    assert!(engine.is_idle());
    let out = engine.tick(FRAME_MS / 1000.0, &mut target).clone();
    assert!(out.changes.is_empty());
}

#[test]
fn failed_filter_relayout_keeps_previous_filter() {
    let mut log = ChangeLog::default();
    let mut engine = livechart_core::Engine::new(livechart_core::charts::LineChart::default());
    let mut target = MemoryTarget::new();
    log.apply_batch([
        ChangeEvent::added(
            Record::new("r1")
                .with("activity", "running")
                .with("date", "2024-03-01")
                .with("distance", 5.0),
        ),
        // No date: only fails once cycling records are laid out.
        ChangeEvent::added(
            Record::new("c1")
                .with("activity", "cycling")
                .with("distance", 20.0),
        ),
    ]);
    engine.update(log.snapshot(), &mut target).unwrap();
    engine.settle(FRAME_MS, 10, &mut target);
    let before = target.len();

    let err = engine
        .dispatch(
            Message::SetFilter {
                filter: Some("cycling".into()),
            },
            log.snapshot(),
            &mut target,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Layout(LayoutError::MissingField { .. })
    ));
    assert_eq!(engine.chart().filter(), Some("running".to_string()));
    assert!(engine.element(&rec("r1")).is_some());
    assert_eq!(target.len(), before);

    // A later data change still lays out with the running filter.
    engine.update(log.snapshot(), &mut target).unwrap();
    assert!(engine.element(&rec("c1")).is_none());
}
