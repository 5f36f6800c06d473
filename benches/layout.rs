use std::time::{Duration, Instant};

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use studydash::layout::sanitize;
use studydash::settings::SavedWidget;
use studydash::{
    DashboardFeatures, EditorRuntime, GridRect, GridSize, MemoryStore, OccupancyMap,
    RuntimeConfig, RuntimeEvent, WidgetType, default_layout, resolve,
};

fn saved_entries() -> Vec<SavedWidget> {
    vec![
        SavedWidget::bare("start_timer").with_order(3),
        SavedWidget::bare("progress").with_geometry(0, 0, 4, 1),
        SavedWidget::bare("today_study").with_visible(false),
        SavedWidget::bare("category_chart").with_geometry(0, 1, 4, 2),
        SavedWidget::bare("daily_goal").with_geometry(-1, 9, 7, 0),
        SavedWidget::bare("focus_music"),
        SavedWidget::bare("progress"),
    ]
}

fn occupancy_queries(c: &mut Criterion) {
    let layout = default_layout(DashboardFeatures::default().with_review(true));
    let grid = GridSize::REFERENCE;

    c.bench_function("occupancy_build", |b| {
        b.iter(|| OccupancyMap::build(black_box(layout.widgets()), grid, None))
    });

    let map = OccupancyMap::build(layout.widgets(), grid, Some(WidgetType::CategoryChart));
    c.bench_function("occupancy_can_place_sweep", |b| {
        b.iter(|| {
            let mut accepted = 0usize;
            for y in 0..grid.rows {
                for x in 0..grid.cols {
                    if map.can_place(GridRect::new(x, y, 2, 2), None) {
                        accepted += 1;
                    }
                }
            }
            black_box(accepted)
        })
    });

    c.bench_function("occupancy_first_fit", |b| {
        b.iter(|| map.first_fit(black_box(4), black_box(2), None))
    });
}

fn reconciliation(c: &mut Criterion) {
    let defaults = default_layout(DashboardFeatures::default().with_review(true));
    let saved = saved_entries();
    let grid = GridSize::REFERENCE;

    c.bench_function("sanitize_saved_entries", |b| {
        b.iter(|| sanitize(black_box(&saved), grid, 4))
    });

    c.bench_function("resolve_layout", |b| {
        b.iter(|| resolve(black_box(&defaults), black_box(&saved), grid, 4).expect("resolve"))
    });
}

fn edit_session(c: &mut Criterion) {
    let script = scripted_events();
    c.bench_function("runtime_move_script", |b| {
        b.iter(|| {
            let mut runtime =
                EditorRuntime::new(MemoryStore::new(), RuntimeConfig::default()).expect("runtime");
            let t0 = Instant::now();
            for (offset, event) in black_box(script.clone()) {
                runtime.handle(event, t0 + offset).expect("event");
            }
            runtime
        });
    });
}

fn scripted_events() -> Vec<(Duration, RuntimeEvent)> {
    let ms = Duration::from_millis;
    vec![
        (ms(0), RuntimeEvent::EnterEdit),
        (ms(10), RuntimeEvent::PressDown { x: 0, y: 4 }),
        (ms(600), RuntimeEvent::Tick),
        (ms(650), RuntimeEvent::PressUp),
        (ms(700), RuntimeEvent::PressDown { x: 0, y: 5 }),
        (ms(750), RuntimeEvent::PressUp),
        (ms(800), RuntimeEvent::PressDown { x: 2, y: 0 }),
        (ms(850), RuntimeEvent::PressUp),
        (ms(900), RuntimeEvent::StepHeight(1)),
        (ms(950), RuntimeEvent::ApplySize),
        (ms(1000), RuntimeEvent::Back),
        (ms(1050), RuntimeEvent::Done),
    ]
}

criterion_group!(benches, occupancy_queries, reconciliation, edit_session);
criterion_main!(benches);
