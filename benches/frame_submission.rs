use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Mat4, Vec3};
use raw_window_handle::{RawWindowHandle, Win32WindowHandle};
use std::num::NonZeroIsize;
use text_rpg::backend::HeadlessFactory;
use text_rpg::types::{Extent, FontDesc, Point, Rect, Rgb};
use text_rpg::{FailurePolicy, Pipeline, WindowMessage};

fn window() -> RawWindowHandle {
    RawWindowHandle::Win32(Win32WindowHandle::new(NonZeroIsize::new(1).unwrap()))
}

fn ready_pipeline() -> Pipeline<HeadlessFactory> {
    let mut pipeline = Pipeline::new(HeadlessFactory::new(), FailurePolicy::Strict);
    pipeline.dispatch(window(), WindowMessage::Create).unwrap();
    pipeline
        .dispatch(window(), WindowMessage::Size(Extent::new(800, 600)))
        .unwrap();
    pipeline
}

/// Benchmark: one dialogue frame (panel quad, text, present)
///
/// The call log is cleared each iteration so it does not grow across samples.
fn bench_dialogue_frame(c: &mut Criterion) {
    let mut pipeline = ready_pipeline();
    let renderer = pipeline.renderer().unwrap();
    let font = renderer.create_font(FontDesc::default()).unwrap();
    let panel = renderer.create_texture(Extent::new(1, 1), &[64, 32, 32, 192]).unwrap();

    c.bench_function("dialogue_frame", |b| {
        b.iter(|| {
            let renderer = pipeline.renderer().unwrap();
            renderer
                .update_world(Mat4::from_scale(Vec3::new(640.0, 120.0, 1.0)))
                .unwrap();
            renderer
                .render_texture(&panel, black_box(Rect::new(0, 0, 1, 1)))
                .unwrap();
            renderer
                .render_text(
                    &font,
                    black_box("다음 지문을 보려면 N키를 누르세요."),
                    Rgb::WHITE,
                    Extent::new(640, 120),
                    Point::new(400, 500),
                )
                .unwrap();
            pipeline.dispatch(window(), WindowMessage::Present).unwrap();
            pipeline.factory().recording().clear_calls();
        })
    });

    let renderer = pipeline.renderer().unwrap();
    renderer.delete_texture(panel);
}

/// Benchmark: textured quads per frame
fn bench_quad_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("quad_batches");
    let mut pipeline = ready_pipeline();
    let texture = pipeline
        .renderer()
        .unwrap()
        .create_texture(Extent::new(16, 16), &vec![255; 16 * 16 * 4])
        .unwrap();

    for count in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let renderer = pipeline.renderer().unwrap();
                for i in 0..count {
                    let offset = (i % 16) as i32;
                    renderer
                        .render_texture(&texture, Rect::new(offset, 0, offset + 1, 1))
                        .unwrap();
                }
                pipeline.factory().recording().clear_calls();
            })
        });
    }
    group.finish();

    pipeline.renderer().unwrap().delete_texture(texture);
}

/// Benchmark: window resize, which rebuilds the render target
fn bench_resize(c: &mut Criterion) {
    let mut pipeline = ready_pipeline();
    let sizes = [Extent::new(800, 600), Extent::new(1024, 768)];
    let mut i = 0;

    c.bench_function("resize", |b| {
        b.iter(|| {
            i += 1;
            pipeline
                .dispatch(window(), WindowMessage::Size(sizes[i % 2]))
                .unwrap();
            pipeline.factory().recording().clear_calls();
        })
    });
}

criterion_group!(benches, bench_dialogue_frame, bench_quad_batches, bench_resize);
criterion_main!(benches);
