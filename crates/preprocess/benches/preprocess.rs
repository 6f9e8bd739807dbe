use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use image::{ImageFormat, RgbImage};
use preprocess::{CpuPreProcessor, Preprocess, PreprocessConfig, ResizeMode};
use std::io::Cursor;

/// Encode a gradient image so the decoder has real work to do
fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}

fn benchmark_cpu_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_preprocess");

    let resolutions = [(640, 480), (1280, 720), (1920, 1080)];
    let presets = [
        ("mobilenet", PreprocessConfig::mobilenet()),
        ("imagenet", PreprocessConfig::imagenet()),
        (
            "imagenet_letterbox",
            PreprocessConfig {
                resize_mode: ResizeMode::Letterbox,
                ..PreprocessConfig::imagenet()
            },
        ),
    ];

    for (width, height) in resolutions.iter() {
        let jpeg = create_test_image(*width, *height, ImageFormat::Jpeg);

        for (name, config) in presets.iter() {
            let preprocessor = CpuPreProcessor::new(config.clone()).unwrap();

            group.bench_with_input(
                BenchmarkId::new(*name, format!("{}x{}", width, height)),
                &jpeg,
                |b, jpeg| {
                    b.iter(|| preprocessor.preprocess(black_box(jpeg)).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, benchmark_cpu_preprocess);
criterion_main!(benches);
