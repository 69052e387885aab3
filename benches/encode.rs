use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qrsmith::planner::make_segments_optimally;
use qrsmith::{Mask, QrCode, QrCodeEcc, QrSegment, Version};

const URL: &str = "https://www.nayuki.io/page/qr-code-generator-library";

fn bench_encode_text_auto_mask(c: &mut Criterion) {
    c.bench_function("encode_text_url_auto_mask", |b| {
        b.iter(|| QrCode::encode_text(black_box(URL), black_box(QrCodeEcc::Medium)))
    });
}

fn bench_encode_text_fixed_mask(c: &mut Criterion) {
    let segs = QrSegment::make_segments(URL);
    let mask = Mask::new(3).ok();
    c.bench_function("encode_text_url_mask3", |b| {
        b.iter(|| {
            QrCode::encode_segments(
                black_box(&segs),
                QrCodeEcc::Medium,
                Version::MIN,
                Version::MAX,
                mask,
                true,
            )
        })
    });
}

fn bench_encode_version_40(c: &mut Criterion) {
    let data = vec![0xa5u8; 2900];
    c.bench_function("encode_binary_2900_bytes", |b| {
        b.iter(|| QrCode::encode_binary(black_box(&data), black_box(QrCodeEcc::Low)))
    });
}

fn bench_optimal_segments(c: &mut Criterion) {
    let text = "THE SQUARE ROOT OF 2 IS 1.41421356237309504880168872420969807856967187537694807317667973799";
    c.bench_function("make_segments_optimally_91_chars", |b| {
        b.iter(|| make_segments_optimally(black_box(text), QrCodeEcc::Low, Version::MIN, Version::MAX))
    });
}

criterion_group!(
    benches,
    bench_encode_text_auto_mask,
    bench_encode_text_fixed_mask,
    bench_encode_version_40,
    bench_optimal_segments
);
criterion_main!(benches);
