use image::{Rgb, RgbImage};
use std::thread;
use std::time::Duration;
use topcolors::engine::{
    ColorHistogram, FetchError, decode_image, format_result_line, top_k,
};
use topcolors::pipeline::WorkQueue;
use topcolors::utils::config_file::{apply_settings_to_opts, parse_settings};
use topcolors::{DecodedImage, Opts, ResultLine, Rgb24};

fn image_with(w: u32, h: u32, base: [u8; 3], extra: &[(u32, u32, [u8; 3])]) -> DecodedImage {
    let mut px = RgbImage::from_pixel(w, h, Rgb(base));
    for &(x, y, c) in extra {
        px.put_pixel(x, y, Rgb(c));
    }
    DecodedImage::new("http://test/img.png", px)
}

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

// --- Rgb24 ---

#[test]
fn test_rgb24_hex_is_lowercase_and_zero_padded() {
    assert_eq!(Rgb24::new(255, 0, 0).to_hex(), "#ff0000");
    assert_eq!(Rgb24::new(0, 0, 1).to_hex(), "#000001");
    assert_eq!(Rgb24::new(0xab, 0xcd, 0xef).to_string(), "#abcdef");
}

#[test]
fn test_rgb24_order_matches_hex_order() {
    let a = Rgb24::new(0x0a, 0x00, 0x00);
    let b = Rgb24::new(0x00, 0xff, 0xff);
    assert_eq!(a.cmp(&b), a.to_hex().cmp(&b.to_hex()));
}

// --- top_k ---

#[test]
fn test_top_k_orders_by_count_desc() {
    let out = top_k(vec![("a", 1), ("b", 5), ("c", 3), ("d", 4)], 3);
    assert_eq!(out, vec![("b", 5), ("d", 4), ("c", 3)]);
}

#[test]
fn test_top_k_tie_break_is_lexicographic() {
    let items = vec![
        ("#ffffff".to_string(), 2),
        ("#000002".to_string(), 2),
        ("#000001".to_string(), 2),
        ("#aaaaaa".to_string(), 2),
    ];
    let out: Vec<String> = top_k(items, 3).into_iter().map(|(v, _)| v).collect();
    assert_eq!(out, vec!["#000001", "#000002", "#aaaaaa"]);
}

#[test]
fn test_top_k_tie_break_independent_of_input_order() {
    let fwd = top_k((0..50u32).map(|v| (v, 1)), 3);
    let rev = top_k((0..50u32).rev().map(|v| (v, 1)), 3);
    assert_eq!(fwd, rev);
    assert_eq!(fwd, vec![(0, 1), (1, 1), (2, 1)]);
}

#[test]
fn test_top_k_fewer_than_k() {
    assert_eq!(top_k(vec![("x", 9)], 3), vec![("x", 9)]);
    assert!(top_k(Vec::<(u32, u64)>::new(), 3).is_empty());
    assert!(top_k(vec![("x", 9)], 0).is_empty());
}

#[test]
fn test_top_k_counts_non_increasing() {
    let items = (0..500u32).map(|v| (v, u64::from((v * 37) % 101)));
    let out = top_k(items, 3);
    assert_eq!(out.len(), 3);
    assert!(out.windows(2).all(|w| w[0].1 >= w[1].1));
}

// --- ColorHistogram ---

#[test]
fn test_histogram_total_equals_pixel_count() {
    let img = image_with(7, 5, [1, 2, 3], &[(0, 0, [9, 9, 9]), (6, 4, [4, 4, 4])]);
    let hist = ColorHistogram::accumulate(&img);
    assert_eq!(hist.total(), 35);
    assert_eq!(hist.distinct(), 3);
    assert_eq!(hist.count(Rgb24::new(1, 2, 3)), 33);
}

#[test]
fn test_histogram_top_three() {
    let img = image_with(
        4,
        4,
        [255, 0, 0],
        &[
            (0, 0, [0, 0, 255]),
            (1, 0, [0, 0, 255]),
            (2, 0, [0, 255, 0]),
        ],
    );
    let hist = ColorHistogram::accumulate(&img);
    assert_eq!(
        hist.top_k(3),
        vec![
            Rgb24::new(255, 0, 0),
            Rgb24::new(0, 0, 255),
            Rgb24::new(0, 255, 0)
        ]
    );
}

#[test]
fn test_histogram_single_color_gives_one_entry() {
    let img = image_with(3, 3, [10, 20, 30], &[]);
    assert_eq!(
        ColorHistogram::accumulate(&img).top_k(3),
        vec![Rgb24::new(10, 20, 30)]
    );
}

// --- format ---

#[test]
fn test_format_three_colors() {
    let line = ResultLine {
        url: "http://a/x.jpg".into(),
        colors: vec![
            Rgb24::new(255, 0, 0),
            Rgb24::new(0, 0, 255),
            Rgb24::new(0, 0, 0),
        ],
    };
    assert_eq!(
        format_result_line(&line),
        "http://a/x.jpg, #ff0000, #0000ff, #000000\n"
    );
}

#[test]
fn test_format_short_results() {
    let one = ResultLine {
        url: "u".into(),
        colors: vec![Rgb24::new(1, 1, 1)],
    };
    assert_eq!(format_result_line(&one), "u, #010101\n");
    let none = ResultLine {
        url: "u".into(),
        colors: vec![],
    };
    assert_eq!(format_result_line(&none), "u\n");
}

// --- decode ---

#[test]
fn test_decode_png_sniffed() {
    let mut px = RgbImage::from_pixel(2, 3, Rgb([0, 128, 255]));
    px.put_pixel(1, 2, Rgb([1, 1, 1]));
    let img = decode_image("u", &png_bytes(&px), None, 1 << 24).unwrap();
    assert_eq!((img.width(), img.height()), (2, 3));
    assert_eq!(img.pixels.get_pixel(1, 2), &Rgb([1, 1, 1]));
}

#[test]
fn test_decode_uses_content_type_with_params() {
    let px = RgbImage::from_pixel(1, 1, Rgb([5, 6, 7]));
    let img = decode_image("u", &png_bytes(&px), Some("image/png; charset=binary"), 1 << 24);
    assert!(img.is_ok());
}

#[test]
fn test_decode_wrong_content_type_fails() {
    let px = RgbImage::from_pixel(1, 1, Rgb([5, 6, 7]));
    let err = decode_image("u", &png_bytes(&px), Some("image/jpeg"), 1 << 24).unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[test]
fn test_decode_respects_alloc_limit() {
    let px = RgbImage::from_pixel(64, 64, Rgb([0, 0, 0]));
    let err = decode_image("u", &png_bytes(&px), None, 16).unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

// --- WorkQueue ---

#[test]
fn test_queue_fifo_and_drain_after_close() {
    let (producer, consumer) = WorkQueue::new(3).split();
    for i in 0..3 {
        let permit = producer.reserve();
        let img = DecodedImage::new(format!("u{i}"), RgbImage::new(1, 1));
        producer.push(img, permit).unwrap();
    }
    producer.close();
    let urls: Vec<String> = std::iter::from_fn(|| consumer.pop()).map(|i| i.url).collect();
    assert_eq!(urls, vec!["u0", "u1", "u2"]);
    assert!(consumer.pop().is_none());
}

#[test]
fn test_queue_permits_bounded_by_capacity() {
    let (producer, _consumer) = WorkQueue::new(2).split();
    let a = producer.reserve();
    let _b = producer.reserve();
    assert!(producer.try_reserve().is_none());
    assert_eq!(producer.stats().resident(), 2);
    drop(a);
    assert_eq!(producer.stats().resident(), 1);
    assert!(producer.try_reserve().is_some());
    assert_eq!(producer.stats().peak_resident(), 2);
}

#[test]
fn test_queue_capacity_zero_clamped_to_one() {
    let q = WorkQueue::new(0);
    assert_eq!(q.capacity(), 1);
}

#[test]
fn test_queue_backpressure_blocks_producer() {
    let (producer, consumer) = WorkQueue::new(2).split();
    let stats = producer.stats().clone();
    let handle = thread::spawn(move || {
        for i in 0..5 {
            let permit = producer.reserve();
            let img = DecodedImage::new(format!("u{i}"), RgbImage::new(2, 2));
            producer.push(img, permit).unwrap();
        }
        producer.close();
    });
    thread::sleep(Duration::from_millis(100));
    assert!(!handle.is_finished());
    assert_eq!(stats.resident(), 2);

    let mut seen = 0;
    while let Some(img) = consumer.pop() {
        assert!(stats.resident() <= 2);
        drop(img);
        seen += 1;
    }
    handle.join().unwrap();
    assert_eq!(seen, 5);
    assert_eq!(stats.peak_resident(), 2);
    assert_eq!(stats.resident(), 0);
}

// --- settings file ---

#[test]
fn test_settings_file_overrides_defaults() {
    let file = parse_settings(
        r#"
[settings]
input_path = "urls.txt"
queue_capacity = 4
worker_count = 1
fetch_timeout = 5
"#,
    )
    .unwrap();
    let mut opts = Opts::default();
    apply_settings_to_opts(&file, &mut opts);
    assert_eq!(opts.input_path, std::path::PathBuf::from("urls.txt"));
    assert_eq!(opts.queue_capacity, 4);
    assert_eq!(opts.worker_count, Some(1));
    assert_eq!(opts.fetch_timeout, Duration::from_secs(5));
    assert_eq!(opts.fetch_retries, 0);
}

#[test]
fn test_settings_file_empty_keeps_defaults() {
    let file = parse_settings("").unwrap();
    let mut opts = Opts::default();
    apply_settings_to_opts(&file, &mut opts);
    assert_eq!(opts.queue_capacity, 10);
    assert_eq!(opts.worker_count, None);
    assert_eq!(opts.fetch_timeout, Duration::from_secs(30));
}

#[test]
fn test_opts_effective_values() {
    let opts = Opts {
        queue_capacity: 0,
        worker_count: Some(0),
        fetch_retries: 99,
        ..Opts::default()
    };
    assert_eq!(opts.effective_queue_capacity(), 1);
    assert_eq!(opts.effective_workers(), 1);
    assert_eq!(opts.effective_retries(), 5);
    assert_eq!(opts.effective_result_capacity(), 4);
    assert!(Opts::default().effective_workers() >= 1);
}
