use mssim::{compute_mssim, MssimParams};
use std::time::Instant;

fn main() {
    let width = 512;
    let height = 512;

    // Create gradient images with small differences
    let mut img1 = vec![0u8; width * height];
    let mut img2 = vec![0u8; width * height];

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let val = ((x as f32 / width as f32) * 200.0) as u8;
            img1[idx] = val;
            img2[idx] = val.saturating_add(((x * y) % 10) as u8);
        }
    }

    // The SAT construction makes the cost independent of window size;
    // these should all run in roughly the same time.
    for ws in [3, 11, 31, 101] {
        let params = MssimParams::new().with_window_size(ws);

        // Warmup
        let _ = compute_mssim(&img1, &img2, width, height, &params);

        let iterations = 20;
        let start = Instant::now();
        let mut score = 0.0;
        for _ in 0..iterations {
            score = compute_mssim(&img1, &img2, width, height, &params).unwrap();
        }
        let elapsed = start.elapsed();

        println!(
            "512x512, window {ws:>3}: {:.2}ms per iteration (score {score:.6})",
            elapsed.as_secs_f64() * 1000.0 / f64::from(iterations),
        );
    }
}
