// End-to-end latency of the submission pipeline
// Measures wrap + compile + resolve + invoke through the library API
// Budget: the whole run has to fit in the default 5000 ms ceiling with room to spare

use sortbox::{ExecutorConfig, Judge, Submission};
use std::time::{Duration, Instant};

const ITERATIONS: usize = 20;
const WARMUP_ITERATIONS: usize = 2;

/// Latency percentiles
struct LatencyStats {
    p50: Duration,
    p95: Duration,
    min: Duration,
    max: Duration,
    mean: Duration,
}

impl LatencyStats {
    fn from_samples(mut samples: Vec<Duration>) -> Self {
        samples.sort();
        let len = samples.len();

        let p50_idx = (len as f64 * 0.50) as usize;
        let p95_idx = ((len as f64 * 0.95) as usize).min(len - 1);

        let sum: Duration = samples.iter().sum();
        let mean = sum / len as u32;

        Self {
            p50: samples[p50_idx],
            p95: samples[p95_idx],
            min: samples[0],
            max: samples[len - 1],
            mean,
        }
    }

    fn print(&self, label: &str) {
        println!("\n{}", label);
        println!("  p50: {:?}", self.p50);
        println!("  p95: {:?}", self.p95);
        println!("  min: {:?}", self.min);
        println!("  max: {:?}", self.max);
        println!("  mean: {:?}", self.mean);
    }
}

struct BenchmarkResult {
    scenario: String,
    stats: LatencyStats,
    passed: bool,
    reason: Option<String>,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n=== {} ===", self.scenario);
        self.stats.print("Latency");

        match &self.reason {
            None => println!("✅ PASS"),
            Some(reason) => println!("❌ FAIL: {}", reason),
        }
    }
}

fn measure(judge: &Judge, scenario: &str, submission: &Submission, input: &[i32], p95_budget: Duration) -> BenchmarkResult {
    for _ in 0..WARMUP_ITERATIONS {
        let _ = judge.run(submission, input);
    }

    let mut samples = Vec::with_capacity(ITERATIONS);
    let mut failures = 0;
    for _ in 0..ITERATIONS {
        let start = Instant::now();
        let outcome = judge.run(submission, input);
        samples.push(start.elapsed());
        if !outcome.is_success() {
            failures += 1;
        }
    }

    let stats = LatencyStats::from_samples(samples);
    let reason = if failures > 0 {
        Some(format!("{} of {} runs failed", failures, ITERATIONS))
    } else if stats.p95 >= p95_budget {
        Some(format!("p95={:?} (target <{:?})", stats.p95, p95_budget))
    } else {
        None
    };

    BenchmarkResult {
        scenario: scenario.to_string(),
        stats,
        passed: reason.is_none(),
        reason,
    }
}

fn main() {
    let scratch = std::env::temp_dir().join("sortbox-bench");
    let config = ExecutorConfig::default()
        .with_scratch_root(&scratch)
        .with_time_limit_ms(30_000);
    let judge = match Judge::new(config) {
        Ok(judge) => judge,
        Err(e) => {
            eprintln!("cannot set up judge: {}", e);
            std::process::exit(1);
        }
    };

    let input: Vec<i32> = (0..1000).rev().collect();

    let body = Submission::new(
        "let n = arr.len();\nfor i in 0..n {\n    for j in 0..n - 1 - i {\n        if arr[j] > arr[j + 1] {\n            arr.swap(j, j + 1);\n        }\n    }\n}",
    );
    let ranged = Submission::new(
        r#"
pub fn quick_sort(arr: &mut [i32], low: isize, high: isize) {
    if low < high {
        let p = partition(arr, low, high);
        quick_sort(arr, low, p - 1);
        quick_sort(arr, p + 1, high);
    }
}

fn partition(arr: &mut [i32], low: isize, high: isize) -> isize {
    let pivot = arr[high as usize];
    let mut i = low - 1;
    for j in low..high {
        if arr[j as usize] <= pivot {
            i += 1;
            arr.swap(i as usize, j as usize);
        }
    }
    arr.swap((i + 1) as usize, high as usize);
    i + 1
}
"#,
    )
    .with_hint_str("quickSort");

    let results = vec![
        measure(&judge, "Body-wrapped bubble sort", &body, &input, Duration::from_millis(3000)),
        measure(&judge, "Ranged quick sort", &ranged, &input, Duration::from_millis(3000)),
    ];

    println!("\n========================================");
    for result in &results {
        result.print();
    }
    let passed = results.iter().filter(|r| r.passed).count();
    println!("\n{}/{} scenarios within budget", passed, results.len());

    if passed != results.len() {
        std::process::exit(1);
    }
}
