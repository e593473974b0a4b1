use std::time::Instant;

use scaffolder::contexts::{BuildReport, FileStatus};

pub struct ProgressIndicator {
    total: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            start_time: Instant::now(),
        }
    }

    pub fn start(&self, model: &str) {
        println!("Building {} manifest entr(ies) with {}", self.total, model);
    }

    pub fn finish(&self, report: &BuildReport) {
        let elapsed = self.start_time.elapsed();
        let count = |status| report.paths_with_status(status).len();

        println!("\n{}", "=".repeat(60));
        println!("Summary:");
        println!("  Entries:      {}", self.total);
        println!("  Directories:  {}", count(FileStatus::Directory));
        println!("  Generated:    {}", count(FileStatus::Generated));
        println!("  Failed:       {}", count(FileStatus::Failed));
        println!("  Unstable:     {}", count(FileStatus::Unstable));
        println!("  Model calls:  {}", report.generation_calls);
        println!("  Requeues:     {}", report.requeues);
        println!("  Duration:     {:.2}s", elapsed.as_secs_f64());
        println!("{}", "=".repeat(60));

        for path in report.paths_with_status(FileStatus::Failed) {
            eprintln!("✗ {} holds a provider error", path);
        }
        for path in report.paths_with_status(FileStatus::Unstable) {
            eprintln!("⚠ {} kept changing; last version was written", path);
        }
    }
}
