//! Progress counter for processed URLs

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (shows count without percentage)
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " urls"
    )))
}

/// Force a refresh of the bar (e.g. so counter shows "0 urls" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Update progress bar if available
/// Uses try_lock so the writer never blocks on the bar; a skipped update is caught up next time.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Counter bar (verbose only) and the callback the writer calls after each batch.
pub fn setup_progress(
    verbose: bool,
) -> (Option<ProgressBar>, Option<Box<dyn Fn(usize) + Send>>) {
    let bar = verbose.then(|| {
        let b = create_counter("Processing");
        refresh_bar(&b);
        b
    });
    let callback = bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as Box<dyn Fn(usize) + Send>
    });
    (bar, callback)
}
