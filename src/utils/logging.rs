use log::{log_enabled, warn, Level};
use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Optional host-side sink for diagnostic text. Presentation-only: nothing in
/// the control flow depends on it being installed.
pub type TraceHandler = unsafe extern "C" fn(message: *const c_char);

static TRACE_HANDLER: AtomicUsize = AtomicUsize::new(0);

/// Installs (or clears) the host trace handler.
pub fn set_trace_handler(handler: Option<TraceHandler>) {
    let raw = handler.map_or(0, |f| f as usize);
    TRACE_HANDLER.store(raw, Ordering::Release);
}

/// Sends one formatted line to the `log` facade and, when installed, to the
/// host trace handler.
pub fn trace_line(message: &str) {
    log::debug!("{message}");
    let raw = TRACE_HANDLER.load(Ordering::Acquire);
    if raw != 0 {
        if let Ok(text) = CString::new(message) {
            let handler: TraceHandler = unsafe { std::mem::transmute(raw) };
            unsafe { handler(text.as_ptr()) };
        }
    }
}

/// Scoped timer around one simulation update or other critical section.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
    budget_ms: Option<f32>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            start: Instant::now(),
            budget_ms: None,
        }
    }

    /// Warns on drop if the section ran longer than `budget_ms`.
    pub fn with_budget(label: &'a str, budget_ms: f32) -> Self {
        Self {
            label,
            start: Instant::now(),
            budget_ms: Some(budget_ms),
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f32() * 1000.0;
        if log_enabled!(Level::Trace) {
            log::trace!("{} took {:.3} ms", self.label, elapsed_ms);
        }
        if let Some(budget) = self.budget_ms {
            if elapsed_ms > budget {
                warn!(
                    "{} exceeded budget: {:.2} ms > {:.2} ms",
                    self.label, elapsed_ms, budget
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_trace(_message: *const c_char) {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn trace_handler_receives_lines() {
        set_trace_handler(Some(count_trace));
        trace_line("boundary check");
        trace_line("boundary check");
        set_trace_handler(None);
        trace_line("dropped");
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }
}
