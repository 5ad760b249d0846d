use std::sync::{Mutex, MutexGuard};

static DEFERRED: Mutex<Option<Vec<String>>> = Mutex::new(None);

fn deferred() -> MutexGuard<'static, Option<Vec<String>>> {
    DEFERRED.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Start deferring warnings. While active, [`warn`] stores messages so a
/// command can print its own output first.
pub fn activate() {
    *deferred() = Some(Vec::new());
}

/// Stop deferring and return every message collected since [`activate`].
pub fn drain() -> Vec<String> {
    deferred().take().unwrap_or_default()
}

/// The stderr line for a warning
pub fn format_warning(msg: &str) -> String {
    format!("warning: {}", msg)
}

/// Stop deferring and print everything collected to stderr
pub fn flush() {
    for msg in drain() {
        eprintln!("{}", format_warning(&msg));
    }
}

/// Report a non-fatal problem. Goes to stderr right away unless deferring is active.
pub fn warn(msg: String) {
    let mut guard = deferred();
    if let Some(buf) = guard.as_mut() {
        buf.push(msg);
    } else {
        drop(guard);
        eprintln!("{}", format_warning(&msg));
    }
}

/// Like `eprintln!`, but routed through [`warn`].
#[macro_export]
macro_rules! deferred_eprintln {
    ($($arg:tt)*) => {
        $crate::diagnostics::warn(format!($($arg)*))
    };
}
