#![allow(dead_code)]

pub use treemirror_test_utils::builders;
pub use treemirror_test_utils::{FakeSource, RecordingMirror, init_tracing, with_timeout};

use treemirror::engine::Monitor;
use treemirror::watch::{ExclusionFilter, WatchRegistry};

/// Start a monitor over `root` with a fake source and a recording mirror.
///
/// Returns the monitor together with handles sharing the fakes' state.
pub fn start_fake_monitor(
    root: &std::path::Path,
    filter: ExclusionFilter,
    capacity: usize,
) -> (Monitor<FakeSource, RecordingMirror>, FakeSource, RecordingMirror) {
    let source = FakeSource::new();
    let mirror = RecordingMirror::new();
    let registry = WatchRegistry::with_capacity(source.clone(), capacity);
    let (monitor, _summary) =
        Monitor::start(registry, filter, mirror.clone(), root).expect("initial walk failed");
    (monitor, source, mirror)
}
